// Auction domain: lots, catalog construction, participants, bid ladder,
// and the state machine that resolves each lot.

pub mod catalog;
pub mod ladder;
pub mod lot;
pub mod participant;
pub mod state;
