// Library root: the auction decision core.
//
// `auction` holds the catalog, participants, bid ladder and the lot-by-lot
// state machine. `strategy` holds the pure scoring and AI bidding functions
// the state machine consults. Nothing here performs I/O beyond reading
// config files, and nothing here owns a clock.

pub mod auction;
pub mod config;
pub mod price;
pub mod strategy;
