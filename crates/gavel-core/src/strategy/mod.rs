// Pure decision functions: roster needs, lot valuation, AI bidding, and the
// random source the bidding engine draws from.

pub mod bidding;
pub mod needs;
pub mod random;
pub mod valuation;
