// Bid increment ladder: maps the current price to the next legal price.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LadderError {
    #[error("bid increment schedule is empty")]
    Empty,

    #[error("bid increment step {index} has a zero increment")]
    ZeroIncrement { index: usize },

    #[error("bid increment step {index} bound {bound} does not exceed the previous bound")]
    NotAscending { index: usize, bound: u32 },

    #[error("only the last bid increment step may be unbounded (step {index} is not last)")]
    UnboundedNotLast { index: usize },

    #[error("the last bid increment step must be unbounded")]
    LastStepBounded,
}

/// One rung of the ladder: prices strictly below `below` rise by `increment`.
/// `below = None` means the step covers every remaining price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementStep {
    #[serde(default)]
    pub below: Option<u32>,
    pub increment: u32,
}

/// A validated increment schedule whose final step is unbounded, so every
/// price has an increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidLadder {
    steps: Vec<IncrementStep>,
}

impl BidLadder {
    /// Build a ladder from ordered steps.
    ///
    /// Requirements:
    /// 1. At least one step.
    /// 2. Every increment > 0 (so `next_price(p) > p` whenever it exists).
    /// 3. Bounds strictly ascending.
    /// 4. Exactly the last step is unbounded.
    pub fn new(steps: Vec<IncrementStep>) -> Result<Self, LadderError> {
        if steps.is_empty() {
            return Err(LadderError::Empty);
        }

        let last = steps.len() - 1;
        let mut previous: Option<u32> = None;
        for (index, step) in steps.iter().enumerate() {
            if step.increment == 0 {
                return Err(LadderError::ZeroIncrement { index });
            }
            match step.below {
                Some(bound) => {
                    if index == last {
                        return Err(LadderError::LastStepBounded);
                    }
                    if previous.is_some_and(|p| bound <= p) {
                        return Err(LadderError::NotAscending { index, bound });
                    }
                    previous = Some(bound);
                }
                None if index != last => {
                    return Err(LadderError::UnboundedNotLast { index });
                }
                None => {}
            }
        }

        Ok(BidLadder { steps })
    }

    /// The increment that applies at `current`.
    pub fn increment_at(&self, current: u32) -> u32 {
        self.steps
            .iter()
            .find(|s| s.below.map_or(true, |bound| current < bound))
            .or(self.steps.last())
            .map_or(1, |s| s.increment)
    }

    /// Next legal price: `current` plus the increment of the first step whose
    /// bound is strictly greater than `current`. `None` when the raise would
    /// not fit in a `u32`.
    pub fn next_price(&self, current: u32) -> Option<u32> {
        current.checked_add(self.increment_at(current))
    }
}

impl Default for BidLadder {
    /// <100: +5, <200: +10, otherwise +25.
    fn default() -> Self {
        BidLadder {
            steps: vec![
                IncrementStep {
                    below: Some(100),
                    increment: 5,
                },
                IncrementStep {
                    below: Some(200),
                    increment: 10,
                },
                IncrementStep {
                    below: None,
                    increment: 25,
                },
            ],
        }
    }
}
