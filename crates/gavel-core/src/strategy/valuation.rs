// Lot valuation: a 0-100 desirability score from the three skill attributes.

use crate::auction::lot::{Lot, Role, RoleTable, Skills};

/// Weights applied to (batting, bowling, fielding). Each triple sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillWeights {
    pub batting: f64,
    pub bowling: f64,
    pub fielding: f64,
}

impl SkillWeights {
    const fn new(batting: f64, bowling: f64, fielding: f64) -> Self {
        SkillWeights {
            batting,
            bowling,
            fielding,
        }
    }
}

/// Per-role weights: batting-heavy for batters, keeping-heavy fielding for
/// wicketkeepers, balanced for all-rounders, bowling-heavy for bowlers.
pub const ROLE_WEIGHTS: RoleTable<SkillWeights> = RoleTable::new(
    SkillWeights::new(0.7, 0.1, 0.2),
    SkillWeights::new(0.5, 0.1, 0.4),
    SkillWeights::new(0.4, 0.4, 0.2),
    SkillWeights::new(0.1, 0.7, 0.2),
);

/// Score a skill set for a buyer looking at `role`.
pub fn skill_score(skills: &Skills, role: Role) -> f64 {
    let w = ROLE_WEIGHTS[role];
    let score = skills.batting as f64 * w.batting
        + skills.bowling as f64 * w.bowling
        + skills.fielding as f64 * w.fielding;
    score.clamp(0.0, 100.0)
}

/// Desirability of a lot, in `[0, 100]`.
pub fn lot_value(lot: &Lot) -> f64 {
    skill_score(&lot.skills, lot.role)
}
