// Squad needs: how far a roster is from the composition rules.
//
// Everything here is a pure function of the roster's current contents and is
// recomputed on each call; nothing is cached on the participant.

use serde::Serialize;

use crate::auction::lot::{Lot, Role, RoleTable};
use crate::config::AuctionRules;

/// Remaining gaps in a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamNeeds {
    /// Athletes still required per role to reach that role's minimum.
    pub role_gaps: RoleTable<usize>,
    /// Overseas slots still open.
    pub overseas_remaining: usize,
    /// Athletes still required to reach the minimum squad size. Negative
    /// once the squad is past the minimum; callers treat that as zero.
    pub total_gap: i64,
}

/// Count of roster entries per role.
pub fn role_counts(roster: &[Lot]) -> RoleTable<usize> {
    let mut counts = RoleTable::default();
    for lot in roster {
        counts[lot.role] += 1;
    }
    counts
}

/// Number of roster entries counting against the overseas cap.
pub fn overseas_count(roster: &[Lot]) -> usize {
    roster.iter().filter(|l| l.overseas).count()
}

/// Compute the remaining gaps of `roster` against `rules`.
pub fn team_needs(roster: &[Lot], rules: &AuctionRules) -> TeamNeeds {
    let counts = role_counts(roster);
    let mut role_gaps = RoleTable::default();
    for role in Role::ALL {
        role_gaps[role] = rules.role_limits[role].min.saturating_sub(counts[role]);
    }

    TeamNeeds {
        role_gaps,
        overseas_remaining: rules.max_overseas.saturating_sub(overseas_count(roster)),
        total_gap: rules.min_squad_size as i64 - roster.len() as i64,
    }
}

/// How badly a roster needs another athlete of `role`, in `[0, 1]`.
///
/// - Below the role minimum: `1 - count / min`, so an empty role scores 1.
/// - Between minimum and maximum: a mild 0.3.
/// - At or above the maximum: 0.
pub fn role_urgency(roster: &[Lot], role: Role, rules: &AuctionRules) -> f64 {
    let count = role_counts(roster)[role];
    let limit = rules.role_limits[role];

    if count < limit.min {
        1.0 - count as f64 / limit.min as f64
    } else if count < limit.max {
        0.3
    } else {
        0.0
    }
}
