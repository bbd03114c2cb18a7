// Participant registry: the competing teams, their purses and squads.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auction::lot::{Lot, RoleTable};
use crate::config::AuctionRules;
use crate::strategy::needs::{overseas_count, role_counts};

/// Presentation attributes of a team. Carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
}

/// A team as supplied by the data layer, before the auction starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDescriptor {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub branding: Branding,
}

/// A team competing in the auction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub branding: Branding,
    /// Remaining purse in lakhs. Only ever debited.
    pub budget: u32,
    /// Acquired lots in purchase order, each stamped with its sale.
    pub roster: Vec<Lot>,
    pub is_user: bool,
}

impl Participant {
    pub fn squad_size(&self) -> usize {
        self.roster.len()
    }

    /// Total spent so far, summed from the roster's sale stamps.
    pub fn total_spent(&self) -> u32 {
        self.roster.iter().map(Lot::sold_price).sum()
    }
}

/// Create one participant per descriptor with a full purse and an empty squad.
///
/// At most one participant is flagged as the user: the one whose id equals
/// `user_team_id`. An id that matches no descriptor yields a fully automated
/// run.
pub fn init_participants(
    teams: &[TeamDescriptor],
    user_team_id: Option<&str>,
    rules: &AuctionRules,
) -> Vec<Participant> {
    if let Some(user) = user_team_id {
        if !teams.iter().any(|t| t.id == user) {
            warn!("user team {user} not found among {} teams; running fully automated", teams.len());
        }
    }

    teams
        .iter()
        .map(|t| Participant {
            id: t.id.clone(),
            name: t.name.clone(),
            branding: t.branding.clone(),
            budget: rules.initial_purse,
            roster: Vec::new(),
            is_user: user_team_id == Some(t.id.as_str()),
        })
        .collect()
}

/// Squad snapshot used for standings and result screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub team_id: String,
    pub role_counts: RoleTable<usize>,
    pub overseas_count: usize,
    pub squad_size: usize,
    pub total_spent: u32,
    pub budget_remaining: u32,
}

pub fn team_summary(participant: &Participant) -> TeamSummary {
    TeamSummary {
        team_id: participant.id.clone(),
        role_counts: role_counts(&participant.roster),
        overseas_count: overseas_count(&participant.roster),
        squad_size: participant.squad_size(),
        total_spent: participant.total_spent(),
        budget_remaining: participant.budget,
    }
}
