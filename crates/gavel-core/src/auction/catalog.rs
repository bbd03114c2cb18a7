// Catalog builder: turns grouped raw records into the ordered, priced lot
// sequence the auction runs through.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::auction::lot::{Lot, Role, RoleTable, Skills};
use crate::config::AuctionRules;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One athlete as read from the data layer, before validation.
///
/// Skill scores are optional and wide here so that a missing or out-of-range
/// value is reported as a catalog issue rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawLotRecord {
    pub name: String,
    pub nationality: String,
    pub role: String,
    #[serde(default)]
    pub batting: Option<i64>,
    #[serde(default)]
    pub bowling: Option<i64>,
    #[serde(default)]
    pub fielding: Option<i64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A single problem found while validating the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub set_key: String,
    /// Record name, or `None` when the problem is with the set key itself.
    pub record: Option<String>,
    pub problem: String,
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(name) => write!(f, "{} / {}: {}", self.set_key, name, self.problem),
            None => write!(f, "{}: {}", self.set_key, self.problem),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has {} invalid entries in sets [{}]", .issues.len(), offending_keys(.issues))]
    Invalid { issues: Vec<CatalogIssue> },
}

impl CatalogError {
    pub fn issues(&self) -> &[CatalogIssue] {
        match self {
            CatalogError::Invalid { issues } => issues,
        }
    }
}

fn offending_keys(issues: &[CatalogIssue]) -> String {
    let mut keys: Vec<&str> = issues.iter().map(|i| i.set_key.as_str()).collect();
    keys.dedup();
    keys.join(", ")
}

// ---------------------------------------------------------------------------
// Set keys
// ---------------------------------------------------------------------------

/// A parsed set key such as "BOWL4".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetKey {
    pub role: Role,
    pub index: u32,
}

impl SetKey {
    /// Split a key into its role label prefix and numeric suffix.
    pub fn parse(key: &str) -> Option<SetKey> {
        let key = key.trim();
        let digits_at = key.find(|c: char| c.is_ascii_digit())?;
        let (label, number) = key.split_at(digits_at);
        let role = Role::from_label(label)?;
        let index = number.parse().ok()?;
        Some(SetKey { role, index })
    }

    fn sort_key(&self, marquee_max_set: u32) -> (bool, u32, u8) {
        (self.index > marquee_max_set, self.index, self.role.sort_order())
    }
}

/// Price band (1..=5) of a set, given how many sets its role has.
pub fn price_band(set_index: u32, sets_in_role: usize) -> usize {
    let band_size = sets_in_role.div_ceil(5).max(1);
    (set_index as usize).div_ceil(band_size).clamp(1, 5)
}

/// Base price of a set under `rules.price_tiers`.
pub fn base_price_for(set: SetKey, sets_per_role: &RoleTable<usize>, rules: &AuctionRules) -> u32 {
    let band = price_band(set.index, sets_per_role[set.role]);
    rules.price_tiers[band - 1]
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the ordered lot sequence.
///
/// 1. Parse every set key; count sets per role.
/// 2. Order sets: marquee first, then ascending index, then role precedence.
/// 3. Price each set by its band within its role.
/// 4. Validate every record; collect all problems before failing.
/// 5. Number lots from 1 in auction order.
pub fn build_catalog(
    sets: &BTreeMap<String, Vec<RawLotRecord>>,
    rules: &AuctionRules,
) -> Result<Vec<Lot>, CatalogError> {
    let mut issues = Vec::new();
    let mut parsed: Vec<(SetKey, &String, &Vec<RawLotRecord>)> = Vec::new();

    for (key, records) in sets {
        match SetKey::parse(key) {
            Some(set) => parsed.push((set, key, records)),
            None => issues.push(CatalogIssue {
                set_key: key.clone(),
                record: None,
                problem: "set key must be a role label followed by a set number".into(),
            }),
        }
    }

    let mut sets_per_role: RoleTable<usize> = RoleTable::default();
    for (set, _, _) in &parsed {
        sets_per_role[set.role] += 1;
    }

    parsed.sort_by_key(|(set, _, _)| set.sort_key(rules.marquee_max_set));

    let mut lots = Vec::new();
    for (set, key, records) in parsed {
        let base_price = base_price_for(set, &sets_per_role, rules);
        for record in records {
            match validate_record(key, set, record) {
                Ok((role, skills)) => {
                    let overseas = rules.is_overseas(&record.nationality);
                    lots.push(Lot::new(
                        lots.len() + 1,
                        record.name.trim(),
                        role,
                        record.nationality.trim(),
                        overseas,
                        skills,
                        key.as_str(),
                        base_price,
                    ));
                }
                Err(mut record_issues) => issues.append(&mut record_issues),
            }
        }
    }

    if !issues.is_empty() {
        return Err(CatalogError::Invalid { issues });
    }

    info!("Built catalog: {} lots from {} sets", lots.len(), sets.len());
    Ok(lots)
}

fn validate_record(
    key: &str,
    set: SetKey,
    record: &RawLotRecord,
) -> Result<(Role, Skills), Vec<CatalogIssue>> {
    let mut issues = Vec::new();
    let issue = |problem: String| CatalogIssue {
        set_key: key.to_string(),
        record: Some(record.name.clone()),
        problem,
    };

    let role = Role::from_label(&record.role);
    match role {
        None => issues.push(issue(format!("unknown role {:?}", record.role))),
        Some(role) if role != set.role => {
            warn!(
                "{} in set {key} has role {role}, set role is {}",
                record.name, set.role
            );
        }
        Some(_) => {}
    }

    let mut skill = |label: &str, value: Option<i64>| -> u8 {
        match value {
            None => {
                issues.push(issue(format!("missing {label} score")));
                0
            }
            Some(v) => match u8::try_from(v) {
                Ok(v) if v <= 100 => v,
                _ => {
                    issues.push(issue(format!("{label} score {v} outside 0-100")));
                    0
                }
            },
        }
    };
    let skills = Skills {
        batting: skill("batting", record.batting),
        bowling: skill("bowling", record.bowling),
        fielding: skill("fielding", record.fielding),
    };

    match role {
        Some(role) if issues.is_empty() => Ok((role, skills)),
        _ => Err(issues),
    }
}
