// Configuration loading and parsing (auction.toml, simulation.toml).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::auction::ladder::{BidLadder, IncrementStep};
use crate::auction::lot::{Role, RoleTable};
use crate::strategy::bidding::{Personality, PersonalityTable};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub rules: AuctionRules,
    pub ladder: BidLadder,
    pub personalities: PersonalityTable,
    pub timing: TimingConfig,
    pub run: RunConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// Auction rules
// ---------------------------------------------------------------------------

/// Minimum and maximum number of athletes of one role in a squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleLimit {
    pub min: usize,
    pub max: usize,
}

/// Squad composition, purse and pricing rules shared by every participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionRules {
    /// Starting budget per team, in lakhs.
    pub initial_purse: u32,
    pub min_squad_size: usize,
    pub max_squad_size: usize,
    pub max_overseas: usize,
    /// Amount held back per squad slot still needed to reach the minimum.
    pub reserve_per_slot: u32,
    /// Nationality that does not count against the overseas cap.
    pub domestic_nationality: String,
    /// Sets numbered at or below this are marquee sets.
    pub marquee_max_set: u32,
    /// Base price by band, band 1 first.
    pub price_tiers: [u32; 5],
    pub role_limits: RoleTable<RoleLimit>,
}

impl AuctionRules {
    /// Whether an athlete of this nationality counts against the overseas cap.
    pub fn is_overseas(&self, nationality: &str) -> bool {
        !nationality
            .trim()
            .eq_ignore_ascii_case(&self.domestic_nationality)
    }

    /// Budget a team of `roster_size` must keep back so it can still fill its
    /// remaining minimum-squad slots after the current purchase.
    pub fn reserve_for(&self, roster_size: usize) -> u32 {
        let slots = self.min_squad_size.saturating_sub(roster_size + 1);
        (slots as u32).saturating_mul(self.reserve_per_slot)
    }
}

impl Default for AuctionRules {
    fn default() -> Self {
        AuctionRules {
            initial_purse: 12_000,
            min_squad_size: 18,
            max_squad_size: 25,
            max_overseas: 8,
            reserve_per_slot: 50,
            domestic_nationality: "India".into(),
            marquee_max_set: 2,
            price_tiers: [200, 150, 100, 75, 50],
            role_limits: RoleTable::new(
                RoleLimit { min: 4, max: 6 },
                RoleLimit { min: 2, max: 3 },
                RoleLimit { min: 3, max: 5 },
                RoleLimit { min: 5, max: 7 },
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Timing and run settings
// ---------------------------------------------------------------------------

/// Durations of the auction's simulated clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Bidding window, restarted on every accepted bid.
    pub countdown: Duration,
    /// Pause between a sale and the next lot.
    pub settle_delay: Duration,
    /// Cadence of AI polls while a lot is active.
    pub ai_poll_interval: Duration,
    /// Probability that a due AI poll actually runs.
    pub ai_poll_chance: f64,
    /// Resolution of the external scheduler's clock.
    pub tick: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            countdown: Duration::from_millis(5_000),
            settle_delay: Duration::from_millis(2_000),
            ai_poll_interval: Duration::from_millis(800),
            ai_poll_chance: 0.3,
            tick: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Team controlled by the human participant. `None` runs fully automated.
    #[serde(default)]
    pub user_team: Option<String>,
    /// Seed for the random source. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub teams: String,
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire auction.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AuctionFile {
    rules: RulesSection,
    roles: RolesSection,
    bid_increments: Vec<IncrementStep>,
    #[serde(default)]
    personalities: Option<HashMap<String, Personality>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RulesSection {
    initial_purse: u32,
    min_squad_size: usize,
    max_squad_size: usize,
    max_overseas: usize,
    reserve_per_slot: u32,
    domestic_nationality: String,
    marquee_max_set: u32,
    price_tiers: Vec<u32>,
}

/// Per-role limits. Field names match the TOML table keys (BAT, WK, ...).
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
struct RolesSection {
    BAT: RoleLimit,
    WK: RoleLimit,
    AR: RoleLimit,
    BOWL: RoleLimit,
}

// ---------------------------------------------------------------------------
// simulation.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct SimulationFile {
    timing: TimingSection,
    #[serde(default)]
    run: RunConfig,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct TimingSection {
    countdown_ms: u64,
    settle_delay_ms: u64,
    ai_poll_interval_ms: u64,
    ai_poll_chance: f64,
    tick_ms: u64,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/auction.toml` and
/// `config/simulation.toml`, relative to the given `base_dir`.
///
/// This does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- auction.toml (required) ---
    let auction_path = config_dir.join(CONFIG_FILES[0]);
    let auction_text = read_file(&auction_path)?;
    let auction_file: AuctionFile =
        toml::from_str(&auction_text).map_err(|e| ConfigError::ParseError {
            path: auction_path.clone(),
            source: e,
        })?;

    // --- simulation.toml (required) ---
    let simulation_path = config_dir.join(CONFIG_FILES[1]);
    let simulation_text = read_file(&simulation_path)?;
    let simulation_file: SimulationFile =
        toml::from_str(&simulation_text).map_err(|e| ConfigError::ParseError {
            path: simulation_path.clone(),
            source: e,
        })?;

    let rules_section = auction_file.rules;
    let price_tiers: [u32; 5] =
        rules_section
            .price_tiers
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::ValidationError {
                field: "rules.price_tiers".into(),
                message: format!(
                    "expected exactly 5 tiers, got {}",
                    rules_section.price_tiers.len()
                ),
            })?;

    let roles = auction_file.roles;
    let rules = AuctionRules {
        initial_purse: rules_section.initial_purse,
        min_squad_size: rules_section.min_squad_size,
        max_squad_size: rules_section.max_squad_size,
        max_overseas: rules_section.max_overseas,
        reserve_per_slot: rules_section.reserve_per_slot,
        domestic_nationality: rules_section.domestic_nationality,
        marquee_max_set: rules_section.marquee_max_set,
        price_tiers,
        role_limits: RoleTable::new(roles.BAT, roles.WK, roles.AR, roles.BOWL),
    };

    let ladder =
        BidLadder::new(auction_file.bid_increments).map_err(|e| ConfigError::ValidationError {
            field: "bid_increments".into(),
            message: e.to_string(),
        })?;

    let personalities = match auction_file.personalities {
        Some(map) => PersonalityTable::new(map),
        None => PersonalityTable::default(),
    };

    let t = simulation_file.timing;
    let timing = TimingConfig {
        countdown: Duration::from_millis(t.countdown_ms),
        settle_delay: Duration::from_millis(t.settle_delay_ms),
        ai_poll_interval: Duration::from_millis(t.ai_poll_interval_ms),
        ai_poll_chance: t.ai_poll_chance,
        tick: Duration::from_millis(t.tick_ms),
    };

    let config = Config {
        rules,
        ladder,
        personalities,
        timing,
        run: simulation_file.run,
        data_paths: simulation_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// The two files every run reads from `config/`.
pub const CONFIG_FILES: [&str; 2] = ["auction.toml", "simulation.toml"];

/// Copy `auction.toml` and `simulation.toml` from `defaults/` into `config/`
/// when the user has no copy yet. Other files in `defaults/` are ignored.
/// Returns the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no defaults/ or config/ under {}; start the simulator from the workspace root",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("cannot create {}: {e}", config_dir.display()),
    })?;

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = defaults_dir.join(name);
        let content = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("cannot read default {}: {e}", source.display()),
        })?;

        // create_new: never clobber a copy that appeared since the check.
        let mut dest = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(dest) => dest,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("cannot create {}: {e}", target.display()),
                })
            }
        };
        std::io::Write::write_all(&mut dest, &content).map_err(|e| {
            ConfigError::DefaultsCopyError {
                message: format!("cannot write {}: {e}", target.display()),
            }
        })?;
        info!("Copied default {} into {}", name, config_dir.display());
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory,
/// copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_rules(&config.rules)?;
    validate_timing(&config.timing)
}

/// Check the squad and pricing rules for internal consistency.
pub fn validate_rules(rules: &AuctionRules) -> Result<(), ConfigError> {
    if rules.initial_purse == 0 {
        return Err(invalid("rules.initial_purse", "must be greater than 0"));
    }

    if rules.min_squad_size == 0 {
        return Err(invalid("rules.min_squad_size", "must be greater than 0"));
    }

    if rules.min_squad_size > rules.max_squad_size {
        return Err(invalid(
            "rules.min_squad_size",
            format!(
                "must not exceed max_squad_size ({} > {})",
                rules.min_squad_size, rules.max_squad_size
            ),
        ));
    }

    for (role, limit) in rules.role_limits.iter() {
        if limit.min > limit.max {
            return Err(invalid(
                &format!("roles.{}", role.label()),
                format!("min {} exceeds max {}", limit.min, limit.max),
            ));
        }
    }

    let required: usize = Role::ALL
        .iter()
        .map(|&r| rules.role_limits[r].min)
        .sum();
    if required > rules.max_squad_size {
        return Err(invalid(
            "roles",
            format!(
                "role minimums sum to {required}, more than max_squad_size {}",
                rules.max_squad_size
            ),
        ));
    }

    if rules.price_tiers.iter().any(|&p| p == 0) {
        return Err(invalid("rules.price_tiers", "every tier must be > 0"));
    }
    if rules.price_tiers.windows(2).any(|w| w[1] > w[0]) {
        return Err(invalid(
            "rules.price_tiers",
            "tiers must be non-increasing from band 1 to band 5",
        ));
    }

    Ok(())
}

fn validate_timing(timing: &TimingConfig) -> Result<(), ConfigError> {
    let nonzero: &[(&str, Duration)] = &[
        ("timing.countdown_ms", timing.countdown),
        ("timing.ai_poll_interval_ms", timing.ai_poll_interval),
        ("timing.tick_ms", timing.tick),
    ];
    for (name, val) in nonzero {
        if val.is_zero() {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let chance = timing.ai_poll_chance;
    if !(0.0..=1.0).contains(&chance) {
        return Err(invalid(
            "timing.ai_poll_chance",
            format!("must be between 0.0 and 1.0 inclusive, got {chance}"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
