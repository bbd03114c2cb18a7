// Lot representation: the role enumeration, role-keyed lookup tables, and the
// auctionable item itself.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Playing role of an athlete. The four roles are mutually exclusive and
/// drive both valuation weights and squad composition limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Batter,
    WicketKeeper,
    AllRounder,
    Bowler,
}

impl Role {
    /// All roles in catalog precedence order.
    pub const ALL: [Role; 4] = [
        Role::Batter,
        Role::WicketKeeper,
        Role::AllRounder,
        Role::Bowler,
    ];

    /// Parse a role label ("BAT", "WK", "AR", "BOWL"), case-insensitive.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BAT" => Some(Role::Batter),
            "WK" => Some(Role::WicketKeeper),
            "AR" => Some(Role::AllRounder),
            "BOWL" => Some(Role::Bowler),
            _ => None,
        }
    }

    /// Short label used in set keys and data files.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Batter => "BAT",
            Role::WicketKeeper => "WK",
            Role::AllRounder => "AR",
            Role::Bowler => "BOWL",
        }
    }

    /// Plural display name for squad listings.
    pub fn plural_name(&self) -> &'static str {
        match self {
            Role::Batter => "Batters",
            Role::WicketKeeper => "Wicketkeepers",
            Role::AllRounder => "All-Rounders",
            Role::Bowler => "Bowlers",
        }
    }

    /// Precedence within a set index: batters, keepers, all-rounders, bowlers.
    pub fn sort_order(&self) -> u8 {
        match self {
            Role::Batter => 0,
            Role::WicketKeeper => 1,
            Role::AllRounder => 2,
            Role::Bowler => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Role-keyed table
// ---------------------------------------------------------------------------

/// A fixed-size table holding one value per [`Role`].
///
/// Used for weights, squad limits and per-role counts so that every lookup is
/// exhaustive over the closed role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleTable<T>([T; 4]);

impl<T> RoleTable<T> {
    pub const fn new(batter: T, wicket_keeper: T, all_rounder: T, bowler: T) -> Self {
        RoleTable([batter, wicket_keeper, all_rounder, bowler])
    }

    /// Iterate `(role, value)` pairs in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Role> for RoleTable<T> {
    type Output = T;

    fn index(&self, role: Role) -> &T {
        &self.0[role.sort_order() as usize]
    }
}

impl<T> IndexMut<Role> for RoleTable<T> {
    fn index_mut(&mut self, role: Role) -> &mut T {
        &mut self.0[role.sort_order() as usize]
    }
}

// ---------------------------------------------------------------------------
// Lot
// ---------------------------------------------------------------------------

/// The three skill attributes of an athlete, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub batting: u8,
    pub bowling: u8,
    pub fielding: u8,
}

/// The outcome stamped on a lot once it is sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub buyer_id: String,
    pub price: u32,
}

/// One auctionable athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// 1-indexed position in the auction order.
    pub lot_number: usize,
    pub name: String,
    pub role: Role,
    /// Nationality as supplied by the data file (e.g. "India").
    pub nationality: String,
    /// Whether this athlete counts against the overseas cap.
    pub overseas: bool,
    pub skills: Skills,
    /// Originating set key (e.g. "BAT3"); only used for ordering and pricing.
    pub set_key: String,
    /// Base price in lakhs, fixed at catalog build time.
    pub base_price: u32,
    sale: Option<Sale>,
}

impl Lot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lot_number: usize,
        name: impl Into<String>,
        role: Role,
        nationality: impl Into<String>,
        overseas: bool,
        skills: Skills,
        set_key: impl Into<String>,
        base_price: u32,
    ) -> Self {
        Lot {
            lot_number,
            name: name.into(),
            role,
            nationality: nationality.into(),
            overseas,
            skills,
            set_key: set_key.into(),
            base_price,
            sale: None,
        }
    }

    /// The sale record, if this lot has been sold.
    pub fn sale(&self) -> Option<&Sale> {
        self.sale.as_ref()
    }

    /// Price paid, or 0 if unsold.
    pub fn sold_price(&self) -> u32 {
        self.sale.as_ref().map_or(0, |s| s.price)
    }

    /// Return this lot stamped as sold. A lot that already carries a sale
    /// keeps its original stamp.
    pub fn into_sold(mut self, buyer_id: &str, price: u32) -> Self {
        debug_assert!(self.sale.is_none(), "lot {} sold twice", self.name);
        if self.sale.is_none() {
            self.sale = Some(Sale {
                buyer_id: buyer_id.to_string(),
                price,
            });
        }
        self
    }
}
