// AI bidding engine.
//
// Decides, for each computer-controlled team, whether to raise the current
// bid on a lot. The decision has three stages:
// 1. Eligibility gates (never bid against yourself, full squad, overseas cap,
//    role saturated, purse exhausted).
// 2. Willingness to pay: valuation score scaled by budget per open slot,
//    role urgency and team personality, capped by the purse minus reserve.
// 3. A probabilistic trigger that fires less often as the next price
//    approaches the team's maximum.
//
// All functions are pure given the injected random source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auction::ladder::BidLadder;
use crate::auction::lot::Lot;
use crate::auction::participant::Participant;
use crate::config::AuctionRules;
use crate::strategy::needs::{overseas_count, role_counts, role_urgency};
use crate::strategy::random::{shuffle, RandomSource};
use crate::strategy::valuation::lot_value;

// ---------------------------------------------------------------------------
// Personalities
// ---------------------------------------------------------------------------

/// Bidding temperament of an AI team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Aggressive,
    #[default]
    Balanced,
    Conservative,
}

impl Personality {
    /// Scale applied to the maximum bid.
    pub fn multiplier(&self) -> f64 {
        match self {
            Personality::Aggressive => 1.3,
            Personality::Balanced => 1.0,
            Personality::Conservative => 0.75,
        }
    }

    /// Shift applied to the bid probability.
    pub fn probability_bias(&self) -> f64 {
        match self {
            Personality::Aggressive => 0.2,
            Personality::Balanced => 0.0,
            Personality::Conservative => -0.1,
        }
    }
}

/// Personality assignment per team id. Unassigned teams are balanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalityTable {
    assignments: HashMap<String, Personality>,
}

impl PersonalityTable {
    pub fn new(assignments: HashMap<String, Personality>) -> Self {
        PersonalityTable { assignments }
    }

    /// A table with no assignments: every team bids as balanced.
    pub fn all_balanced() -> Self {
        Self::new(HashMap::new())
    }

    pub fn lookup(&self, team_id: &str) -> Personality {
        self.assignments.get(team_id).copied().unwrap_or_default()
    }
}

impl Default for PersonalityTable {
    fn default() -> Self {
        let defaults = [
            ("CHE", Personality::Conservative),
            ("MUM", Personality::Aggressive),
            ("KOL", Personality::Balanced),
            ("BLR", Personality::Aggressive),
            ("HYD", Personality::Balanced),
            ("DEL", Personality::Aggressive),
            ("RAJ", Personality::Conservative),
            ("PUN", Personality::Aggressive),
            ("LKN", Personality::Balanced),
            ("GUJ", Personality::Conservative),
        ];
        Self::new(
            defaults
                .into_iter()
                .map(|(id, p)| (id.to_string(), p))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Why a team declined to raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// The team already holds the high bid.
    AlreadyLeading,
    /// Squad is at maximum size.
    SquadFull,
    /// Lot is overseas and the overseas cap is reached.
    OverseasCapReached,
    /// Role is at its maximum and the squad already meets the minimum size.
    RoleSaturated,
    /// Purse minus reserve does not exceed the current price.
    InsufficientPurse,
    /// The next legal price exceeds what the team will pay.
    AboveMaxBid { max_bid: u32 },
    /// Willing, but the random trigger did not fire.
    Hesitated,
}

/// Outcome of a single AI decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    Bid { amount: u32 },
    Hold(HoldReason),
}

impl BidDecision {
    pub fn will_bid(&self) -> bool {
        matches!(self, BidDecision::Bid { .. })
    }

    /// Amount bid, or 0 when holding.
    pub fn bid_amount(&self) -> u32 {
        match self {
            BidDecision::Bid { amount } => *amount,
            BidDecision::Hold(_) => 0,
        }
    }
}

/// A team that wants to raise in this poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestedBidder {
    pub team_id: String,
    pub bid_amount: u32,
}

/// Whether a team has a free slot and enough purse above its reserve to top
/// `current_price`. Shared by AI and human eligibility.
pub fn can_bid(participant: &Participant, current_price: u32, rules: &AuctionRules) -> bool {
    let slots_remaining = rules.max_squad_size.saturating_sub(participant.roster.len());
    let available = participant.budget as i64 - rules.reserve_for(participant.roster.len()) as i64;
    slots_remaining > 0 && available > current_price as i64
}

/// Bundles the rules an AI decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct Bidder<'a> {
    pub rules: &'a AuctionRules,
    pub ladder: &'a BidLadder,
    pub personalities: &'a PersonalityTable,
}

impl<'a> Bidder<'a> {
    pub fn new(
        rules: &'a AuctionRules,
        ladder: &'a BidLadder,
        personalities: &'a PersonalityTable,
    ) -> Self {
        Bidder {
            rules,
            ladder,
            personalities,
        }
    }

    /// Maximum price `participant` is willing to pay for `lot`, before any
    /// eligibility gate.
    ///
    /// 1. `per_slot = budget / max(1, max_squad - squad)`
    /// 2. `max = value/100 * per_slot * (1 + urgency) * personality`
    /// 3. capped at `budget - reserve`
    /// 4. floored at the lot's base price, then rounded down
    pub fn max_bid(&self, participant: &Participant, lot: &Lot) -> u32 {
        let rules = self.rules;
        let squad = participant.roster.len();
        let personality = self.personalities.lookup(&participant.id);
        let urgency = role_urgency(&participant.roster, lot.role, rules);

        let slots_left = rules.max_squad_size.saturating_sub(squad).max(1);
        let per_slot_budget = participant.budget as f64 / slots_left as f64;

        let mut max_bid =
            (lot_value(lot) / 100.0) * per_slot_budget * (1.0 + urgency) * personality.multiplier();

        let reserve = rules.reserve_for(squad) as f64;
        max_bid = max_bid.min(participant.budget as f64 - reserve);
        max_bid = max_bid.max(lot.base_price as f64);

        max_bid.floor() as u32
    }

    /// Reason `participant` may not bid at all on `lot`, if any.
    fn gate(
        &self,
        participant: &Participant,
        lot: &Lot,
        current_price: u32,
        current_leader: Option<&str>,
    ) -> Option<HoldReason> {
        let rules = self.rules;
        let squad = participant.roster.len();

        if current_leader == Some(participant.id.as_str()) {
            return Some(HoldReason::AlreadyLeading);
        }
        if squad >= rules.max_squad_size {
            return Some(HoldReason::SquadFull);
        }
        if lot.overseas && overseas_count(&participant.roster) >= rules.max_overseas {
            return Some(HoldReason::OverseasCapReached);
        }
        let role_count = role_counts(&participant.roster)[lot.role];
        if role_count >= rules.role_limits[lot.role].max && squad >= rules.min_squad_size {
            return Some(HoldReason::RoleSaturated);
        }
        if !can_bid(participant, current_price, rules) {
            return Some(HoldReason::InsufficientPurse);
        }
        None
    }

    /// Decide whether `participant` raises the bid on `lot`.
    ///
    /// Draws exactly one sample from `rng` when the team is eligible and the
    /// next price is within its maximum; draws nothing otherwise.
    pub fn decide<R: RandomSource + ?Sized>(
        &self,
        participant: &Participant,
        lot: &Lot,
        current_price: u32,
        current_leader: Option<&str>,
        rng: &mut R,
    ) -> BidDecision {
        if let Some(reason) = self.gate(participant, lot, current_price, current_leader) {
            return BidDecision::Hold(reason);
        }

        let personality = self.personalities.lookup(&participant.id);
        let urgency = role_urgency(&participant.roster, lot.role, self.rules);
        let max_bid = self.max_bid(participant, lot);
        let candidate = match self.ladder.next_price(current_price) {
            Some(price) if price <= max_bid => price,
            _ => return BidDecision::Hold(HoldReason::AboveMaxBid { max_bid }),
        };

        let bid_ratio = candidate as f64 / max_bid as f64;
        let probability =
            1.0 - bid_ratio.powi(2) + personality.probability_bias() + urgency * 0.3;

        if rng.sample() < probability {
            BidDecision::Bid { amount: candidate }
        } else {
            BidDecision::Hold(HoldReason::Hesitated)
        }
    }

    /// Every team except `exclude_id` that decides to raise, in random order.
    ///
    /// Callers apply only the first entry; the rest get no retry this poll.
    pub fn interested_bidders<R: RandomSource + ?Sized>(
        &self,
        participants: &[Participant],
        lot: &Lot,
        current_price: u32,
        current_leader: Option<&str>,
        exclude_id: Option<&str>,
        rng: &mut R,
    ) -> Vec<InterestedBidder> {
        let mut interested: Vec<InterestedBidder> = participants
            .iter()
            .filter(|p| exclude_id != Some(p.id.as_str()))
            .filter_map(|p| {
                match self.decide(p, lot, current_price, current_leader, rng) {
                    BidDecision::Bid { amount } => Some(InterestedBidder {
                        team_id: p.id.clone(),
                        bid_amount: amount,
                    }),
                    BidDecision::Hold(_) => None,
                }
            })
            .collect();

        shuffle(&mut interested, rng);
        interested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::lot::{Role, Skills};
    use crate::auction::participant::{Branding, Participant};
    use crate::strategy::random::ScriptedRandom;

    fn participant(id: &str, budget: u32) -> Participant {
        Participant {
            id: id.into(),
            name: format!("Team {id}"),
            branding: Branding::default(),
            budget,
            roster: Vec::new(),
            is_user: false,
        }
    }

    fn lot(role: Role, overseas: bool, base_price: u32, skill: u8) -> Lot {
        Lot::new(
            1,
            "Test Athlete",
            role,
            if overseas { "England" } else { "India" },
            overseas,
            Skills {
                batting: skill,
                bowling: skill,
                fielding: skill,
            },
            format!("{}1", role.label()),
            base_price,
        )
    }

    fn filler(role: Role, overseas: bool) -> Lot {
        lot(role, overseas, 50, 50).into_sold("X", 50)
    }

    struct Fixture {
        rules: AuctionRules,
        ladder: BidLadder,
        personalities: PersonalityTable,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                rules: AuctionRules::default(),
                ladder: BidLadder::default(),
                personalities: PersonalityTable::default(),
            }
        }

        fn bidder(&self) -> Bidder<'_> {
            Bidder::new(&self.rules, &self.ladder, &self.personalities)
        }
    }

    #[test]
    fn personality_defaults_to_balanced() {
        let table = PersonalityTable::default();
        assert_eq!(table.lookup("MUM"), Personality::Aggressive);
        assert_eq!(table.lookup("RAJ"), Personality::Conservative);
        assert_eq!(table.lookup("NOPE"), Personality::Balanced);
        assert_eq!(PersonalityTable::all_balanced().lookup("MUM"), Personality::Balanced);
    }

    #[test]
    fn aggressive_fresh_team_values_marquee_above_base() {
        let fx = Fixture::new();
        let team = participant("MUM", 12_000);
        let marquee = lot(Role::Batter, false, 200, 80);
        // value 80, per slot 480, urgency 1, x1.3 => 998.4
        let max = fx.bidder().max_bid(&team, &marquee);
        assert!(max > 200, "max bid {max} should exceed base price");
        assert_eq!(max, 998);
    }

    #[test]
    fn max_bid_capped_by_purse_minus_reserve() {
        let fx = Fixture::new();
        let team = participant("MUM", 1_000);
        let star = lot(Role::Batter, false, 50, 100);
        // uncapped: 1.0 * 40 * 2 * 1.3 = 104; cap = 1000 - 850 = 150
        assert_eq!(fx.bidder().max_bid(&team, &star), 104);

        let poor = participant("MUM", 900);
        // cap = 900 - 850 = 50; base price 50
        assert_eq!(fx.bidder().max_bid(&poor, &star), 50);
    }

    #[test]
    fn max_bid_never_below_base_price() {
        let fx = Fixture::new();
        let team = participant("CHE", 12_000);
        let weak = lot(Role::Bowler, false, 200, 1);
        assert_eq!(fx.bidder().max_bid(&team, &weak), 200);
    }

    #[test]
    fn never_bids_against_itself() {
        let fx = Fixture::new();
        let team = participant("MUM", 12_000);
        let l = lot(Role::Batter, false, 50, 90);
        let mut rng = ScriptedRandom::constant(0.0);
        let decision = fx.bidder().decide(&team, &l, 50, Some("MUM"), &mut rng);
        assert_eq!(decision, BidDecision::Hold(HoldReason::AlreadyLeading));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn full_squad_never_bids() {
        let fx = Fixture::new();
        let mut team = participant("MUM", 12_000);
        team.roster = (0..25).map(|_| filler(Role::Bowler, false)).collect();
        let l = lot(Role::Batter, false, 50, 99);
        let mut rng = ScriptedRandom::constant(0.0);
        for price in [50, 100, 500] {
            let decision = fx.bidder().decide(&team, &l, price, None, &mut rng);
            assert_eq!(decision, BidDecision::Hold(HoldReason::SquadFull));
        }
    }

    #[test]
    fn overseas_cap_blocks_foreign_lots_only() {
        let fx = Fixture::new();
        let mut team = participant("KOL", 12_000);
        team.roster = (0..8).map(|_| filler(Role::AllRounder, true)).collect();
        let mut rng = ScriptedRandom::constant(0.0);

        let foreign = lot(Role::Batter, true, 50, 90);
        assert_eq!(
            fx.bidder().decide(&team, &foreign, 50, None, &mut rng),
            BidDecision::Hold(HoldReason::OverseasCapReached)
        );

        let local = lot(Role::Batter, false, 50, 90);
        assert!(fx.bidder().decide(&team, &local, 50, None, &mut rng).will_bid());
    }

    #[test]
    fn saturated_role_blocks_once_minimum_squad_met() {
        let fx = Fixture::new();
        let mut team = participant("KOL", 12_000);
        let mut roster: Vec<Lot> = (0..7).map(|_| filler(Role::Bowler, false)).collect();
        roster.extend((0..11).map(|_| filler(Role::Batter, false)));
        team.roster = roster;
        let mut rng = ScriptedRandom::constant(0.0);

        let bowler = lot(Role::Bowler, false, 50, 90);
        assert_eq!(
            fx.bidder().decide(&team, &bowler, 50, None, &mut rng),
            BidDecision::Hold(HoldReason::RoleSaturated)
        );
    }

    #[test]
    fn saturated_role_still_eligible_below_minimum_squad() {
        let fx = Fixture::new();
        let mut team = participant("KOL", 12_000);
        team.roster = (0..7).map(|_| filler(Role::Bowler, false)).collect();
        let mut rng = ScriptedRandom::constant(0.0);

        let bowler = lot(Role::Bowler, false, 50, 90);
        let decision = fx.bidder().decide(&team, &bowler, 50, None, &mut rng);
        assert!(decision.will_bid(), "got {decision:?}");
    }

    #[test]
    fn insufficient_purse_holds() {
        let fx = Fixture::new();
        let team = participant("MUM", 900);
        let l = lot(Role::Batter, false, 50, 90);
        let mut rng = ScriptedRandom::constant(0.0);
        // 900 - 850 = 50, not > 50
        assert_eq!(
            fx.bidder().decide(&team, &l, 50, None, &mut rng),
            BidDecision::Hold(HoldReason::InsufficientPurse)
        );
    }

    #[test]
    fn holds_when_next_price_exceeds_max() {
        let fx = Fixture::new();
        let team = participant("CHE", 12_000);
        let l = lot(Role::Batter, false, 50, 50);
        let mut rng = ScriptedRandom::constant(0.0);
        let max = fx.bidder().max_bid(&team, &l);
        let decision = fx.bidder().decide(&team, &l, max, None, &mut rng);
        assert_eq!(
            decision,
            BidDecision::Hold(HoldReason::AboveMaxBid { max_bid: max })
        );
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn bids_next_ladder_price_when_sample_low() {
        let fx = Fixture::new();
        let team = participant("HYD", 12_000);
        let l = lot(Role::Batter, false, 100, 80);
        let mut rng = ScriptedRandom::constant(0.0);
        let decision = fx.bidder().decide(&team, &l, 100, None, &mut rng);
        assert_eq!(decision, BidDecision::Bid { amount: 110 });
        assert_eq!(decision.bid_amount(), 110);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn hesitates_when_sample_above_probability() {
        let fx = Fixture::new();
        let mut team = participant("CHE", 12_000);
        // Batters at minimum: urgency 0.3.
        team.roster = (0..4).map(|_| filler(Role::Batter, false)).collect();
        let l = lot(Role::Batter, false, 50, 80);
        let bidder = fx.bidder();
        let max = bidder.max_bid(&team, &l);

        // Next price lands exactly on max: ratio 1, probability 0 - 0.1 + 0.09.
        let price = max - 25;
        let mut rng = ScriptedRandom::constant(0.5);
        let decision = bidder.decide(&team, &l, price, None, &mut rng);
        assert_eq!(decision, BidDecision::Hold(HoldReason::Hesitated));
        assert_eq!(decision.bid_amount(), 0);
    }

    #[test]
    fn interested_bidders_excludes_user_and_leader() {
        let fx = Fixture::new();
        let teams = vec![
            participant("MUM", 12_000),
            participant("CHE", 12_000),
            participant("KOL", 12_000),
        ];
        let l = lot(Role::Batter, false, 50, 90);
        let mut rng = ScriptedRandom::constant(0.0);

        let interested =
            fx.bidder()
                .interested_bidders(&teams, &l, 50, Some("CHE"), Some("MUM"), &mut rng);
        assert_eq!(
            interested,
            vec![InterestedBidder {
                team_id: "KOL".into(),
                bid_amount: 55,
            }]
        );
    }

    #[test]
    fn interested_bidders_shuffled_per_call() {
        let fx = Fixture::new();
        let teams = vec![
            participant("MUM", 12_000),
            participant("DEL", 12_000),
            participant("PUN", 12_000),
        ];
        let l = lot(Role::Batter, false, 50, 90);
        // Three decide draws of 0.0, then the shuffle draws 0.0 twice.
        let mut rng = ScriptedRandom::constant(0.0);
        let interested = fx
            .bidder()
            .interested_bidders(&teams, &l, 50, None, None, &mut rng);
        let order: Vec<&str> = interested.iter().map(|b| b.team_id.as_str()).collect();
        assert_eq!(order, vec!["DEL", "PUN", "MUM"]);
        assert!(interested.iter().all(|b| b.bid_amount == 55));
    }

    #[test]
    fn can_bid_requires_slot_and_purse() {
        let rules = AuctionRules::default();
        let team = participant("MUM", 12_000);
        assert!(can_bid(&team, 200, &rules));
        assert!(!can_bid(&team, 11_150, &rules));
        assert!(can_bid(&team, 11_149, &rules));

        let mut full = participant("MUM", 12_000);
        full.roster = (0..25).map(|_| filler(Role::Bowler, false)).collect();
        assert!(!can_bid(&full, 0, &rules));
    }
}
