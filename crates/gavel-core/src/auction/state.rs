// Auction state machine.
//
// Owns the lot queue, the active lot's price/leader/countdown, and the
// resolved lists. Every transition takes the state by value and returns the
// next state; the caller supplies elapsed time and the random source.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::auction::ladder::BidLadder;
use crate::auction::lot::Lot;
use crate::auction::participant::{
    init_participants, team_summary, Participant, TeamDescriptor, TeamSummary,
};
use crate::config::{AuctionRules, Config, TimingConfig};
use crate::strategy::bidding::{can_bid, Bidder, PersonalityTable};
use crate::strategy::needs::overseas_count;
use crate::strategy::random::RandomSource;

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// The lot currently under the hammer.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLot {
    pub lot: Lot,
    /// Current high bid, or the base price before any bid.
    pub price: u32,
    pub leader: Option<String>,
    /// Time left before the hammer falls.
    pub countdown: Duration,
    /// Time since the last AI poll.
    pub since_poll: Duration,
}

/// A just-sold lot, held briefly before the next lot comes up.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// The lot as sold, carrying its sale stamp.
    pub lot: Lot,
    pub remaining: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Active(ActiveLot),
    Settling(Settlement),
    Complete,
}

/// One resolution event. Unsold lots record no buyer and a price of 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionLogEntry {
    pub lot_number: usize,
    pub lot_name: String,
    pub buyer_id: Option<String>,
    pub price: u32,
    pub timestamp: DateTime<Utc>,
}

/// Complete state of one auction run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionState {
    pub participants: Vec<Participant>,
    /// Id of the human-controlled participant, if any.
    pub user_team_id: Option<String>,
    pub phase: Phase,
    /// Lots not yet brought up, in auction order.
    pub queue: VecDeque<Lot>,
    pub sold: Vec<Lot>,
    pub unsold: Vec<Lot>,
    pub log: Vec<AuctionLogEntry>,
    pub paused: bool,
    pub catalog_size: usize,
    /// Simulated time consumed by `tick` so far.
    pub elapsed: Duration,
}

impl AuctionState {
    pub fn active(&self) -> Option<&ActiveLot> {
        match &self.phase {
            Phase::Active(active) => Some(active),
            _ => None,
        }
    }

    pub fn current_lot(&self) -> Option<&Lot> {
        self.active().map(|a| &a.lot)
    }

    pub fn current_price(&self) -> Option<u32> {
        self.active().map(|a| a.price)
    }

    pub fn leader(&self) -> Option<&str> {
        self.active().and_then(|a| a.leader.as_deref())
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn user(&self) -> Option<&Participant> {
        self.user_team_id.as_deref().and_then(|id| self.participant(id))
    }

    /// `(lot number currently up, catalog size)`. While settling this is the
    /// lot just sold; once complete it is `(catalog_size, catalog_size)`.
    pub fn progress(&self) -> (usize, usize) {
        let current = match &self.phase {
            Phase::Active(active) => active.lot.lot_number,
            Phase::Settling(settlement) => settlement.lot.lot_number,
            Phase::Complete => self.catalog_size,
        };
        (current, self.catalog_size)
    }

    /// Sold plus unsold plus queued plus active. Always equals `catalog_size`.
    pub fn accounted_lots(&self) -> usize {
        let active = usize::from(matches!(self.phase, Phase::Active(_)));
        self.sold.len() + self.unsold.len() + self.queue.len() + active
    }

    pub fn standings(&self) -> Vec<TeamSummary> {
        self.participants.iter().map(team_summary).collect()
    }
}

/// Whether every lot has been classified sold or unsold.
pub fn is_complete(state: &AuctionState) -> bool {
    matches!(state.phase, Phase::Complete) && state.queue.is_empty()
}

// ---------------------------------------------------------------------------
// Auctioneer
// ---------------------------------------------------------------------------

/// Applies the auction rules to an `AuctionState`.
#[derive(Debug, Clone)]
pub struct Auctioneer {
    pub rules: AuctionRules,
    pub ladder: BidLadder,
    pub personalities: PersonalityTable,
    pub timing: TimingConfig,
}

/// What the clock reaches next inside one `tick`.
enum Step {
    Expire,
    Poll,
    Settled,
}

impl Auctioneer {
    pub fn new(
        rules: AuctionRules,
        ladder: BidLadder,
        personalities: PersonalityTable,
        timing: TimingConfig,
    ) -> Self {
        Auctioneer {
            rules,
            ladder,
            personalities,
            timing,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rules.clone(),
            config.ladder.clone(),
            config.personalities.clone(),
            config.timing,
        )
    }

    pub fn bidder(&self) -> Bidder<'_> {
        Bidder::new(&self.rules, &self.ladder, &self.personalities)
    }

    /// Build the opening state: participants at full purse, the first lot
    /// active at its base price. An empty catalog is complete immediately.
    pub fn initialize(
        &self,
        catalog: Vec<Lot>,
        teams: &[TeamDescriptor],
        user_team_id: Option<&str>,
    ) -> AuctionState {
        let participants = init_participants(teams, user_team_id, &self.rules);
        let user_team_id = participants
            .iter()
            .find(|p| p.is_user)
            .map(|p| p.id.clone());

        let mut state = AuctionState {
            participants,
            user_team_id,
            phase: Phase::Complete,
            catalog_size: catalog.len(),
            queue: catalog.into(),
            sold: Vec::new(),
            unsold: Vec::new(),
            log: Vec::new(),
            paused: false,
            elapsed: Duration::ZERO,
        };

        info!(
            "Auction initialized: {} lots, {} teams, user team {:?}",
            state.catalog_size,
            state.participants.len(),
            state.user_team_id
        );
        self.advance(&mut state);
        state
    }

    /// Advance the simulated clock by `elapsed`.
    ///
    /// Events inside the window are processed in time order:
    /// 1. Countdown expiry resolves the lot (sold enters settling, unsold
    ///    brings up the next lot at once).
    /// 2. An AI poll falls due every `ai_poll_interval`; it runs only when a
    ///    sample is below `ai_poll_chance`. On an exact tie with expiry, the
    ///    expiry wins. A zero interval schedules no polls.
    /// 3. Settling ends after `settle_delay` and brings up the next lot.
    ///
    /// A paused state is returned unchanged.
    pub fn tick<R: RandomSource + ?Sized>(
        &self,
        mut state: AuctionState,
        elapsed: Duration,
        rng: &mut R,
    ) -> AuctionState {
        if state.paused {
            return state;
        }
        state.elapsed += elapsed;
        let mut remaining = elapsed;

        loop {
            let step = match &mut state.phase {
                Phase::Complete => break,
                Phase::Active(active) => {
                    // A zero poll interval disables AI polls.
                    let to_poll = if self.timing.ai_poll_interval.is_zero() {
                        Duration::MAX
                    } else {
                        self.timing.ai_poll_interval.saturating_sub(active.since_poll)
                    };
                    let next = active.countdown.min(to_poll);
                    if remaining < next {
                        active.countdown -= remaining;
                        active.since_poll += remaining;
                        break;
                    }
                    remaining -= next;
                    active.countdown -= next;
                    active.since_poll += next;
                    if active.countdown.is_zero() {
                        Step::Expire
                    } else {
                        active.since_poll = Duration::ZERO;
                        Step::Poll
                    }
                }
                Phase::Settling(settlement) => {
                    if remaining < settlement.remaining {
                        settlement.remaining -= remaining;
                        break;
                    }
                    remaining -= settlement.remaining;
                    settlement.remaining = Duration::ZERO;
                    Step::Settled
                }
            };

            match step {
                Step::Expire => self.resolve_lot(&mut state),
                Step::Poll => {
                    if rng.sample() < self.timing.ai_poll_chance {
                        self.apply_ai_poll(&mut state, rng);
                    }
                }
                Step::Settled => self.advance(&mut state),
            }
        }

        state
    }

    /// Run one AI poll immediately, without the poll-chance gate.
    pub fn poll_ai<R: RandomSource + ?Sized>(
        &self,
        mut state: AuctionState,
        rng: &mut R,
    ) -> AuctionState {
        if !state.paused {
            self.apply_ai_poll(&mut state, rng);
        }
        state
    }

    /// Raise the bid on behalf of the user team. Ineligible bids are ignored.
    pub fn submit_human_bid(&self, mut state: AuctionState) -> AuctionState {
        let Some(price) = self.next_user_bid(&state) else {
            debug!("User bid rejected");
            return state;
        };
        let user_id = state.user_team_id.clone();
        if let Phase::Active(active) = &mut state.phase {
            active.price = price;
            active.leader = user_id;
            active.countdown = self.timing.countdown;
            info!("{}: user bids {price}", active.lot.name);
        }
        state
    }

    /// The user declines to bid. The lot resolves on its own when the
    /// countdown runs out.
    pub fn submit_pass(&self, state: AuctionState) -> AuctionState {
        if let Some(lot) = state.current_lot() {
            debug!("User passes on {}", lot.name);
        }
        state
    }

    pub fn pause(&self, mut state: AuctionState) -> AuctionState {
        if !state.paused {
            info!("Auction paused");
            state.paused = true;
        }
        state
    }

    pub fn resume(&self, mut state: AuctionState) -> AuctionState {
        if state.paused {
            info!("Auction resumed");
            state.paused = false;
        }
        state
    }

    /// Whether a user bid would be accepted right now.
    pub fn can_user_bid(&self, state: &AuctionState) -> bool {
        self.next_user_bid(state).is_some()
    }

    /// The price a user bid would set, if the user may bid.
    ///
    /// Requires: not paused, a lot active, the user not already leading, a
    /// free slot with purse above reserve, the next price affordable, and an
    /// overseas slot when the lot is overseas.
    pub fn next_user_bid(&self, state: &AuctionState) -> Option<u32> {
        if state.paused {
            return None;
        }
        let active = state.active()?;
        let user = state.user()?;
        if active.leader.as_deref() == Some(user.id.as_str()) {
            return None;
        }
        if !can_bid(user, active.price, &self.rules) {
            return None;
        }
        if active.lot.overseas && overseas_count(&user.roster) >= self.rules.max_overseas {
            return None;
        }
        let next = self.ladder.next_price(active.price)?;
        (next <= user.budget).then_some(next)
    }

    // -----------------------------------------------------------------------
    // Internal transitions
    // -----------------------------------------------------------------------

    fn apply_ai_poll<R: RandomSource + ?Sized>(&self, state: &mut AuctionState, rng: &mut R) {
        let Phase::Active(active) = &state.phase else {
            return;
        };
        let interested = self.bidder().interested_bidders(
            &state.participants,
            &active.lot,
            active.price,
            active.leader.as_deref(),
            state.user_team_id.as_deref(),
            rng,
        );
        let Some(winner) = interested.into_iter().next() else {
            return;
        };

        if let Phase::Active(active) = &mut state.phase {
            debug!(
                "{}: {} raises {} -> {}",
                active.lot.name, winner.team_id, active.price, winner.bid_amount
            );
            active.price = winner.bid_amount;
            active.leader = Some(winner.team_id);
            active.countdown = self.timing.countdown;
        }
    }

    /// Countdown expired on the active lot.
    fn resolve_lot(&self, state: &mut AuctionState) {
        let phase = std::mem::replace(&mut state.phase, Phase::Complete);
        let Phase::Active(active) = phase else {
            state.phase = phase;
            return;
        };

        let lot = match active.leader {
            Some(buyer_id) => match self.sell(state, active.lot, &buyer_id, active.price) {
                Ok(sold) => {
                    info!(
                        "SOLD lot {} {} to {} for {}",
                        sold.lot_number, sold.name, buyer_id, active.price
                    );
                    state.log.push(AuctionLogEntry {
                        lot_number: sold.lot_number,
                        lot_name: sold.name.clone(),
                        buyer_id: Some(buyer_id),
                        price: active.price,
                        timestamp: Utc::now(),
                    });
                    state.sold.push(sold.clone());
                    state.phase = Phase::Settling(Settlement {
                        lot: sold,
                        remaining: self.timing.settle_delay,
                    });
                    return;
                }
                Err(lot) => lot,
            },
            None => active.lot,
        };

        info!("UNSOLD lot {} {}", lot.lot_number, lot.name);
        state.log.push(AuctionLogEntry {
            lot_number: lot.lot_number,
            lot_name: lot.name.clone(),
            buyer_id: None,
            price: 0,
            timestamp: Utc::now(),
        });
        state.unsold.push(lot);
        self.advance(state);
    }

    /// Debit the buyer and append the stamped lot to its roster.
    ///
    /// Refuses a sale that would overdraw the purse, overfill the squad or
    /// break the overseas cap; the lot comes back for the caller to mark
    /// unsold.
    fn sell(
        &self,
        state: &mut AuctionState,
        lot: Lot,
        buyer_id: &str,
        price: u32,
    ) -> Result<Lot, Lot> {
        let rules = &self.rules;
        let index = state.participants.iter().position(|p| p.id == buyer_id);

        let violation = match index.map(|i| &state.participants[i]) {
            None => Some(format!("unknown buyer {buyer_id}")),
            Some(p) if p.budget < price => {
                Some(format!("{buyer_id} has {} but owes {price}", p.budget))
            }
            Some(p) if p.roster.len() >= rules.max_squad_size => {
                Some(format!("{buyer_id} squad already at {}", p.roster.len()))
            }
            Some(p) if lot.overseas && overseas_count(&p.roster) >= rules.max_overseas => {
                Some(format!("{buyer_id} overseas cap reached"))
            }
            Some(_) => None,
        };
        debug_assert!(
            violation.is_none(),
            "invalid sale of {}: {:?}",
            lot.name,
            violation
        );

        match (index, violation) {
            (Some(i), None) => {
                let sold = lot.into_sold(buyer_id, price);
                let buyer = &mut state.participants[i];
                buyer.budget -= price;
                buyer.roster.push(sold.clone());
                Ok(sold)
            }
            (_, problem) => {
                error!(
                    "Rejected sale of {}: {}; marking unsold",
                    lot.name,
                    problem.unwrap_or_default()
                );
                Err(lot)
            }
        }
    }

    /// Bring up the next queued lot, or finish.
    fn advance(&self, state: &mut AuctionState) {
        match state.queue.pop_front() {
            Some(lot) => {
                info!(
                    "Lot {}/{}: {} ({}, {}) base {}",
                    lot.lot_number,
                    state.catalog_size,
                    lot.name,
                    lot.role,
                    lot.nationality,
                    lot.base_price
                );
                state.phase = Phase::Active(ActiveLot {
                    price: lot.base_price,
                    lot,
                    leader: None,
                    countdown: self.timing.countdown,
                    since_poll: Duration::ZERO,
                });
            }
            None => {
                info!(
                    "Auction complete: {} sold, {} unsold",
                    state.sold.len(),
                    state.unsold.len()
                );
                state.phase = Phase::Complete;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::lot::{Role, Skills};
    use crate::auction::participant::Branding;
    use crate::strategy::random::ScriptedRandom;

    fn lot(number: usize, name: &str, role: Role, overseas: bool, base_price: u32) -> Lot {
        Lot::new(
            number,
            name,
            role,
            if overseas { "New Zealand" } else { "India" },
            overseas,
            Skills {
                batting: 85,
                bowling: 85,
                fielding: 85,
            },
            format!("{}1", role.label()),
            base_price,
        )
    }

    fn catalog(n: usize) -> Vec<Lot> {
        (1..=n)
            .map(|i| lot(i, &format!("Athlete {i}"), Role::Batter, false, 200))
            .collect()
    }

    fn teams(ids: &[&str]) -> Vec<TeamDescriptor> {
        ids.iter()
            .map(|id| TeamDescriptor {
                id: id.to_string(),
                name: format!("{id} XI"),
                branding: Branding::default(),
            })
            .collect()
    }

    /// Timing with AI polls that never fire.
    fn quiet() -> TimingConfig {
        TimingConfig {
            ai_poll_chance: 0.0,
            ..TimingConfig::default()
        }
    }

    fn auctioneer(timing: TimingConfig) -> Auctioneer {
        Auctioneer::new(
            AuctionRules::default(),
            BidLadder::default(),
            PersonalityTable::default(),
            timing,
        )
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn fill_roster(p: &mut Participant, n: usize, overseas: bool) {
        p.roster = (0..n)
            .map(|i| lot(100 + i, "Filler", Role::Bowler, overseas, 50).into_sold(&p.id, 50))
            .collect();
    }

    #[test]
    fn initialize_brings_up_first_lot() {
        let a = auctioneer(quiet());
        let state = a.initialize(catalog(3), &teams(&["MUM", "CHE"]), Some("MUM"));

        assert_eq!(state.current_lot().map(|l| l.lot_number), Some(1));
        assert_eq!(state.current_price(), Some(200));
        assert_eq!(state.leader(), None);
        assert_eq!(state.queue.len(), 2);
        assert_eq!(state.user_team_id.as_deref(), Some("MUM"));
        assert_eq!(state.progress(), (1, 3));
        assert_eq!(state.accounted_lots(), 3);
        assert!(!is_complete(&state));
    }

    #[test]
    fn empty_catalog_is_complete_immediately() {
        let a = auctioneer(quiet());
        let state = a.initialize(Vec::new(), &teams(&["MUM"]), None);
        assert!(is_complete(&state));
        assert_eq!(state.progress(), (0, 0));
    }

    #[test]
    fn unknown_user_team_runs_automated() {
        let a = auctioneer(quiet());
        let state = a.initialize(catalog(1), &teams(&["MUM"]), Some("XYZ"));
        assert_eq!(state.user_team_id, None);
        assert!(!a.can_user_bid(&state));
    }

    #[test]
    fn countdown_without_leader_resolves_unsold() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(2), &teams(&["MUM"]), None);

        let state = a.tick(state, ms(4_900), &mut rng);
        assert_eq!(state.current_lot().map(|l| l.lot_number), Some(1));
        assert_eq!(state.active().map(|a| a.countdown), Some(ms(100)));

        let state = a.tick(state, ms(100), &mut rng);
        assert_eq!(state.unsold.len(), 1);
        assert_eq!(state.log[0].buyer_id, None);
        assert_eq!(state.log[0].price, 0);
        // No settle delay after an unsold lot.
        assert_eq!(state.current_lot().map(|l| l.lot_number), Some(2));
    }

    #[test]
    fn single_tick_can_span_several_lots() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(3), &teams(&["MUM"]), None);
        let state = a.tick(state, ms(15_000), &mut rng);
        assert!(is_complete(&state));
        assert_eq!(state.unsold.len(), 3);
        assert_eq!(state.accounted_lots(), 3);
        assert_eq!(state.elapsed, ms(15_000));
    }

    #[test]
    fn all_squads_full_lot_goes_unsold() {
        let a = auctioneer(TimingConfig {
            ai_poll_chance: 1.0,
            ..TimingConfig::default()
        });
        let mut rng = ScriptedRandom::constant(0.0);
        let mut state = a.initialize(catalog(1), &teams(&["MUM", "CHE", "KOL"]), None);
        for p in &mut state.participants {
            fill_roster(p, 25, false);
        }

        let state = a.tick(state, ms(5_000), &mut rng);
        assert!(is_complete(&state));
        assert_eq!(state.unsold.len(), 1);
        assert!(state.sold.is_empty());
    }

    #[test]
    fn human_bid_while_leading_is_ignored() {
        let a = auctioneer(quiet());
        let state = a.initialize(catalog(1), &teams(&["MUM", "CHE"]), Some("MUM"));

        let state = a.submit_human_bid(state);
        assert_eq!(state.leader(), Some("MUM"));
        assert_eq!(state.current_price(), Some(225));

        let again = a.submit_human_bid(state.clone());
        assert_eq!(again, state);
    }

    #[test]
    fn human_bid_resets_countdown() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(1), &teams(&["MUM"]), Some("MUM"));
        let state = a.tick(state, ms(3_000), &mut rng);
        let state = a.submit_human_bid(state);
        assert_eq!(state.active().map(|a| a.countdown), Some(ms(5_000)));
    }

    #[test]
    fn sale_debits_buyer_after_settle_delay() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(2), &teams(&["MUM", "CHE"]), Some("MUM"));
        let state = a.submit_human_bid(state);
        let state = a.tick(state, ms(5_000), &mut rng);

        assert!(matches!(state.phase, Phase::Settling(_)));
        assert_eq!(state.progress(), (1, 2));
        assert_eq!(state.accounted_lots(), 2);
        assert!(!a.can_user_bid(&state));

        let state = a.tick(state, ms(2_000), &mut rng);
        let user = state.user().unwrap();
        assert_eq!(user.budget, 12_000 - 225);
        assert_eq!(user.roster.len(), 1);
        assert_eq!(user.roster[0].sold_price(), 225);
        assert_eq!(state.sold.len(), 1);
        assert_eq!(state.log[0].buyer_id.as_deref(), Some("MUM"));
        assert_eq!(state.log[0].price, 225);
        assert_eq!(state.current_lot().map(|l| l.lot_number), Some(2));
        assert_eq!(state.leader(), None);
        assert_eq!(state.current_price(), Some(200));
    }

    #[test]
    fn last_sale_completes_after_settling() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(1), &teams(&["MUM"]), Some("MUM"));
        let state = a.submit_human_bid(state);
        let state = a.tick(state, ms(6_000), &mut rng);
        assert!(!is_complete(&state));
        let state = a.tick(state, ms(1_000), &mut rng);
        assert!(is_complete(&state));
        assert_eq!(state.standings()[0].total_spent, 225);
    }

    #[test]
    fn human_bid_rejected_when_unaffordable() {
        let a = auctioneer(quiet());
        let mut state = a.initialize(catalog(1), &teams(&["MUM"]), Some("MUM"));
        // 900 - reserve 850 leaves 50, below the 200 base price.
        state.participants[0].budget = 900;
        let after = a.submit_human_bid(state.clone());
        assert_eq!(after, state);
    }

    #[test]
    fn human_bid_rejected_at_overseas_cap() {
        let a = auctioneer(quiet());
        let foreign = vec![lot(1, "Visitor", Role::AllRounder, true, 100)];
        let mut state = a.initialize(foreign, &teams(&["MUM"]), Some("MUM"));
        fill_roster(&mut state.participants[0], 8, true);
        assert!(!a.can_user_bid(&state));
        assert_eq!(a.submit_human_bid(state.clone()), state);
    }

    #[test]
    fn pass_changes_nothing() {
        let a = auctioneer(quiet());
        let state = a.initialize(catalog(1), &teams(&["MUM"]), Some("MUM"));
        assert_eq!(a.submit_pass(state.clone()), state);
    }

    #[test]
    fn pause_freezes_clock_and_bids() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(1), &teams(&["MUM"]), Some("MUM"));
        let state = a.tick(state, ms(1_000), &mut rng);
        let state = a.pause(state);

        let frozen = a.tick(state.clone(), ms(10_000), &mut rng);
        assert_eq!(frozen, state);
        assert!(!a.can_user_bid(&frozen));
        assert_eq!(a.submit_human_bid(frozen.clone()), frozen);

        let resumed = a.resume(frozen);
        assert_eq!(resumed.active().map(|a| a.countdown), Some(ms(4_000)));
        assert!(a.can_user_bid(&resumed));
    }

    #[test]
    fn ai_poll_installs_single_leader() {
        let a = auctioneer(TimingConfig {
            ai_poll_chance: 1.0,
            ..TimingConfig::default()
        });
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(1), &teams(&["MUM", "CHE", "KOL"]), Some("MUM"));

        let state = a.tick(state, ms(800), &mut rng);
        let leader = state.leader().map(str::to_string);
        assert!(matches!(leader.as_deref(), Some("CHE") | Some("KOL")));
        assert_eq!(state.current_price(), Some(225));
        assert_eq!(state.active().map(|a| a.countdown), Some(ms(5_000)));
    }

    #[test]
    fn poll_chance_gates_ai_bids() {
        let a = auctioneer(TimingConfig {
            ai_poll_chance: 0.3,
            ..TimingConfig::default()
        });
        // Poll gate sample 0.5 fails every time.
        let mut rng = ScriptedRandom::constant(0.5);
        let state = a.initialize(catalog(1), &teams(&["MUM", "CHE"]), None);
        let state = a.tick(state, ms(4_000), &mut rng);
        assert_eq!(state.leader(), None);
        assert_eq!(rng.draws(), 5);
    }

    #[test]
    fn expiry_wins_tie_with_poll() {
        let a = auctioneer(TimingConfig {
            countdown: ms(800),
            ai_poll_interval: ms(800),
            ai_poll_chance: 1.0,
            ..TimingConfig::default()
        });
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(1), &teams(&["CHE", "KOL"]), None);
        let state = a.tick(state, ms(800), &mut rng);
        assert!(is_complete(&state));
        assert_eq!(state.unsold.len(), 1);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn zero_poll_interval_disables_ai_polls() {
        let a = auctioneer(TimingConfig {
            ai_poll_interval: Duration::ZERO,
            ai_poll_chance: 1.0,
            ..TimingConfig::default()
        });
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(2), &teams(&["CHE", "KOL"]), None);

        let state = a.tick(state, ms(100), &mut rng);
        assert_eq!(state.active().map(|a| a.countdown), Some(ms(4_900)));
        let state = a.tick(state, ms(10_000), &mut rng);
        assert!(is_complete(&state));
        assert_eq!(state.unsold.len(), 2);
        assert_eq!(rng.draws(), 0);
    }

    // -----------------------------------------------------------------------
    // Sale guards
    // -----------------------------------------------------------------------

    /// MUM leads lot 1 at 225 with the countdown still running.
    fn user_leading() -> (Auctioneer, AuctionState) {
        let a = auctioneer(quiet());
        let state = a.initialize(catalog(2), &teams(&["MUM", "CHE"]), Some("MUM"));
        let state = a.submit_human_bid(state);
        assert_eq!(state.leader(), Some("MUM"));
        (a, state)
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid sale")]
    fn sale_to_overdrawn_leader_trips_guard() {
        let (a, mut state) = user_leading();
        state.participants[0].budget = 100;
        let mut rng = ScriptedRandom::constant(0.0);
        let _ = a.tick(state, ms(5_000), &mut rng);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid sale")]
    fn sale_to_full_squad_trips_guard() {
        let (a, mut state) = user_leading();
        fill_roster(&mut state.participants[0], 25, false);
        let mut rng = ScriptedRandom::constant(0.0);
        let _ = a.tick(state, ms(5_000), &mut rng);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid sale")]
    fn overseas_sale_past_cap_trips_guard() {
        let a = auctioneer(quiet());
        let foreign = vec![lot(1, "Import", Role::Bowler, true, 200)];
        let state = a.initialize(foreign, &teams(&["MUM", "CHE"]), Some("MUM"));
        let mut state = a.submit_human_bid(state);
        fill_roster(&mut state.participants[0], 8, true);
        let mut rng = ScriptedRandom::constant(0.0);
        let _ = a.tick(state, ms(5_000), &mut rng);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn rejected_sale_marks_lot_unsold() {
        let (a, mut state) = user_leading();
        state.participants[0].budget = 100;
        let before = state.participants[0].clone();
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.tick(state, ms(5_000), &mut rng);

        assert_eq!(state.participants[0], before);
        assert!(state.sold.is_empty());
        assert_eq!(state.unsold.len(), 1);
        assert_eq!(state.log[0].buyer_id, None);
        assert_eq!(state.current_lot().map(|l| l.lot_number), Some(2));
    }

    #[test]
    fn poll_ai_ignores_chance_gate() {
        let a = auctioneer(quiet());
        let mut rng = ScriptedRandom::constant(0.0);
        let state = a.initialize(catalog(1), &teams(&["CHE"]), None);
        let state = a.poll_ai(state, &mut rng);
        assert_eq!(state.leader(), Some("CHE"));
    }
}
