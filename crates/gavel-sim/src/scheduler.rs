// Real-time driver for the auction state machine.
//
// Feeds wall-clock time and user commands into the pure transitions of
// `Auctioneer`, serialized through a single `tokio::select!` loop, and
// publishes what changed as `AuctionUpdate`s.

use std::time::Duration;

use gavel_core::auction::lot::Role;
use gavel_core::auction::state::{is_complete, AuctionLogEntry, AuctionState, Auctioneer};
use gavel_core::strategy::random::RandomSource;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Commands from the human participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Bid,
    Pass,
    Pause,
    Resume,
    Quit,
}

/// Parse a line of user input. Accepts `b`/`bid`, `p`/`pass`, `pause`,
/// `resume`, `q`/`quit`, case-insensitive.
pub fn parse_command(input: &str) -> Option<UserCommand> {
    match input.trim().to_lowercase().as_str() {
        "b" | "bid" => Some(UserCommand::Bid),
        "p" | "pass" => Some(UserCommand::Pass),
        "pause" => Some(UserCommand::Pause),
        "resume" => Some(UserCommand::Resume),
        "q" | "quit" => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Changes published to the presentation side.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionUpdate {
    LotStarted {
        lot_number: usize,
        total: usize,
        name: String,
        role: Role,
        overseas: bool,
        base_price: u32,
    },
    BidPlaced {
        lot_number: usize,
        team_id: String,
        price: u32,
    },
    LotResolved(AuctionLogEntry),
    Paused,
    Resumed,
    Finished {
        sold: usize,
        unsold: usize,
        complete: bool,
    },
}

// ---------------------------------------------------------------------------
// Change detection
// ---------------------------------------------------------------------------

/// The parts of the state that updates are derived from.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    lot_number: Option<usize>,
    price: Option<u32>,
    leader: Option<String>,
    log_len: usize,
    paused: bool,
}

impl Snapshot {
    fn of(state: &AuctionState) -> Self {
        Snapshot {
            lot_number: state.current_lot().map(|l| l.lot_number),
            price: state.current_price(),
            leader: state.leader().map(str::to_string),
            log_len: state.log.len(),
            paused: state.paused,
        }
    }
}

/// Updates describing the move from `before` to `state`.
fn diff(before: &Snapshot, state: &AuctionState) -> Vec<AuctionUpdate> {
    let after = Snapshot::of(state);
    let mut updates = Vec::new();

    for entry in state.log.iter().skip(before.log_len) {
        updates.push(AuctionUpdate::LotResolved(entry.clone()));
    }

    if after.paused != before.paused {
        updates.push(if after.paused {
            AuctionUpdate::Paused
        } else {
            AuctionUpdate::Resumed
        });
    }

    let new_lot = after.lot_number.is_some() && after.lot_number != before.lot_number;
    if new_lot {
        if let Some(lot) = state.current_lot() {
            updates.push(AuctionUpdate::LotStarted {
                lot_number: lot.lot_number,
                total: state.catalog_size,
                name: lot.name.clone(),
                role: lot.role,
                overseas: lot.overseas,
                base_price: lot.base_price,
            });
        }
    }

    let bid_changed = new_lot || after.leader != before.leader || after.price != before.price;
    if let (true, Some(lot_number), Some(team_id), Some(price)) =
        (bid_changed, after.lot_number, after.leader, after.price)
    {
        updates.push(AuctionUpdate::BidPlaced {
            lot_number,
            team_id,
            price,
        });
    }

    updates
}

async fn publish(updates: Vec<AuctionUpdate>, update_tx: &mpsc::Sender<AuctionUpdate>) {
    for update in updates {
        // A closed receiver just means nobody is watching.
        let _ = update_tx.send(update).await;
    }
}

fn apply_command(auctioneer: &Auctioneer, state: AuctionState, cmd: UserCommand) -> AuctionState {
    match cmd {
        UserCommand::Bid => auctioneer.submit_human_bid(state),
        UserCommand::Pass => auctioneer.submit_pass(state),
        UserCommand::Pause => auctioneer.pause(state),
        UserCommand::Resume => auctioneer.resume(state),
        UserCommand::Quit => state,
    }
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Drive `state` until the auction completes, `Quit` arrives, or the command
/// channel closes. Returns the final state.
///
/// Listens on two sources using `tokio::select!`:
/// 1. A clock interval of `timing.tick`; the real time elapsed since the
///    previous tick is passed to `Auctioneer::tick`.
/// 2. User commands.
///
/// Time that passes while paused is discarded, so resuming continues from
/// the frozen countdown.
pub async fn run<R: RandomSource>(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    update_tx: mpsc::Sender<AuctionUpdate>,
    auctioneer: Auctioneer,
    mut state: AuctionState,
    mut rng: R,
) -> AuctionState {
    info!("Auction scheduler started");

    let tick = if auctioneer.timing.tick.is_zero() {
        Duration::from_millis(100)
    } else {
        auctioneer.timing.tick
    };
    let mut clock = tokio::time::interval(tick);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first real
    // advance covers one full interval.
    clock.tick().await;
    let mut last_tick = Instant::now();

    let opening = Snapshot {
        lot_number: None,
        price: None,
        leader: None,
        log_len: state.log.len(),
        paused: state.paused,
    };
    publish(diff(&opening, &state), &update_tx).await;

    while !is_complete(&state) {
        tokio::select! {
            // --- Clock ---
            _ = clock.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;

                let before = Snapshot::of(&state);
                state = auctioneer.tick(state, elapsed, &mut rng);
                publish(diff(&before, &state), &update_tx).await;
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, stopping auction");
                        break;
                    }
                    Some(cmd) => {
                        debug!("User command: {:?}", cmd);
                        let before = Snapshot::of(&state);
                        state = apply_command(&auctioneer, state, cmd);
                        publish(diff(&before, &state), &update_tx).await;
                    }
                    None => {
                        info!("Command channel closed, stopping auction");
                        break;
                    }
                }
            }
        }
    }

    let complete = is_complete(&state);
    publish(
        vec![AuctionUpdate::Finished {
            sold: state.sold.len(),
            unsold: state.unsold.len(),
            complete,
        }],
        &update_tx,
    )
    .await;
    info!("Auction scheduler exiting (complete: {complete})");
    state
}
