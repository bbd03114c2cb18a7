// Auction simulator entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the auction narration)
// 2. Load config
// 3. Load catalog and team data, build the catalog
// 4. Initialize the auction state
// 5. Create mpsc channels
// 6. Spawn the stdin command reader
// 7. Spawn the scheduler
// 8. Narrate updates until the scheduler finishes
// 9. Print final squads

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use gavel_core::auction::catalog::build_catalog;
use gavel_core::auction::lot::Role;
use gavel_core::auction::state::{AuctionState, Auctioneer};
use gavel_core::config;
use gavel_core::price::{format_price, format_price_short};
use gavel_core::strategy::random::SeededRandom;
use gavel_sim::data;
use gavel_sim::scheduler::{self, parse_command, AuctionUpdate, UserCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Auction simulator starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: purse {}, squad {}-{}, {} overseas",
        config.rules.initial_purse,
        config.rules.min_squad_size,
        config.rules.max_squad_size,
        config.rules.max_overseas
    );

    // 3. Load data and build the catalog
    let records = data::load_catalog_records(Path::new(&config.data_paths.players))
        .context("failed to load athlete data")?;
    let teams =
        data::load_teams(Path::new(&config.data_paths.teams)).context("failed to load teams")?;

    let catalog = match build_catalog(&records, &config.rules) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{e}");
            for issue in e.issues() {
                eprintln!("  {issue}");
            }
            error!("Catalog validation failed: {}", e);
            return Err(anyhow::Error::new(e).context("catalog validation failed"));
        }
    };

    // 4. Initialize the auction
    let user_team = std::env::args().nth(1).or_else(|| config.run.user_team.clone());
    let auctioneer = Auctioneer::from_config(&config);
    let state = auctioneer.initialize(catalog, &teams, user_team.as_deref());
    let rng = match config.run.seed {
        Some(seed) => {
            info!("Using fixed seed {seed}");
            SeededRandom::from_seed(seed)
        }
        None => SeededRandom::from_entropy(),
    };

    let names: HashMap<String, String> = state
        .participants
        .iter()
        .map(|p| (p.id.clone(), p.name.clone()))
        .collect();
    match state.user() {
        Some(user) => println!(
            "You are bidding for {} ({}). Commands: b(id), p(ass), pause, resume, q(uit)",
            user.name,
            format_price(user.budget)
        ),
        None => println!("Fully automated run. Commands: pause, resume, q(uit)"),
    }

    // 5. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (update_tx, mut update_rx) = mpsc::channel(256);

    // 6. Spawn the stdin reader
    let stdin_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let Some(cmd) = parse_command(&line) else {
                println!("Unknown command {line:?}. Commands: b(id), p(ass), pause, resume, q(uit)");
                continue;
            };
            if cmd_tx.send(cmd).await.is_err() || cmd == UserCommand::Quit {
                return;
            }
        }
        // Input ended: keep the channel open so the auction runs to the end.
        cmd_tx.closed().await;
    });

    // 7. Spawn the scheduler
    let scheduler_handle = tokio::spawn(scheduler::run(cmd_rx, update_tx, auctioneer, state, rng));

    // 8. Narrate
    while let Some(update) = update_rx.recv().await {
        narrate(&update, &names);
    }

    let final_state = scheduler_handle
        .await
        .context("scheduler task failed")?;
    stdin_handle.abort();

    // 9. Results
    print_results(&final_state);

    info!("Auction simulator shut down cleanly");
    Ok(())
}

fn team_name<'a>(names: &'a HashMap<String, String>, id: &'a str) -> &'a str {
    names.get(id).map(String::as_str).unwrap_or(id)
}

fn narrate(update: &AuctionUpdate, names: &HashMap<String, String>) {
    match update {
        AuctionUpdate::LotStarted {
            lot_number,
            total,
            name,
            role,
            overseas,
            base_price,
        } => {
            let flag = if *overseas { " [overseas]" } else { "" };
            println!(
                "\nLot {lot_number}/{total}: {name} ({role}){flag}, base {}",
                format_price(*base_price)
            );
        }
        AuctionUpdate::BidPlaced { team_id, price, .. } => {
            println!("  {} bids {}", team_name(names, team_id), format_price(*price));
        }
        AuctionUpdate::LotResolved(entry) => match &entry.buyer_id {
            Some(buyer) => println!(
                "  SOLD: {} to {} for {}",
                entry.lot_name,
                team_name(names, buyer),
                format_price(entry.price)
            ),
            None => println!("  UNSOLD: {}", entry.lot_name),
        },
        AuctionUpdate::Paused => println!("  -- paused --"),
        AuctionUpdate::Resumed => println!("  -- resumed --"),
        AuctionUpdate::Finished {
            sold,
            unsold,
            complete,
        } => {
            let status = if *complete { "complete" } else { "stopped" };
            println!("\nAuction {status}: {sold} sold, {unsold} unsold");
        }
    }
}

fn print_results(state: &AuctionState) {
    for (participant, summary) in state.participants.iter().zip(state.standings()) {
        let marker = if participant.is_user { " (you)" } else { "" };
        println!(
            "\n{}{marker}: {} players, {} overseas, spent {}, left {}",
            participant.name,
            summary.squad_size,
            summary.overseas_count,
            format_price(summary.total_spent),
            format_price(summary.budget_remaining)
        );
        for role in Role::ALL {
            let picks: Vec<String> = participant
                .roster
                .iter()
                .filter(|lot| lot.role == role)
                .map(|lot| format!("{} {}", lot.name, format_price_short(lot.sold_price())))
                .collect();
            if !picks.is_empty() {
                println!("  {} ({}): {}", role.plural_name(), picks.len(), picks.join(", "));
            }
        }
    }
}

/// Initialize tracing to log to a file (stdout is used for the narration).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gavel.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("gavel=info,gavel_core=info,gavel_sim=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
