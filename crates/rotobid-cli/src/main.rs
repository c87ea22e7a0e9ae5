// rotobid entry point.
//
// Every invocation:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database and resolve the current draft id
// 4. Load projections and filter to the eligible pool
// 5. Build the draft session and replay the persisted action log, falling
//    back to the stored snapshot if the log no longer applies
// 6. Run the subcommand, persisting any new action and a snapshot

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rotobid_baseball::draft::position::Position;
use rotobid_baseball::draft::session::{DraftAction, DraftSession, DraftSnapshot, RankedPlayer};
use rotobid_baseball::player::{OwnerId, PlayerId, UNOWNED};
use rotobid_baseball::projections;
use rotobid_core::config::{self, CategoryGroup};
use rotobid_core::db::Database;
use tracing::{info, warn};

/// rotobid - auction values and live inflation for rotisserie baseball drafts.
#[derive(Parser, Debug)]
#[command(name = "rotobid")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show players ranked by value with live prices
    Values {
        /// Only show one group
        #[arg(long, value_enum)]
        group: Option<GroupArg>,
        /// Maximum rows per group
        #[arg(long, default_value_t = 30)]
        limit: usize,
        /// Include drafted players
        #[arg(long)]
        all: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record a player bought at auction
    Draft {
        /// Player id or exact name
        player: String,
        /// Owner id, name or abbreviation
        owner: String,
        /// Price paid in whole dollars
        price: u32,
        /// Roster position filled (C, 1B, OF, U, P, ...)
        position: String,
    },

    /// Return a drafted player to the pool
    Undo {
        /// Player id or exact name
        player: String,
    },

    /// Show each owner's budget and roster
    Owners {
        #[arg(long)]
        json: bool,
    },

    /// Show projected roto standings
    Standings {
        #[arg(long)]
        json: bool,
    },

    /// Discard the current draft and start a new one
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum GroupArg {
    Hitters,
    Pitchers,
}

impl From<GroupArg> for CategoryGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Hitters => CategoryGroup::Hitting,
            GroupArg::Pitchers => CategoryGroup::Pitching,
        }
    }
}

const SNAPSHOT_KEY: &str = "snapshot";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("rotobid starting: {:?}", cli.command);

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} owners, ${} budget",
        config.league.name, config.league.owner_count, config.league.budget
    );

    // 3. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    if matches!(cli.command, Command::Reset) {
        return reset(&db);
    }
    let draft_id = db.current_or_new_draft_id()?;

    // 4. Load projections
    let players = projections::load_all(&config.data_paths).context("failed to load projections")?;
    let players = projections::eligible(players, &config.league);

    // 5. Build the session and recover any draft in progress
    let mut session =
        DraftSession::new(players, config.league.clone()).context("failed to build draft session")?;
    for issue in &session.valuations().issues {
        eprintln!("warning: {issue}");
    }
    recover_from_db(&mut session, &db, &draft_id)?;

    // 6. Run the command
    match cli.command {
        Command::Values {
            group,
            limit,
            all,
            json,
        } => print_values(&session, group.map(Into::into), limit, all, json)?,
        Command::Draft {
            player,
            owner,
            price,
            position,
        } => {
            let player = resolve_player(&session, &player)?;
            let owner = session
                .settings()
                .resolve_owner(&owner)
                .with_context(|| format!("unknown owner '{owner}'"))? as OwnerId;
            let Some(position) = Position::from_str_pos(&position) else {
                bail!("unrecognized position '{position}'");
            };
            let outcome = session.draft(player, owner, price, position)?;
            persist(&db, &draft_id, &session, &outcome.action)?;

            let name = player_name(&session, player);
            println!("{name} drafted by {} for ${price} at {position}", owner_label(&session, owner));
            if outcome.over_max_bid {
                println!("warning: price exceeds the owner's maximum bid");
            }
            println!("inflation now {:.3}", outcome.inflation);
        }
        Command::Undo { player } => {
            let player = resolve_player(&session, &player)?;
            let outcome = session.return_to_pool(player)?;
            persist(&db, &draft_id, &session, &outcome.action)?;
            println!(
                "{} returned to the pool from {}",
                player_name(&session, player),
                owner_label(&session, outcome.previous.owner)
            );
            println!("inflation now {:.3}", outcome.inflation);
        }
        Command::Owners { json } => print_owners(&session, json)?,
        Command::Standings { json } => print_standings(&session, json)?,
        // Handled before the pool is loaded.
        Command::Reset => {}
    }

    Ok(())
}

/// Initialize tracing to log to a file (not the terminal).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("rotobid.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rotobid=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

/// Replay the stored action log for `draft_id` onto a fresh session.
/// Returns whether there was anything to restore.
///
/// If the log no longer replays (for example after the projection files
/// changed), the session is rebuilt from the snapshot `persist` keeps, with
/// the current league settings applied on top.
fn recover_from_db(session: &mut DraftSession, db: &Database, draft_id: &str) -> anyhow::Result<bool> {
    if !db.has_draft_in_progress(draft_id)? {
        info!("No draft in progress for draft_id={draft_id}, starting fresh");
        return Ok(false);
    }

    let records = db.load_actions(draft_id)?;
    let replay_err = match session.replay(&records) {
        Ok(count) => {
            info!("Restored {count} actions for draft_id={draft_id}");
            return Ok(true);
        }
        Err(e) => e,
    };

    warn!("Replay failed for draft_id={draft_id}: {replay_err}; trying stored snapshot");
    let Some(value) = db.load_state(SNAPSHOT_KEY)? else {
        return Err(anyhow::Error::new(replay_err).context(format!("failed to restore draft {draft_id}")));
    };
    let snapshot: DraftSnapshot =
        serde_json::from_value(value).context("failed to parse stored snapshot")?;

    let settings = session.settings().clone();
    let mut restored = DraftSession::restore(session.players().to_vec(), &snapshot)
        .with_context(|| format!("failed to restore draft {draft_id} from snapshot"))?;
    restored.apply_settings(settings)?;
    *session = restored;
    info!(
        "Restored {} drafted players from snapshot saved at {}",
        snapshot.drafted.len(),
        snapshot.saved_at
    );
    Ok(true)
}

/// Append the action to the log and refresh the stored snapshot that
/// `recover_from_db` falls back on.
fn persist(db: &Database, draft_id: &str, session: &DraftSession, action: &DraftAction) -> anyhow::Result<()> {
    let seq = db.next_seq(draft_id)?;
    db.record_action(&action.to_record(seq), draft_id)?;
    let snapshot = serde_json::to_value(session.snapshot()).context("failed to serialize snapshot")?;
    db.save_state(SNAPSHOT_KEY, &snapshot)?;
    Ok(())
}

fn reset(db: &Database) -> anyhow::Result<()> {
    if let Some(old) = db.get_draft_id()? {
        warn!("Discarding draft {old}");
    }
    db.clear_draft()?;
    let draft_id = Database::generate_draft_id();
    db.set_draft_id(&draft_id)?;
    info!("Started new draft {draft_id}");
    println!("started new draft {draft_id}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Accept a numeric id or a player name.
fn resolve_player(session: &DraftSession, key: &str) -> anyhow::Result<PlayerId> {
    if let Ok(id) = key.trim().parse::<PlayerId>() {
        if session.player(id).is_some() {
            return Ok(id);
        }
    }
    session
        .find_by_name(key)
        .map(|p| p.id)
        .with_context(|| format!("no player matching '{key}'"))
}

fn player_name(session: &DraftSession, id: PlayerId) -> String {
    session.player(id).map(|p| p.name.clone()).unwrap_or_default()
}

fn owner_label(session: &DraftSession, owner: OwnerId) -> String {
    if owner == UNOWNED {
        return "-".into();
    }
    session
        .settings()
        .owner_list()
        .get(owner as usize - 1)
        .map(|o| o.abbreviation.clone())
        .unwrap_or_else(|| owner.to_string())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Whole-dollar price for display. Undrafted players never show below $1.
fn shown_price(row: &RankedPlayer) -> i64 {
    if row.owner == UNOWNED {
        (row.display_price.round() as i64).max(1)
    } else {
        row.display_price.round() as i64
    }
}

fn print_values(
    session: &DraftSession,
    group: Option<CategoryGroup>,
    limit: usize,
    include_drafted: bool,
    json: bool,
) -> anyhow::Result<()> {
    let groups: Vec<CategoryGroup> = match group {
        Some(g) => vec![g],
        None => CategoryGroup::ALL.to_vec(),
    };

    if json {
        let rows: Vec<RankedPlayer> = groups
            .iter()
            .flat_map(|&g| session.ranked(g, include_drafted).into_iter().take(limit))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("inflation {:.3}", session.inflation().inflation);
    for g in groups {
        println!();
        println!("{:>4}  {:<24} {:<4} {:<10} {:>7} {:>6} {:>6}  {}", "rank", g.label(), "team", "pos", "z", "est", "price", "owner");
        for row in session.ranked(g, include_drafted).into_iter().take(limit) {
            let positions: Vec<&str> = row.positions.iter().map(|p| p.display_str()).collect();
            println!(
                "{:>4}  {:<24} {:<4} {:<10} {:>7.2} {:>6.1} {:>6}  {}",
                row.category_rank,
                row.name,
                row.team,
                positions.join("/"),
                row.total_z,
                row.estimate,
                format!("${}", shown_price(&row)),
                owner_label(session, row.owner)
            );
        }
    }
    Ok(())
}

fn print_owners(session: &DraftSession, json: bool) -> anyhow::Result<()> {
    let owners = session.owners();
    if json {
        println!("{}", serde_json::to_string_pretty(&owners)?);
        return Ok(());
    }

    println!("{:<4} {:<20} {:>6} {:>6} {:>5} {:>5} {:>5} {:>7}", "id", "owner", "spent", "left", "H", "P", "open", "max bid");
    for o in &owners {
        println!(
            "{:<4} {:<20} {:>6} {:>6} {:>5} {:>5} {:>5} {:>7}",
            o.id, o.name, o.spent, o.remaining, o.hitters, o.pitchers, o.spots_to_fill, o.max_bid
        );
    }
    Ok(())
}

fn print_standings(session: &DraftSession, json: bool) -> anyhow::Result<()> {
    let standings = session.standings();
    if json {
        println!("{}", serde_json::to_string_pretty(standings)?);
        return Ok(());
    }

    let categories: Vec<_> = session.settings().categories.iter().collect();
    let header: Vec<String> = categories.iter().map(|c| format!("{:>5}", c.label())).collect();
    println!("{:<5} {:<20} {:>6} {}", "place", "owner", "points", header.join(" "));
    for s in standings.by_place() {
        let points: Vec<String> = categories
            .iter()
            .map(|c| format!("{:>5}", s.category_points.get(c).copied().unwrap_or(0)))
            .collect();
        println!(
            "{:<5} {:<20} {:>6} {}",
            s.place,
            owner_label(session, s.owner),
            s.total_points,
            points.join(" ")
        );
    }
    Ok(())
}
