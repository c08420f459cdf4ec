use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use timbertally::db::Database;
use timbertally::models::SessionKind;
use timbertally::species;
use timbertally::store::SessionStore;
use timbertally::volume::estimate_volume;

#[derive(Parser)]
#[command(name = "ttally")]
#[command(about = "Standing-tree timber volume estimation and field surveys")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the species catalog with measurement envelopes
    Species,
    /// Estimate the volume of a single tree
    Estimate {
        #[arg(short, long)]
        species: String,
        /// Diameter at breast height in cm (even values, 6-200)
        #[arg(short, long)]
        diameter: f64,
        /// Tree height in m (1-100)
        #[arg(long)]
        height: f64,
    },
    /// Start a new survey session
    New {
        /// Survey kind: standing or harvested
        #[arg(short, long, default_value = "standing")]
        kind: String,
    },
    /// Append a measurement to a session
    Add {
        session: Uuid,
        #[arg(short, long)]
        species: String,
        #[arg(short, long)]
        diameter: f64,
        #[arg(long)]
        height: f64,
    },
    /// Remove the most recent measurement from a session
    Undo { session: Uuid },
    /// Pause a session
    Pause { session: Uuid },
    /// Resume a paused session
    Resume { session: Uuid },
    /// End a session
    End { session: Uuid },
    /// List sessions
    List {
        /// Only sessions still in progress
        #[arg(short, long)]
        active: bool,
    },
    /// Print a session's summary
    Summary { session: Uuid },
    /// Delete a session
    Delete { session: Uuid },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "timbertally=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Species => {
            for s in species::all() {
                let max_d = s
                    .max_diameter_cm
                    .map_or("∞".to_string(), |v| format!("{v}"));
                let max_h = s.max_height_m.map_or("∞".to_string(), |v| format!("{v}"));
                println!(
                    "{:<16} {:<18} [{}] d: {}-{} cm, h: {}-{} m",
                    s.species_id,
                    s.display_name,
                    s.code,
                    s.min_diameter_cm,
                    max_d,
                    s.min_height_m,
                    max_h
                );
            }
        }
        Commands::Estimate {
            species,
            diameter,
            height,
        } => {
            let validation = timbertally::validate::validate_measurement_input(diameter, height);
            if let Some(error) = validation.error {
                anyhow::bail!("{error}");
            }
            let result = estimate_volume(&species, diameter, height)?;
            println!("{} m³", result.volume_m3);
            if let Some(warning) = result.warning {
                eprintln!("warning: {}", warning.message_key());
            }
        }
        Commands::New { kind } => {
            let kind = SessionKind::from_str(&kind)
                .ok_or_else(|| anyhow::anyhow!("Unknown session kind: {kind}"))?;
            let session = open_store()?.create_session(kind)?;
            println!("{}", session.id);
        }
        Commands::Add {
            session,
            species,
            diameter,
            height,
        } => {
            let appended =
                open_store()?.append_measurement(session, &species, diameter, height)?;
            println!(
                "{}  {} m³",
                appended.measurement.id, appended.measurement.volume_m3
            );
            if let Some(warning) = appended.calculation.warning {
                eprintln!("warning: {}", warning.message_key());
            }
        }
        Commands::Undo { session } => match open_store()?.undo_last(session)? {
            Some(removed) => println!("removed {}", removed.id),
            None => println!("nothing to undo"),
        },
        Commands::Pause { session } => {
            open_store()?.pause(session)?;
        }
        Commands::Resume { session } => {
            open_store()?.resume(session)?;
        }
        Commands::End { session } => {
            let session = open_store()?.end(session)?;
            println!("ended with {} measurements", session.measurements.len());
        }
        Commands::List { active } => {
            let store = open_store()?;
            let sessions = if active {
                store.active_sessions()?
            } else {
                store.all_sessions()?
            };
            for s in sessions {
                let state = if s.is_ended() {
                    "ended"
                } else if s.is_paused {
                    "paused"
                } else {
                    "active"
                };
                println!(
                    "{}  {:<9} {:<7} {} trees",
                    s.id,
                    s.kind.as_str(),
                    state,
                    s.measurements.len()
                );
            }
        }
        Commands::Summary { session } => {
            let summary = open_store()?.summarize(session)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Delete { session } => {
            if !open_store()?.delete_session(session)? {
                anyhow::bail!("Session not found: {session}");
            }
        }
    }

    Ok(())
}

fn open_store() -> anyhow::Result<SessionStore<Database>> {
    let db = Database::open_default()?;
    db.migrate()?;
    Ok(SessionStore::new(db))
}
