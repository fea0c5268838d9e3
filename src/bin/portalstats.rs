use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use portalstats::{FactFixture, FixedClock, PortalStats, ReportKind};

#[derive(Parser)]
#[command(name = "portalstats", about = "Training and webinar statistics engine")]
struct Cli {
    /// Database path (default: ~/.portalstats/portalstats.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a statistics report as JSON
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },
    /// Print an analytics report as JSON
    Analytics {
        #[command(subcommand)]
        target: AnalyticsTarget,
    },
    /// Serve the reports over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Show row counts per fact table
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Load facts from a JSON fixture file
    Load {
        /// Path to the fixture file
        file: String,
    },
}

#[derive(Subcommand)]
enum StatsTarget {
    /// Training dashboard with month-over-month growth
    Training {
        /// Evaluate as of this timestamp instead of now
        #[arg(long)]
        now: Option<String>,
    },
    /// Webinar dashboard cards
    Webinar {
        #[arg(long)]
        now: Option<String>,
    },
}

#[derive(Subcommand)]
enum AnalyticsTarget {
    /// Monthly trends, status distribution and top categories
    Webinar {
        #[arg(long)]
        now: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => portalstats::Database::open_at(path).await?,
        None => portalstats::Database::open().await?,
    };
    let engine = PortalStats::from_config(db).await?;

    match cli.command {
        Commands::Stats { target } => match target {
            StatsTarget::Training { now } => {
                print_report(engine, ReportKind::TrainingStats, now.as_deref()).await?;
            }
            StatsTarget::Webinar { now } => {
                print_report(engine, ReportKind::WebinarStats, now.as_deref()).await?;
            }
        },
        Commands::Analytics { target } => match target {
            AnalyticsTarget::Webinar { now } => {
                print_report(engine, ReportKind::WebinarAnalytics, now.as_deref()).await?;
            }
        },
        Commands::Serve { bind } => {
            eprintln!("Listening on http://{bind}");
            portalstats::server::serve(engine, bind).await?;
        }
        Commands::Status => {
            print_status(&engine).await?;
        }
        Commands::Config { action } => {
            handle_config(&engine, action).await?;
        }
        Commands::Load { file } => {
            let text = std::fs::read_to_string(&file)?;
            let fixture: FactFixture = serde_json::from_str(&text)?;
            let n = engine.load_fixture(fixture).await?;
            println!("Loaded {n} facts from {file}.");
        }
    }

    Ok(())
}

async fn print_report(
    engine: PortalStats,
    kind: ReportKind,
    now: Option<&str>,
) -> anyhow::Result<()> {
    let engine = match now {
        Some(ts) => engine.with_clock(FixedClock(portalstats::date_util::parse_timestamp(ts)?)),
        None => engine,
    };
    let rendered = engine.render(kind).await?;
    println!("{}", serde_json::to_string_pretty(&rendered.body)?);
    if !rendered.ok {
        anyhow::bail!("{kind} report failed");
    }
    Ok(())
}

async fn print_status(engine: &PortalStats) -> anyhow::Result<()> {
    let counts = engine.status().await?;
    println!("Fact Store Status");
    for (table, count) in counts {
        println!("  {:<26} {count}", format!("{}:", table.table_name()));
    }
    println!("Error Policies");
    for kind in ReportKind::ALL {
        println!("  {:<26} {}", format!("{}:", kind.name()), engine.policies().get(kind));
    }
    Ok(())
}

async fn handle_config(engine: &PortalStats, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match engine.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            engine.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = engine.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}
