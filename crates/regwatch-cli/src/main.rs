use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use regwatch_core::{Config, Level, SourceConfig, config};
use regwatch_store::{RegulationFilter, RegulationStore};

mod display;

#[derive(Parser)]
#[command(name = "regwatch", version, about = "Aggregate regulatory updates from government APIs")]
struct Cli {
    /// Path to the SQLite database.
    #[arg(long, env = "REGULATIONS_DB_FILE", default_value = "regulations.db", global = true)]
    db_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch updates from all configured sources and store them.
    Fetch(FetchArgs),
    /// List stored regulations, most recently published first.
    List {
        /// Restrict to one jurisdiction level.
        #[arg(long)]
        level: Option<Level>,
        /// Substring match on title or description.
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show one stored regulation by id.
    Show { id: String },
}

#[derive(Args)]
struct FetchArgs {
    /// Number of days to look back.
    #[arg(long, default_value_t = 7)]
    days_back: u32,

    /// Maximum results per source.
    #[arg(long, default_value_t = 10)]
    page_size: u32,

    /// Sources to fetch (default: all with a key configured).
    #[arg(long, value_delimiter = ',')]
    sources: Vec<Level>,

    /// Optional search term forwarded to each source.
    #[arg(long)]
    search: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print the run summary as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Regulations.gov API key.
    #[arg(long, env = "REGULATIONS_GOV_API_KEY", hide_env_values = true)]
    federal_key: Option<String>,

    /// NYS Open Legislation API key.
    #[arg(long, env = "NYS_LEGISLATURE_API_KEY", hide_env_values = true)]
    state_key: Option<String>,

    /// Municipal open-data app token.
    #[arg(long, env = "MUNICIPAL_API_TOKEN", hide_env_values = true)]
    local_key: Option<String>,
}

impl FetchArgs {
    /// Build the run configuration. `--sources` narrows the run by
    /// withholding keys from the levels not listed.
    fn into_config(self, db_path: PathBuf) -> Config {
        let sources = self.sources;
        let requested = |level: Level, key: Option<String>| {
            if sources.is_empty() || sources.contains(&level) {
                key
            } else {
                None
            }
        };
        Config {
            federal: SourceConfig {
                base_url: config::FEDERAL_BASE_URL.to_string(),
                api_key: requested(Level::Federal, self.federal_key),
            },
            state: SourceConfig {
                base_url: config::STATE_BASE_URL.to_string(),
                api_key: requested(Level::State, self.state_key),
            },
            local: SourceConfig {
                base_url: config::LOCAL_BASE_URL.to_string(),
                api_key: requested(Level::Local, self.local_key),
            },
            days_back: self.days_back,
            page_size: self.page_size,
            search_term: self.search,
            request_timeout_secs: self.timeout,
            db_path,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(args) => fetch(args, cli.db_file).await,
        Command::List { level, query, limit } => list(&cli.db_file, level, query, limit),
        Command::Show { id } => show(&cli.db_file, &id),
    }
}

async fn fetch(args: FetchArgs, db_file: PathBuf) -> anyhow::Result<()> {
    let json = args.json;
    let config = args.into_config(db_file);
    if config.no_sources_enabled() {
        anyhow::bail!(
            "no API keys configured; set REGULATIONS_GOV_API_KEY, \
             NYS_LEGISLATURE_API_KEY, or MUNICIPAL_API_TOKEN"
        );
    }

    let store = open_store(&config.db_path)?;
    tracing::info!(db = %config.db_path.display(), "starting aggregation run");
    let summary = regwatch_sync::run(&config, &store).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        display::print_summary(&summary);
    }
    Ok(())
}

fn list(
    db_file: &Path,
    level: Option<Level>,
    query: Option<String>,
    limit: u32,
) -> anyhow::Result<()> {
    let store = open_store(db_file)?;
    let records = store.search(&RegulationFilter {
        level,
        query,
        limit,
        offset: 0,
    })?;
    if records.is_empty() {
        println!("no matching regulations");
    } else {
        display::print_record_list(&records);
    }
    Ok(())
}

fn show(db_file: &Path, id: &str) -> anyhow::Result<()> {
    let store = open_store(db_file)?;
    let record = store
        .get(id)?
        .with_context(|| format!("no record with id {id:?}"))?;
    display::print_record_card(&record);
    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<RegulationStore> {
    RegulationStore::open(path).with_context(|| format!("opening database {}", path.display()))
}
