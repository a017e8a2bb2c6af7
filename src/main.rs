mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use futures::future::join_all;
use log::{debug, error, info};

use oracles_core::backend::{HttpBackend, MemoryBackend, VotingBackend};
use oracles_core::config::{Network, OraclesConfig};
use oracles_core::errors::OraclesError;
use oracles_core::list::{
    spawn_list, FilePreferenceStore, ListEvent, ListSegment, ListState, MemoryPreferenceStore,
    PreferenceStore, VotingFilter, VotingListMachine, VotingListService,
};
use oracles_core::machine::Snapshot;
use oracles_core::utils::{current_time, init_logger};
use oracles_core::voting::{
    EpochSnapshot, IdentitySnapshot, VoteOption, VotingDetail, VotingEvent, VotingId,
    VotingRegistry, VotingService, VotingStatus,
};

const DEMO_ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

#[derive(Parser)]
#[clap(author, version, about)]
/// Browse oracle votings and take part in them
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Network preset the configuration starts from
    #[clap(short, long, default_value = "mainnet")]
    network: Network,

    /// Use an in-memory backend seeded with sample votings
    #[clap(long)]
    demo: bool,

    /// Address of the identity acting as oracle
    #[clap(short, long, default_value = DEMO_ADDRESS)]
    address: String,

    /// Identity balance
    #[clap(long, default_value = "0")]
    balance: f64,

    /// Whether the identity is validated in the current epoch
    #[clap(long)]
    validated: bool,

    #[clap(long, default_value = "0")]
    epoch: u64,

    /// Overrides the configured log level
    #[clap(short, long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List votings
    #[clap(alias = "ls")]
    List {
        /// todo, voting, closed or owned
        #[clap(short, long)]
        segment: Option<ListSegment>,

        /// Only these statuses (comma-separated)
        #[clap(long, value_delimiter = ',')]
        status: Vec<VotingStatus>,

        /// Funding, starting and running votings only
        #[clap(long, conflicts_with = "status")]
        open: bool,

        /// Follow continuation tokens until the last page
        #[clap(long)]
        all: bool,
    },

    /// Show one or more votings
    Show {
        #[clap(required = true)]
        ids: Vec<String>,
    },

    /// Launch a pending voting
    Launch { id: String },

    /// Add coins to the prize pool of a voting
    Fund {
        id: String,

        #[clap(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Cast a vote
    Vote {
        id: String,

        /// confirm or reject
        option: VoteOption,

        #[clap(short, long, default_value = "0")]
        deposit: f64,
    },

    /// Print the effective configuration
    Config,
}

struct App {
    config: OraclesConfig,
    backend: Arc<dyn VotingBackend>,
    identity: IdentitySnapshot,
    epoch: EpochSnapshot,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("{}", err);
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), OraclesError> {
    let config = OraclesConfig::load(cli.network, cli.config.as_deref())?;
    init_logger(cli.log_level.as_deref().unwrap_or(&config.log_level));
    debug!("Loaded configuration for {}", config.network);

    let validation = config.validate();
    if !validation.is_valid {
        eprint!("{}", validation.get_summary());
        return Err(OraclesError::Config("invalid configuration".to_string()));
    }
    for warning in &validation.warnings {
        info!("{}", warning);
    }

    if let Commands::Config = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let backend: Arc<dyn VotingBackend> = if cli.demo {
        info!("Using the in-memory demo backend");
        Arc::new(MemoryBackend::demo(&cli.address))
    } else {
        Arc::new(HttpBackend::from_config(&config.backend)?)
    };
    let app = App {
        config,
        backend,
        identity: IdentitySnapshot {
            address: cli.address,
            balance: cli.balance,
            is_validated: cli.validated,
        },
        epoch: EpochSnapshot {
            epoch_number: cli.epoch,
        },
    };

    match cli.command {
        Commands::List {
            segment,
            status,
            open,
            all,
        } => {
            let filter = if open {
                Some(VotingFilter::open())
            } else if status.is_empty() {
                None
            } else {
                Some(VotingFilter::only(status))
            };
            list(&app, segment, filter, all).await
        }
        Commands::Show { ids } => show(&app, ids).await,
        Commands::Launch { id } => act(&app, &id, VotingEvent::StartVoting).await,
        Commands::Fund { id, amount } => act(&app, &id, VotingEvent::AddFund { amount }).await,
        Commands::Vote {
            id,
            option,
            deposit,
        } => act(&app, &id, VotingEvent::Vote { option, deposit }).await,
        Commands::Config => Ok(()),
    }
}

fn preference_store(config: &OraclesConfig) -> Arc<dyn PreferenceStore> {
    match &config.preferences_path {
        Some(path) => Arc::new(FilePreferenceStore::new(path.clone())),
        None => Arc::new(MemoryPreferenceStore::default()),
    }
}

fn stopped() -> OraclesError {
    OraclesError::Config("state machine stopped unexpectedly".to_string())
}

/// Waits for the fetch started after request `after` to settle
async fn settle(
    service: &VotingListService,
    after: u64,
) -> Result<Snapshot<VotingListMachine>, OraclesError> {
    service
        .wait_for(|s| {
            s.context.last_request() > after
                && matches!(s.state, ListState::Loaded | ListState::Failure)
        })
        .await
        .ok_or_else(stopped)
}

async fn list(
    app: &App,
    segment: Option<ListSegment>,
    filter: Option<VotingFilter>,
    all: bool,
) -> Result<(), OraclesError> {
    let service = spawn_list(
        Arc::clone(&app.backend),
        preference_store(&app.config),
        app.identity.clone(),
        app.epoch,
        app.config.list_options(),
    );

    let mut snapshot = settle(&service, 0).await?;
    if let Some(segment) = segment.filter(|s| *s != snapshot.context.segment) {
        let before = snapshot.context.last_request();
        service.send(ListEvent::ToggleShowAll(segment));
        snapshot = settle(&service, before).await?;
    }
    if let Some(filter) = filter.filter(|f| *f != snapshot.context.filter) {
        let before = snapshot.context.last_request();
        service.send(ListEvent::Filter(filter));
        snapshot = settle(&service, before).await?;
    }
    while all && snapshot.can_load_more() {
        let before = snapshot.context.last_request();
        service.send(ListEvent::LoadMore);
        snapshot = settle(&service, before).await?;
    }

    render::print_list(&snapshot, current_time());
    service.stop();
    Ok(())
}

async fn show(app: &App, ids: Vec<String>) -> Result<(), OraclesError> {
    let ids: Vec<VotingId> = ids.into_iter().map(VotingId::new).collect();
    let records = join_all(ids.iter().map(|id| app.backend.fetch_voting(id))).await;

    let now = current_time();
    for (i, record) in records.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        render::print_detail(&VotingDetail::from_record(record?), None, now);
    }
    Ok(())
}

/// Sends one user action to a freshly bound machine and reports its outcome
async fn act(app: &App, id: &str, event: VotingEvent) -> Result<(), OraclesError> {
    let record = app.backend.fetch_voting(&VotingId::new(id)).await?;
    let registry = VotingRegistry::new(
        Arc::clone(&app.backend),
        app.identity.clone(),
        app.epoch,
        None,
    );
    let service = registry.bind_detail(VotingDetail::from_record(record));

    if let Some(reason) = refusal(&service, &event) {
        println!("{}", reason.yellow());
        return Ok(());
    }

    let mut notifications = service.notifications();
    service.send(event);
    let timeout = Duration::from_secs(app.config.backend.request_timeout_secs.saturating_mul(2));
    let notification = tokio::time::timeout(timeout, notifications.recv())
        .await
        .map_err(|_| OraclesError::Config("timed out waiting for the transaction".to_string()))?
        .map_err(|_| stopped())?;
    render::print_notification(&notification);

    let snapshot = service.snapshot();
    render::print_detail(&snapshot.context.detail, Some(&snapshot.state), current_time());
    Ok(())
}

/// Why the machine would silently ignore `event`, if it would
fn refusal(service: &VotingService, event: &VotingEvent) -> Option<String> {
    let snapshot = service.snapshot();
    let state = snapshot.state;
    // a repeated vote is let through so the machine reports it
    let voted = snapshot.context.has_voted || state.is_idle_in(&[VotingStatus::Voted]);
    match event {
        VotingEvent::StartVoting if !state.can_launch() => {
            Some(format!("Only pending votings can be launched, this one is {}", state))
        }
        VotingEvent::AddFund { .. } if !state.can_add_fund() => {
            Some(format!("Funds cannot be added while {}", state))
        }
        VotingEvent::Vote { .. } if !state.can_vote() && !voted => {
            Some(format!("Voting is not open for votes, it is {}", state))
        }
        _ => None,
    }
}
