use clap::{Parser, Subcommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use uptime_worker::config::WorkerConfig;
use uptime_worker::db::{SeaOrmStore, ensure_schema};
use uptime_worker::monitoring::prober::quick_check_with;
use uptime_worker::monitoring::{
    CheckExecutor, Clock, HttpProber, MonitorScheduler, SchedulerConfig, SystemClock,
    TransitionDetector,
};
use uptime_worker::notifications::NotificationService;
use uptime_worker::retention::RetentionSweeper;
use uptime_worker::version::VERSION;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about = "Background uptime monitoring worker", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler and the retention sweeper until Ctrl-C (default)
    Run,
    /// Check one URL right away and print the outcome as JSON
    Check { url: String },
    /// Run a single retention sweep and exit
    Sweep,
}

fn init_logging(log_dir: &str) -> Result<(), BoxError> {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "worker.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    // try_init also routes `log` records into tracing.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;
    Ok(())
}

async fn connect(config: &WorkerConfig) -> Result<DatabaseConnection, BoxError> {
    let mut opt = ConnectOptions::new(config.database_url.to_owned());
    opt.max_connections(config.worker_pool_size as u32 + 2)
        .sqlx_logging(false);
    let db = Database::connect(opt).await?;
    if config.create_schema {
        ensure_schema(&db).await?;
    }
    Ok(db)
}

async fn run(config: WorkerConfig) -> Result<(), BoxError> {
    let db = connect(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(SeaOrmStore::new(db.clone(), clock.clone()));
    let notifier = Arc::new(NotificationService::new(db)?);

    let prober = Arc::new(HttpProber::new(config.check_timeout(), &config.user_agent)?);
    let executor = CheckExecutor::new(prober, config.worker_pool_size, config.check_deadline());
    let detector = TransitionDetector::new(
        store.clone(),
        notifier,
        clock.clone(),
        config.probe_location.clone(),
    );
    let scheduler = Arc::new(MonitorScheduler::new(
        store.clone(),
        store.clone(),
        executor,
        detector,
        clock.clone(),
        SchedulerConfig {
            tick_interval: config.tick_interval(),
            max_checks_per_tick: config.max_checks_per_tick,
        },
    ));
    let sweeper = Arc::new(RetentionSweeper::new(
        store.clone(),
        store,
        clock,
        config.retention_interval(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, waiting for in-flight work to finish.");
    let _ = shutdown_tx.send(());

    for (name, handle) in [("scheduler", scheduler_handle), ("retention", sweeper_handle)] {
        if let Err(e) = handle.await {
            error!(task = name, error = ?e, "Background task ended abnormally.");
        }
    }
    info!("Uptime worker stopped.");
    Ok(())
}

async fn sweep_once(config: WorkerConfig) -> Result<(), BoxError> {
    let db = connect(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(SeaOrmStore::new(db, clock.clone()));
    let sweeper = RetentionSweeper::new(store.clone(), store, clock, config.retention_interval());
    let report = sweeper.sweep().await?;
    info!(
        accounts = report.accounts,
        deleted = report.deleted,
        failed = report.failed,
        "Retention sweep completed."
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    let config = WorkerConfig::load(args.config.as_deref())?;

    init_logging(&config.log_dir)?;
    info!(version = VERSION, "Starting uptime worker.");

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Check { url } => {
            let outcome =
                quick_check_with(&url, config.quick_check_timeout(), &config.user_agent).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::Sweep => sweep_once(config).await,
    }
}
