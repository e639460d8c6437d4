//! # Farm Processor
//!
//! Runs a single processor invocation against the configured datastore, queue
//! backend, shared cache and device gateway, then prints the JSON result.
//!
//! ```bash
//! farm-processor --request '{"task_type": "schedule_automation"}'
//! echo '{}' | farm-processor --config config/farm.toml
//! farm-processor validate --config config/farm.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

use farm_automation::cache::SharedCacheTier;
use farm_automation::clock::system_clock;
use farm_automation::database::{DatabaseConnection, Datastore, PgDatastore};
use farm_automation::gateway::{DeviceGateway, HttpDeviceGateway};
use farm_automation::logging::init_structured_logging;
use farm_automation::messaging::PgmqQueueService;
use farm_automation::{ConfigLoader, ProcessorConfig, ProcessorDependencies, TaskProcessor};

#[derive(Parser)]
#[command(name = "farm-processor")]
#[command(about = "Run one farm automation processor invocation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// TOML configuration file (falls back to FARM_CONFIG_PATH)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Request body as JSON; read from stdin when omitted
    #[arg(short, long)]
    request: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration, print it and exit
    Validate,
}

#[tokio::main]
async fn main() {
    init_structured_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!(error = %e, "❌ Processor run failed");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;

    if let Some(Commands::Validate) = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        info!("✅ Configuration is valid");
        return Ok(true);
    }

    let body = read_request(cli.request)?;
    let processor = build_processor(&config).await?;

    let result = processor.invoke(&body).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}

fn read_request(request: Option<String>) -> anyhow::Result<serde_json::Value> {
    let raw = match request {
        Some(raw) => raw,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading request from stdin")?;
            raw
        }
    };

    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&raw).context("parsing request JSON")
}

async fn build_processor(config: &ProcessorConfig) -> anyhow::Result<TaskProcessor> {
    let clock = system_clock();

    let connection = DatabaseConnection::connect(&config.database)
        .await
        .context("connecting to database")?;
    let pool = connection.pool().clone();

    let queue = PgmqQueueService::new_with_pool(pool.clone()).await;
    for name in [
        &config.queues.critical,
        &config.queues.high,
        &config.queues.normal,
        &config.queues.low,
        &config.queues.dead_letter,
    ] {
        queue
            .ensure_queue(name)
            .await
            .with_context(|| format!("creating queue {name}"))?;
    }

    let gateway: Option<Arc<dyn DeviceGateway>> = if config.gateway.is_configured() {
        Some(Arc::new(
            HttpDeviceGateway::new(&config.gateway).context("building device gateway client")?,
        ))
    } else {
        warn!("No device gateway configured; sync and discovery are disabled");
        None
    };

    let datastore: Arc<dyn Datastore> = Arc::new(PgDatastore::new(pool));
    let shared_cache = SharedCacheTier::from_config_graceful(&config.cache, clock.clone()).await;

    Ok(TaskProcessor::new(
        config,
        ProcessorDependencies {
            datastore,
            queue: Arc::new(queue),
            gateway,
            shared_cache,
            clock,
        },
    ))
}
