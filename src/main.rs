//! synheart-hsi CLI
//!
//! Runs the on-device fusion pipeline in the foreground: reads newline-
//! delimited signal events from stdin (each a tagged `biosignal`,
//! `behavioral`, or `context` JSON object), fuses them into HSI 1.0
//! snapshots on four parallel window cadences, and optionally uploads them.

use clap::{Parser, Subcommand, ValueEnum};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use synheart_hsi_core::config::Config;
use synheart_hsi_core::oracles::{
    CapabilityLevel, CapabilityOracle, ConsentOracle, Module, StaticCapabilityOracle,
    StaticConsentOracle,
};
use synheart_hsi_core::scheduler::WindowScheduler;
use synheart_hsi_core::transparency::create_shared_log_with_persistence;
use synheart_hsi_core::types::{BehavioralEvent, BiosignalSample, ContextSample};
use synheart_hsi_core::{FusionEngine, PRIVACY_DECLARATION, VERSION};

#[cfg(feature = "gateway")]
use synheart_hsi_core::{HsiExporter, UploadClient, UploadConfig};

#[derive(Parser)]
#[command(name = "synheart-hsi")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "On-device streaming fusion core producing signed HSI 1.0 snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, ValueEnum)]
enum CapabilityArg {
    None,
    Core,
    Extended,
    Research,
}

impl From<CapabilityArg> for CapabilityLevel {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::None => CapabilityLevel::None,
            CapabilityArg::Core => CapabilityLevel::Core,
            CapabilityArg::Extended => CapabilityLevel::Extended,
            CapabilityArg::Research => CapabilityLevel::Research,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the fusion pipeline, reading signal events from stdin
    Start {
        /// Capability tier applied uniformly to all modules
        #[arg(long, value_enum, default_value_t = CapabilityArg::Core)]
        capability: CapabilityArg,

        /// Run the diagnostics HTTP server (requires the `server` feature)
        #[arg(long)]
        server: bool,

        /// Diagnostics server port (0 for random)
        #[arg(long, default_value = "0")]
        server_port: u16,
    },

    /// Show current configuration and cumulative transparency statistics
    Status,

    /// Display the privacy declaration
    Privacy,
}

#[derive(serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StdinEvent {
    Biosignal(BiosignalSample),
    Behavioral(BehavioralEvent),
    Context(ContextSample),
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Start {
            capability,
            server,
            server_port,
        } => cmd_start(capability.into(), server, server_port),
        Commands::Status => cmd_status(),
        Commands::Privacy => println!("{PRIVACY_DECLARATION}"),
    }
}

fn cmd_start(
    capability_level: CapabilityLevel,
    enable_server: bool,
    #[cfg_attr(not(feature = "server"), allow(unused_variables))] server_port: u16,
) {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config.log_level.clone()))
        .init();

    println!("synheart-hsi-core v{VERSION}");
    println!("Instance data dir: {:?}", config.data_path);

    let transparency = create_shared_log_with_persistence(config.data_path.join("transparency.json"));

    let consent: Box<dyn ConsentOracle> = Box::new(StaticConsentOracle::new(config.consent_record()));
    let capability: Box<dyn CapabilityOracle> =
        Box::new(StaticCapabilityOracle::new(capability_level));
    for module in [Module::Biosignal, Module::Behavior, Module::Context] {
        tracing::info!(?module, level = ?capability.capability(module), "capability tier");
    }

    let device = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown-device".to_string());
    let session_id = format!("SESS-{}", chrono::Utc::now().timestamp_millis());

    let (engine, hsv_rx) = FusionEngine::new(
        consent,
        capability,
        device,
        session_id,
        config.wear.sampling_rate_hz,
    );
    let engine = Arc::new(engine);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .expect("error setting Ctrl+C handler");

    let rt = tokio::runtime::Runtime::new().expect("failed to start async runtime");
    let block_on_transparency = transparency.clone();
    rt.block_on(async move {
        let transparency = block_on_transparency;
        #[cfg(feature = "server")]
        let _server_shutdown = if enable_server {
            match synheart_hsi_core::server::run(
                synheart_hsi_core::server::ServerConfig::new(server_port),
                transparency.clone(),
            )
            .await
            {
                Ok((addr, tx)) => {
                    println!("Diagnostics server listening on http://{addr}");
                    Some(tx)
                }
                Err(e) => {
                    eprintln!("Warning: diagnostics server failed to start: {e}");
                    None
                }
            }
        } else {
            None
        };
        #[cfg(not(feature = "server"))]
        if enable_server {
            eprintln!("Warning: --server ignored (server feature not enabled at compile time)");
        }

        let tick_transparency = transparency.clone();
        let tick_engine = engine.clone();
        let mut scheduler = WindowScheduler::start(Arc::new(move |wt| {
            tick_engine.tick(wt);
            tick_transparency.record_tick();
        }));

        #[cfg(feature = "gateway")]
        let upload_task = if config.cloud.enabled {
            let upload_client = Arc::new(UploadClient::new(UploadConfig {
                endpoint: config.cloud.endpoint.clone(),
                tenant_id: config.cloud.tenant_id.clone(),
                signing_key: std::env::var("SYNHEART_SIGNING_KEY")
                    .unwrap_or_default()
                    .into_bytes(),
                api_key: config.cloud.api_key.clone(),
                subject_id: config.cloud.subject_id.clone(),
                subject_type: config.cloud.subject_type.clone(),
                max_retries: config.cloud.max_retries,
                max_queue_size: config.cloud.max_queue_size,
            }));
            let mut hsv_rx = hsv_rx.clone();
            let upload_transparency = transparency.clone();
            Some(tokio::spawn(async move {
                let exporter = HsiExporter::new();
                loop {
                    if hsv_rx.changed().await.is_err() {
                        break;
                    }
                    let Some(hsv) = hsv_rx.borrow_and_update().clone() else {
                        continue;
                    };
                    let snapshot = exporter.export(&hsv);
                    upload_transparency.record_upload_attempted();
                    match upload_client.upload(&snapshot).await {
                        Ok(response) => {
                            tracing::info!(
                                snapshot_id = ?response.snapshot_id,
                                "upload succeeded"
                            );
                            upload_transparency.record_upload_succeeded();
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "upload failed, queuing for retry");
                            upload_client.queue.enqueue(snapshot);
                            upload_transparency.record_upload_failed();
                        }
                    }
                }
            }))
        } else {
            None
        };
        #[cfg(not(feature = "gateway"))]
        if config.cloud.enabled {
            eprintln!("Warning: cloud.enabled ignored (gateway feature not enabled at compile time)");
        }

        let published_transparency = transparency.clone();
        let mut published_rx = hsv_rx.clone();
        let publish_task = tokio::spawn(async move {
            loop {
                if published_rx.changed().await.is_err() {
                    break;
                }
                if published_rx.borrow().is_some() {
                    published_transparency.record_hsv_published();
                }
            }
        });

        let stdin_transparency = transparency.clone();
        let stdin_engine = engine.clone();
        let stdin_task = tokio::task::spawn_blocking(move || {
            use std::io::BufRead;
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<StdinEvent>(&line) {
                    Ok(StdinEvent::Biosignal(sample)) => {
                        stdin_transparency.record_biosignal_sample();
                        stdin_engine.push_biosignal(sample);
                    }
                    Ok(StdinEvent::Behavioral(event)) => {
                        stdin_transparency.record_behavioral_event();
                        stdin_engine.push_behavioral(event);
                    }
                    Ok(StdinEvent::Context(sample)) => {
                        stdin_transparency.record_context_sample();
                        stdin_engine.push_context(sample);
                    }
                    Err(e) => eprintln!("Warning: could not parse stdin line: {e}"),
                }
            }
        });

        println!("Press Ctrl+C to stop");
        while running.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }

        scheduler.stop();
        stdin_task.abort();
        publish_task.abort();
        #[cfg(feature = "gateway")]
        if let Some(task) = upload_task {
            task.abort();
        }
    });

    if let Err(e) = transparency.save() {
        eprintln!("Warning: could not save transparency log: {e}");
    }
    println!();
    println!("{}", transparency.summary());
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("synheart-hsi-core Status");
    println!("=========================");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "<error>".to_string())
    );
    println!();

    let stats_path = config.data_path.join("transparency.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            println!("Last persisted transparency stats:");
            println!("{content}");
        }
    } else {
        println!("No previous session data found.");
    }
}
