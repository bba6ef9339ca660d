//! # Host Jobs - Entry Point
//! src/main.rs
//!
//! Levanta el subsistema de jobs, despacha unos jobs de demostración y
//! muestra el estado final del registro.

use clap::Parser;
use host_jobs::config::{Config, LiveSettings};
use host_jobs::jobs::{Job, JobExecutor, JobRegistry, SleepJob};
use host_jobs::logging;
use host_jobs::response::Response;
use host_jobs::schedule::TimerScheduler;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Intervalo de sondeo mientras quedan jobs activos
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() {
    let config = Config::parse();

    if let Err(e) = logging::init(&config.log_level, config.log_format) {
        eprintln!("Error al inicializar logging: {}", e);
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), Box<dyn Error>> {
    info!("Starting host jobs daemon");
    config.log_summary();

    let settings = Arc::new(LiveSettings::from_config(&config));
    let scheduler = Arc::new(TimerScheduler::start()?);
    let registry = JobRegistry::new(settings);
    registry.start(scheduler.clone());
    let executor = JobExecutor::start(config.workers, config.queue_capacity)?;

    let duration = Duration::from_millis(config.demo_duration_ms);
    let mut ids = Vec::with_capacity(config.demo_jobs);
    for n in 0..config.demo_jobs {
        let id = Uuid::new_v4().to_string();
        let job = Arc::new(
            Job::new(id.clone(), SleepJob::new(duration).with_autodelete(true))
                .with_description(format!("demo sleep #{}", n)),
        );

        registry.add(Arc::clone(&job))?;
        executor.dispatch(job)?;
        ids.push(id);
    }

    if config.demo_abort {
        if let Some(first) = ids.first() {
            let response = Response::from(registry.abort(first));
            info!(job_id = %first, response = %response.to_json(), "Abort requested");
        }
    }

    while registry
        .info(None, Some(ids.as_slice()))
        .values()
        .any(|info| info.status.is_active())
    {
        thread::sleep(POLL_INTERVAL);
    }

    let response = Response::jobs(&registry.info(None, None))?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if scheduler.pending() > 0 {
        warn!(
            pending = scheduler.pending(),
            "Stopping with autodeletes still pending"
        );
    }

    executor.stop();
    scheduler.stop();
    info!("Host jobs daemon stopped");
    Ok(())
}
