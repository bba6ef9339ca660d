//! # Configuración del Daemon
//! src/config.rs
//!
//! Configuración del subsistema de jobs con soporte para argumentos CLI y
//! variables de entorno, más el proveedor recargable que consulta el
//! registro en cada transición terminal.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./host_jobs --workers 4 \
//!   --queue-capacity 64 \
//!   --autodelete-delay -1
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! JOBS_WORKERS=8 JOBS_AUTODELETE_DELAY=600 ./host_jobs
//! ```

use clap::{Parser, ValueEnum};
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use tracing::info;

/// Formato de salida de los logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Errores de validación de la configuración
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Workers must be >= 1")]
    NoWorkers,

    #[error("Queue capacity must be >= 1")]
    NoQueueCapacity,
}

/// Configuración del daemon de jobs
#[derive(Debug, Clone, Parser)]
#[command(name = "host_jobs")]
#[command(about = "Subsistema de jobs asíncronos de un daemon de gestión de hosts")]
#[command(version = "0.1.0")]
pub struct Config {
    // === Workers ===

    /// Número de threads que ejecutan jobs
    #[arg(long, default_value = "4", env = "JOBS_WORKERS")]
    pub workers: usize,

    /// Capacidad máxima de la cola de despacho
    #[arg(long = "queue-capacity", default_value = "1000", env = "JOBS_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Jobs ===

    /// Segundos antes de borrar un job terminado (negativo = deshabilitado)
    #[arg(
        long = "autodelete-delay",
        default_value = "3600",
        env = "JOBS_AUTODELETE_DELAY",
        allow_negative_numbers = true
    )]
    pub autodelete_delay: i64,

    // === Logging ===

    /// Nivel de log (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "JOBS_LOG_LEVEL")]
    pub log_level: String,

    /// Formato de log
    #[arg(long = "log-format", value_enum, default_value = "compact", env = "JOBS_LOG_FORMAT")]
    pub log_format: LogFormat,

    // === Demo ===

    /// Cantidad de jobs de demostración a ejecutar
    #[arg(long = "demo-jobs", default_value = "3", env = "JOBS_DEMO_JOBS")]
    pub demo_jobs: usize,

    /// Duración de cada job de demostración en milisegundos
    #[arg(long = "demo-duration-ms", default_value = "2000", env = "JOBS_DEMO_DURATION_MS")]
    pub demo_duration_ms: u64,

    /// Abortar el primer job de demostración
    #[arg(long = "demo-abort", env = "JOBS_DEMO_ABORT")]
    pub demo_abort: bool,
}

impl Config {
    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        Ok(())
    }

    /// Autodelete habilitado?
    pub fn autodelete_enabled(&self) -> bool {
        self.autodelete_delay >= 0
    }

    /// Registra un resumen de la configuración efectiva
    pub fn log_summary(&self) {
        info!(
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            "Worker pool"
        );
        if self.autodelete_enabled() {
            info!(delay_secs = self.autodelete_delay, "Job autodelete enabled");
        } else {
            info!("Job autodelete disabled");
        }
        info!(
            jobs = self.demo_jobs,
            duration_ms = self.demo_duration_ms,
            abort = self.demo_abort,
            "Demo jobs"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1000,
            autodelete_delay: 3600,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            demo_jobs: 3,
            demo_duration_ms: 2000,
            demo_abort: false,
        }
    }
}

/// Fuente de configuración que consulta el registro de jobs
///
/// Se lee en cada transición terminal, así que los cambios aplican sin
/// reiniciar.
pub trait Settings: Send + Sync {
    /// `jobs.autodelete_delay`, en segundos; negativo deshabilita
    fn autodelete_delay(&self) -> i64;
}

/// Configuración recargable en caliente
#[derive(Debug)]
pub struct LiveSettings {
    autodelete_delay: AtomicI64,
}

impl LiveSettings {
    pub fn new(autodelete_delay: i64) -> Self {
        Self {
            autodelete_delay: AtomicI64::new(autodelete_delay),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.autodelete_delay)
    }

    /// Toma los valores de una configuración nueva
    pub fn reload(&self, config: &Config) {
        self.set_autodelete_delay(config.autodelete_delay);
        info!(autodelete_delay = config.autodelete_delay, "Settings reloaded");
    }

    pub fn set_autodelete_delay(&self, delay: i64) {
        self.autodelete_delay.store(delay, Ordering::SeqCst);
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Settings for LiveSettings {
    fn autodelete_delay(&self) -> i64 {
        self.autodelete_delay.load(Ordering::SeqCst)
    }
}
