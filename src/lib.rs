//! # Host Jobs
//! src/lib.rs
//!
//! Subsistema de jobs asíncronos de un daemon de gestión de hosts: las
//! operaciones largas se registran como jobs cuyo estado, progreso y error
//! pueden consultar los clientes mientras corren.
//!
//! ## Arquitectura
//!
//! - `jobs`: Máquina de estados, registro, cola de despacho y errores
//! - `schedule`: Llamadas diferidas (autodelete de jobs terminados)
//! - `config`: Argumentos CLI, variables de entorno y configuración recargable
//! - `response`: Respuestas `{status: {code, message}}` de la API
//! - `logging`: Inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use host_jobs::config::LiveSettings;
//! use host_jobs::jobs::{Job, JobExecutor, JobRegistry, SleepJob};
//! use host_jobs::schedule::TimerScheduler;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let scheduler = Arc::new(TimerScheduler::start()?);
//! let registry = JobRegistry::new(Arc::new(LiveSettings::default()));
//! registry.start(scheduler);
//!
//! let executor = JobExecutor::start(2, 16)?;
//! let job = Arc::new(Job::new("job-1", SleepJob::new(Duration::from_secs(1))));
//! registry.add(Arc::clone(&job))?;
//! executor.dispatch(job)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod jobs;
pub mod logging;
pub mod response;
pub mod schedule;
