//! # Estructura de Job
//! src/jobs/job.rs
//!
//! Representa una operación asíncrona con estado, progreso y error.
//!
//! ## Máquina de estados
//!
//! ```text
//! PENDING ──run()──▶ RUNNING ──▶ DONE | FAILED
//!    │                  │
//!    └────abort()───────┴──────▶ ABORTED
//! ```
//!
//! El estado, el error y la decisión terminal están protegidos por un
//! único `Mutex`. El trabajo corre fuera del lock; al terminar, `run()`
//! vuelve a leer el estado y solo escribe DONE/FAILED si sigue en
//! RUNNING. Así, si `abort()` escribió ABORTED primero, gana el abort.

use crate::jobs::error::{JobError, StructuredError, WorkError};
use crate::jobs::manager::RegistryInner;
use crate::jobs::types::{JobInfo, JobStatus};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Trabajo concreto que ejecuta un job
///
/// `job_type` y `run` son obligatorios. Cancelación, progreso y
/// autodelete son capacidades opcionales.
pub trait Work: Send + Sync {
    /// Etiqueta del tipo de operación
    fn job_type(&self) -> &str;

    /// Ejecuta el trabajo en el thread que llamó a `Job::run`
    fn run(&self) -> Result<(), WorkError>;

    /// Hook de cancelación cooperativa; `None` si el trabajo no se puede abortar
    fn cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }

    /// Progreso actual (0-100), si el trabajo lo reporta
    fn progress(&self) -> Option<u8> {
        None
    }

    /// Si el job debe borrarse solo del registro al terminar
    fn autodelete(&self) -> bool {
        false
    }

    /// Nombre usado en la representación textual del job
    fn kind(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Hook de cancelación cooperativa
///
/// Solo debe despertar lo que el trabajo esté esperando; nunca espera a
/// que el trabajo termine.
pub trait Cancellable: Send + Sync {
    fn cancel(&self);
}

/// Token de cancelación: flag + condvar
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marca el token como cancelado y despierta a todos los que esperan
    pub fn cancel(&self) {
        let mut cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Espera hasta `timeout` o hasta la cancelación
    ///
    /// Retorna `true` si el token fue cancelado.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        let (cancelled, _) = self
            .condvar
            .wait_timeout_while(cancelled, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }
}

impl Cancellable for CancelToken {
    fn cancel(&self) {
        CancelToken::cancel(self);
    }
}

/// Progreso opcional, compartido entre el trabajo y los lectores
#[derive(Debug, Default)]
pub struct ProgressCell {
    value: Mutex<Option<u8>>,
}

impl ProgressCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<u8> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Actualiza el progreso (se limita a 100)
    pub fn set(&self, progress: u8) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(progress.min(100));
    }

    pub fn clear(&self) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Datos internos mutables del job
struct JobState {
    status: JobStatus,
    error: Option<Arc<dyn StructuredError>>,
}

/// Representa un job individual
pub struct Job {
    /// ID único, fijado por quien crea el job
    id: String,

    /// Descripción libre
    description: String,

    /// Trabajo concreto
    work: Box<dyn Work>,

    /// Estado mutable (protegido por Mutex)
    state: Mutex<JobState>,

    /// Registro al que pertenece, para el autodelete
    registry: Mutex<Weak<RegistryInner>>,
}

impl Job {
    /// Crea un nuevo job en estado PENDING
    pub fn new(id: impl Into<String>, work: impl Work + 'static) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            work: Box::new(work),
            state: Mutex::new(JobState {
                status: JobStatus::Pending,
                error: None,
            }),
            registry: Mutex::new(Weak::new()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn job_type(&self) -> &str {
        self.work.job_type()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn autodelete(&self) -> bool {
        self.work.autodelete()
    }

    /// Obtiene el estado actual
    pub fn status(&self) -> JobStatus {
        self.lock_state().status
    }

    /// Verifica si el job sigue activo
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Progreso reportado por el trabajo
    pub fn progress(&self) -> Option<u8> {
        self.work.progress()
    }

    /// Error del trabajo; solo existe si el job falló
    pub fn error(&self) -> Option<Arc<dyn StructuredError>> {
        self.lock_state().error.clone()
    }

    /// Ejecuta el job
    ///
    /// Un job abortado antes de empezar no hace nada. Las fallas del
    /// trabajo quedan guardadas en el job y nunca salen de aquí.
    ///
    /// # Panics
    ///
    /// Si el job está en RUNNING, DONE o FAILED: ejecutar dos veces un
    /// job es un error de programación.
    pub fn run(&self) {
        {
            let mut state = self.lock_state();
            let current = state.status;
            match current {
                JobStatus::Pending => state.status = JobStatus::Running,
                JobStatus::Aborted => {
                    debug!(job_id = %self.id, "Job was aborted before it started, skipping");
                    return;
                }
                status => {
                    drop(state);
                    error!(job_id = %self.id, status = %status, "Attempt to run job in invalid state");
                    panic!("Attempt to run job {} from state {}", self.id, status);
                }
            }
        }
        debug!(job_id = %self.id, job_type = self.job_type(), "Job running");

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.work.run())) {
            Ok(result) => result,
            Err(payload) => Err(WorkError::Other(panic_message(payload.as_ref()))),
        };

        let finished = {
            let mut state = self.lock_state();
            if state.status != JobStatus::Running {
                if let Err(discarded) = &outcome {
                    debug!(job_id = %self.id, error = %discarded, "Discarding failure of aborted job");
                }
                None
            } else {
                match outcome {
                    Ok(()) => state.status = JobStatus::Done,
                    Err(failure) => {
                        let failure = failure.into_structured();
                        warn!(job_id = %self.id, error = %failure, "Job failed");
                        state.error = Some(failure);
                        state.status = JobStatus::Failed;
                    }
                }
                Some(state.status)
            }
        };

        if let Some(status) = finished {
            info!(job_id = %self.id, status = %status, "Job finished");
            self.request_autodelete();
        }
    }

    /// Solicita la cancelación cooperativa del job
    ///
    /// ABORTED se escribe antes de invocar el hook, así un `run()`
    /// concurrente lo ve al terminar el trabajo.
    pub fn abort(&self) -> Result<(), JobError> {
        let hook = {
            let mut state = self.lock_state();
            if !state.status.is_active() {
                return Err(JobError::JobNotActive(self.id.clone()));
            }
            let Some(hook) = self.work.cancellable() else {
                return Err(JobError::AbortNotSupported(self.id.clone()));
            };
            state.status = JobStatus::Aborted;
            hook
        };

        info!(job_id = %self.id, "Job aborted");
        hook.cancel();
        self.request_autodelete();
        Ok(())
    }

    /// Foto de solo lectura del job
    pub fn info(&self) -> JobInfo {
        let (status, error) = {
            let state = self.lock_state();
            (state.status, state.error.as_ref().map(|error| error.info()))
        };

        JobInfo {
            id: self.id.clone(),
            status,
            job_type: self.job_type().to_string(),
            description: self.description.clone(),
            progress: self.progress(),
            error,
        }
    }

    /// Asocia el job al registro que lo acaba de aceptar
    ///
    /// Reemplaza cualquier asociación previa: el autodelete siempre apunta
    /// al último registro que recibió el job.
    pub(crate) fn bind(&self, registry: Weak<RegistryInner>) {
        let mut bound = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if bound.strong_count() > 0 && !bound.ptr_eq(&registry) {
            warn!(job_id = %self.id, "Job moved to another registry");
        }
        *bound = registry;
    }

    /// Llamado una sola vez, por quien escribió el estado terminal
    fn request_autodelete(&self) {
        if !self.autodelete() {
            return;
        }
        let registry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade();
        match registry {
            Some(registry) => RegistryInner::schedule_autodelete(&registry, &self.id),
            None => debug!(job_id = %self.id, "Job is not registered, skipping autodelete"),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn force_status(&self, status: JobStatus) {
        self.lock_state().status = status;
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} id={}, status={}", self.work.kind(), self.id, self.status())?;
        if let Some(progress) = self.progress() {
            write!(f, ", progress={}%", progress)?;
        }
        f.write_str(">")
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// `crate::a::b::Foo<T>` -> `Foo`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Texto de un payload de panic
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
