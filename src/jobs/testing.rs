//! Jobs y colaboradores falsos para los tests unitarios.

use crate::config::Settings;
use crate::jobs::error::{StructuredError, WorkError};
use crate::jobs::job::{CancelToken, Cancellable, ProgressCell, Work};
use crate::schedule::{Callback, ScheduledCall, Scheduler};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Evento de un solo disparo, observable desde otro thread
#[derive(Clone, Default)]
pub(crate) struct Event(Arc<CancelToken>);

impl Event {
    pub(crate) fn set(&self) {
        self.0.cancel();
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.is_cancelled()
    }

    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        self.0.wait_timeout(timeout)
    }
}

/// Error de dominio de prueba
#[derive(Debug, Error)]
#[error("Storage domain is not reachable")]
pub(crate) struct StorageFailure;

impl StorageFailure {
    pub(crate) const CODE: i32 = 358;
}

impl StructuredError for StorageFailure {
    fn code(&self) -> i32 {
        Self::CODE
    }
}

enum Failure {
    Error(WorkError),
    Panic(&'static str),
}

/// Job configurable: tipo, autodelete, abortable y falla opcional
pub(crate) struct TestingJob {
    job_type: &'static str,
    autodelete: bool,
    abortable: bool,
    failure: Mutex<Option<Failure>>,
    ran: Event,
    aborted: Event,
}

impl TestingJob {
    pub(crate) fn new() -> Self {
        Self {
            job_type: "testing",
            autodelete: false,
            abortable: true,
            failure: Mutex::new(None),
            ran: Event::default(),
            aborted: Event::default(),
        }
    }

    pub(crate) fn with_type(mut self, job_type: &'static str) -> Self {
        self.job_type = job_type;
        self
    }

    pub(crate) fn autodelete(mut self) -> Self {
        self.autodelete = true;
        self
    }

    pub(crate) fn not_abortable(mut self) -> Self {
        self.abortable = false;
        self
    }

    pub(crate) fn failing(self, error: WorkError) -> Self {
        *self.failure.lock().unwrap() = Some(Failure::Error(error));
        self
    }

    pub(crate) fn panicking(self, message: &'static str) -> Self {
        *self.failure.lock().unwrap() = Some(Failure::Panic(message));
        self
    }

    pub(crate) fn ran_flag(&self) -> Event {
        self.ran.clone()
    }

    pub(crate) fn aborted_flag(&self) -> Event {
        self.aborted.clone()
    }
}

impl Cancellable for TestingJob {
    fn cancel(&self) {
        self.aborted.set();
    }
}

impl Work for TestingJob {
    fn job_type(&self) -> &str {
        self.job_type
    }

    fn run(&self) -> Result<(), WorkError> {
        self.ran.set();
        let failure = self.failure.lock().unwrap().take();
        match failure {
            None => Ok(()),
            Some(Failure::Error(error)) => Err(error),
            Some(Failure::Panic(message)) => panic!("{}", message),
        }
    }

    fn cancellable(&self) -> Option<&dyn Cancellable> {
        if self.abortable {
            Some(self)
        } else {
            None
        }
    }

    fn autodelete(&self) -> bool {
        self.autodelete
    }
}

/// Job que se queda esperando hasta que lo aborten (máximo 1 segundo)
pub(crate) struct StuckJob {
    running: Event,
    token: CancelToken,
    fail_after_abort: bool,
}

impl StuckJob {
    pub(crate) fn new() -> Self {
        Self {
            running: Event::default(),
            token: CancelToken::new(),
            fail_after_abort: false,
        }
    }

    /// Falla al despertar, para probar que el abort gana
    pub(crate) fn failing_after_abort(mut self) -> Self {
        self.fail_after_abort = true;
        self
    }

    pub(crate) fn running_event(&self) -> Event {
        self.running.clone()
    }
}

impl Work for StuckJob {
    fn job_type(&self) -> &str {
        "testing"
    }

    fn run(&self) -> Result<(), WorkError> {
        self.running.set();
        let cancelled = self.token.wait_timeout(Duration::from_secs(1));
        if cancelled && self.fail_after_abort {
            return Err(WorkError::msg("interrupted while waiting"));
        }
        Ok(())
    }

    fn cancellable(&self) -> Option<&dyn Cancellable> {
        Some(&self.token)
    }
}

/// Job que reporta progreso, sin hook de cancelación
pub(crate) struct ProgressingJob {
    progress: Arc<ProgressCell>,
}

impl ProgressingJob {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(ProgressCell::new()),
        }
    }

    pub(crate) fn handle(&self) -> Arc<ProgressCell> {
        Arc::clone(&self.progress)
    }
}

impl Work for ProgressingJob {
    fn job_type(&self) -> &str {
        "progressing"
    }

    fn run(&self) -> Result<(), WorkError> {
        Ok(())
    }

    fn progress(&self) -> Option<u8> {
        self.progress.get()
    }
}

/// Scheduler que solo registra las llamadas
#[derive(Default)]
pub(crate) struct FakeScheduler {
    calls: Mutex<Vec<(Duration, Option<Callback>)>>,
}

impl FakeScheduler {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(delay, _)| *delay).collect()
    }

    /// Ejecuta el callback de la llamada `index`
    pub(crate) fn fire(&self, index: usize) {
        let callback = self.calls.lock().unwrap()[index].1.take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&self, delay: Duration, callback: Callback) -> ScheduledCall {
        self.calls.lock().unwrap().push((delay, Some(callback)));
        ScheduledCall::new(delay)
    }
}

/// Configuración fija para los tests
pub(crate) struct FakeSettings {
    pub(crate) autodelete_delay: i64,
}

impl FakeSettings {
    pub(crate) fn with_delay(autodelete_delay: i64) -> Arc<Self> {
        Arc::new(Self { autodelete_delay })
    }
}

impl Settings for FakeSettings {
    fn autodelete_delay(&self) -> i64 {
        self.autodelete_delay
    }
}
