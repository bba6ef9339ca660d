//! # Job de Espera
//! src/jobs/sleep.rs
//!
//! Operación concreta mínima: espera un tiempo fijo en pasos, reporta
//! progreso y se puede abortar. La usan el daemon de demostración y los
//! tests de integración.

use crate::jobs::error::WorkError;
use crate::jobs::job::{CancelToken, Cancellable, ProgressCell, Work};
use std::time::Duration;
use tracing::debug;

/// Cantidad de pasos en que se divide la espera
const STEPS: u32 = 10;

pub struct SleepJob {
    duration: Duration,
    autodelete: bool,
    token: CancelToken,
    progress: ProgressCell,
}

impl SleepJob {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            autodelete: false,
            token: CancelToken::new(),
            progress: ProgressCell::new(),
        }
    }

    pub fn with_autodelete(mut self, autodelete: bool) -> Self {
        self.autodelete = autodelete;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Work for SleepJob {
    fn job_type(&self) -> &str {
        "sleep"
    }

    fn run(&self) -> Result<(), WorkError> {
        let step = self.duration / STEPS;
        self.progress.set(0);

        for i in 1..=STEPS {
            if self.token.wait_timeout(step) {
                debug!(step = i, "Sleep interrupted");
                return Ok(());
            }
            self.progress.set((i * 100 / STEPS) as u8);
        }
        Ok(())
    }

    fn cancellable(&self) -> Option<&dyn Cancellable> {
        Some(&self.token)
    }

    fn progress(&self) -> Option<u8> {
        self.progress.get()
    }

    fn autodelete(&self) -> bool {
        self.autodelete
    }
}
