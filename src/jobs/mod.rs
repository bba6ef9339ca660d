//! # Sistema de Jobs
//!
//! Seguimiento de operaciones largas pedidas por clientes externos:
//! estado, progreso y error consultables, cancelación cooperativa y
//! borrado automático de los jobs terminados.
//!
//! ## Flujo
//!
//! 1. Quien llama crea un [`Job`] con su [`Work`] y lo registra con
//!    [`JobRegistry::add`].
//! 2. Un worker ([`JobExecutor`]) llama a [`Job::run`].
//! 3. Al llegar a un estado terminal, si el trabajo pide autodelete, el
//!    job le pide al scheduler que lo borre del registro más tarde.
//!
//! Cualquier thread puede llamar a [`JobRegistry::abort`] mientras tanto.

pub mod error;
pub mod job;
pub mod manager;
pub mod queue;
pub mod sleep;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorInfo, GeneralError, JobError, StructuredError, WorkError};
pub use job::{CancelToken, Cancellable, Job, ProgressCell, Work};
pub use manager::JobRegistry;
pub use queue::{ExecutorError, JobExecutor};
pub use sleep::SleepJob;
pub use types::{JobInfo, JobStatus};
