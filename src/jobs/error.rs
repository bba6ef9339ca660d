//! # Errores del Sistema de Jobs
//! src/jobs/error.rs
//!
//! Dos familias de errores:
//!
//! - [`JobError`]: señales que el registro devuelve a quien lo llama
//!   (job inexistente, job duplicado, abort inválido, delete inválido).
//! - [`StructuredError`]: fallas del trabajo de un job. Se guardan dentro
//!   del job y solo se observan a través de `info()` / `error()`.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Señales devueltas por las operaciones del registro
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Job {0} does not exist")]
    NoSuchJob(String),

    #[error("Job {0} already exists")]
    JobExistsError(String),

    #[error("Job {0} is not active")]
    JobNotActive(String),

    #[error("Job {0} does not support abort")]
    AbortNotSupported(String),

    #[error("Job {0} is not done")]
    JobNotDone(String),
}

impl JobError {
    /// Nombre canónico de la señal, usado en las respuestas de la API
    pub fn name(&self) -> &'static str {
        match self {
            JobError::NoSuchJob(_) => "NoSuchJob",
            JobError::JobExistsError(_) => "JobExistsError",
            JobError::JobNotActive(_) => "JobNotActive",
            JobError::AbortNotSupported(_) => "AbortNotSupported",
            JobError::JobNotDone(_) => "JobNotDone",
        }
    }

    /// Código numérico estable de la señal
    pub fn code(&self) -> i32 {
        match self {
            JobError::NoSuchJob(_) => 2001,
            JobError::JobExistsError(_) => 2002,
            JobError::JobNotActive(_) => 2003,
            JobError::AbortNotSupported(_) => 2004,
            JobError::JobNotDone(_) => 2005,
        }
    }

    /// ID del job involucrado
    pub fn job_id(&self) -> &str {
        match self {
            JobError::NoSuchJob(id)
            | JobError::JobExistsError(id)
            | JobError::JobNotActive(id)
            | JobError::AbortNotSupported(id)
            | JobError::JobNotDone(id) => id,
        }
    }
}

/// Descriptor de un error estructurado
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: i32,
    pub message: String,
}

/// Permite recuperar el tipo concreto detrás de un `dyn StructuredError`
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Falla introspectable de un job
///
/// Los errores de dominio implementan este trait y se guardan tal cual;
/// cualquier otra falla se envuelve en [`GeneralError`].
pub trait StructuredError: std::error::Error + AsAny + Send + Sync {
    /// Código numérico del error
    fn code(&self) -> i32;

    /// Descriptor estructurado: código + mensaje legible
    fn info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl dyn StructuredError {
    /// Intenta obtener el error concreto
    pub fn downcast_ref<T: StructuredError + 'static>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    /// Verifica si el error es del tipo `T`
    pub fn is<T: StructuredError + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

/// Error genérico: envuelve la representación textual de cualquier falla
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("General Exception: {message}")]
pub struct GeneralError {
    message: String,
}

impl GeneralError {
    pub const CODE: i32 = 100;

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Texto original de la falla
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl StructuredError for GeneralError {
    fn code(&self) -> i32 {
        Self::CODE
    }
}

/// Resultado fallido del trabajo de un job
///
/// Cualquier `std::error::Error` se convierte con `?` en
/// `WorkError::Other`. Los errores de dominio deben construirse con
/// [`WorkError::structured`] para conservar su tipo.
pub enum WorkError {
    /// Error de dominio que ya es estructurado
    Structured(Arc<dyn StructuredError>),

    /// Cualquier otra falla, como texto
    Other(String),
}

impl WorkError {
    pub fn structured<E: StructuredError + 'static>(error: E) -> Self {
        WorkError::Structured(Arc::new(error))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        WorkError::Other(message.into())
    }

    /// Aplica la regla de envoltura: lo estructurado pasa intacto,
    /// lo genérico se convierte en `GeneralError`
    pub fn into_structured(self) -> Arc<dyn StructuredError> {
        match self {
            WorkError::Structured(error) => error,
            WorkError::Other(message) => Arc::new(GeneralError::new(message)),
        }
    }
}

impl<E> From<E> for WorkError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        WorkError::Other(error.to_string())
    }
}

impl fmt::Debug for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkError::Structured(error) => f.debug_tuple("Structured").field(error).finish(),
            WorkError::Other(message) => f.debug_tuple("Other").field(message).finish(),
        }
    }
}

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkError::Structured(error) => write!(f, "{}", error),
            WorkError::Other(message) => f.write_str(message),
        }
    }
}
