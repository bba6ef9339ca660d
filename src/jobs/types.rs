//! # Tipos y Estructuras para el Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define el estado de un job y el descriptor que se expone hacia afuera.

use crate::jobs::error::ErrorInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado de un job
///
/// `Pending` y `Running` son activos; el resto son terminales y
/// ninguna transición sale de ellos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job creado, esperando ser ejecutado
    Pending,

    /// Job ejecutándose actualmente
    Running,

    /// Job completado exitosamente
    Done,

    /// El trabajo del job falló
    Failed,

    /// Job abortado por un cliente
    Aborted,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Aborted => "aborted",
        }
    }

    /// Verifica si el job sigue activo (pending o running)
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Verifica si el job está en estado terminal
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor de solo lectura de un job
///
/// Es la foto canónica que cruza el límite del sistema. `progress` y
/// `error` se omiten del JSON cuando no existen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    /// ID único del job
    pub id: String,

    /// Estado actual
    pub status: JobStatus,

    /// Tipo de operación
    pub job_type: String,

    /// Descripción libre
    pub description: String,

    /// Progreso (0-100), solo si la operación lo reporta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    /// Error estructurado, solo si el job falló
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}
