//! # Respuestas de la API
//! src/response.rs
//!
//! Traduce los resultados del registro a la respuesta que ve el cliente.
//!
//! ## Formato
//!
//! ```json
//! {"status": {"code": 0, "message": "Done"}}
//! {"status": {"code": 2001, "message": "NoSuchJob"}}
//! {"status": {"code": 0, "message": "Done"}, "jobs": {...}}
//! ```

use crate::jobs::{JobError, JobInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Estado de una respuesta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

/// Respuesta de la API: estado + campos adicionales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    pub fn success() -> Self {
        Self {
            status: Status {
                code: 0,
                message: "Done".to_string(),
            },
            extra: Map::new(),
        }
    }

    /// Respuesta exitosa con un campo adicional
    pub fn success_with(key: &str, value: Value) -> Self {
        let mut response = Self::success();
        response.extra.insert(key.to_string(), value);
        response
    }

    /// Respuesta de error para una señal del registro
    pub fn error(error: &JobError) -> Self {
        Self {
            status: Status {
                code: error.code(),
                message: error.name().to_string(),
            },
            extra: Map::new(),
        }
    }

    /// Respuesta con los descriptores de jobs bajo la clave `jobs`
    pub fn jobs(info: &HashMap<String, JobInfo>) -> serde_json::Result<Self> {
        let jobs = info
            .iter()
            .map(|(id, info)| Ok((id.clone(), serde_json::to_value(info)?)))
            .collect::<serde_json::Result<Map<String, Value>>>()?;
        Ok(Self::success_with("jobs", Value::Object(jobs)))
    }

    pub fn is_success(&self) -> bool {
        self.status.code == 0
    }

    /// Serializa la respuesta a JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Result<(), JobError>> for Response {
    fn from(result: Result<(), JobError>) -> Self {
        match result {
            Ok(()) => Response::success(),
            Err(error) => Response::error(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use serde_json::json;

    #[test]
    fn test_success() {
        let response = Response::success();
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": {"code": 0, "message": "Done"}})
        );
    }

    #[test]
    fn test_error_uses_signal_name() {
        let response = Response::error(&JobError::NoSuchJob("foo".to_string()));
        assert!(!response.is_success());
        assert_eq!(response.status.message, "NoSuchJob");
        assert_eq!(response.status.code, 2001);
    }

    #[test]
    fn test_from_result() {
        assert_eq!(Response::from(Ok::<(), JobError>(())), Response::success());
        assert_eq!(
            Response::from(Err::<(), JobError>(JobError::JobNotDone("a".to_string()))),
            Response::error(&JobError::JobNotDone("b".to_string()))
        );
    }

    #[test]
    fn test_jobs_response() {
        let info = HashMap::from([(
            "job-1".to_string(),
            JobInfo {
                id: "job-1".to_string(),
                status: JobStatus::Running,
                job_type: "sleep".to_string(),
                description: String::new(),
                progress: Some(50),
                error: None,
            },
        )]);

        let value: Value = serde_json::from_str(&Response::jobs(&info).unwrap().to_json()).unwrap();
        assert_eq!(value["status"]["code"], 0);
        assert_eq!(value["jobs"]["job-1"]["status"], "running");
        assert_eq!(value["jobs"]["job-1"]["progress"], 50);
        assert!(value["jobs"]["job-1"].get("error").is_none());
    }

    #[test]
    fn test_jobs_response_keeps_error_descriptor() {
        let info = HashMap::from([(
            "job-2".to_string(),
            JobInfo {
                id: "job-2".to_string(),
                status: JobStatus::Failed,
                job_type: "sleep".to_string(),
                description: "resize".to_string(),
                progress: None,
                error: Some(crate::jobs::ErrorInfo {
                    code: 100,
                    message: "General Exception: boom".to_string(),
                }),
            },
        )]);

        let response = Response::jobs(&info).unwrap();
        let job = &response.extra["jobs"]["job-2"];
        assert!(!job.is_null());
        assert_eq!(job["error"]["code"], 100);
        assert_eq!(job["description"], "resize");
    }

    #[test]
    fn test_success_with_round_trip() {
        let response = Response::success_with("count", json!(3));
        let parsed: Response = serde_json::from_str(&response.to_json()).unwrap();
        assert_eq!(parsed, response);
        assert_eq!(parsed.extra["count"], 3);
    }
}
