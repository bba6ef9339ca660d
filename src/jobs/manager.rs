//! # Registro Central de Jobs
//! src/jobs/manager.rs
//!
//! Mapa id -> job compartido por todo el proceso. Todas las consultas y
//! operaciones de ciclo de vida entre jobs pasan por aquí.
//!
//! El registro es un objeto de contexto: se construye con su fuente de
//! configuración, se le asocia el scheduler con `start()` y se pasa a
//! quien despacha jobs. `clone()` comparte el mismo estado.

use crate::config::Settings;
use crate::jobs::error::JobError;
use crate::jobs::job::Job;
use crate::jobs::types::JobInfo;
use crate::schedule::Scheduler;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Estado compartido del registro
pub(crate) struct RegistryInner {
    /// Jobs registrados (job_id -> job)
    jobs: Mutex<HashMap<String, Arc<Job>>>,

    /// Colaborador que ejecuta el autodelete
    scheduler: RwLock<Option<Arc<dyn Scheduler>>>,

    /// Fuente del retardo de autodelete
    settings: Arc<dyn Settings>,
}

impl RegistryInner {
    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<String, Arc<Job>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Programa el borrado diferido de un job terminado
    ///
    /// Lo llama el propio job, una vez por transición terminal.
    pub(crate) fn schedule_autodelete(inner: &Arc<RegistryInner>, job_id: &str) {
        let delay = inner.settings.autodelete_delay();
        if delay < 0 {
            debug!(job_id, delay, "Autodelete disabled");
            return;
        }

        let scheduler = inner
            .scheduler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(scheduler) = scheduler else {
            warn!(job_id, "No scheduler bound, job will not be autodeleted");
            return;
        };

        debug!(job_id, delay, "Scheduling job autodelete");
        let registry = Arc::downgrade(inner);
        let id = job_id.to_string();
        scheduler.schedule(
            Duration::from_secs(delay.unsigned_abs()),
            Box::new(move || {
                if let Some(inner) = registry.upgrade() {
                    inner.remove(&id);
                }
            }),
        );
    }

    /// Borra sin validar el estado: el job ya es terminal
    fn remove(&self, job_id: &str) {
        if self.lock_jobs().remove(job_id).is_some() {
            info!(job_id, "Job autodeleted");
        }
    }
}

/// Registro de jobs del proceso
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<RegistryInner>,
}

impl JobRegistry {
    /// Crea un registro vacío, todavía sin scheduler
    pub fn new(settings: Arc<dyn Settings>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                jobs: Mutex::new(HashMap::new()),
                scheduler: RwLock::new(None),
                settings,
            }),
        }
    }

    /// Asocia el scheduler usado por el autodelete
    pub fn start(&self, scheduler: Arc<dyn Scheduler>) {
        let previous = self
            .inner
            .scheduler
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(scheduler);
        if previous.is_some() {
            warn!("Job registry started twice, replacing scheduler");
        } else {
            info!("Job registry started");
        }
    }

    /// Borra todos los jobs sin ejecutar ninguna limpieza
    pub fn clear(&self) {
        let removed = {
            let mut jobs = self.inner.lock_jobs();
            let count = jobs.len();
            jobs.clear();
            count
        };
        debug!(removed, "Job registry cleared");
    }

    /// Registra un job
    pub fn add(&self, job: Arc<Job>) -> Result<(), JobError> {
        let mut jobs = self.inner.lock_jobs();
        if jobs.contains_key(job.id()) {
            return Err(JobError::JobExistsError(job.id().to_string()));
        }

        job.bind(Arc::downgrade(&self.inner));
        info!(job_id = job.id(), job_type = job.job_type(), "Job added");
        jobs.insert(job.id().to_string(), job);
        Ok(())
    }

    /// Obtiene un job por ID
    pub fn get(&self, job_id: &str) -> Result<Arc<Job>, JobError> {
        self.inner
            .lock_jobs()
            .get(job_id)
            .cloned()
            .ok_or_else(|| JobError::NoSuchJob(job_id.to_string()))
    }

    /// Descriptores de los jobs registrados
    ///
    /// Los filtros se intersectan: un job debe cumplir todos los que se
    /// pasen. Sin filtros se devuelven todos.
    pub fn info(
        &self,
        job_type: Option<&str>,
        job_ids: Option<&[String]>,
    ) -> HashMap<String, JobInfo> {
        let wanted: Option<HashSet<&str>> =
            job_ids.map(|ids| ids.iter().map(String::as_str).collect());

        self.inner
            .lock_jobs()
            .iter()
            .filter(|(_, job)| job_type.map_or(true, |job_type| job.job_type() == job_type))
            .filter(|(id, _)| wanted.as_ref().map_or(true, |ids| ids.contains(id.as_str())))
            .map(|(id, job)| (id.clone(), job.info()))
            .collect()
    }

    /// Aborta un job
    pub fn abort(&self, job_id: &str) -> Result<(), JobError> {
        // El hook de cancelación corre sin el lock del registro
        let job = self.get(job_id)?;
        job.abort()
    }

    /// Borra un job terminado
    pub fn delete(&self, job_id: &str) -> Result<(), JobError> {
        let mut jobs = self.inner.lock_jobs();
        let job = jobs
            .get(job_id)
            .ok_or_else(|| JobError::NoSuchJob(job_id.to_string()))?;
        if job.is_active() {
            return Err(JobError::JobNotDone(job_id.to_string()));
        }

        jobs.remove(job_id);
        info!(job_id, "Job deleted");
        Ok(())
    }

    /// Número de jobs registrados
    pub fn len(&self) -> usize {
        self.inner.lock_jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
