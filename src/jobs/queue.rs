//! # Cola de Despacho de Jobs
//! src/jobs/queue.rs
//!
//! Cola FIFO thread-safe más un pool de workers. Cada worker toma un job
//! y llama a `Job::run()` en su propio thread hasta que termina.

use crate::jobs::job::{panic_message, Job};
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error};

/// Errores al despachar un job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Queue is full (max capacity: {capacity})")]
    QueueFull { capacity: usize },

    #[error("Executor is stopped")]
    Stopped,
}

struct QueueState {
    jobs: VecDeque<Arc<Job>>,
    running: bool,
}

struct QueueShared {
    state: Mutex<QueueState>,

    /// Notifica a los workers cuando hay nuevos jobs
    condvar: Condvar,
}

impl QueueShared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pool de workers que ejecuta jobs
pub struct JobExecutor {
    shared: Arc<QueueShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    max_capacity: usize,
}

impl JobExecutor {
    /// Crea la cola e inicia `workers` threads
    pub fn start(workers: usize, max_capacity: usize) -> io::Result<Self> {
        let shared = Arc::new(QueueShared {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                running: true,
            }),
            condvar: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let shared = Arc::clone(&shared);
            let name = format!("jobs-worker-{}", i);
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, shared))?;
            handles.push(handle);
        }

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            max_capacity,
        })
    }

    /// Encola un job para ejecución
    pub fn dispatch(&self, job: Arc<Job>) -> Result<(), ExecutorError> {
        let mut state = self.shared.lock();
        if !state.running {
            return Err(ExecutorError::Stopped);
        }
        if state.jobs.len() >= self.max_capacity {
            return Err(ExecutorError::QueueFull {
                capacity: self.max_capacity,
            });
        }

        debug!(job_id = job.id(), "Job queued");
        state.jobs.push_back(job);
        drop(state);

        self.shared.condvar.notify_one();
        Ok(())
    }

    /// Jobs esperando un worker
    pub fn len(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Detiene los workers; los jobs que no empezaron se descartan
    ///
    /// Espera a que terminen los jobs en ejecución.
    pub fn stop(&self) {
        {
            let mut state = self.shared.lock();
            state.running = false;
            if !state.jobs.is_empty() {
                debug!(dropped = state.jobs.len(), "Dropping queued jobs");
            }
            state.jobs.clear();
        }
        self.shared.condvar.notify_all();

        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    /// Loop principal del worker
    fn worker_loop(name: String, shared: Arc<QueueShared>) {
        debug!(worker = %name, "Worker started");

        loop {
            let job = {
                let mut state = shared.lock();
                loop {
                    if !state.running {
                        debug!(worker = %name, "Worker stopped");
                        return;
                    }
                    if let Some(job) = state.jobs.pop_front() {
                        break job;
                    }
                    state = shared
                        .condvar
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            debug!(worker = %name, job_id = job.id(), "Worker picked up job");

            // Un panic aquí es un error de programación (job ejecutado dos veces)
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
                error!(
                    worker = %name,
                    job_id = job.id(),
                    reason = %panic_message(payload.as_ref()),
                    "Job run aborted by a programming error"
                );
            }
        }
    }
}

impl Drop for JobExecutor {
    fn drop(&mut self) {
        self.stop();
    }
}
