//! # Planificador de Llamadas Diferidas
//! src/schedule.rs
//!
//! Ejecuta callables después de un retardo. El sistema de jobs solo
//! depende del trait [`Scheduler`]; [`TimerScheduler`] es la
//! implementación usada por el daemon: un único thread que duerme sobre
//! un min-heap de deadlines.

use crate::jobs::job::panic_message;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Callable diferido
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Colaborador que invoca un callable después de un retardo
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, callback: Callback) -> ScheduledCall;
}

/// Handle de una llamada programada
#[derive(Debug, Clone)]
pub struct ScheduledCall {
    delay: Duration,
    cancelled: Arc<AtomicBool>,
}

impl ScheduledCall {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Retardo con el que se programó la llamada
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancela la llamada si todavía no se ejecutó
    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

/// Entrada del heap: ordenada por deadline y luego por orden de llegada
struct Entry {
    deadline: Instant,
    seq: u64,
    call: ScheduledCall,
    callback: Callback,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Invertido: BinaryHeap es max-heap y queremos el deadline más cercano
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct TimerState {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    running: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    condvar: Condvar,
}

impl TimerShared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scheduler basado en un thread dedicado
pub struct TimerScheduler {
    shared: Arc<TimerShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TimerScheduler {
    /// Crea el scheduler e inicia su thread
    pub fn start() -> io::Result<Self> {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                heap: BinaryHeap::new(),
                next_seq: 0,
                running: true,
            }),
            condvar: Condvar::new(),
        });

        let loop_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || Self::run_loop(loop_shared))?;

        debug!("Scheduler started");

        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Detiene el thread; las llamadas pendientes se descartan
    pub fn stop(&self) {
        {
            let mut state = self.shared.lock();
            if !state.running {
                return;
            }
            state.running = false;
            state.heap.clear();
        }
        self.shared.condvar.notify_all();

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        debug!("Scheduler stopped");
    }

    /// Número de llamadas pendientes
    pub fn pending(&self) -> usize {
        self.shared.lock().heap.len()
    }

    fn run_loop(shared: Arc<TimerShared>) {
        let mut state = shared.lock();

        loop {
            if !state.running {
                return;
            }

            let next_deadline = state.heap.peek().map(|entry| entry.deadline);
            match next_deadline {
                None => {
                    state = shared
                        .condvar
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) if deadline > Instant::now() => {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    state = match shared.condvar.wait_timeout(state, timeout) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
                Some(_) => {
                    let Some(entry) = state.heap.pop() else {
                        continue;
                    };
                    drop(state);

                    let Entry { call, callback, .. } = entry;
                    if call.is_cancelled() {
                        debug!(delay = ?call.delay(), "Skipping cancelled call");
                    } else if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
                        error!(reason = %panic_message(payload.as_ref()), "Scheduled call panicked");
                    }

                    state = shared.lock();
                }
            }
        }
    }
}

impl Scheduler for TimerScheduler {
    fn schedule(&self, delay: Duration, callback: Callback) -> ScheduledCall {
        let call = ScheduledCall::new(delay);

        let Some(deadline) = Instant::now().checked_add(delay) else {
            warn!(delay = ?delay, "Delay out of range, dropping call");
            call.cancel();
            return call;
        };

        let mut state = self.shared.lock();
        if !state.running {
            warn!(delay = ?delay, "Scheduler is stopped, dropping call");
            call.cancel();
            return call;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Entry {
            deadline,
            seq,
            call: call.clone(),
            callback,
        });
        drop(state);

        self.shared.condvar.notify_one();
        call
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
