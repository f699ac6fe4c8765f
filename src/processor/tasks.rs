//! Registry of in-flight pipeline tasks.
//!
//! Every phase registers itself while it runs and is removed when its
//! handle drops, whether the phase finished or failed. A phase hands over
//! to the next one by registering it before its own handle drops, so the
//! registry never empties in the middle of a chain. A bulk driver also
//! holds a [`TaskKind::Chain`] handle per import → convert → export chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Phase a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Import,
    Convert,
    Export,
    /// A whole import → convert → export chain
    Chain,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Import => f.write_str("import"),
            TaskKind::Convert => f.write_str("convert"),
            TaskKind::Export => f.write_str("export"),
            TaskKind::Chain => f.write_str("chain"),
        }
    }
}

pub type TaskId = u64;

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TaskId, TaskKind>>,
}

/// Shared, cloneable registry of running tasks
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RegistryInner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TaskId, TaskKind>> {
        // A panicking task must not wedge the registry
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track a new task until the returned handle is dropped
    pub fn register(&self, kind: TaskKind) -> TaskHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.tasks().insert(id, kind);
        debug!("Task {} ({}) started", id, kind);
        TaskHandle {
            id,
            kind,
            registry: self.clone(),
        }
    }

    fn remove(&self, id: TaskId) {
        self.tasks().remove(&id);
    }

    pub fn in_flight(&self) -> usize {
        self.tasks().len()
    }

    pub fn in_flight_of(&self, kind: TaskKind) -> usize {
        self.tasks().values().filter(|k| **k == kind).count()
    }

    pub fn all_tasks_finished(&self) -> bool {
        self.tasks().is_empty()
    }
}

/// Registration of one running task
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    registry: TaskRegistry,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.registry.remove(self.id);
        debug!("Task {} ({}) finished", self.id, self.kind);
    }
}
