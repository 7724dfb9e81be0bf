//! Task view projection.
//!
//! Pure derivation of display-ready partitions from the cached task list:
//! open tasks ("to be completed") and done tasks ("completed"), optionally
//! narrowed to one priority. Deterministic and idempotent; input order is
//! preserved within each partition, and the cache is already
//! newest-created-first.

use crate::model::{Priority, Task};

/// Partitioned, display-ready task lists.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    /// Open tasks (`status == true`), input order preserved.
    pub active: Vec<Task>,
    /// Done tasks (`status == false`), input order preserved.
    pub completed: Vec<Task>,
}

impl TaskView {
    pub fn total(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    /// Share of tasks completed, as a 0-100 percentage. None when there are
    /// no tasks to measure.
    pub fn completion_percent(&self) -> Option<u8> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(((self.completed.len() * 100) / total) as u8)
    }
}

/// Partition tasks into active and completed, optionally filtered by
/// priority. Tasks with no priority are excluded when a filter is set.
pub fn project(tasks: &[Task], filter: Option<Priority>) -> TaskView {
    let matches = |task: &Task| match filter {
        Some(priority) => task.priority == Some(priority),
        None => true,
    };

    let mut view = TaskView {
        active: Vec::new(),
        completed: Vec::new(),
    };
    for task in tasks {
        if !matches(task) {
            continue;
        }
        if task.status {
            view.active.push(task.clone());
        } else {
            view.completed.push(task.clone());
        }
    }
    view
}
