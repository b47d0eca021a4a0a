/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Schedule, Task};

/// The progress of the current task of a schedule.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    Running,
    Complete,
    Failed,
}

/// A schedule being executed by an agent, with the position within it.
#[derive(Clone, Copy, PartialEq)]
pub struct ActiveSchedule {
    pub schedule: &'static Schedule,
    pub task_index: usize,
    pub status: TaskStatus,
}

impl ActiveSchedule {
    /// Starts `schedule` from its first task.
    pub fn new(schedule: &'static Schedule) -> Self {
        Self {
            schedule,
            task_index: 0,
            status: TaskStatus::NotStarted,
        }
    }

    pub fn name(&self) -> &'static str {
        self.schedule.name
    }

    /// The task at the current index, `None` past the end.
    pub fn current_task(&self) -> Option<Task> {
        self.schedule.tasks.get(self.task_index).copied()
    }

    /// Moves to the next task, which is not started yet.
    pub fn advance(&mut self) {
        self.task_index += 1;
        self.status = TaskStatus::NotStarted;
    }

    /// Whether all tasks of the schedule have completed.
    pub fn is_finished(&self) -> bool {
        self.task_index >= self.schedule.tasks.len()
    }
}

impl fmt::Debug for ActiveSchedule {
    fn fmt(&self, f: &'_ mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ActiveSchedule")
            .field("schedule", &self.schedule.name)
            .field("task_index", &self.task_index)
            .field("status", &self.status)
            .finish()
    }
}

impl fmt::Display for ActiveSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current_task() {
            Some(task) => write!(
                f,
                "{}[{}/{}] {} ({:?})",
                self.schedule.name,
                self.task_index + 1,
                self.schedule.tasks.len(),
                task,
                self.status
            ),
            None => write!(f, "{} (done)", self.schedule.name),
        }
    }
}
