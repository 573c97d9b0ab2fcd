use std::{collections::HashMap, future::Future};
use tokio::task::JoinHandle;
use tracing::debug;

/// Background tasks keyed by purpose. Spawning under a key aborts whatever
/// was running under it.
#[derive(Default)]
pub struct TaskManager {
    tasks: HashMap<&'static str, JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, key: &'static str, task: JoinHandle<()>) {
        self.tasks.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = self.tasks.insert(key, task) {
            debug!(key, "task_superseded");
            previous.abort();
        }
    }

    /// Spawns `task` under `key` only if nothing is running there yet.
    /// Returns whether it was spawned.
    pub fn spawn_unless_running<F>(&mut self, key: &'static str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_running(key) {
            debug!(key, "task_already_running");
            return false;
        }
        self.spawn(key, tokio::spawn(task));
        true
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.tasks.get(key).is_some_and(|handle| !handle.is_finished())
    }

    pub fn abort_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn respawning_a_key_aborts_the_previous_task() {
        let mut tasks = TaskManager::new();
        let first = tokio::spawn(pending::<()>());
        let first_abort = first.abort_handle();
        tasks.spawn("catalog", first);
        tasks.spawn("catalog", tokio::spawn(pending::<()>()));

        tokio::task::yield_now().await;
        assert!(first_abort.is_finished());
        assert!(tasks.is_running("catalog"));

        tasks.abort_all();
        assert!(!tasks.is_running("catalog"));
    }

    #[tokio::test]
    async fn exclusive_spawn_leaves_a_running_task_alone() {
        let mut tasks = TaskManager::new();
        assert!(tasks.spawn_unless_running("checkout", pending::<()>()));
        assert!(!tasks.spawn_unless_running("checkout", async {}));
        tokio::task::yield_now().await;
        assert!(tasks.is_running("checkout"));

        tasks.abort_all();
        tokio::task::yield_now().await;
        assert!(tasks.spawn_unless_running("checkout", async {}));
    }
}
