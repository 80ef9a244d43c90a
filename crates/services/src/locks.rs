use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tutor_core::model::StudentId;

/// One async lock per student, so read-evaluate-write on a student's level
/// never interleaves within this process.
#[derive(Clone, Default)]
pub struct StudentLocks {
    inner: Arc<Mutex<HashMap<StudentId, Arc<AsyncMutex<()>>>>>,
}

impl StudentLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `student_id`. Released when the guard drops.
    pub async fn acquire(&self, student_id: StudentId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody is holding or waiting on.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(map.entry(student_id).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_student_is_serialized() {
        let locks = StudentLocks::new();
        let guard = locks.acquire(StudentId::new(1)).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.acquire(StudentId::new(1)).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());
        drop(guard);
        waiting.await.unwrap();
    }

    #[tokio::test]
    async fn different_students_do_not_block() {
        let locks = StudentLocks::new();
        let _a = locks.acquire(StudentId::new(1)).await;
        let _b = locks.acquire(StudentId::new(2)).await;
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn released_locks_are_pruned() {
        let locks = StudentLocks::new();
        drop(locks.acquire(StudentId::new(1)).await);
        let _b = locks.acquire(StudentId::new(2)).await;
        assert_eq!(locks.tracked(), 1);
    }
}
