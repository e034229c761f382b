use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 进程内按 (team_id, task_id) 串行化提交与评分
///
/// 跨进程的唯一性仍由数据库的 UNIQUE (team_id, task_id) 约束兜底。
#[derive(Default)]
pub struct SubmissionLocks {
    inner: DashMap<(i64, i64), Arc<Mutex<()>>>,
}

/// 持有期间独占一个 (team, task)；释放后没有其他等待者时回收表项
pub struct PairGuard<'a> {
    locks: &'a SubmissionLocks,
    key: (i64, i64),
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        // 先放锁，guard 内的 Arc 随之释放
        self.guard.take();
        // 引用只剩表内一份说明无人等待；判断与删除都在分片写锁内完成
        self.locks
            .inner
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SubmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, team_id: i64, task_id: i64) -> PairGuard<'_> {
        let key = (team_id, task_id);
        // 先克隆出 Arc，避免持有 DashMap 分片锁跨 await
        let lock = self.inner.entry(key).or_default().value().clone();
        PairGuard {
            locks: self,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_pair_is_exclusive() {
        let locks = SubmissionLocks::new();
        let guard = locks.acquire(1, 2).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1, 2)).await;
        assert!(blocked.is_err());

        // 其他组合不受影响
        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1, 3)).await;
        assert!(other.is_ok());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1, 2)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn released_pairs_are_evicted() {
        let locks = SubmissionLocks::new();
        for task_id in 0..100 {
            let _guard = locks.acquire(1, task_id).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn entry_kept_while_someone_waits() {
        let locks = Arc::new(SubmissionLocks::new());
        let guard = locks.acquire(4, 5).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(4, 5).await;
            })
        };
        // 等待者已克隆出同一把锁
        while Arc::strong_count(locks.inner.get(&(4, 5)).unwrap().value()) < 3 {
            tokio::task::yield_now().await;
        }

        drop(guard);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
