//! Persist worker pool
//!
//! A fixed number of blocking tasks share one bounded receiver and write each
//! record through the store. Outcomes are tallied per target with atomics so
//! the coordinator can assemble reports after the pool drains.

use crate::model::MemberRecord;
use crate::storage::{MemberStore, UpsertOutcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A normalized record bound for the store
#[derive(Debug)]
pub struct Job {
    /// Tally of the target the record was scraped from
    pub tally: Arc<TargetTally>,
    pub record: MemberRecord,
}

/// Write outcomes for one target
#[derive(Debug, Default)]
pub struct TargetTally {
    inserted: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
}

impl TargetTally {
    fn record(&self, outcome: &UpsertOutcome) {
        let counter = if outcome.is_insert() {
            &self.inserted
        } else {
            &self.updated
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    pub fn updated(&self) -> u64 {
        self.updated.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Handle to a running pool
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `count` workers draining `receiver` into `store`
    ///
    /// # Arguments
    ///
    /// * `count` - Number of blocking workers
    /// * `receiver` - Receiving half of the bounded job queue
    /// * `store` - Store every job is upserted into
    pub fn spawn(count: usize, receiver: mpsc::Receiver<Job>, store: Arc<dyn MemberStore>) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..count)
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let store = Arc::clone(&store);
                tokio::task::spawn_blocking(move || {
                    run_worker(worker_id, &receiver, store.as_ref())
                })
            })
            .collect();

        tracing::debug!("Spawned {} persist workers", count);
        Self { handles }
    }

    /// Waits for every worker to exit
    ///
    /// Workers exit once all senders are dropped and the queue is empty.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All workers drained the queue and exited
    /// * `Err(String)` - At least one worker panicked
    pub async fn join(self) -> Result<(), String> {
        let mut first_error = None;

        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Persist worker crashed: {}", e);
                first_error.get_or_insert_with(|| e.to_string());
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn run_worker(worker_id: usize, receiver: &Mutex<mpsc::Receiver<Job>>, store: &dyn MemberStore) {
    let mut processed = 0u64;

    loop {
        // The lock is held only while waiting for the next job
        let job = match receiver.lock() {
            Ok(mut rx) => rx.blocking_recv(),
            Err(_) => {
                tracing::error!("Worker {} found the job queue poisoned", worker_id);
                break;
            }
        };

        let Some(job) = job else {
            break;
        };

        match store.upsert(&job.record) {
            Ok(outcome) => {
                let (entity_id, group) = job.record.key();
                tracing::trace!(
                    "Stored {} in {} as row {}",
                    entity_id,
                    group,
                    outcome.internal_id()
                );
                job.tally.record(&outcome);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to persist {} in {}: {}",
                    job.record.entity_id,
                    job.record.source_group,
                    e
                );
                job.tally.record_failure();
            }
        }

        processed += 1;
    }

    tracing::debug!("Worker {} exiting after {} jobs", worker_id, processed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[tokio::test]
    async fn test_pool_drains_queue_and_tallies() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn MemberStore> =
            Arc::new(SqliteStorage::open(&dir.path().join("pool.db")).unwrap());
        let tallies = [
            Arc::new(TargetTally::default()),
            Arc::new(TargetTally::default()),
        ];

        let (tx, rx) = mpsc::channel(4);
        let pool = WorkerPool::spawn(3, rx, Arc::clone(&store));

        for id in 1..=20 {
            tx.send(Job {
                tally: Arc::clone(&tallies[(id % 2) as usize]),
                record: MemberRecord::new(id, "@pool"),
            })
            .await
            .unwrap();
        }
        // Same key again: must update, not insert
        tx.send(Job {
            tally: Arc::clone(&tallies[0]),
            record: MemberRecord::new(2, "@pool"),
        })
        .await
        .unwrap();
        drop(tx);

        pool.join().await.unwrap();

        assert_eq!(store.count().unwrap(), 20);
        assert_eq!(tallies[0].inserted() + tallies[1].inserted(), 20);
        assert_eq!(tallies[0].updated(), 1);
        assert_eq!(tallies[0].failed() + tallies[1].failed(), 0);
    }

    #[tokio::test]
    async fn test_pool_exits_when_sender_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn MemberStore> =
            Arc::new(SqliteStorage::open(&dir.path().join("idle.db")).unwrap());

        let (tx, rx) = mpsc::channel::<Job>(1);
        let pool = WorkerPool::spawn(2, rx, store);
        drop(tx);

        assert!(pool.join().await.is_ok());
    }
}
