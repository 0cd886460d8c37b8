use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::{QueueSnapshot, WorkItem};

/// FIFO of pending classification work. Producers push from the extractor;
/// a single worker loop pops one item at a time in insertion order. The
/// `Notify` wake-up stores a permit, so a push that lands between the
/// worker's pop and its wait is never lost.
#[derive(Debug, Default)]
pub struct AnalysisQueue {
    items: Mutex<VecDeque<WorkItem>>,
    wake: Notify,
}

impl AnalysisQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: WorkItem) {
        self.items.lock().push_back(item);
        self.wake.notify_one();
    }

    pub fn pop(&self) -> Option<WorkItem> {
        self.items.lock().pop_front()
    }

    pub async fn wait_for_work(&self) {
        self.wake.notified().await;
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            depth: self.items.lock().len(),
        }
    }
}
