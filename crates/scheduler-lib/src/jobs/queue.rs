//! Priority queue of pending jobs
//!
//! Entries are ordered by ascending priority, then by insertion sequence so
//! equal priorities are served FIFO. The queue itself is not synchronized;
//! the scheduler wraps it in a single mutex.

use crate::models::Job;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::time::Instant;

/// A job waiting for admission
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub priority: u32,
    pub seq: u64,
    pub enqueued_at: Instant,
    pub job: Job,
}

impl QueueEntry {
    fn key(&self) -> (u32, u64) {
        (self.priority, self.seq)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-heap of queued jobs keyed by (priority, seq)
#[derive(Debug, Default)]
pub struct JobQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    next_seq: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job; returns the assigned sequence number
    pub fn push(&mut self, priority: u32, job: Job) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(QueueEntry {
            priority,
            seq,
            enqueued_at: Instant::now(),
            job,
        }));
        seq
    }

    /// Remove the most urgent entry
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.heap.peek().map(|Reverse(entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.heap.iter().any(|Reverse(e)| e.job.id == job_id)
    }

    /// How long the longest-waiting entry has been queued
    pub fn oldest_age(&self) -> Option<Duration> {
        self.heap
            .iter()
            .map(|Reverse(e)| e.enqueued_at)
            .min()
            .map(|oldest| oldest.elapsed())
    }

    /// Queued job ids in service order
    pub fn ordered_ids(&self) -> Vec<String> {
        let mut entries: Vec<&QueueEntry> = self.heap.iter().map(|Reverse(e)| e).collect();
        entries.sort();
        entries.into_iter().map(|e| e.job.id.clone()).collect()
    }
}
