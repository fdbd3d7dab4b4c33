//! Tests for the resource monitor and its rolling history

use super::*;
use crate::models::ResourceReading;
use chrono::{Duration as ChronoDuration, TimeZone};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Probe returning a fixed reading, optionally failing on demand
struct FixedProbe {
    reading: ResourceReading,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FixedProbe {
    fn new(cpu: f64) -> Self {
        Self {
            reading: ResourceReading {
                cpu_usage: cpu,
                memory_usage: 40.0,
                gpu_usage: 10.0,
                storage_usage: 55.0,
                network_io: 1234,
            },
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ResourceProbe for FixedProbe {
    async fn read(&self) -> Result<ResourceReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("probe unavailable");
        }
        Ok(self.reading)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn sample_at(index: i64) -> ResourceSample {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    ResourceSample {
        cpu_usage: index as f64 % 100.0,
        memory_usage: 50.0,
        gpu_usage: 0.0,
        storage_usage: 10.0,
        network_io: index as u64,
        timestamp: base + ChronoDuration::seconds(index),
    }
}

#[tokio::test]
async fn test_sample_appends_to_history() {
    let monitor = ResourceMonitor::new(Arc::new(FixedProbe::new(25.0)));

    let sample = monitor.sample().await;

    assert_eq!(sample.cpu_usage, 25.0);
    assert_eq!(sample.network_io, 1234);
    assert_eq!(monitor.len().await, 1);
    assert_eq!(monitor.latest().await, Some(sample));
}

#[tokio::test]
async fn test_probe_failure_returns_zero_sample_without_recording() {
    let probe = Arc::new(FixedProbe::new(25.0));
    probe.fail.store(true, Ordering::SeqCst);
    let monitor = ResourceMonitor::new(probe.clone());

    let sample = monitor.sample().await;

    assert_eq!(sample.cpu_usage, 0.0);
    assert_eq!(sample.memory_usage, 0.0);
    assert_eq!(sample.network_io, 0);
    assert!(monitor.is_empty().await);
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

    assert!(monitor.try_sample().await.is_err());
}

#[tokio::test]
async fn test_history_evicts_oldest_after_capacity() {
    let monitor = ResourceMonitor::new(Arc::new(FixedProbe::new(1.0)));

    for i in 0..1001 {
        monitor.record(sample_at(i)).await;
    }

    assert_eq!(monitor.len().await, DEFAULT_HISTORY_CAPACITY);
    let all = monitor.history(usize::MAX).await;
    assert_eq!(all.len(), 1000);
    assert!(all.iter().all(|s| s.network_io != 0));
    assert_eq!(all.first().unwrap().network_io, 1);
    assert_eq!(all.last().unwrap().network_io, 1000);
}

#[tokio::test]
async fn test_history_returns_most_recent_last() {
    let monitor = ResourceMonitor::new(Arc::new(FixedProbe::new(1.0)));
    for i in 0..5 {
        monitor.record(sample_at(i)).await;
    }

    let last_three = monitor.history(3).await;
    let ids: Vec<u64> = last_three.iter().map(|s| s.network_io).collect();
    assert_eq!(ids, vec![2, 3, 4]);

    assert_eq!(monitor.history(10).await.len(), 5);
    assert!(monitor.history(0).await.is_empty());
}

#[tokio::test]
async fn test_custom_capacity() {
    let monitor = ResourceMonitor::with_config(
        Arc::new(FixedProbe::new(1.0)),
        MonitorConfig {
            history_capacity: 3,
        },
    );
    for i in 0..10 {
        monitor.record(sample_at(i)).await;
    }

    assert_eq!(monitor.capacity(), 3);
    let ids: Vec<u64> = monitor.history(3).await.iter().map(|s| s.network_io).collect();
    assert_eq!(ids, vec![7, 8, 9]);
}

#[tokio::test]
async fn test_shared_monitor_concurrent_sampling() {
    let monitor = Arc::new(ResourceMonitor::new(Arc::new(FixedProbe::new(5.0))));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let monitor = monitor.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    monitor.sample().await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(monitor.len().await, 80);
}
