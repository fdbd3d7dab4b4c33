//! Host resource probe backed by sysinfo
//!
//! CPU usage is computed by sysinfo from the delta between two refreshes, so
//! the probe keeps one [`System`] alive and primes it on construction.
//! GPU utilization needs a vendor backend and is always reported as 0 here.

use super::ResourceProbe;
use crate::models::ResourceReading;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::{Disks, Networks, System};

/// Space figures for one mounted filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSpace {
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

struct HostState {
    system: System,
    disks: Disks,
    networks: Networks,
}

/// Probe reading host-wide utilization through sysinfo
pub struct HostProbe {
    storage_mount: PathBuf,
    state: Mutex<HostState>,
}

impl HostProbe {
    pub fn new() -> Self {
        Self::with_storage_mount("/")
    }

    /// Report storage usage for the filesystem holding `storage_mount`
    pub fn with_storage_mount(storage_mount: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        Self {
            storage_mount: storage_mount.into(),
            state: Mutex::new(HostState {
                system,
                disks: Disks::new_with_refreshed_list(),
                networks: Networks::new_with_refreshed_list(),
            }),
        }
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// `used / total` as a percentage clamped to 0..=100
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Used-space percentage of the filesystem containing `target`
///
/// Picks the disk with the longest mount point that prefixes `target`. When
/// none matches, reports usage across every disk.
pub fn storage_percent(disks: &[DiskSpace], target: &Path) -> f64 {
    let mount = disks
        .iter()
        .filter(|d| target.starts_with(&d.mount_point))
        .max_by_key(|d| d.mount_point.as_os_str().len());

    match mount {
        Some(disk) => percent(disk.total.saturating_sub(disk.available), disk.total),
        None => {
            let total: u64 = disks.iter().map(|d| d.total).sum();
            let available: u64 = disks.iter().map(|d| d.available).sum();
            percent(total.saturating_sub(available), total)
        }
    }
}

/// Cumulative received plus transmitted bytes, excluding loopback
pub fn network_bytes<'a>(interfaces: impl IntoIterator<Item = (&'a str, u64, u64)>) -> u64 {
    interfaces
        .into_iter()
        .filter(|(name, _, _)| *name != "lo")
        .fold(0u64, |acc, (_, rx, tx)| acc.saturating_add(rx).saturating_add(tx))
}

#[async_trait]
impl ResourceProbe for HostProbe {
    async fn read(&self) -> Result<ResourceReading> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {}", e))?;

        state.system.refresh_cpu();
        state.system.refresh_memory();
        state.disks.refresh();
        state.networks.refresh();

        let disks: Vec<DiskSpace> = state
            .disks
            .iter()
            .map(|d| DiskSpace {
                mount_point: d.mount_point().to_path_buf(),
                total: d.total_space(),
                available: d.available_space(),
            })
            .collect();

        let network_io = network_bytes(
            state
                .networks
                .iter()
                .map(|(name, data)| (name.as_str(), data.total_received(), data.total_transmitted())),
        );

        Ok(ResourceReading {
            cpu_usage: (state.system.global_cpu_info().cpu_usage() as f64).clamp(0.0, 100.0),
            memory_usage: percent(state.system.used_memory(), state.system.total_memory()),
            gpu_usage: 0.0,
            storage_usage: storage_percent(&disks, &self.storage_mount),
            network_io,
        })
    }

    fn name(&self) -> &str {
        "host"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(mount: &str, total: u64, available: u64) -> DiskSpace {
        DiskSpace {
            mount_point: PathBuf::from(mount),
            total,
            available,
        }
    }

    #[test]
    fn test_percent_bounds() {
        assert_eq!(percent(0, 0), 0.0);
        assert!((percent(12, 16) - 75.0).abs() < 1e-9);
        assert_eq!(percent(20, 10), 100.0);
    }

    #[test]
    fn test_storage_picks_deepest_mount() {
        let disks = vec![disk("/", 1000, 900), disk("/var/lib", 100, 25)];
        assert!((storage_percent(&disks, Path::new("/var/lib/jobs")) - 75.0).abs() < 1e-9);
        assert!((storage_percent(&disks, Path::new("/home")) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_storage_without_matching_mount_sums_disks() {
        let disks = vec![disk("/a", 100, 50), disk("/b", 100, 0)];
        assert!((storage_percent(&disks, Path::new("/c")) - 75.0).abs() < 1e-9);
        assert_eq!(storage_percent(&[], Path::new("/")), 0.0);
    }

    #[test]
    fn test_network_bytes_skips_loopback() {
        let ifaces = [("lo", 5000, 5000), ("eth0", 1000, 2000), ("wlan0", 10, 0)];
        assert_eq!(network_bytes(ifaces), 3010);
        assert_eq!(network_bytes(std::iter::empty()), 0);
    }

    #[tokio::test]
    async fn test_read_live_host() {
        let probe = HostProbe::new();
        let reading = probe.read().await.unwrap();

        assert!((0.0..=100.0).contains(&reading.cpu_usage));
        assert!((0.0..=100.0).contains(&reading.memory_usage));
        assert!((0.0..=100.0).contains(&reading.storage_usage));
        assert_eq!(reading.gpu_usage, 0.0);
        assert_eq!(probe.name(), "host");
    }
}
