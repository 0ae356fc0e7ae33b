// src/info.rs
// Host inventory: CPU/memory/disk/network snapshot and process queries
//
// Everything here is synchronous (sysinfo refreshes block); tool handlers
// call in through spawn_blocking.

use crate::{MachinaError, Result};
use serde::Serialize;
use sysinfo::{Disks, Networks, Pid, Process, Signal, System};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
    pub cores: usize,
    pub usage_percent: f32,
    pub load_average: [f64; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryInfo {
    pub total_gb: f64,
    pub available_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskInfo {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total_gb: f64,
    pub available_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub interface: String,
    pub addresses: Vec<String>,
}

/// Full host snapshot returned by the `system_info` tool.
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub hostname: Option<String>,
    pub platform: String,
    pub kernel: Option<String>,
    pub uptime_seconds: u64,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disks: Vec<DiskInfo>,
    pub network: Vec<NetworkInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub status: String,
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub started: Option<String>,
}

/// Collect a full host snapshot. The CPU sample needs two refreshes spaced
/// by sysinfo's minimum interval, so this blocks for ~200ms.
pub fn collect_snapshot() -> HostSnapshot {
    let mut sys = System::new_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_all();

    let load = System::load_average();
    let total_memory = sys.total_memory();
    let available_memory = sys.available_memory();
    let used_memory = total_memory.saturating_sub(available_memory);

    let disks = Disks::new_with_refreshed_list();
    let disks = disks
        .list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let available = disk.available_space();
            let used = total.saturating_sub(available);
            DiskInfo {
                device: disk.name().to_string_lossy().into_owned(),
                mountpoint: disk.mount_point().display().to_string(),
                fstype: disk.file_system().to_string_lossy().into_owned(),
                total_gb: round2(total as f64 / GIB),
                available_gb: round2(available as f64 / GIB),
                usage_percent: round1(percent(used, total)),
            }
        })
        .collect();

    let networks = Networks::new_with_refreshed_list();
    let network = networks
        .iter()
        .map(|(interface, data)| NetworkInfo {
            interface: interface.clone(),
            addresses: data
                .ip_networks()
                .iter()
                .map(|ip| ip.to_string())
                .collect(),
        })
        .collect();

    HostSnapshot {
        hostname: System::host_name(),
        platform: System::long_os_version()
            .unwrap_or_else(|| std::env::consts::OS.to_string()),
        kernel: System::kernel_version(),
        uptime_seconds: System::uptime(),
        cpu: CpuInfo {
            cores: sys.cpus().len(),
            usage_percent: sys.global_cpu_usage(),
            load_average: [load.one, load.five, load.fifteen],
        },
        memory: MemoryInfo {
            total_gb: round2(total_memory as f64 / GIB),
            available_gb: round2(available_memory as f64 / GIB),
            usage_percent: round1(percent(used_memory, total_memory)),
        },
        disks,
        network,
    }
}

/// Processes sorted by CPU usage, capped at `limit` entries.
pub fn list_processes(limit: usize) -> Vec<ProcessInfo> {
    let mut sys = System::new_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_all();

    let mut processes: Vec<ProcessInfo> = sys.processes().values().map(to_process_info).collect();
    processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    processes.truncate(limit);
    processes
}

/// Details for a single pid, if it exists.
pub fn process_info(pid: u32) -> Option<ProcessInfo> {
    let mut sys = System::new_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_all();
    sys.processes().get(&Pid::from_u32(pid)).map(to_process_info)
}

/// Signal processes by pid or by exact name. Returns how many were
/// signalled; zero matches is a NotFound error.
pub fn kill_processes(identifier: &str, signal_name: &str) -> Result<usize> {
    let signal = parse_signal(signal_name)?;
    let sys = System::new_all();

    if let Ok(pid) = identifier.parse::<u32>() {
        let process = sys
            .processes()
            .get(&Pid::from_u32(pid))
            .ok_or_else(|| MachinaError::NotFound(format!("no process with pid {pid}")))?;
        if signal_process(process, signal) {
            Ok(1)
        } else {
            Err(MachinaError::Execution(format!(
                "failed to signal pid {pid}"
            )))
        }
    } else {
        let signalled = sys
            .processes()
            .values()
            .filter(|p| p.name().to_string_lossy() == identifier)
            .filter(|p| signal_process(p, signal))
            .count();
        if signalled == 0 {
            return Err(MachinaError::NotFound(format!(
                "no process named `{identifier}` could be signalled"
            )));
        }
        Ok(signalled)
    }
}

fn signal_process(process: &Process, signal: Signal) -> bool {
    // kill_with returns None when the platform lacks the signal
    process.kill_with(signal).unwrap_or_else(|| process.kill())
}

fn parse_signal(name: &str) -> Result<Signal> {
    let upper = name.trim().to_ascii_uppercase();
    let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
    match bare {
        "TERM" => Ok(Signal::Term),
        "KILL" => Ok(Signal::Kill),
        "INT" => Ok(Signal::Interrupt),
        "HUP" => Ok(Signal::Hangup),
        _ => Err(MachinaError::InvalidInput(format!(
            "unsupported signal `{name}`; use TERM/KILL/INT/HUP"
        ))),
    }
}

fn to_process_info(process: &Process) -> ProcessInfo {
    ProcessInfo {
        pid: process.pid().as_u32(),
        name: process.name().to_string_lossy().into_owned(),
        status: process.status().to_string(),
        cpu_percent: process.cpu_usage(),
        memory_mb: round1(process.memory() as f64 / MIB),
        started: chrono::DateTime::from_timestamp(process.start_time() as i64, 0)
            .map(|t| t.to_rfc3339()),
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_has_cores_and_memory() {
        let snapshot = collect_snapshot();
        assert!(snapshot.cpu.cores > 0);
        assert!(snapshot.memory.total_gb > 0.0);
        assert!((0.0..=100.0).contains(&snapshot.memory.usage_percent));
    }

    #[test]
    fn test_list_processes_capped() {
        let processes = list_processes(5);
        assert!(processes.len() <= 5);
        assert!(!processes.is_empty());
    }

    #[test]
    fn test_current_process_is_visible() {
        let pid = std::process::id();
        let details = process_info(pid).unwrap();
        assert_eq!(details.pid, pid);
        assert!(!details.name.is_empty());
    }

    #[test]
    fn test_parse_signal_variants() {
        assert!(parse_signal("TERM").is_ok());
        assert!(parse_signal("sigkill").is_ok());
        assert!(parse_signal("hup").is_ok());
        assert!(parse_signal("FROB").is_err());
    }

    #[test]
    fn test_kill_unknown_pid_is_not_found() {
        // pid 0 is never a real signalable target for us
        let err = kill_processes("999999999", "TERM").unwrap_err();
        assert!(matches!(err, MachinaError::NotFound(_)));
    }

    #[test]
    fn test_percent_guards_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(50, 100), 50.0);
    }
}
