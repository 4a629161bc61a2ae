//! Host snapshot attached to the run statistics.

use sysinfo::System;

use crate::models::{HostMetrics, MemoryInfo, RunStats, SystemInfo};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Sample CPU and memory usage of the host.
///
/// CPU usage needs two refreshes separated by at least
/// `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`; the sample spans about one second.
pub async fn collect_host_metrics() -> HostMetrics {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_usage();
    tokio::time::sleep(sample_window()).await;
    sys.refresh_cpu_usage();

    HostMetrics {
        system_info: SystemInfo {
            platform: platform_string(),
            cpu_count_logical: sys.cpus().len(),
            cpu_count_physical: sys.physical_core_count(),
        },
        cpu_percent_after_run: sys.global_cpu_usage(),
        memory_info: memory_info(
            sys.total_memory(),
            sys.available_memory(),
            sys.used_memory(),
        ),
    }
}

/// Collect host metrics into `stats`.
pub async fn enrich_run_stats(stats: &mut RunStats) {
    let host = collect_host_metrics().await;
    tracing::debug!(
        cpu_percent = host.cpu_percent_after_run,
        memory_percent = host.memory_info.percent_used,
        "Collected host metrics"
    );
    stats.host = Some(host);
}

fn sample_window() -> std::time::Duration {
    std::time::Duration::from_secs(1).max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
}

fn platform_string() -> String {
    let os = System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string());
    match System::kernel_version() {
        Some(kernel) => format!("{os}-{kernel}-{}", std::env::consts::ARCH),
        None => format!("{os}-{}", std::env::consts::ARCH),
    }
}

/// Memory figures in GiB, unrounded; percent used is `(total - available) / total`.
fn memory_info(total_bytes: u64, available_bytes: u64, used_bytes: u64) -> MemoryInfo {
    let percent_used = if total_bytes > 0 {
        total_bytes.saturating_sub(available_bytes) as f64 / total_bytes as f64 * 100.0
    } else {
        0.0
    };
    MemoryInfo {
        total_gb: total_bytes as f64 / BYTES_PER_GIB,
        available_gb: available_bytes as f64 / BYTES_PER_GIB,
        used_gb: used_bytes as f64 / BYTES_PER_GIB,
        percent_used,
    }
}
