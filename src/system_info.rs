//! Host information surfaced by the `/system` route: kernel string, CPU count, load average, and
//! the isolation tool's own version, probed the same way a language `Program` probes its own.

use super::*;

/// One-minute/five-minute/fifteen-minute load average, mirroring `/proc/loadavg`'s first three
/// fields.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct LoadAverage {
  pub one: f64,
  pub five: f64,
  pub fifteen: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemInfo {
  pub kernel: String,
  pub cpu_count: usize,
  pub load_average: LoadAverage,
  pub isolate_version: Option<String>,
}

/// Collect a fresh snapshot. Cheap enough to call per-request; `sysinfo`'s static accessors read
/// straight from `/proc` without needing a long-lived `System` handle refreshed in a background
/// loop.
pub async fn collect(environment: &Environment) -> SystemInfo {
  let kernel = sysinfo::System::kernel_version().unwrap_or_else(|| "unknown".to_string());
  let cpu_count = sysinfo::System::physical_core_count()
    .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
    .unwrap_or(1);
  let raw = sysinfo::System::load_average();
  let load_average = LoadAverage { one: raw.one, five: raw.five, fifteen: raw.fifteen };
  let isolate_version = probe_isolate_version(environment).await;

  SystemInfo { kernel, cpu_count, load_average, isolate_version }
}

async fn probe_isolate_version(environment: &Environment) -> Option<String> {
  let output = tokio::process::Command::new(&environment.isolate_binary)
    .arg("--version")
    .output()
    .await
    .ok()?;

  String::from_utf8_lossy(&output.stdout).lines().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn collect_reports_at_least_one_cpu() {
    let info = collect(&Environment::default()).await;
    assert!(info.cpu_count >= 1);
  }

  #[tokio::test]
  async fn missing_isolate_binary_yields_no_version() {
    let environment = Environment {
      isolate_binary: PathBuf::from("/no/such/isolate-binary"),
      ..Environment::default()
    };
    assert_eq!(probe_isolate_version(&environment).await, None);
  }
}
