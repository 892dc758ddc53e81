use super::*;

/// Process-level configuration, parsed once at startup from CLI flags (with environment variable
/// fallback via clap's `env` attribute, matching the teacher's layered-config convention).
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "judgebox-server", version, about = "Sandboxed code execution judge")]
pub struct Config {
  /// Address to bind the HTTP server to.
  #[arg(long, env = "JUDGEBOX_BIND", default_value = "127.0.0.1:8080")]
  pub bind: String,

  /// Path to the `isolate` binary.
  #[arg(long, env = "JUDGEBOX_ISOLATE_BINARY", default_value = "isolate")]
  pub isolate_binary: PathBuf,

  /// Root directory under which `isolate` creates numbered box directories.
  #[arg(long, env = "JUDGEBOX_BOX_ROOT", default_value = "/var/local/lib/isolate")]
  pub box_root: PathBuf,

  /// Number of sandbox ids available for concurrent use.
  #[arg(long, env = "JUDGEBOX_NUM_BOXES", default_value_t = 64)]
  pub num_boxes: u32,

  /// Drive `isolate --cg` so runs report `cg-mem` / `cg-oom-killed`.
  #[arg(long, env = "JUDGEBOX_CGROUPS")]
  pub cgroups: bool,

  /// Maximum accepted request body size, in bytes.
  #[arg(long, env = "JUDGEBOX_MAX_BODY_BYTES", default_value_t = 16 * 1024 * 1024)]
  pub max_body_bytes: usize,

  /// Log filter directive passed to `tracing_subscriber::EnvFilter`.
  #[arg(long, env = "JUDGEBOX_LOG", default_value = "info")]
  pub log: String,
}

impl Config {
  pub fn environment(&self) -> Environment {
    Environment {
      isolate_binary: self.isolate_binary.clone(),
      box_root: self.box_root.clone(),
      num_boxes: self.num_boxes,
      cgroups: self.cgroups,
    }
  }
}
