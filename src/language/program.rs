use super::*;

/// A recognized external executable: a compiler, an interpreter, or any other binary a
/// descriptor needs on the host. Immutable after construction; a version probe result is cached
/// the first time it succeeds.
#[derive(Debug)]
pub struct Program {
  pub path: PathBuf,
  pub opts: Vec<String>,
  pub env: Vec<Variable>,
  version_probe: Option<VersionProbe>,
  version_cache: OnceLock<String>,
}

#[derive(Debug, Clone)]
pub struct VersionProbe {
  pub argument: String,
  pub header_lines: usize,
  /// Extracts the version token out of the probe's header lines; most compiler/interpreter
  /// `--version` banners bury the version number in surrounding text (e.g. `gcc (Ubuntu
  /// 11.4.0-1ubuntu1) 11.4.0`).
  pub regex: regex::Regex,
}

/// Matches the first dotted version number in a `--version` banner (`11.4.0`, `3.11`, ...).
fn default_version_regex() -> regex::Regex {
  regex::Regex::new(r"\d+(?:\.\d+)+").expect("valid regex")
}

impl Program {
  pub fn new(path: impl Into<PathBuf>, opts: Vec<String>) -> Self {
    Self {
      path: path.into(),
      opts,
      env: Vec::new(),
      version_probe: Some(VersionProbe {
        argument: "--version".to_string(),
        header_lines: 1,
        regex: default_version_regex(),
      }),
      version_cache: OnceLock::new(),
    }
  }

  pub fn with_version_probe(self, probe: Option<VersionProbe>) -> Self {
    Self {
      version_probe: probe,
      ..self
    }
  }

  pub fn with_env(self, env: Vec<Variable>) -> Self {
    Self { env, ..self }
  }

  /// Whether this binary exists and is executable by the current process.
  pub fn is_accessible(&self) -> bool {
    nix::unistd::access(&self.path, nix::unistd::AccessFlags::X_OK).is_ok()
  }

  /// Run the version probe, caching the matched version after the first success. Returns `None`
  /// if no probe is configured, the binary could not be run, or its banner's header lines didn't
  /// contain anything the probe's regex recognized as a version.
  pub async fn version(&self) -> Option<&str> {
    if let Some(cached) = self.version_cache.get() {
      return Some(cached);
    }

    let probe = self.version_probe.as_ref()?;
    let output = tokio::process::Command::new(&self.path)
      .arg(&probe.argument)
      .output()
      .await
      .ok()?;

    let text = String::from_utf8_lossy(&output.stdout);
    let header: String = text
      .lines()
      .take(probe.header_lines)
      .collect::<Vec<_>>()
      .join("\n");

    let version = probe.regex.find(&header)?.as_str().to_string();

    Some(self.version_cache.get_or_init(|| version))
  }
}
