use super::*;

/// Resource limits for a single sandboxed run, as carried on the wire by a request's `limits`
/// object and translated 1:1 onto the isolation tool's own flags by the driver.
///
/// Fields mirror the isolate CLI option set the teacher's `Config` enumerated, trimmed to the
/// subset that is meaningful to expose over the network (box-id, cgroup root, and other
/// host-local plumbing live on `Environment` instead).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Limits {
  /// Run time limit in seconds. `None` means no limit.
  pub time: Option<f64>,

  /// Wall-clock time limit in seconds.
  pub wall_time: Option<f64>,

  /// Extra seconds granted past `time` before the process is actually killed, so the reported
  /// `time` can exceed the limit slightly without the run being aborted early.
  pub extra_time: Option<f64>,

  /// Address space limit in kilobytes, applied per process.
  pub memory: Option<u32>,

  /// Stack limit in kilobytes.
  pub stack: Option<u32>,

  /// Limit on the size of any single file the program creates or grows, in kilobytes.
  pub fsize: Option<u32>,

  /// Maximum number of processes and/or threads the program may create.
  pub processes: Option<u32>,

  /// Maximum number of open file descriptors.
  pub open_files: Option<u32>,

  /// Core dump size limit in kilobytes. Zero disables core dumps entirely.
  pub core_size: Option<u32>,

  /// Whether to give the sandboxed process its own network namespace (`false`, the default) or
  /// leave it in the host's (`true`).
  pub share_net: bool,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      time: Some(1.0),
      wall_time: Some(5.0),
      extra_time: Some(0.5),
      memory: Some(256_000),
      stack: Some(32_000),
      fsize: Some(8192),
      processes: Some(1),
      open_files: Some(64),
      core_size: Some(0),
      share_net: false,
    }
  }
}

impl Limits {
  /// Append this run's limits onto an argv buffer as isolate CLI flags. Omitted (`None`) limits
  /// are simply not passed, letting isolate fall back to its own compiled-in defaults.
  pub fn push_flags(&self, argv: &mut Vec<String>) {
    if let Some(time) = self.time {
      argv.push(format!("--time={time}"));
    }
    if let Some(wall_time) = self.wall_time {
      argv.push(format!("--wall-time={wall_time}"));
    }
    if let Some(extra_time) = self.extra_time {
      argv.push(format!("--extra-time={extra_time}"));
    }
    if let Some(memory) = self.memory {
      argv.push(format!("--mem={memory}"));
    }
    if let Some(stack) = self.stack {
      argv.push(format!("--stack={stack}"));
    }
    if let Some(fsize) = self.fsize {
      argv.push(format!("--fsize={fsize}"));
    }
    if let Some(processes) = self.processes {
      argv.push(format!("--processes={processes}"));
    } else {
      argv.push("--processes".to_string());
    }
    if let Some(open_files) = self.open_files {
      argv.push(format!("--open-files={open_files}"));
    }
    if let Some(core_size) = self.core_size {
      argv.push(format!("--core={core_size}"));
    }
    if self.share_net {
      argv.push("--share-net".to_string());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_flags_match_isolate_defaults() {
    let mut argv = Vec::new();
    Limits::default().push_flags(&mut argv);
    assert!(argv.contains(&"--time=1".to_string()));
    assert!(argv.contains(&"--wall-time=5".to_string()));
    assert!(argv.contains(&"--mem=256000".to_string()));
  }

  #[test]
  fn omitted_limit_is_not_passed() {
    let limits = Limits {
      time: None,
      ..Limits::default()
    };
    let mut argv = Vec::new();
    limits.push_flags(&mut argv);
    assert!(!argv.iter().any(|a| a.starts_with("--time=")));
  }

  #[test]
  fn unbounded_processes_uses_bare_flag() {
    let limits = Limits {
      processes: None,
      ..Limits::default()
    };
    let mut argv = Vec::new();
    limits.push_flags(&mut argv);
    assert!(argv.contains(&"--processes".to_string()));
  }

  #[test]
  fn deserializes_partial_object_with_defaults() {
    let limits: Limits = serde_json::from_str(r#"{"time": 2.5}"#).unwrap();
    assert_eq!(limits.time, Some(2.5));
    assert_eq!(limits.memory, Limits::default().memory);
  }
}
