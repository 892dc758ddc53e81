use super::*;

/// Outcome of a single sandboxed run, as isolate's own two-letter status codes generalize to.
///
/// `ShortCircuit` has no isolate counterpart: it marks a placeholder record synthesized when a
/// fatal test aborts the remainder of a test loop (see `pipeline::run_tests`) rather than a
/// status that ever came out of a meta file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Status {
  #[serde(rename = "OK")]
  Ok,
  #[serde(rename = "TIMED_OUT")]
  TimedOut,
  #[serde(rename = "RUNTIME_ERROR")]
  RuntimeError,
  #[serde(rename = "SIGNALED")]
  Signaled,
  #[serde(rename = "SHORT_CIRCUIT")]
  ShortCircuit,
  #[serde(rename = "INTERNAL_ERROR")]
  InternalError,
}

impl Status {
  fn from_isolate_code(code: &str) -> Self {
    match code {
      "TO" => Status::TimedOut,
      "RE" => Status::RuntimeError,
      "SG" => Status::Signaled,
      "XX" => Status::InternalError,
      _ => Status::Ok,
    }
  }
}

/// Resource-usage and outcome metadata for one sandboxed run, matching the fields isolate writes
/// to its `--meta=` file one-for-one plus the captured stdout/stderr bytes.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunMetadata {
  pub cg_mem: Option<u32>,
  pub cg_oom_killed: bool,
  pub csw_forced: Option<u32>,
  pub csw_voluntary: Option<u32>,
  pub exitcode: Option<i32>,
  pub exitsig: Option<i32>,
  pub exitsig_message: Option<String>,
  pub killed: bool,
  pub max_rss: Option<u32>,
  pub message: Option<String>,
  pub status: Option<Status>,
  pub time: Option<f64>,
  pub time_wall: Option<f64>,
  #[serde(with = "lossy_text_or_bytes")]
  pub stdout: Vec<u8>,
  #[serde(with = "lossy_text_or_bytes")]
  pub stderr: Vec<u8>,
}

/// Captured output serializes differently per wire format: human-readable encodings (JSON) get a
/// best-effort UTF-8 string, matching the reference implementation's `BinaryJsonEncoder`; binary
/// encodings (MessagePack) get the raw bytes. Deserialization always takes raw bytes, since
/// `RunMetadata` is never read back off a request — this only exists for round-trip tests.
mod lossy_text_or_bytes {
  pub fn serialize<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
      serializer.serialize_str(&String::from_utf8_lossy(bytes))
    } else {
      serde_bytes::serialize(bytes, serializer)
    }
  }

  pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    serde_bytes::deserialize(deserializer)
  }
}

impl Default for Status {
  fn default() -> Self {
    Status::Ok
  }
}

impl RunMetadata {
  /// A zero-valued placeholder record reported for every test skipped after a fatal failure
  /// aborts a run loop early.
  pub fn short_circuit() -> Self {
    Self {
      status: Some(Status::ShortCircuit),
      ..Self::default()
    }
  }

  /// Parse isolate's `key:value` meta file format, attaching the given captured stdout/stderr.
  ///
  /// Unrecognized keys are ignored rather than rejected, since isolate versions have added
  /// fields over time and an unknown one should not fail the run.
  pub fn parse(content: &str, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
    let mut meta = Self {
      stdout,
      stderr,
      ..Self::default()
    };

    for line in content.lines() {
      let Some((key, value)) = line.split_once(':') else {
        continue;
      };
      let value = value.trim();

      match key.trim() {
        "cg-mem" => meta.cg_mem = value.parse().ok(),
        "cg-oom-killed" => meta.cg_oom_killed = true,
        "csw-forced" => meta.csw_forced = value.parse().ok(),
        "csw-voluntary" => meta.csw_voluntary = value.parse().ok(),
        "exitcode" => meta.exitcode = value.parse().ok(),
        "exitsig" => meta.exitsig = value.parse().ok(),
        "exitsig-message" => meta.exitsig_message = Some(value.to_string()),
        "killed" => meta.killed = true,
        "max-rss" => meta.max_rss = value.parse().ok(),
        "message" => meta.message = Some(value.to_string()),
        "status" => meta.status = Some(Status::from_isolate_code(value)),
        "time" => meta.time = value.parse().ok(),
        "time-wall" => meta.time_wall = value.parse().ok(),
        _ => {}
      }
    }

    if meta.status.is_none() {
      meta.status = Some(Status::Ok);
    }

    meta
  }
}
