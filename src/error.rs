use super::*;

/// Every failure kind the crate can surface, from malformed request payloads down to the
/// isolation tool going missing. The HTTP layer maps this to the `{success, error}` envelope at
/// exactly one boundary (see `http::negotiation`); everywhere else it is propagated with `?`.
#[derive(Debug, Error)]
pub enum Error {
  /// The request body could not be decoded, or failed schema validation.
  #[error("malformed payload: {0}")]
  MalformedPayload(String),

  /// `lang` (or `prog.lang` / `interact.lang`) did not match any registered descriptor.
  #[error("unknown language: {0}")]
  UnknownLanguage(String),

  /// The box-id pool had no free ids at `Acquire` time.
  #[error("sandbox pool exhausted")]
  BoxExhausted,

  /// `isolate --init` exited non-zero.
  #[error("sandbox init failed: {0}")]
  InitFailed(String),

  /// A `Run` produced no meta file at all, as opposed to a meta file reporting a non-zero
  /// retcode (which is a successful `Run` carrying a failure status).
  #[error("sandbox crashed: {0}")]
  SandboxCrashed(String),

  /// A dir rule whose options are contradictory (e.g. `temporary` with an outside path).
  #[error("invalid directory rule: {0}")]
  Mount(String),

  /// Invalid configuration value supplied at startup.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// Filesystem operation on a box's working directory failed.
  #[error("filesystem error: {0}")]
  Io(#[from] std::io::Error),

  /// JSON encode/decode failure.
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// MessagePack decode failure.
  #[error("msgpack decode error: {0}")]
  MsgPackDecode(#[from] rmp_serde::decode::Error),

  /// MessagePack encode failure.
  #[error("msgpack encode error: {0}")]
  MsgPackEncode(#[from] rmp_serde::encode::Error),

  /// None of the content types in `Accept` could be satisfied by a registered encoder.
  #[error("not acceptable: {0}")]
  NotAcceptable(String),

  /// Catch-all for host-level conditions that abort the request (process spawn failure,
  /// a required binary missing from PATH, etc).
  #[error("internal error: {0}")]
  Internal(String),
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;
