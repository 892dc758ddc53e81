//! Language descriptors, the registry that resolves a request's `lang` name to one, and the
//! per-request binding (a Language Instance) that carries a submission's options.

mod builtins;
mod descriptor;
mod program;
mod registry;

pub use builtins::candidates;
pub use descriptor::{AnyDescriptor, ChainDescriptor, Descriptor};
pub use program::{Program, VersionProbe};
pub use registry::Registry;

use crate::{
  environment::Environment,
  error::{Error, Result},
  limits::Limits,
  mount::Mount,
  variable::Variable,
};
use std::{path::PathBuf, sync::{Arc, OnceLock}};

/// Per-test overrides layered onto a submission's `execute` limits.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TestSpec {
  pub name: Option<String>,
  #[serde(default, with = "serde_bytes")]
  pub stdin: Option<Vec<u8>>,
  #[serde(default)]
  pub fatal: bool,
  pub limits: Option<Limits>,
}

impl TestSpec {
  /// Zero-padded default name ("test000", "test001", ...), used when a test spec omits `name`.
  pub fn default_name(index: usize) -> String {
    format!("test{index:03}")
  }

  pub fn name_or_default(&self, index: usize) -> String {
    self.name.clone().unwrap_or_else(|| Self::default_name(index))
  }
}

/// One submission's full set of options: source to compile/run, per-stage limits, and the test
/// list to execute it against.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct OptionBag {
  #[serde(with = "serde_bytes")]
  pub source: Vec<u8>,
  pub compile: Option<Limits>,
  pub execute: Option<Limits>,
  #[serde(default)]
  pub tests: Vec<TestSpec>,
  #[serde(default)]
  pub all_fatal: bool,
}

impl OptionBag {
  /// `tests` absent (empty) defaults to a single empty spec, per the pipeline's tie-break rule.
  pub fn tests_or_default(&self) -> Vec<TestSpec> {
    if self.tests.is_empty() {
      vec![TestSpec::default()]
    } else {
      self.tests.clone()
    }
  }
}

/// A descriptor bound to one request's options. Created per request, discarded at response
/// emission; never shared across requests.
pub struct Instance {
  pub descriptor: Arc<AnyDescriptor>,
  pub options: OptionBag,
}

impl Instance {
  pub fn new(descriptor: Arc<AnyDescriptor>, options: OptionBag) -> Self {
    Self { descriptor, options }
  }
}
