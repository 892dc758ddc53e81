use super::*;

/// Everything needed to invoke a program once inside an acquired sandbox: what to run, how to
/// run it, and what it gets to see. A `RunSpec` is built per test (or per compile step) and
/// handed to `sandbox::Driver::run`, which layers it over the environment's default mounts and
/// a language's fixed program/args.
#[derive(Debug, Clone, Default)]
pub struct RunSpec {
  /// Extra arguments appended after the program's own fixed argv.
  pub arguments: Vec<String>,

  /// Environment overlay applied on top of the sandbox's default (empty) environment.
  pub variables: Vec<Variable>,

  /// Extra mounts layered on top of the language's `allowed_dirs` and the environment's
  /// defaults. Processed in order, after the defaults, so a later entry can replace an earlier
  /// one with the same inside path.
  pub extra_mounts: Vec<Mount>,

  /// Bytes written to the child's stdin before the run starts.
  pub stdin: Vec<u8>,

  /// Working directory inside the sandbox, relative to its root. `None` uses isolate's default
  /// (`/box`).
  pub working_directory: Option<PathBuf>,
}

impl RunSpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn arguments(self, arguments: Vec<String>) -> Self {
    Self { arguments, ..self }
  }

  pub fn variables(self, variables: Vec<Variable>) -> Self {
    Self { variables, ..self }
  }

  pub fn variable(self, variable: Variable) -> Self {
    Self {
      variables: self.variables.into_iter().chain(Some(variable)).collect(),
      ..self
    }
  }

  pub fn extra_mounts(self, extra_mounts: Vec<Mount>) -> Self {
    Self {
      extra_mounts,
      ..self
    }
  }

  pub fn stdin(self, stdin: Vec<u8>) -> Self {
    Self { stdin, ..self }
  }

  pub fn working_directory(self, working_directory: Option<PathBuf>) -> Self {
    Self {
      working_directory,
      ..self
    }
  }

  /// Render the environment overlay as isolate `-E` flags, in `variables` order so a later
  /// `Set` for the same key wins (isolate applies `-E` left to right).
  pub fn push_env_flags(&self, argv: &mut Vec<String>) {
    for variable in &self.variables {
      match &variable.action {
        crate::variable::Action::Inherit => argv.push(format!("-E{}", variable.key)),
        crate::variable::Action::Clear => {} // absence from argv is isolate's "clear"
        crate::variable::Action::Set(value) => {
          argv.push(format!("-E{}={value}", variable.key));
        }
      }
    }
  }
}
