use super::*;

/// Declarative record for one supported language: how to compile (if at all) and run a
/// submission, plus what a smoke test looks like.
#[derive(Debug)]
pub struct Descriptor {
  pub display_name: String,
  pub key: String,
  pub source_ext: String,
  pub compiler: Option<Program>,
  pub interpreter: Option<Program>,
  pub extra_programs: Vec<Program>,
  pub allowed_dirs: Vec<Mount>,
  pub reference_source: String,
}

impl Descriptor {
  pub fn source_filename(&self) -> String {
    format!("source{}", self.source_ext)
  }

  pub fn artifact_filename(&self) -> String {
    if self.compiler.is_some() {
      "compiled".to_string()
    } else {
      format!("compiled{}", self.source_ext)
    }
  }

  /// `None` when this language has no compile stage (it is run by an interpreter directly).
  pub fn compile_command(&self, environment: &Environment, src: &str, out: &str) -> Option<Vec<String>> {
    let compiler = self.compiler.as_ref()?;
    let scrubbed_out = environment.scrub_host_prefix(out);
    let mut argv = vec![compiler.path.to_string_lossy().into_owned()];
    argv.extend(compiler.opts.iter().cloned());
    argv.extend(self.compile_opt_out(&scrubbed_out));
    argv.push(environment.scrub_host_prefix(src));
    Some(argv)
  }

  /// The output-selector flags for the compiler; overridable for compilers that spell this
  /// differently than `-o <out>`.
  pub fn compile_opt_out(&self, out: &str) -> Vec<String> {
    vec!["-o".to_string(), out.to_string()]
  }

  pub fn execute_command(&self, environment: &Environment, out: &str) -> Vec<String> {
    let mut argv = Vec::new();
    if let Some(interpreter) = &self.interpreter {
      argv.push(interpreter.path.to_string_lossy().into_owned());
      argv.extend(interpreter.opts.iter().cloned());
    }
    argv.push(environment.scrub_host_prefix(out));
    argv
  }

  /// Eligible for registration only if every Program it declares is reachable.
  pub fn is_eligible(&self) -> bool {
    self
      .compiler
      .iter()
      .chain(self.interpreter.iter())
      .chain(self.extra_programs.iter())
      .all(Program::is_accessible)
  }
}

/// A descriptor variant (C6) whose compile stage chains several descriptors' compile stages
/// together: stage N's compiled artifact becomes stage N+1's source. Deliberately does not
/// implement `Descriptor`'s single-stage `compile_command`/`execute_command` pair — direct
/// invocation of a single compile step on a chain is meaningless, so the type simply has no such
/// method rather than one that panics.
#[derive(Debug)]
pub struct ChainDescriptor {
  pub display_name: String,
  pub key: String,
  pub stages: Vec<Descriptor>,
  pub reference_source: String,
}

impl ChainDescriptor {
  pub fn is_eligible(&self) -> bool {
    self.stages.iter().all(Descriptor::is_eligible)
  }

  pub fn source_ext(&self) -> &str {
    self.stages.first().map(|s| s.source_ext.as_str()).unwrap_or("")
  }

  /// The final stage is the one whose execute semantics apply to the fully-compiled artifact.
  pub fn final_stage(&self) -> Option<&Descriptor> {
    self.stages.last()
  }
}

/// Either shape of descriptor the registry can hold.
#[derive(Debug)]
pub enum AnyDescriptor {
  Single(Descriptor),
  Chain(ChainDescriptor),
}

impl AnyDescriptor {
  pub fn display_name(&self) -> &str {
    match self {
      AnyDescriptor::Single(d) => &d.display_name,
      AnyDescriptor::Chain(d) => &d.display_name,
    }
  }

  pub fn key(&self) -> &str {
    match self {
      AnyDescriptor::Single(d) => &d.key,
      AnyDescriptor::Chain(d) => &d.key,
    }
  }

  pub fn reference_source(&self) -> &str {
    match self {
      AnyDescriptor::Single(d) => &d.reference_source,
      AnyDescriptor::Chain(d) => &d.reference_source,
    }
  }

  pub fn is_eligible(&self) -> bool {
    match self {
      AnyDescriptor::Single(d) => d.is_eligible(),
      AnyDescriptor::Chain(d) => d.is_eligible(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn descriptor(compiler: Option<Program>, interpreter: Option<Program>) -> Descriptor {
    Descriptor {
      display_name: "Test".to_string(),
      key: "test".to_string(),
      source_ext: ".t".to_string(),
      compiler,
      interpreter,
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "42".to_string(),
    }
  }

  #[test]
  fn artifact_filename_depends_on_compiler_presence() {
    let compiled = descriptor(Some(Program::new("/usr/bin/cc", vec![])), None);
    assert_eq!(compiled.artifact_filename(), "compiled");

    let interpreted = descriptor(None, Some(Program::new("/usr/bin/python3", vec![])));
    assert_eq!(interpreted.artifact_filename(), "compiled.t");
  }

  #[test]
  fn compile_command_is_none_without_compiler() {
    let environment = Environment::default();
    let interpreted = descriptor(None, Some(Program::new("/usr/bin/python3", vec![])));
    assert!(interpreted.compile_command(&environment, "source.t", "compiled").is_none());
  }

  #[test]
  fn compile_command_scrubs_host_prefix() {
    let environment = Environment::default();
    let compiled = descriptor(
      Some(Program::new("/usr/bin/g++", vec!["-O2".to_string()])),
      None,
    );

    let argv = compiled
      .compile_command(&environment, "/var/local/lib/isolate/7/box/source.t", "compiled")
      .unwrap();

    assert!(argv.iter().any(|a| a == "/box/source.t"));
  }

  #[test]
  fn execute_command_prepends_interpreter() {
    let environment = Environment::default();
    let interpreted = descriptor(
      None,
      Some(Program::new("/usr/bin/python3", vec!["-I".to_string()])),
    );

    let argv = interpreted.execute_command(&environment, "compiled.t");
    assert_eq!(
      argv,
      vec!["/usr/bin/python3".to_string(), "-I".to_string(), "compiled.t".to_string()]
    );
  }
}
