use super::*;

use crate::{
  language::{AnyDescriptor, Descriptor, Instance, OptionBag},
  run_spec::RunSpec,
  sandbox::Driver,
};
use std::os::unix::fs::PermissionsExt;

/// One test's outcome, the test's resolved name carried alongside the run metadata isolate
/// itself has no notion of.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TestOutcome {
  pub name: String,
  #[serde(flatten)]
  pub meta: RunMetadata,
}

/// Full result of running one submission: an optional compile record (absent when the language
/// has no compile stage at all) and the ordered list of test outcomes (absent when compilation
/// failed and no test ever ran).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunResult {
  pub compile: Option<RunMetadata>,
  pub tests: Option<Vec<TestOutcome>>,
}

/// Run one submission (compile, if the language has a compile stage, then every test in order)
/// to completion.
pub async fn run(driver: &Driver, instance: &Instance) -> Result<RunResult> {
  match compile_any(driver, instance.descriptor.as_ref(), &instance.options).await? {
    Err(meta) => Ok(RunResult { compile: Some(meta), tests: None }),
    Ok(artifact) => {
      let tests = run_tests(driver, artifact.descriptor, &artifact.binary, &instance.options).await?;
      Ok(RunResult { compile: artifact.meta, tests: Some(tests) })
    }
  }
}

enum CompileOutcome {
  NotNeeded,
  Failed(RunMetadata),
  Succeeded(RunMetadata, Vec<u8>),
}

/// The result of compiling either descriptor shape down to one executable artifact: the
/// (single-stage, or final-stage-of-a-chain) descriptor that knows how to run it, the compile
/// metadata to surface (absent for interpreted languages), and the artifact bytes themselves.
pub(crate) struct CompiledArtifact<'a> {
  pub descriptor: &'a Descriptor,
  pub meta: Option<RunMetadata>,
  pub binary: Vec<u8>,
}

/// Compile a bound language instance down to a runnable artifact, handling both single-stage
/// descriptors and chains uniformly. `Err(meta)` carries the failing stage's metadata, already
/// suitable to surface directly as `result['compile']`.
pub(crate) async fn compile_any<'a>(
  driver: &Driver,
  descriptor: &'a AnyDescriptor,
  options: &OptionBag,
) -> Result<std::result::Result<CompiledArtifact<'a>, RunMetadata>> {
  match descriptor {
    AnyDescriptor::Single(descriptor) => {
      match compile_stage(driver, descriptor, &options.source, options.compile.as_ref()).await? {
        CompileOutcome::NotNeeded => Ok(Ok(CompiledArtifact {
          descriptor,
          meta: None,
          binary: options.source.clone(),
        })),
        CompileOutcome::Failed(meta) => Ok(Err(meta)),
        CompileOutcome::Succeeded(meta, binary) => Ok(Ok(CompiledArtifact {
          descriptor,
          meta: Some(meta),
          binary,
        })),
      }
    }
    AnyDescriptor::Chain(chain) => {
      let mut source = options.source.clone();
      let mut last_meta = None;

      for stage in &chain.stages {
        match compile_stage(driver, stage, &source, options.compile.as_ref()).await? {
          CompileOutcome::NotNeeded => continue,
          CompileOutcome::Failed(meta) => return Ok(Err(meta)),
          CompileOutcome::Succeeded(meta, artifact) => {
            source = artifact;
            last_meta = Some(meta);
          }
        }
      }

      let final_stage = chain
        .final_stage()
        .ok_or_else(|| Error::Internal("chain descriptor has no stages".to_string()))?;

      Ok(Ok(CompiledArtifact { descriptor: final_stage, meta: last_meta, binary: source }))
    }
  }
}

/// Compile `source` inside a fresh box, returning the compiled bytes on success. `limits`
/// defaults to isolate's own defaults when the submission did not override the compile stage.
async fn compile_stage(
  driver: &Driver,
  descriptor: &Descriptor,
  source: &[u8],
  limits: Option<&Limits>,
) -> Result<CompileOutcome> {
  if descriptor.compiler.is_none() {
    return Ok(CompileOutcome::NotNeeded);
  }

  let handle = driver.acquire().await?;
  let src_path = handle.work_dir().join(descriptor.source_filename());
  let out_path = handle.work_dir().join(descriptor.artifact_filename());
  write_file(&src_path, source).await?;

  let argv = descriptor
    .compile_command(
      driver.environment(),
      &src_path.to_string_lossy(),
      &out_path.to_string_lossy(),
    )
    .expect("compiler presence checked above");
  let program = argv[0].clone();
  let spec = RunSpec::new().arguments(argv[1..].to_vec());
  let limits = limits.cloned().unwrap_or_default();

  let meta = driver.run(&handle, &program, &limits, &spec, &descriptor.allowed_dirs).await?;

  if meta.exitcode != Some(0) {
    handle.release().await?;
    return Ok(CompileOutcome::Failed(meta));
  }

  let artifact = match tokio::fs::read(&out_path).await {
    Ok(bytes) => bytes,
    Err(_) => {
      let mut meta = meta;
      meta.stderr.extend_from_slice(b"\nCannot find result binary");
      handle.release().await?;
      return Ok(CompileOutcome::Failed(meta));
    }
  };

  handle.release().await?;
  Ok(CompileOutcome::Succeeded(meta, artifact))
}

/// Run `binary` against every test, in order, honoring the short-circuit and fatal-break rules:
/// a run that times out or errors shorts every remaining test to a zero-valued placeholder
/// record; a non-zero retcode on a test marked `fatal` (or when `all_fatal` is set) stops the
/// loop outright, so the tests after it are never even recorded.
pub(crate) async fn run_tests(
  driver: &Driver,
  descriptor: &Descriptor,
  binary: &[u8],
  options: &OptionBag,
) -> Result<Vec<TestOutcome>> {
  let tests = options.tests_or_default();
  let mut outcomes = Vec::with_capacity(tests.len());
  let mut shorted = false;

  for (index, test) in tests.iter().enumerate() {
    let name = test.name_or_default(index);

    if shorted {
      outcomes.push(TestOutcome { name, meta: RunMetadata::short_circuit() });
      continue;
    }

    let handle = driver.acquire().await?;
    let artifact_path = handle.work_dir().join(descriptor.artifact_filename());
    write_file(&artifact_path, binary).await?;
    if descriptor.compiler.is_some() {
      make_executable(&artifact_path).await?;
    }

    let argv = descriptor.execute_command(driver.environment(), &artifact_path.to_string_lossy());
    let program = argv[0].clone();
    let spec = RunSpec::new()
      .arguments(argv[1..].to_vec())
      .stdin(test.stdin.clone().unwrap_or_default());
    let limits = test
      .limits
      .clone()
      .unwrap_or_else(|| options.execute.clone().unwrap_or_default());

    let meta = driver.run(&handle, &program, &limits, &spec, &descriptor.allowed_dirs).await?;
    handle.release().await?;

    let retcode_nonzero = meta.exitcode != Some(0);
    let status_shorts_remainder = matches!(meta.status, Some(Status::TimedOut) | Some(Status::RuntimeError));
    let fatal = test.fatal || options.all_fatal;

    outcomes.push(TestOutcome { name, meta });

    if status_shorts_remainder {
      shorted = true;
    }
    if retcode_nonzero && fatal {
      break;
    }
  }

  Ok(outcomes)
}

pub(crate) async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }
  tokio::fs::write(path, bytes).await?;
  Ok(())
}

pub(crate) async fn make_executable(path: &Path) -> Result<()> {
  let mut perms = tokio::fs::metadata(path).await?.permissions();
  perms.set_mode(perms.mode() | 0o111);
  tokio::fs::set_permissions(path, perms).await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{language::Program, variable::Variable};

  fn compiled_descriptor() -> Descriptor {
    Descriptor {
      display_name: "Test C".to_string(),
      key: "testc".to_string(),
      source_ext: ".c".to_string(),
      compiler: Some(Program::new("/usr/bin/cc", vec![])),
      interpreter: None,
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "int main(){}".to_string(),
    }
  }

  fn interpreted_descriptor() -> Descriptor {
    Descriptor {
      display_name: "Test Py".to_string(),
      key: "testpy".to_string(),
      source_ext: ".py".to_string(),
      compiler: None,
      interpreter: Some(Program::new("/usr/bin/python3", vec![])),
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "print(1)".to_string(),
    }
  }

  #[test]
  fn interpreted_language_never_enters_compile_stage() {
    let descriptor = interpreted_descriptor();
    assert!(descriptor.compiler.is_none());
  }

  #[test]
  fn test_outcome_serializes_name_alongside_flattened_meta() {
    let outcome = TestOutcome { name: "test000".to_string(), meta: RunMetadata::short_circuit() };
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["name"], "test000");
    assert_eq!(json["status"], "SHORT_CIRCUIT");
  }

  #[tokio::test]
  async fn write_file_creates_parent_directories() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("box").join("source.c");
    write_file(&path, b"int main(){}").await.unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"int main(){}");
  }

  #[tokio::test]
  async fn make_executable_sets_exec_bit() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("compiled");
    tokio::fs::write(&path, b"fake binary").await.unwrap();
    make_executable(&path).await.unwrap();
    let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
  }

  // Silence unused-import warnings for descriptors kept as fixtures for future pipeline tests
  // that exercise the real sandbox via the `integration` feature.
  #[allow(dead_code)]
  fn _use_fixtures() -> (Descriptor, Variable) {
    (compiled_descriptor(), Variable::with_set_value("K", "V"))
  }
}
