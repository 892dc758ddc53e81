use super::*;

use crate::{
  language::Instance,
  pipeline::{self, CompiledArtifact, RunResult, TestOutcome},
  run_spec::RunSpec,
  sandbox::{CoupledRun, Coupler, Driver},
};

/// Paired result of an interactive request: one `RunResult` per side, same shape as a single
/// run's, so the front end can serialize both under `prog`/`interact` with no special-casing.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InteractiveResult {
  pub prog: RunResult,
  pub interact: RunResult,
}

/// Run a solution (`prog`) against an interactor (`interact`): compile both independently, then
/// drive the interactor's test list through the Coupler one test at a time.
pub async fn run(driver: &Driver, prog: &Instance, interact: &Instance) -> Result<InteractiveResult> {
  let (prog_compiled, interact_compiled) = tokio::join!(
    pipeline::compile_any(driver, prog.descriptor.as_ref(), &prog.options),
    pipeline::compile_any(driver, interact.descriptor.as_ref(), &interact.options),
  );
  let prog_compiled = prog_compiled?;
  let interact_compiled = interact_compiled?;

  let prog_compile_meta = match &prog_compiled {
    Ok(artifact) => artifact.meta.clone(),
    Err(meta) => Some(meta.clone()),
  };
  let interact_compile_meta = match &interact_compiled {
    Ok(artifact) => artifact.meta.clone(),
    Err(meta) => Some(meta.clone()),
  };

  // Either side failing to produce a binary skips every test on both sides.
  let (prog_artifact, interact_artifact) = match (prog_compiled, interact_compiled) {
    (Ok(p), Ok(i)) => (p, i),
    _ => {
      return Ok(InteractiveResult {
        prog: RunResult { compile: prog_compile_meta, tests: None },
        interact: RunResult { compile: interact_compile_meta, tests: None },
      });
    }
  };

  // The interactor's own test list is authoritative for both the count and the per-test fatal
  // flag; prog's tests (if the request even set any) are not consulted here.
  let tests = interact.options.tests_or_default();
  let mut prog_outcomes = Vec::with_capacity(tests.len());
  let mut interact_outcomes = Vec::with_capacity(tests.len());
  let mut shorted = false;

  for (index, test) in tests.iter().enumerate() {
    let name = test.name_or_default(index);

    if shorted {
      prog_outcomes.push(TestOutcome { name: name.clone(), meta: RunMetadata::short_circuit() });
      interact_outcomes.push(TestOutcome { name, meta: RunMetadata::short_circuit() });
      continue;
    }

    let prog_limits = prog.options.execute.clone().unwrap_or_default();
    let interact_limits = interact.options.execute.clone().unwrap_or_default();

    let (prog_meta, interact_meta) = run_test_pair(
      driver,
      &prog_artifact,
      &interact_artifact,
      test.stdin.as_deref().unwrap_or(&[]),
      &prog_limits,
      &interact_limits,
    )
    .await?;

    // Per the coupler's own contract (§4.2), only prog's status short-circuits the remaining
    // tests; an interactor that times out or errors does not, by design (see DESIGN.md).
    let prog_shorts_remainder = matches!(prog_meta.status, Some(Status::TimedOut) | Some(Status::RuntimeError));
    let retcode_nonzero = prog_meta.exitcode != Some(0) || interact_meta.exitcode != Some(0);
    let fatal = test.fatal || interact.options.all_fatal;

    prog_outcomes.push(TestOutcome { name: name.clone(), meta: prog_meta });
    interact_outcomes.push(TestOutcome { name, meta: interact_meta });

    if prog_shorts_remainder {
      shorted = true;
    }
    if retcode_nonzero && fatal {
      break;
    }
  }

  Ok(InteractiveResult {
    prog: RunResult { compile: prog_compile_meta, tests: Some(prog_outcomes) },
    interact: RunResult { compile: interact_compile_meta, tests: Some(interact_outcomes) },
  })
}

/// Materialize both artifacts into fresh boxes, seed the interactor's input file, and hand both
/// to the `Coupler` for one crossed-stdio run.
async fn run_test_pair(
  driver: &Driver,
  prog: &CompiledArtifact<'_>,
  interact: &CompiledArtifact<'_>,
  seed_input: &[u8],
  prog_limits: &Limits,
  interact_limits: &Limits,
) -> Result<(RunMetadata, RunMetadata)> {
  let prog_handle = driver.acquire().await?;
  let interact_handle = driver.acquire().await?;

  let prog_artifact_path = prog_handle.work_dir().join(prog.descriptor.artifact_filename());
  pipeline::write_file(&prog_artifact_path, &prog.binary).await?;
  if prog.descriptor.compiler.is_some() {
    pipeline::make_executable(&prog_artifact_path).await?;
  }

  let interact_artifact_path = interact_handle.work_dir().join(interact.descriptor.artifact_filename());
  pipeline::write_file(&interact_artifact_path, &interact.binary).await?;
  if interact.descriptor.compiler.is_some() {
    pipeline::make_executable(&interact_artifact_path).await?;
  }

  let input_path = interact_handle.work_dir().join("input.txt");
  pipeline::write_file(&input_path, seed_input).await?;

  let environment = driver.environment();
  let prog_argv = prog.descriptor.execute_command(environment, &prog_artifact_path.to_string_lossy());
  let mut interact_argv =
    interact.descriptor.execute_command(environment, &interact_artifact_path.to_string_lossy());
  interact_argv.push(environment.scrub_host_prefix(&input_path.to_string_lossy()));

  let prog_program = prog_argv[0].clone();
  let prog_spec = RunSpec::new().arguments(prog_argv[1..].to_vec());

  let interact_program = interact_argv[0].clone();
  let interact_spec = RunSpec::new().arguments(interact_argv[1..].to_vec());

  let coupler = Coupler::new(driver);
  let result = coupler
    .run(
      CoupledRun {
        handle: &prog_handle,
        program: &prog_program,
        limits: prog_limits,
        spec: &prog_spec,
        mounts: &prog.descriptor.allowed_dirs,
      },
      CoupledRun {
        handle: &interact_handle,
        program: &interact_program,
        limits: interact_limits,
        spec: &interact_spec,
        mounts: &interact.descriptor.allowed_dirs,
      },
    )
    .await;

  // Best-effort cleanup: a release failure here must not mask the run result it raced to
  // collect; a leaked handle still gets cleaned up via its `Drop` impl.
  let _ = prog_handle.release().await;
  let _ = interact_handle.release().await;

  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interactive_result_defaults_to_no_tests() {
    let result = InteractiveResult::default();
    assert!(result.prog.tests.is_none());
    assert!(result.interact.tests.is_none());
  }

  #[test]
  fn interactive_result_serializes_both_sides() {
    let result = InteractiveResult {
      prog: RunResult { compile: None, tests: Some(vec![]) },
      interact: RunResult { compile: None, tests: Some(vec![]) },
    };
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("prog").is_some());
    assert!(json.get("interact").is_some());
  }
}
