use super::*;

/// Fallback grace period when the surviving side declares no `wall_time` limit at all. Not a
/// limit the isolation tool knows about — purely a safety net so one side hanging on a read that
/// will never be answered cannot wedge a request forever.
const GRACE_PERIOD_FALLBACK: std::time::Duration = std::time::Duration::from_secs(2);

/// The grace period is the survivor's own wall-time budget: it already held that much of a
/// promise from its own limits, so waiting any less would force-kill a side that was always
/// going to finish within its own allowance. Falls back to `GRACE_PERIOD_FALLBACK` only when the
/// survivor's `wall_time` is unset.
fn grace_period(survivor_limits: &Limits) -> std::time::Duration {
  survivor_limits
    .wall_time
    .and_then(|secs| std::time::Duration::try_from_secs_f64(secs).ok())
    .unwrap_or(GRACE_PERIOD_FALLBACK)
}

/// One side of a coupled interactive run: which sandbox to invoke and with what argv/limits.
pub struct CoupledRun<'a> {
  pub handle: &'a Handle,
  pub program: &'a str,
  pub limits: &'a Limits,
  pub spec: &'a RunSpec,
  pub mounts: &'a [Mount],
}

/// Starts two sandboxed children with crossed stdio — `prog`'s stdout feeds `interact`'s stdin
/// and vice versa — and awaits their joint termination, each stderr captured independently.
pub struct Coupler<'a> {
  driver: &'a Driver,
}

impl<'a> Coupler<'a> {
  pub fn new(driver: &'a Driver) -> Self {
    Self { driver }
  }

  #[tracing::instrument(skip(self, prog, interact))]
  pub async fn run(&self, prog: CoupledRun<'_>, interact: CoupledRun<'_>) -> Result<(RunMetadata, RunMetadata)> {
    let environment = self.driver.environment();

    let mut prog_child = self.spawn(environment, &prog)?;
    let mut interact_child = self.spawn(environment, &interact)?;

    let prog_stdout = prog_child.stdout.take().expect("piped stdout");
    let interact_stdout = interact_child.stdout.take().expect("piped stdout");
    let prog_stdin = prog_child.stdin.take().expect("piped stdin");
    let interact_stdin = interact_child.stdin.take().expect("piped stdin");
    let prog_stderr = prog_child.stderr.take().expect("piped stderr");
    let interact_stderr = interact_child.stderr.take().expect("piped stderr");

    // prog's stdout feeds interact's stdin, and vice versa. Each direction ends naturally when
    // its source reaches EOF, at which point the destination's write half is dropped to deliver
    // EOF downstream.
    let prog_to_interact = tokio::spawn(pipe(prog_stdout, interact_stdin));
    let interact_to_prog = tokio::spawn(pipe(interact_stdout, prog_stdin));

    let prog_stderr_handle = tokio::spawn(super::driver::read_capped(prog_stderr, 1024 * 1024));
    let interact_stderr_handle = tokio::spawn(super::driver::read_capped(interact_stderr, 1024 * 1024));

    let (first, second_child, second_stderr_handle, second_is_prog) = tokio::select! {
      status = prog_child.wait() => (status, interact_child, interact_stderr_handle, false),
      status = interact_child.wait() => (status, prog_child, prog_stderr_handle, true),
    };
    let _ = first;

    let survivor_limits = if second_is_prog { prog.limits } else { interact.limits };
    let grace = grace_period(survivor_limits);

    let mut second_child = second_child;
    let (second_status, second_force_killed) = match tokio::time::timeout(grace, second_child.wait()).await {
      Ok(status) => (status, false),
      Err(_) => {
        let _ = second_child.kill().await;
        (second_child.wait().await, true)
      }
    };

    let _ = prog_to_interact.await;
    let _ = interact_to_prog.await;

    let prog_stderr_bytes = prog_stderr_handle.await.unwrap_or(Ok(Vec::new())).unwrap_or_default();
    let interact_stderr_bytes = interact_stderr_handle
      .await
      .unwrap_or(Ok(Vec::new()))
      .unwrap_or_default();
    let _ = second_stderr_handle;
    let _ = second_status;

    let prog_meta_path = prog.handle.directory.join("meta.txt");
    let interact_meta_path = interact.handle.directory.join("meta.txt");

    let prog_meta_content = tokio::fs::read_to_string(&prog_meta_path).await.unwrap_or_default();
    let interact_meta_content = tokio::fs::read_to_string(&interact_meta_path)
      .await
      .unwrap_or_default();

    let mut prog_meta = RunMetadata::parse(&prog_meta_content, Vec::new(), prog_stderr_bytes);
    let mut interact_meta = RunMetadata::parse(&interact_meta_content, Vec::new(), interact_stderr_bytes);

    // Only the side actually force-killed by the grace timer is reported as TIMED_OUT; a
    // survivor that exits on its own within the grace period keeps its real status.
    if second_force_killed {
      if second_is_prog {
        prog_meta.status = Some(crate::run_meta::Status::TimedOut);
      } else {
        interact_meta.status = Some(crate::run_meta::Status::TimedOut);
      }
    }

    Ok((prog_meta, interact_meta))
  }

  fn spawn(&self, environment: &Environment, run: &CoupledRun<'_>) -> Result<tokio::process::Child> {
    let meta_path = run.handle.directory.join("meta.txt");

    let mut argv = vec!["--box-id".to_string(), run.handle.box_id().to_string()];
    if environment.cgroups {
      argv.push("--cg".to_string());
    }
    run.limits.push_flags(&mut argv);
    argv.push(format!("--meta={}", meta_path.display()));
    for mount in run.mounts {
      argv.push(mount.to_dir_flag());
    }
    run.spec.push_env_flags(&mut argv);
    argv.push("--run".to_string());
    argv.push("--".to_string());
    argv.push(run.program.to_string());
    argv.extend(run.spec.arguments.iter().cloned());

    tokio::process::Command::new(&environment.isolate_binary)
      .args(&argv)
      .stdin(std::process::Stdio::piped())
      .stdout(std::process::Stdio::piped())
      .stderr(std::process::Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| Error::SandboxCrashed(format!("failed to spawn isolate: {e}")))
  }
}

async fn pipe<R, W>(mut reader: R, mut writer: W)
where
  R: tokio::io::AsyncRead + Unpin,
  W: tokio::io::AsyncWrite + Unpin,
{
  use tokio::io::AsyncWriteExt;
  let _ = tokio::io::copy(&mut reader, &mut writer).await;
  let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn grace_period_follows_survivor_wall_time() {
    let limits = Limits { wall_time: Some(10.0), ..Limits::default() };
    assert_eq!(grace_period(&limits), std::time::Duration::from_secs_f64(10.0));
  }

  #[test]
  fn grace_period_falls_back_when_wall_time_unset() {
    let limits = Limits { wall_time: None, ..Limits::default() };
    assert_eq!(grace_period(&limits), GRACE_PERIOD_FALLBACK);
  }
}
