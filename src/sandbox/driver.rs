use super::*;
use crate::ensure;

/// Output captured from stdout/stderr is capped so a program that floods either stream cannot
/// exhaust server memory; isolate's own `fsize` limit bounds disk, this bounds what we buffer.
const MAX_CAPTURED_BYTES: usize = 1024 * 1024;

/// Drives the external isolation tool: acquires a box id, runs `isolate --init`/`--run`/
/// `--cleanup` as subprocesses, and turns their output into `RunMetadata`.
#[derive(Debug, Clone)]
pub struct Driver {
  environment: Arc<Environment>,
  pool: Arc<Pool>,
}

impl Driver {
  pub fn new(environment: Environment) -> Self {
    let pool = Pool::new(environment.num_boxes);
    Self {
      environment: Arc::new(environment),
      pool: Arc::new(pool),
    }
  }

  pub fn environment(&self) -> &Environment {
    &self.environment
  }

  /// Acquire a free box id and initialize it, returning a `Handle` that owns the id until
  /// released or dropped.
  #[tracing::instrument(skip(self))]
  pub async fn acquire(&self) -> Result<Handle> {
    let box_id = self.pool.acquire().await?;

    let mut init = tokio::process::Command::new(&self.environment.isolate_binary);
    init.arg("--box-id").arg(box_id.to_string());
    if self.environment.cgroups {
      init.arg("--cg");
    }
    init.arg("--init");

    let output = init.output().await.map_err(|e| {
      Error::InitFailed(format!("failed to spawn isolate --init: {e}"))
    })?;

    if !output.status.success() {
      self.pool.release(box_id).await;
      return Err(Error::InitFailed(
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
      ));
    }

    let directory = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    tracing::debug!(box_id, ?directory, "initialized sandbox");

    Ok(Handle::new(
      box_id,
      directory,
      Arc::clone(&self.environment),
      Arc::clone(&self.pool),
    ))
  }

  /// Run `program` with `arguments` inside `handle`, applying `limits` and the layered mount
  /// set (environment defaults, then `extra_mounts`, then the language's own allowed dirs).
  #[tracing::instrument(skip(self, handle, limits, spec))]
  pub async fn run(
    &self,
    handle: &Handle,
    program: &str,
    limits: &Limits,
    spec: &RunSpec,
    mounts: &[Mount],
  ) -> Result<RunMetadata> {
    let meta_path = handle.directory.join("meta.txt");

    let mut argv = vec![
      "--box-id".to_string(),
      handle.box_id.to_string(),
    ];
    if self.environment.cgroups {
      argv.push("--cg".to_string());
      if let Some(memory) = limits.memory {
        argv.push(format!("--cg-mem={memory}"));
      }
    }
    limits.push_flags(&mut argv);
    argv.push(format!("--meta={}", meta_path.display()));
    for mount in mounts {
      argv.push(mount.to_dir_flag());
    }
    spec.push_env_flags(&mut argv);
    if let Some(working_directory) = &spec.working_directory {
      argv.push(format!("--chdir={}", working_directory.display()));
    }
    argv.push("--run".to_string());
    argv.push("--".to_string());
    argv.push(program.to_string());
    argv.extend(spec.arguments.iter().cloned());

    tracing::debug!(box_id = handle.box_id, ?argv, "invoking isolate");

    let mut command = tokio::process::Command::new(&self.environment.isolate_binary);
    command
      .args(&argv)
      .stdin(std::process::Stdio::piped())
      .stdout(std::process::Stdio::piped())
      .stderr(std::process::Stdio::piped())
      .kill_on_drop(true);

    let mut child = command
      .spawn()
      .map_err(|e| Error::SandboxCrashed(format!("failed to spawn isolate: {e}")))?;

    let mut stdin = child.stdin.take().expect("piped stdin");
    let stdin_bytes = spec.stdin.clone();
    let writer = tokio::spawn(async move {
      use tokio::io::AsyncWriteExt;
      let _ = stdin.write_all(&stdin_bytes).await;
      drop(stdin);
    });

    let stdout = child.stdout.take().expect("piped stdout");
    let stderr = child.stderr.take().expect("piped stderr");
    let stdout_handle = tokio::spawn(read_capped(stdout, MAX_CAPTURED_BYTES));
    let stderr_handle = tokio::spawn(read_capped(stderr, MAX_CAPTURED_BYTES));

    let status = child
      .wait()
      .await
      .map_err(|e| Error::SandboxCrashed(format!("isolate did not exit cleanly: {e}")))?;

    let _ = writer.await;
    let stdout_bytes = stdout_handle.await.unwrap_or_default().unwrap_or_default();
    let stderr_bytes = stderr_handle.await.unwrap_or_default().unwrap_or_default();

    let meta_content = tokio::fs::read_to_string(&meta_path).await.unwrap_or_default();
    let _ = tokio::fs::remove_file(&meta_path).await;

    ensure!(
      !meta_content.is_empty() || status.success(),
      Error::SandboxCrashed(format!("isolate exited with {status} and produced no meta file"))
    );

    Ok(RunMetadata::parse(&meta_content, stdout_bytes, stderr_bytes))
  }
}

/// Read a pipe to EOF, keeping only the first `max_output` bytes. Reading continues past the
/// cap so the child never blocks on a full pipe buffer; the excess is simply discarded.
pub(super) async fn read_capped<R>(mut reader: R, max_output: usize) -> std::io::Result<Vec<u8>>
where
  R: tokio::io::AsyncRead + Unpin,
{
  use tokio::io::AsyncReadExt;

  let mut buf = Vec::with_capacity(max_output.min(8 * 1024));
  let mut tmp = [0u8; 8192];
  let mut remaining = max_output;

  loop {
    let n = reader.read(&mut tmp).await?;
    if n == 0 {
      break;
    }
    if remaining > 0 {
      let take = n.min(remaining);
      buf.extend_from_slice(&tmp[..take]);
      remaining -= take;
    }
  }

  Ok(buf)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn read_capped_truncates() {
    let data = vec![b'x'; 100];
    let read = read_capped(data.as_slice(), 10).await.unwrap();
    assert_eq!(read.len(), 10);
  }

  #[tokio::test]
  async fn read_capped_reads_short_input_fully() {
    let data = b"hello".to_vec();
    let read = read_capped(data.as_slice(), 1024).await.unwrap();
    assert_eq!(read, b"hello");
  }
}
