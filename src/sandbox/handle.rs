use super::*;

/// A live, initialized isolate box. Owns the box id for as long as it lives; dropping it
/// releases the id back to the pool and best-effort runs `isolate --cleanup` in the background,
/// so a handle leaked past an error path does not starve the pool.
pub struct Handle {
  pub(super) box_id: u32,
  pub(super) directory: PathBuf,
  pub(super) environment: Arc<Environment>,
  pub(super) pool: Arc<Pool>,
  released: bool,
}

impl Handle {
  pub(super) fn new(box_id: u32, directory: PathBuf, environment: Arc<Environment>, pool: Arc<Pool>) -> Self {
    Self {
      box_id,
      directory,
      environment,
      pool,
      released: false,
    }
  }

  pub fn box_id(&self) -> u32 {
    self.box_id
  }

  /// `<box_root>/<box_id>/box`, the directory the sandboxed process sees as `/box`.
  pub fn work_dir(&self) -> PathBuf {
    self.directory.join("box")
  }

  /// Explicitly run `isolate --cleanup` and release the id, rather than waiting for `Drop` to
  /// do it on a best-effort basis. Callers that want to observe cleanup failures should use
  /// this instead of letting the handle drop.
  pub async fn release(mut self) -> Result<()> {
    self.cleanup().await?;
    self.released = true;
    self.pool.release(self.box_id).await;
    Ok(())
  }

  async fn cleanup(&self) -> Result<()> {
    let status = tokio::process::Command::new(&self.environment.isolate_binary)
      .arg("--box-id")
      .arg(self.box_id.to_string())
      .arg("--cleanup")
      .status()
      .await?;

    if !status.success() {
      return Err(Error::InitFailed(format!(
        "isolate --cleanup exited with {status}"
      )));
    }
    Ok(())
  }
}

impl Drop for Handle {
  fn drop(&mut self) {
    if self.released {
      return;
    }
    let isolate_binary = self.environment.isolate_binary.clone();
    let box_id = self.box_id;
    let pool = Arc::clone(&self.pool);

    tokio::spawn(async move {
      let _ = tokio::process::Command::new(&isolate_binary)
        .arg("--box-id")
        .arg(box_id.to_string())
        .arg("--cleanup")
        .status()
        .await;
      pool.release(box_id).await;
    });
  }
}
