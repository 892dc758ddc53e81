use super::*;

/// Pool of free isolate box ids, bounded by `Environment::num_boxes`. Acquiring blocks (async)
/// until an id is returned; this is the one piece of shared mutable state every concurrent run
/// contends on, so it stays as small and short-held as possible.
#[derive(Debug)]
pub struct Pool {
  free: tokio::sync::Mutex<Vec<u32>>,
}

impl Pool {
  pub fn new(num_boxes: u32) -> Self {
    Self {
      free: tokio::sync::Mutex::new((0..num_boxes).rev().collect()),
    }
  }

  pub async fn acquire(&self) -> Result<u32> {
    self.free.lock().await.pop().ok_or(Error::BoxExhausted)
  }

  pub async fn release(&self, box_id: u32) {
    self.free.lock().await.push(box_id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn acquires_and_releases() {
    let pool = Pool::new(2);
    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    assert_ne!(a, b);

    assert!(matches!(pool.acquire().await, Err(Error::BoxExhausted)));

    pool.release(a).await;
    assert_eq!(pool.acquire().await.unwrap(), a);
  }
}
