use super::*;

/// Host-wide configuration for driving the external isolation tool. One `Environment` is built
/// once at startup and shared (via `Arc`) by every sandboxed run.
#[derive(Debug, Clone)]
pub struct Environment {
  /// Path to the `isolate` binary (or a compatible drop-in). Resolved once at startup; `Acquire`
  /// fails fast with `Error::InitFailed` if it is not executable.
  pub isolate_binary: PathBuf,

  /// All boxes live under this directory on the host (`isolate`'s own `box_root`). Any
  /// occurrence of `<box_root>/<N>` inside an argv, env value, or `HOME` handed to a sandboxed
  /// child must be scrubbed to an empty prefix before the child ever sees it — see
  /// `Environment::scrub_host_prefix`.
  pub box_root: PathBuf,

  /// Number of sandbox instances `isolate` was configured to support (`box-id` is in
  /// `0..num_boxes`). Bounds the size of the box-id pool.
  pub num_boxes: u32,

  /// Whether to pass `--cg` to every invocation, enabling the cgroup-backed `cg-mem` /
  /// `cg-oom-killed` metadata fields.
  pub cgroups: bool,
}

impl Default for Environment {
  fn default() -> Self {
    Self {
      isolate_binary: PathBuf::from("isolate"),
      box_root: PathBuf::from("/var/local/lib/isolate"),
      num_boxes: 64,
      cgroups: false,
    }
  }
}

impl Environment {
  /// Scrub every occurrence of this environment's box-root prefix (for any box id) out of `s`,
  /// leaving the sandbox's own view (`/box`) intact. Generalizes the hard-coded
  /// `filter_box_prefix` regex of the reference implementation this was ported from to an
  /// arbitrary configured root.
  pub fn scrub_host_prefix(&self, s: &str) -> String {
    let root = self.box_root.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(idx) = rest.find(root.as_ref()) {
      out.push_str(&rest[..idx]);
      let after_root = &rest[idx + root.len()..];
      let digits_end = after_root
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_root.len());
      if digits_end > 0 {
        // A numeric box id followed the root: this is a box path, strip it.
        rest = &after_root[digits_end..];
      } else {
        out.push_str(root.as_ref());
        rest = after_root;
      }
    }
    out.push_str(rest);
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scrubs_box_path_prefix() {
    let env = Environment::default();
    assert_eq!(
      env.scrub_host_prefix("/var/local/lib/isolate/7/box/source.c"),
      "/box/source.c"
    );
  }

  #[test]
  fn leaves_unrelated_paths_alone() {
    let env = Environment::default();
    assert_eq!(env.scrub_host_prefix("/usr/bin/gcc"), "/usr/bin/gcc");
  }

  #[test]
  fn leaves_root_without_trailing_digits_alone() {
    let env = Environment::default();
    assert_eq!(
      env.scrub_host_prefix("/var/local/lib/isolate/README"),
      "/var/local/lib/isolate/README"
    );
  }
}
