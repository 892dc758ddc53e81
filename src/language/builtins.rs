use super::*;

/// The built-in descriptor table, probed against the host at registry build time. Modest by
/// design — a judge deployment is expected to extend this list, not exhaust every toolchain a
/// host might have installed.
pub fn candidates() -> Vec<AnyDescriptor> {
  vec![
    AnyDescriptor::Single(Descriptor {
      display_name: "C++23".to_string(),
      key: "cpp".to_string(),
      source_ext: ".cc".to_string(),
      compiler: Some(Program::new(
        "/usr/bin/g++",
        vec![
          "-std=c++23".to_string(),
          "-Wall".to_string(),
          "-Wextra".to_string(),
          "-O2".to_string(),
        ],
      )),
      interpreter: None,
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "#include <iostream>\nint main() { std::cout << 42 << std::endl; }\n"
        .to_string(),
    }),
    AnyDescriptor::Single(Descriptor {
      display_name: "C17".to_string(),
      key: "c".to_string(),
      source_ext: ".c".to_string(),
      compiler: Some(Program::new(
        "/usr/bin/gcc",
        vec!["-std=c17".to_string(), "-Wall".to_string(), "-O2".to_string()],
      )),
      interpreter: None,
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "#include <stdio.h>\nint main() { printf(\"42\\n\"); }\n".to_string(),
    }),
    AnyDescriptor::Single(Descriptor {
      display_name: "Python 3".to_string(),
      key: "python3".to_string(),
      source_ext: ".py".to_string(),
      compiler: None,
      interpreter: Some(Program::new("/usr/bin/python3", Vec::new())),
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "print(42)\n".to_string(),
    }),
    AnyDescriptor::Single(Descriptor {
      display_name: "PyPy".to_string(),
      key: "pypy".to_string(),
      source_ext: ".pypy".to_string(),
      compiler: None,
      interpreter: Some(Program::new("/usr/bin/pypy3", Vec::new())),
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "print(42)\n".to_string(),
    }),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn candidate_keys_are_unique() {
    let candidates = candidates();
    let mut keys: Vec<&str> = candidates.iter().map(AnyDescriptor::key).collect();
    keys.sort_unstable();
    let mut deduped = keys.clone();
    deduped.dedup();
    assert_eq!(keys.len(), deduped.len());
  }
}
