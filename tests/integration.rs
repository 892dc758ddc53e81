#![cfg(feature = "integration")]

//! End-to-end tests against a real `isolate` binary. Skipped unless the `integration` feature is
//! enabled and `isolate` is reachable on PATH (or `JUDGEBOX_ISOLATE_BINARY` points at it) and the
//! process has the privileges `isolate --init` requires.

use judgebox::{
  environment::Environment,
  language::{AnyDescriptor, Descriptor, Instance, OptionBag, Program, TestSpec},
  pipeline,
  sandbox::Driver,
};

fn driver() -> Driver {
  let isolate_binary = std::env::var("JUDGEBOX_ISOLATE_BINARY").unwrap_or_else(|_| "isolate".to_string());
  Driver::new(Environment {
    isolate_binary: isolate_binary.into(),
    ..Environment::default()
  })
}

fn c_descriptor() -> AnyDescriptor {
  AnyDescriptor::Single(Descriptor {
    display_name: "Test C".to_string(),
    key: "testc".to_string(),
    source_ext: ".c".to_string(),
    compiler: Some(Program::new("/usr/bin/gcc", vec!["-O2".to_string()])),
    interpreter: None,
    extra_programs: Vec::new(),
    allowed_dirs: Vec::new(),
    reference_source: "#include <stdio.h>\nint main(){ printf(\"42\\n\"); return 0; }\n".to_string(),
  })
}

#[tokio::test]
async fn compiles_and_runs_a_clean_program() {
  let driver = driver();
  let descriptor = std::sync::Arc::new(c_descriptor());
  let options = OptionBag {
    source: descriptor.reference_source().as_bytes().to_vec(),
    compile: None,
    execute: None,
    tests: Vec::new(),
    all_fatal: false,
  };
  let instance = Instance::new(descriptor, options);

  let result = pipeline::run(&driver, &instance).await.unwrap();

  assert_eq!(result.compile.unwrap().exitcode, Some(0));
  let tests = result.tests.unwrap();
  assert_eq!(tests.len(), 1);
  assert_eq!(tests[0].meta.exitcode, Some(0));
  assert_eq!(tests[0].meta.stdout, b"42\n");
}

#[tokio::test]
async fn reports_compile_failure_without_running_tests() {
  let driver = driver();
  let descriptor = std::sync::Arc::new(c_descriptor());
  let options = OptionBag {
    source: b"this is not valid c".to_vec(),
    compile: None,
    execute: None,
    tests: Vec::new(),
    all_fatal: false,
  };
  let instance = Instance::new(descriptor, options);

  let result = pipeline::run(&driver, &instance).await.unwrap();

  assert_ne!(result.compile.unwrap().exitcode, Some(0));
  assert!(result.tests.is_none());
}

#[tokio::test]
async fn fatal_test_short_circuits_the_remainder() {
  let driver = driver();
  let descriptor = std::sync::Arc::new(c_descriptor());
  let options = OptionBag {
    source: b"int main(){ return 1; }\n".to_vec(),
    compile: None,
    execute: None,
    tests: vec![
      TestSpec { name: Some("first".to_string()), fatal: true, ..TestSpec::default() },
      TestSpec { name: Some("second".to_string()), ..TestSpec::default() },
    ],
    all_fatal: false,
  };
  let instance = Instance::new(descriptor, options);

  let result = pipeline::run(&driver, &instance).await.unwrap();
  let tests = result.tests.unwrap();

  assert_eq!(tests.len(), 1);
  assert_eq!(tests[0].name, "first");
}
