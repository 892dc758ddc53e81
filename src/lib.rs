//! Sandboxed code-execution judge: compiles a submitted program inside an isolated box, runs it
//! against a list of tests inside a fresh box each, and reports structured resource-usage
//! metadata. A second, interactive mode wires two sandboxed programs together through crossed
//! pipes so a solution and an interactor can converse turn by turn while both are metered.

pub mod config;
pub mod ensure;
pub mod environment;
pub mod error;
pub mod http;
pub mod interactive_pipeline;
pub mod language;
pub mod limits;
pub mod mount;
pub mod path_ext;
pub mod pipeline;
pub mod run_meta;
pub mod run_spec;
pub mod sandbox;
pub mod system_info;
pub mod variable;

pub(crate) use {
  crate::error::{Error, Result},
  std::{
    fmt,
    fs,
    path::{Path, PathBuf},
  },
  thiserror::Error,
};

pub use crate::{
  environment::Environment, limits::Limits, run_meta::{RunMetadata, Status},
};
