//! Drives the external isolation tool: box-id pool, single-run driver, and the interactive
//! coupler that crosses two sandboxes' stdio together.

mod driver;
mod handle;
mod interactive;
mod pool;

pub use driver::Driver;
pub use handle::Handle;
pub use interactive::{CoupledRun, Coupler};
pub use pool::Pool;

use crate::{
  environment::Environment,
  error::{Error, Result},
  limits::Limits,
  mount::Mount,
  run_meta::RunMetadata,
  run_spec::RunSpec,
  variable::Variable,
};
use std::{path::PathBuf, sync::Arc};
