//! Request front end (C8): one `actix-web` handler per route, all funneled through the same
//! content-negotiation boundary in `negotiation.rs`.

mod handlers;
mod negotiation;
mod schema;

pub use handlers::{configure, AppState};

use crate::{
  error::{Error, Result},
  interactive_pipeline,
  language::{AnyDescriptor, Instance, OptionBag, Registry},
  pipeline,
  run_meta::Status,
  sandbox::Driver,
  system_info,
};
use std::sync::Arc;
