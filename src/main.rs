//! Binary entry point: parse configuration, build the shared `Driver` and both registry views,
//! and serve the HTTP front end.

use clap::Parser;
use judgebox::{
  config::Config,
  http,
  language::Registry,
  sandbox::Driver,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let config = Config::parse();

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new(config.log.clone()))
    .init();

  let environment = config.environment();
  let driver = Driver::new(environment);

  let (filtered, unfiltered) = Registry::build(judgebox::language::candidates());
  tracing::info!(
    filtered = filtered.len(),
    unfiltered = unfiltered.len(),
    "language registry built"
  );

  let state = actix_web::web::Data::new(http::AppState {
    driver,
    filtered: Arc::new(filtered),
    unfiltered: Arc::new(unfiltered),
  });

  let bind = config.bind.clone();
  let max_body_bytes = config.max_body_bytes;
  tracing::info!(%bind, "starting server");

  actix_web::HttpServer::new(move || {
    actix_web::App::new()
      .app_data(state.clone())
      .app_data(actix_web::web::PayloadConfig::new(max_body_bytes))
      .configure(http::configure)
  })
  .bind(&bind)?
  .run()
  .await
}
