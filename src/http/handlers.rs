use super::*;
use super::{
  negotiation,
  schema::{InteractiveRequest, SingleRunRequest, TestQuery},
};

use actix_web::{web, HttpRequest, HttpResponse};

/// Everything a request handler needs: the driver shared by every sandboxed run, and both
/// registry views (filtered for dispatch, unfiltered for introspection).
pub struct AppState {
  pub driver: Driver,
  pub filtered: Arc<Registry>,
  pub unfiltered: Arc<Registry>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/", web::get().to(index))
    .route("/run", web::post().to(run_handler))
    .route("/interactive", web::post().to(interactive_handler))
    .route("/languages", web::get().to(languages_handler))
    .route("/system", web::get().to(system_handler))
    .route("/test", web::get().to(test_handler));
}

async fn index() -> HttpResponse {
  HttpResponse::Ok().content_type("text/plain").body(
    "Welcome to judgebox. POST /run to run some code, POST /interactive to run an interactive problem.\n",
  )
}

fn content_type(req: &HttpRequest) -> String {
  req
    .headers()
    .get(actix_web::http::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or(negotiation::TYPE_JSON)
    .to_string()
}

async fn run_handler(req: HttpRequest, body: web::Bytes, state: web::Data<AppState>) -> HttpResponse {
  let result = run_impl(&content_type(&req), &body, &state).await;
  negotiation::respond(&req, result)
}

async fn run_impl(content_type: &str, body: &[u8], state: &AppState) -> Result<pipeline::RunResult> {
  let request: SingleRunRequest = negotiation::decode(content_type, body)?;
  let descriptor = state.filtered.lookup(&request.lang)?;
  let instance = Instance::new(descriptor, request.options);
  pipeline::run(&state.driver, &instance).await
}

async fn interactive_handler(req: HttpRequest, body: web::Bytes, state: web::Data<AppState>) -> HttpResponse {
  let result = interactive_impl(&content_type(&req), &body, &state).await;
  negotiation::respond(&req, result)
}

async fn interactive_impl(
  content_type: &str,
  body: &[u8],
  state: &AppState,
) -> Result<interactive_pipeline::InteractiveResult> {
  let request: InteractiveRequest = negotiation::decode(content_type, body)?;

  // Each side's lookup failure is reported against its own name, correctly scoped — not the
  // single ambiguous `lang_name` the reference handler mistakenly reused for both.
  let descriptor_prog = state
    .filtered
    .lookup(&request.prog.lang)
    .map_err(|_| Error::UnknownLanguage(format!("program: {}", request.prog.lang)))?;
  let descriptor_interact = state
    .filtered
    .lookup(&request.interact.lang)
    .map_err(|_| Error::UnknownLanguage(format!("interactor: {}", request.interact.lang)))?;

  let prog_instance = Instance::new(descriptor_prog, request.prog.options);
  let interact_instance = Instance::new(descriptor_interact, request.interact.options);

  interactive_pipeline::run(&state.driver, &prog_instance, &interact_instance).await
}

#[derive(serde::Serialize)]
struct LanguageInfo {
  name: String,
  programs: Vec<String>,
}

fn program_paths(descriptor: &AnyDescriptor) -> Vec<String> {
  fn stage_paths(stage: &crate::language::Descriptor, out: &mut Vec<String>) {
    if let Some(program) = &stage.compiler {
      out.push(program.path.display().to_string());
    }
    if let Some(program) = &stage.interpreter {
      out.push(program.path.display().to_string());
    }
    out.extend(stage.extra_programs.iter().map(|p| p.path.display().to_string()));
  }

  let mut programs = Vec::new();
  match descriptor {
    AnyDescriptor::Single(stage) => stage_paths(stage, &mut programs),
    AnyDescriptor::Chain(chain) => {
      for stage in &chain.stages {
        stage_paths(stage, &mut programs);
      }
    }
  }
  programs
}

#[derive(serde::Serialize)]
struct LanguagesResponse {
  languages: std::collections::BTreeMap<String, LanguageInfo>,
}

async fn languages_handler(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
  let languages = state
    .unfiltered
    .iter()
    .map(|descriptor| {
      let info = LanguageInfo {
        name: descriptor.display_name().to_string(),
        programs: program_paths(descriptor),
      };
      (descriptor.key().to_string(), info)
    })
    .collect();

  negotiation::respond(&req, Ok::<_, Error>(LanguagesResponse { languages }))
}

#[derive(serde::Serialize)]
struct SystemResponse {
  system: system_info::SystemInfo,
}

async fn system_handler(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
  let system = system_info::collect(state.driver.environment()).await;
  negotiation::respond(&req, Ok::<_, Error>(SystemResponse { system }))
}

#[derive(serde::Serialize)]
struct TestOutcome {
  success: bool,
}

async fn test_handler(req: HttpRequest, query: web::Query<TestQuery>, state: web::Data<AppState>) -> HttpResponse {
  let excluded = query.excluded();
  let mut results = std::collections::BTreeMap::new();

  for descriptor in state.filtered.iter() {
    let key = descriptor.key().to_string();
    if excluded.contains(&key) {
      continue;
    }
    let success = run_reference(&state.driver, descriptor).await;
    results.insert(key, TestOutcome { success });
  }

  negotiation::respond(&req, Ok::<_, Error>(serde_json::json!({ "results": results })))
}

async fn run_reference(driver: &Driver, descriptor: &Arc<AnyDescriptor>) -> bool {
  let options = OptionBag {
    source: descriptor.reference_source().as_bytes().to_vec(),
    compile: None,
    execute: None,
    tests: Vec::new(),
    all_fatal: false,
  };
  let instance = Instance::new(Arc::clone(descriptor), options);

  match pipeline::run(driver, &instance).await {
    Ok(result) => {
      let compile_ok = result.compile.as_ref().map(|meta| meta.exitcode == Some(0)).unwrap_or(true);
      let tests_ok = result
        .tests
        .as_ref()
        .map(|tests| tests.iter().all(|t| matches!(t.meta.status, Some(Status::Ok))))
        .unwrap_or(false);
      compile_ok && tests_ok
    }
    Err(_) => false,
  }
}
