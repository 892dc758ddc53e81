use super::*;

/// Wire shape of a single-program submission: `{lang, source, compile?, execute?, tests?,
/// all_fatal?}`. `options` captures everything but `lang` via `#[serde(flatten)]`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SingleRunRequest {
  pub lang: String,
  #[serde(flatten)]
  pub options: OptionBag,
}

/// Wire shape of an interactive submission: two single-run payloads under `prog`/`interact`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InteractiveRequest {
  pub prog: SingleRunRequest,
  pub interact: SingleRunRequest,
}

/// `/test?exclude=a,b,c` — a single comma-separated query parameter, since `serde_urlencoded`
/// (what `actix-web`'s `Query` extractor uses) has no native support for repeated keys.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TestQuery {
  #[serde(default)]
  pub exclude: Option<String>,
}

impl TestQuery {
  pub fn excluded(&self) -> std::collections::HashSet<String> {
    self
      .exclude
      .as_deref()
      .unwrap_or("")
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_lowercase)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_run_request_flattens_options() {
    let json = serde_json::json!({"lang": "cpp", "source": "int main(){}", "all_fatal": true});
    let request: SingleRunRequest = serde_json::from_value(json).unwrap();
    assert_eq!(request.lang, "cpp");
    assert_eq!(request.options.source, b"int main(){}");
    assert!(request.options.all_fatal);
  }

  #[test]
  fn interactive_request_deserializes_both_sides() {
    let json = serde_json::json!({
      "prog": {"lang": "cpp", "source": ""},
      "interact": {"lang": "python3", "source": ""},
    });
    let request: InteractiveRequest = serde_json::from_value(json).unwrap();
    assert_eq!(request.prog.lang, "cpp");
    assert_eq!(request.interact.lang, "python3");
  }

  #[test]
  fn excluded_parses_comma_separated_query() {
    let query = TestQuery { exclude: Some("Cpp, python3".to_string()) };
    let excluded = query.excluded();
    assert!(excluded.contains("cpp"));
    assert!(excluded.contains("python3"));
    assert_eq!(excluded.len(), 2);
  }

  #[test]
  fn excluded_is_empty_by_default() {
    assert!(TestQuery::default().excluded().is_empty());
  }
}
