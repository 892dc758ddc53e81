use super::*;

/// Name → descriptor lookup. Two variants are built from the same candidate list: `filtered`
/// drops any descriptor whose required binaries are missing (logged at registration time),
/// `unfiltered` keeps everything for introspection (`/languages`, `/test`).
#[derive(Debug)]
pub struct Registry {
  by_key: std::collections::HashMap<String, Arc<AnyDescriptor>>,
}

impl Registry {
  /// Build both a filtered and an unfiltered registry from the same candidate list. Display-name
  /// collisions (case-insensitive) are logged and the later registration wins, matching
  /// insertion order into the map.
  pub fn build(candidates: Vec<AnyDescriptor>) -> (Registry, Registry) {
    let mut unfiltered = std::collections::HashMap::new();
    let mut filtered = std::collections::HashMap::new();
    let mut seen_names: std::collections::HashMap<String, String> = std::collections::HashMap::new();

    for candidate in candidates {
      let key = candidate.key().to_lowercase();
      let display_lower = candidate.display_name().to_lowercase();

      if let Some(previous_key) = seen_names.get(&display_lower) {
        tracing::warn!(
          display_name = candidate.display_name(),
          previous_key,
          new_key = %key,
          "display-name collision, last registration wins"
        );
      }
      seen_names.insert(display_lower, key.clone());

      let descriptor = Arc::new(candidate);

      if descriptor.is_eligible() {
        filtered.insert(key.clone(), Arc::clone(&descriptor));
      } else {
        tracing::warn!(key = %key, "dropping descriptor: required binary not accessible");
      }

      unfiltered.insert(key, descriptor);
    }

    (Registry { by_key: filtered }, Registry { by_key: unfiltered })
  }

  pub fn lookup(&self, name: &str) -> Result<Arc<AnyDescriptor>> {
    self
      .by_key
      .get(&name.to_lowercase())
      .cloned()
      .ok_or_else(|| Error::UnknownLanguage(name.to_string()))
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<AnyDescriptor>> {
    self.by_key.values()
  }

  pub fn len(&self) -> usize {
    self.by_key.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_key.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn eligible_descriptor(key: &str, display_name: &str) -> AnyDescriptor {
    AnyDescriptor::Single(Descriptor {
      display_name: display_name.to_string(),
      key: key.to_string(),
      source_ext: ".t".to_string(),
      compiler: None,
      interpreter: None,
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "42".to_string(),
    })
  }

  fn ineligible_descriptor(key: &str) -> AnyDescriptor {
    AnyDescriptor::Single(Descriptor {
      display_name: key.to_string(),
      key: key.to_string(),
      source_ext: ".t".to_string(),
      compiler: Some(Program::new("/no/such/compiler", vec![])),
      interpreter: None,
      extra_programs: Vec::new(),
      allowed_dirs: Vec::new(),
      reference_source: "42".to_string(),
    })
  }

  #[test]
  fn drops_ineligible_descriptors_from_filtered_registry() {
    let (filtered, unfiltered) = Registry::build(vec![
      eligible_descriptor("ok", "Ok"),
      ineligible_descriptor("broken"),
    ]);

    assert!(filtered.lookup("ok").is_ok());
    assert!(matches!(
      filtered.lookup("broken"),
      Err(Error::UnknownLanguage(_))
    ));
    assert!(unfiltered.lookup("broken").is_ok());
  }

  #[test]
  fn lookup_is_case_insensitive() {
    let (filtered, _) = Registry::build(vec![eligible_descriptor("ok", "Ok")]);
    assert!(filtered.lookup("OK").is_ok());
  }

  #[test]
  fn unknown_language_is_reported_by_name() {
    let (filtered, _) = Registry::build(vec![]);
    assert!(matches!(
      filtered.lookup("cobol99"),
      Err(Error::UnknownLanguage(name)) if name == "cobol99"
    ));
  }

  #[test]
  fn display_name_collision_last_registration_wins() {
    let (filtered, _) = Registry::build(vec![
      eligible_descriptor("lang-a", "Same"),
      eligible_descriptor("lang-b", "Same"),
    ]);

    assert!(filtered.lookup("lang-a").is_ok());
    assert!(filtered.lookup("lang-b").is_ok());
  }
}
