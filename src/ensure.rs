#[cfg(test)]
use super::*;

#[macro_export]
macro_rules! ensure {
  ($cond:expr, $err:expr) => {
    if !($cond) {
      return Err($err);
    }
  };
  ($cond:expr, $fmt:expr, $($arg:tt)*) => {
    if !($cond) {
      return Err($fmt.to_string(), $($arg)*);
    }
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ensures_properly() {
    fn validate_box_id(id: u32, max: u32) -> Result<()> {
      ensure!(id < max, Error::BoxExhausted);

      Ok(())
    }

    fn validate_language(known: bool, name: &str) -> Result<()> {
      ensure!(known, Error::UnknownLanguage(name.to_string()));

      Ok(())
    }

    assert!(validate_box_id(5, 10).is_ok());

    assert!(matches!(validate_box_id(10, 10), Err(Error::BoxExhausted)));

    assert!(matches!(
      validate_language(false, "cobol"),
      Err(Error::UnknownLanguage(_))
    ));
  }
}
