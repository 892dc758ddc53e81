//! Content-type negotiation: request `Content-Type` selects the decoder, response `Accept`
//! selects the encoder, both restricted to the same two registered types. Mirrors the reference
//! implementation's `json_msgpack_handler` decorator, reimplemented as a pair of free functions
//! every handler in `handlers.rs` funnels through rather than a decorator macro.

use super::*;

pub const TYPE_JSON: &str = "application/json";
pub const TYPE_MSGPACK: &str = "application/msgpack";

/// Decode a request body per its declared `Content-Type`. Anything other than exactly
/// `application/msgpack` is treated as JSON, matching the reference implementation's default.
pub fn decode<T: serde::de::DeserializeOwned>(content_type: &str, body: &[u8]) -> Result<T> {
  if content_type.contains(TYPE_MSGPACK) {
    rmp_serde::from_slice(body).map_err(|e| Error::MalformedPayload(format!("malformed msgpack: {e}")))
  } else {
    serde_json::from_slice(body).map_err(|e| Error::MalformedPayload(format!("malformed json: {e}")))
  }
}

/// Parse an `Accept` header into media types ordered by descending `q` value, highest first.
/// Unparseable entries are dropped rather than rejecting the whole header.
pub fn accepted_types(accept: &str) -> Vec<String> {
  let mut entries: Vec<(f32, String)> = accept
    .split(',')
    .filter_map(|part| {
      let mut segments = part.split(';');
      let media = segments.next()?.trim().to_string();
      if media.is_empty() {
        return None;
      }
      let q = segments
        .find_map(|s| s.trim().strip_prefix("q="))
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(1.0);
      Some((q, media))
    })
    .collect();

  entries.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
  entries.into_iter().map(|(_, media)| media).collect()
}

fn expand(accepted: &[String]) -> Vec<&'static str> {
  let mut result = Vec::new();
  let mut push = |media: &'static str, result: &mut Vec<&'static str>| {
    if !result.contains(&media) {
      result.push(media);
    }
  };
  for media in accepted {
    match media.as_str() {
      TYPE_JSON => push(TYPE_JSON, &mut result),
      TYPE_MSGPACK => push(TYPE_MSGPACK, &mut result),
      "*/*" => {
        push(TYPE_JSON, &mut result);
        push(TYPE_MSGPACK, &mut result);
      }
      _ => {}
    }
  }
  result
}

/// Envelope wrapping every successful response: `{success: true, <payload fields>}`.
#[derive(serde::Serialize)]
struct SuccessEnvelope<T> {
  success: bool,
  #[serde(flatten)]
  payload: T,
}

/// Envelope wrapping every error response: `{success: false, error: <message>}`.
#[derive(serde::Serialize)]
struct ErrorEnvelope {
  success: bool,
  error: String,
}

/// Encode `value` against the first mutually-acceptable type in `accepted`. `None` means no
/// registered encoder could satisfy the `Accept` header at all.
fn encode(accepted: &[String], value: &impl serde::Serialize) -> Option<(Vec<u8>, &'static str)> {
  for content_type in expand(accepted) {
    let encoded = match content_type {
      TYPE_JSON => serde_json::to_vec(value).ok(),
      TYPE_MSGPACK => rmp_serde::to_vec_named(value).ok(),
      _ => None,
    };
    if let Some(bytes) = encoded {
      return Some((bytes, content_type));
    }
  }
  None
}

/// Turn a handler's `Result<T>` into the final HTTP response, applying the success/error
/// envelope and the `Accept`-driven encoder choice in one place — the one boundary the error
/// design calls for (see `error.rs`).
pub fn respond<T: serde::Serialize>(req: &actix_web::HttpRequest, result: Result<T>) -> actix_web::HttpResponse {
  let accept = req
    .headers()
    .get(actix_web::http::header::ACCEPT)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("*/*");
  let accepted = accepted_types(accept);

  match result {
    Ok(payload) => respond_value(&accepted, &SuccessEnvelope { success: true, payload }, 200),
    Err(error) => respond_value(&accepted, &ErrorEnvelope { success: false, error: error.to_string() }, 200),
  }
}

fn respond_value(accepted: &[String], value: &impl serde::Serialize, code: u16) -> actix_web::HttpResponse {
  match encode(accepted, value) {
    Some((bytes, content_type)) => actix_web::HttpResponse::build(
      actix_web::http::StatusCode::from_u16(code).unwrap_or(actix_web::http::StatusCode::OK),
    )
    .content_type(content_type)
    .body(bytes),
    None => {
      let accepted_msgpack = accepted.iter().any(|m| m == TYPE_MSGPACK);
      let message = if !accepted_msgpack {
        format!("use 'Accept: {TYPE_MSGPACK}' to be able to receive binary payloads")
      } else {
        "not acceptable".to_string()
      };
      actix_web::HttpResponse::NotAcceptable()
        .content_type(TYPE_JSON)
        .body(serde_json::to_vec(&ErrorEnvelope { success: false, error: message }).unwrap_or_default())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepted_types_orders_by_q_value() {
    let accepted = accepted_types("application/msgpack;q=0.5, application/json;q=0.9, */*;q=0.1");
    assert_eq!(accepted, vec!["application/json", "application/msgpack", "*/*"]);
  }

  #[test]
  fn wildcard_expands_to_both_registered_types() {
    assert_eq!(expand(&["*/*".to_string()]), vec![TYPE_JSON, TYPE_MSGPACK]);
  }

  #[test]
  fn unrecognized_media_type_is_dropped() {
    assert!(expand(&["text/html".to_string()]).is_empty());
  }

  #[test]
  fn decode_defaults_to_json() {
    let decoded: serde_json::Value = decode("text/plain", b"{\"a\":1}").unwrap();
    assert_eq!(decoded["a"], 1);
  }

  #[test]
  fn decode_malformed_json_is_reported() {
    let result: Result<serde_json::Value> = decode(TYPE_JSON, b"not json");
    assert!(matches!(result, Err(Error::MalformedPayload(_))));
  }

  #[test]
  fn round_trips_through_json_and_msgpack() {
    let accepted_json = vec![TYPE_JSON.to_string()];
    let accepted_msgpack = vec![TYPE_MSGPACK.to_string()];
    let value = serde_json::json!({"a": 1});

    let (json_bytes, ct) = encode(&accepted_json, &value).unwrap();
    assert_eq!(ct, TYPE_JSON);
    let back: serde_json::Value = serde_json::from_slice(&json_bytes).unwrap();
    assert_eq!(back, value);

    let (msgpack_bytes, ct) = encode(&accepted_msgpack, &value).unwrap();
    assert_eq!(ct, TYPE_MSGPACK);
    let back: serde_json::Value = rmp_serde::from_slice(&msgpack_bytes).unwrap();
    assert_eq!(back, value);
  }
}
