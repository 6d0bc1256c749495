//! Lenient decoding of model-produced JSON.
//!
//! Models wrap JSON in Markdown fences or prose often enough that every
//! caller needs the same recovery: strip fences, then fall back to the
//! first-`{`-through-last-`}` substring. Callers pattern-match the returned
//! `Result` instead of scattering ad-hoc cleanup.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;

/// Decode a JSON value out of raw model output.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(direct_err) => {
            if let Some(bounded) = brace_bounded(&cleaned) {
                if let Ok(value) = serde_json::from_str(bounded) {
                    debug!("recovered JSON from brace-bounded substring");
                    return Ok(value);
                }
            }
            Err(Error::parse(format!(
                "model output is not valid JSON: {direct_err}"
            )))
        }
    }
}

/// Remove Markdown code-fence markers, keeping the fenced content.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

fn brace_bounded(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    struct Payload {
        summary: String,
    }

    #[test]
    fn test_plain_json() {
        let payload: Payload = decode_json(r#"{"summary": "ok"}"#).unwrap();
        assert_eq!(payload.summary, "ok");
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"summary\": \"fenced\"}\n```";
        let payload: Payload = decode_json(raw).unwrap();
        assert_eq!(payload.summary, "fenced");
    }

    #[test]
    fn test_prose_wrapped_json() {
        let raw = "Sure! Here is the answer:\n{\"summary\": \"wrapped\"}\nHope that helps.";
        let payload: Payload = decode_json(raw).unwrap();
        assert_eq!(payload.summary, "wrapped");
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = decode_json::<Payload>("no json here at all").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_brace_bounds_require_order() {
        assert!(brace_bounded("} {").is_none());
        assert_eq!(brace_bounded("x {\"a\":1} y"), Some("{\"a\":1}"));
    }
}
