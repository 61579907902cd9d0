//! Coercion of raw upstream JSON into candidates.
//!
//! Only list-shaped values are accepted. A single malformed element fails the
//! whole list so a misbehaving upstream never contributes partial garbage.

use serde_json::Value;

use crate::errors::ProviderError;
use crate::types::Candidate;

/// Converts a raw JSON value into a list of candidates.
///
/// # Errors
/// - `ProviderError::InvalidShape` - Value is not an array, or an element is not
///   an object with a usable `url`
pub fn candidates_from_value(value: Value) -> Result<Vec<Candidate>, ProviderError> {
    let Value::Array(elements) = value else {
        return Err(ProviderError::InvalidShape {
            detail: format!("expected a list, got {}", value_kind(&value)),
        });
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            if !element.is_object() {
                return Err(ProviderError::InvalidShape {
                    detail: format!("element {index} is {}, not an object", value_kind(&element)),
                });
            }

            let candidate: Candidate =
                serde_json::from_value(element).map_err(|e| ProviderError::InvalidShape {
                    detail: format!("element {index}: {e}"),
                })?;

            candidate
                .validate()
                .map_err(|detail| ProviderError::InvalidShape {
                    detail: format!("element {index}: {detail}"),
                })?;

            Ok(candidate)
        })
        .collect()
}

/// Locates the candidate list inside a response body with a JSON pointer.
///
/// A missing pointer target counts as an empty result, the common way
/// upstreams say "nothing found".
pub fn select_list(body: Value, pointer: Option<&str>) -> Value {
    match pointer {
        Some(pointer) => body
            .pointer(pointer)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
        None => body,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_accepts_well_formed_list() {
        let candidates = candidates_from_value(json!([
            {"title": "X", "url": "http://a/1", "quality": "1080p"},
            {"name": "mirror", "url": "http://a/2", "size": 1024, "headers": {"Referer": "http://a/"}}
        ]))
        .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], Candidate::new("X", "http://a/1").with_quality("1080p"));
        assert_eq!(candidates[1].display_name, "mirror");
        assert_eq!(candidates[1].size_bytes, Some(1024));
    }

    #[test]
    fn test_rejects_non_list_values() {
        for value in [json!(null), json!({"streams": []}), json!("streams"), json!(42)] {
            let error = candidates_from_value(value).unwrap_err();
            assert!(matches!(error, ProviderError::InvalidShape { .. }));
            assert_eq!(error.to_string(), "invalid result shape");
        }
    }

    #[test]
    fn test_one_malformed_element_fails_the_list() {
        let result = candidates_from_value(json!([
            {"title": "ok", "url": "http://a/1"},
            {"title": "missing url"}
        ]));
        assert!(matches!(result, Err(ProviderError::InvalidShape { .. })));

        let result = candidates_from_value(json!([{"url": ""}]));
        assert!(matches!(result, Err(ProviderError::InvalidShape { .. })));

        let result = candidates_from_value(json!(["http://a/1"]));
        assert!(matches!(result, Err(ProviderError::InvalidShape { .. })));
    }

    #[test]
    fn test_empty_list_is_success() {
        assert!(candidates_from_value(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_select_list_with_pointer() {
        let body = json!({"data": {"streams": [{"url": "http://a/1"}]}});
        let list = select_list(body.clone(), Some("/data/streams"));
        assert!(list.is_array());

        let missing = select_list(body.clone(), Some("/data/sources"));
        assert_eq!(missing, json!([]));

        assert_eq!(select_list(body.clone(), None), body);
    }
}
