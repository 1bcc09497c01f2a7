//! Tolerant coercion of a free-text LLM reply into an [`AnalysisResult`].
//!
//! The reply may wrap its JSON in prose or code fences. The first balanced
//! `{...}` span is parsed and each of the seven fields is defaulted on its
//! own, so a partially malformed reply still yields a usable result.

use serde_json::{Map, Value};

use super::AnalysisError;
use crate::models::{AnalysisEntry, AnalysisResult, TerminationCondition, NO_SUMMARY};

/// Find the first balanced `{...}` span, ignoring braces inside JSON strings.
pub fn find_json_object(reply: &str) -> Option<&str> {
    let bytes = reply.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = reply[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(bytes, start) {
            return Some(&reply[start..=end]);
        }
        search_from = start + 1;
    }
    None
}

/// Index of the brace closing the one at `start`, if any.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and normalize a raw LLM reply.
pub fn normalize_reply(reply: &str) -> Result<AnalysisResult, AnalysisError> {
    let span = find_json_object(reply).ok_or_else(|| {
        AnalysisError::InvalidAnalysisFormat("no JSON object in reply".to_string())
    })?;

    let value: Value = serde_json::from_str(span)
        .map_err(|e| AnalysisError::InvalidAnalysisFormat(format!("unparseable JSON: {}", e)))?;

    normalize_value(&value)
}

/// Normalize an already-parsed reply object.
pub fn normalize_value(value: &Value) -> Result<AnalysisResult, AnalysisError> {
    let obj = value.as_object().ok_or_else(|| {
        AnalysisError::InvalidAnalysisFormat("top level is not a JSON object".to_string())
    })?;

    Ok(AnalysisResult {
        summary: summary_field(obj),
        parties: entries(obj, "parties"),
        dates: entries(obj, "dates"),
        financial_terms: entries(obj, "financial_terms"),
        obligations: entries(obj, "obligations"),
        risks: entries(obj, "risks"),
        termination_conditions: termination_conditions(obj),
    })
}

/// Falsy summaries (missing, null, `false`, zero, empty string) get the
/// placeholder; any other value is kept, non-strings as their JSON text.
fn summary_field(obj: &Map<String, Value>) -> String {
    match obj.get("summary") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => NO_SUMMARY.to_string(),
        Some(Value::String(s)) if s.is_empty() => NO_SUMMARY.to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => NO_SUMMARY.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// List field as typed entries. Non-array values give an empty list; bare
/// strings are placed in the entry's primary field; other scalars are dropped.
fn entries<T: AnalysisEntry>(obj: &Map<String, Value>, key: &str) -> Vec<T> {
    let Some(Value::Array(items)) = obj.get(key) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => serde_json::from_value(item.clone()).ok(),
            Value::String(s) if !s.trim().is_empty() => {
                let mut fields = Map::new();
                fields.insert(T::PRIMARY_FIELD.to_string(), Value::String(s.clone()));
                serde_json::from_value(Value::Object(fields)).ok()
            }
            _ => None,
        })
        .collect()
}

fn termination_conditions(obj: &Map<String, Value>) -> Vec<TerminationCondition> {
    let Some(Value::Array(items)) = obj.get("termination_conditions") else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(s) => Some(TerminationCondition::Text(s.clone())),
            Value::Object(map) => Some(TerminationCondition::Structured(map.clone())),
            other => Some(TerminationCondition::Other(other.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_json_object_in_prose() {
        let reply = "Sure! Here is the analysis:\n```json\n{\"summary\": \"x\"}\n```\nLet me know.";
        assert_eq!(find_json_object(reply), Some("{\"summary\": \"x\"}"));
    }

    #[test]
    fn test_find_json_object_ignores_braces_in_strings() {
        let reply = r#"{"summary": "uses } and { and \" quotes", "risks": []} trailing }"#;
        assert_eq!(
            find_json_object(reply),
            Some(r#"{"summary": "uses } and { and \" quotes", "risks": []}"#)
        );
    }

    #[test]
    fn test_find_json_object_takes_first_span() {
        let reply = r#"{"a": 1} {"b": 2}"#;
        assert_eq!(find_json_object(reply), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_find_json_object_skips_unclosed_brace() {
        let reply = r#"Note { this never closes... {"summary": "ok"}"#;
        assert_eq!(find_json_object(reply), Some(r#"{"summary": "ok"}"#));
        assert_eq!(find_json_object("no braces here"), None);
        assert_eq!(find_json_object("{ unbalanced"), None);
    }

    #[test]
    fn test_empty_object_gets_all_defaults() {
        let result = normalize_reply("{}").unwrap();
        assert_eq!(result.summary, NO_SUMMARY);
        assert!(result.parties.is_empty());
        assert!(result.dates.is_empty());
        assert!(result.financial_terms.is_empty());
        assert!(result.obligations.is_empty());
        assert!(result.risks.is_empty());
        assert!(result.termination_conditions.is_empty());
    }

    #[test]
    fn test_unrecognized_keys_get_all_defaults() {
        let result = normalize_reply(r#"{"title": "Lease", "pages": 4}"#).unwrap();
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_null_and_wrong_typed_fields_default_independently() {
        let reply = r#"{
            "summary": null,
            "parties": "Acme and Beta",
            "dates": null,
            "financial_terms": {"amount": 5},
            "risks": [{"type": "liability", "description": "Uncapped", "severity": "high", "recommendation": "Cap it"}]
        }"#;
        let result = normalize_reply(reply).unwrap();
        assert_eq!(result.summary, NO_SUMMARY);
        assert!(result.parties.is_empty());
        assert!(result.dates.is_empty());
        assert!(result.financial_terms.is_empty());
        assert_eq!(result.risks.len(), 1);
        assert_eq!(result.risks[0].severity, "high");
    }

    #[test]
    fn test_string_entries_fill_primary_field() {
        let reply = r#"{"parties": ["Acme Corp", {"name": "Beta LLC", "role": "Tenant", "type": "company"}, 7, null]}"#;
        let result = normalize_reply(reply).unwrap();
        assert_eq!(result.parties.len(), 2);
        assert_eq!(result.parties[0].name, "Acme Corp");
        assert_eq!(result.parties[0].role, "");
        assert_eq!(result.parties[1].role, "Tenant");
    }

    #[test]
    fn test_termination_conditions_mixed_shapes() {
        let reply = r#"{"termination_conditions": ["30 days notice", {"event": "breach", "cure_period": 10}, null, 3]}"#;
        let result = normalize_reply(reply).unwrap();
        assert_eq!(result.termination_conditions.len(), 3);
        assert!(matches!(result.termination_conditions[0], TerminationCondition::Text(_)));
        assert!(matches!(
            result.termination_conditions[1],
            TerminationCondition::Structured(_)
        ));
        assert!(matches!(result.termination_conditions[2], TerminationCondition::Other(_)));
    }

    #[test]
    fn test_falsy_summary_uses_placeholder() {
        for reply in [
            r#"{"summary": ""}"#,
            r#"{"summary": false}"#,
            r#"{"summary": 0}"#,
            r#"{"summary": 0.0}"#,
        ] {
            assert_eq!(normalize_reply(reply).unwrap().summary, NO_SUMMARY, "{}", reply);
        }
    }

    #[test]
    fn test_truthy_summary_is_kept() {
        assert_eq!(normalize_reply(r#"{"summary": "   "}"#).unwrap().summary, "   ");
        assert_eq!(normalize_reply(r#"{"summary": 3}"#).unwrap().summary, "3");
        assert_eq!(normalize_reply(r#"{"summary": true}"#).unwrap().summary, "true");
    }

    #[test]
    fn test_invalid_replies() {
        assert!(matches!(
            normalize_reply("I cannot analyze this document."),
            Err(AnalysisError::InvalidAnalysisFormat(_))
        ));
        assert!(matches!(
            normalize_reply("{summary: 'single quotes'}"),
            Err(AnalysisError::InvalidAnalysisFormat(_))
        ));
        assert!(matches!(
            normalize_value(&serde_json::json!(["not", "an", "object"])),
            Err(AnalysisError::InvalidAnalysisFormat(_))
        ));
    }
}
