//! Structured analysis of a legal document.
//!
//! Entry types deserialize leniently: the model producing them gives no
//! structural guarantees, so wrong-typed or missing fields fall back to empty
//! values instead of rejecting the whole entry.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Summary used when the model reply carries none.
pub const NO_SUMMARY: &str = "No summary available";

/// A party to the agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    /// individual, company, or organization.
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
}

/// A date mentioned in the document (deadline, effective date, expiry).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyDate {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    /// YYYY-MM-DD as produced by the model; not validated.
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// low, medium, or high.
    #[serde(default, deserialize_with = "lenient_string")]
    pub importance: String,
}

/// A payment, penalty, fee, or other amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialTerm {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<String>,
}

/// Something a party must do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub party: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub obligation: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<String>,
    /// low, medium, or high.
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: String,
}

/// A legal or business risk with a recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// low, medium, or high.
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendation: String,
}

/// How the agreement can end. The model returns either prose or an object
/// of arbitrary shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerminationCondition {
    Text(String),
    Structured(Map<String, Value>),
    Other(Value),
}

impl TerminationCondition {
    /// Render for display. Objects are rendered one line per field as
    /// `Field name: value`; nested values are shown as compact JSON.
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            Self::Text(text) => vec![text.clone()],
            Self::Structured(fields) => fields
                .iter()
                .map(|(key, value)| format!("{}: {}", humanize_key(key), render_value(value)))
                .collect(),
            Self::Other(value) => vec![render_value(value)],
        }
    }
}

fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Entry types that can be recovered from a bare string reply.
pub trait AnalysisEntry: DeserializeOwned {
    /// Field that receives a bare string entry.
    const PRIMARY_FIELD: &'static str;
}

impl AnalysisEntry for Party {
    const PRIMARY_FIELD: &'static str = "name";
}

impl AnalysisEntry for KeyDate {
    const PRIMARY_FIELD: &'static str = "description";
}

impl AnalysisEntry for FinancialTerm {
    const PRIMARY_FIELD: &'static str = "description";
}

impl AnalysisEntry for Obligation {
    const PRIMARY_FIELD: &'static str = "obligation";
}

impl AnalysisEntry for Risk {
    const PRIMARY_FIELD: &'static str = "description";
}

/// Normalized analysis content. Every list is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub dates: Vec<KeyDate>,
    #[serde(default)]
    pub financial_terms: Vec<FinancialTerm>,
    #[serde(default)]
    pub obligations: Vec<Obligation>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub termination_conditions: Vec<TerminationCondition>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            summary: NO_SUMMARY.to_string(),
            parties: Vec::new(),
            dates: Vec::new(),
            financial_terms: Vec::new(),
            obligations: Vec::new(),
            risks: Vec::new(),
            termination_conditions: Vec::new(),
        }
    }
}

/// A persisted analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    #[serde(skip_serializing)]
    #[serde(default)]
    pub document_id: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_party_tolerates_missing_and_wrong_types() {
        let party: Party = serde_json::from_value(json!({"name": "Acme", "role": 7})).unwrap();
        assert_eq!(party.name, "Acme");
        assert_eq!(party.role, "7");
        assert_eq!(party.kind, "");
    }

    #[test]
    fn test_financial_amount_from_string() {
        let term: FinancialTerm = serde_json::from_value(json!({
            "type": "payment",
            "amount": "$1,250.50",
            "currency": "USD",
            "due_date": ""
        }))
        .unwrap();
        assert_eq!(term.amount, 1250.5);
        assert_eq!(term.due_date, None);

        let term: FinancialTerm =
            serde_json::from_value(json!({"amount": "a lot", "due_date": null})).unwrap();
        assert_eq!(term.amount, 0.0);
    }

    #[test]
    fn test_termination_condition_shapes() {
        let conditions: Vec<TerminationCondition> = serde_json::from_value(json!([
            "Either party may terminate with 30 days notice",
            {"notice_period": "30 days", "cause": {"type": "breach"}},
            42
        ]))
        .unwrap();

        assert_eq!(
            conditions[0].display_lines(),
            vec!["Either party may terminate with 30 days notice".to_string()]
        );
        assert_eq!(
            conditions[1].display_lines(),
            vec![
                "Notice period: 30 days".to_string(),
                r#"Cause: {"type":"breach"}"#.to_string()
            ]
        );
        assert_eq!(conditions[2].display_lines(), vec!["42".to_string()]);
    }

    #[test]
    fn test_stored_analysis_serializes_flat() {
        let stored = StoredAnalysis {
            document_id: "doc".to_string(),
            result: AnalysisResult::default(),
            confidence_score: 0.0,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["summary"], NO_SUMMARY);
        assert_eq!(value["parties"], json!([]));
        assert_eq!(value["termination_conditions"], json!([]));
        assert!(value.get("document_id").is_none());
    }
}
