//! Completeness score for a normalized analysis.

use crate::models::AnalysisResult;

/// Weight of each of the five checks.
pub const CHECK_WEIGHT: f64 = 0.2;

/// A summary must be longer than this many characters to count.
const MIN_SUMMARY_CHARS: usize = 10;

/// Score an analysis by how many of its key sections were filled in.
///
/// Five equal checks: a summary longer than ten characters, and non-empty
/// parties, dates, financial terms, and risks. Obligations and termination
/// conditions are not scored. The summary is counted as normalized, so the
/// placeholder summary passes the length check.
pub fn confidence_score(analysis: &AnalysisResult) -> f64 {
    let checks = [
        analysis.summary.chars().count() > MIN_SUMMARY_CHARS,
        !analysis.parties.is_empty(),
        !analysis.dates.is_empty(),
        !analysis.financial_terms.is_empty(),
        !analysis.risks.is_empty(),
    ];

    let passed = checks.iter().filter(|&&c| c).count() as f64;
    round2(passed * CHECK_WEIGHT)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FinancialTerm, KeyDate, Obligation, Party, Risk, TerminationCondition};

    fn party() -> Party {
        Party {
            name: "Acme Corp".into(),
            role: "Landlord".into(),
            kind: "company".into(),
        }
    }

    fn risk() -> Risk {
        Risk {
            kind: "liability".into(),
            description: "Uncapped indemnity".into(),
            severity: "high".into(),
            recommendation: "Negotiate a cap".into(),
        }
    }

    #[test]
    fn test_partial_analysis_scores_three_fifths() {
        let analysis = AnalysisResult {
            summary: "A lease for 2y.".into(),
            parties: vec![party()],
            risks: vec![risk(), risk()],
            ..Default::default()
        };
        assert_eq!(analysis.summary.chars().count(), 15);
        assert_eq!(confidence_score(&analysis), 0.6);
    }

    #[test]
    fn test_complete_analysis_scores_one() {
        let analysis = AnalysisResult {
            summary: "Commercial lease between Acme and Beta.".into(),
            parties: vec![party()],
            dates: vec![KeyDate::default()],
            financial_terms: vec![FinancialTerm::default()],
            risks: vec![risk()],
            ..Default::default()
        };
        assert_eq!(confidence_score(&analysis), 1.0);
    }

    #[test]
    fn test_default_analysis_scores_placeholder_summary() {
        assert_eq!(confidence_score(&AnalysisResult::default()), 0.2);
    }

    #[test]
    fn test_empty_reply_scores_placeholder_summary() {
        let analysis = crate::analysis::normalize_reply("{}").unwrap();
        assert_eq!(confidence_score(&analysis), 0.2);
    }

    #[test]
    fn test_padded_summary_is_counted_untrimmed() {
        let analysis = AnalysisResult {
            summary: "    Lease.    ".into(),
            ..Default::default()
        };
        assert_eq!(confidence_score(&analysis), 0.2);
    }

    #[test]
    fn test_short_summary_does_not_count() {
        let analysis = AnalysisResult {
            summary: "Ten chars!".into(),
            ..Default::default()
        };
        assert_eq!(confidence_score(&analysis), 0.0);

        let analysis = AnalysisResult {
            summary: "Eleven chrs".into(),
            ..Default::default()
        };
        assert_eq!(confidence_score(&analysis), 0.2);
    }

    #[test]
    fn test_obligations_and_termination_are_not_scored() {
        let analysis = AnalysisResult {
            summary: String::new(),
            obligations: vec![Obligation::default()],
            termination_conditions: vec![TerminationCondition::Text("30 days notice".into())],
            ..Default::default()
        };
        assert_eq!(confidence_score(&analysis), 0.0);
    }

    #[test]
    fn test_scores_have_two_decimals() {
        let analysis = AnalysisResult {
            summary: "A sufficiently long summary".into(),
            parties: vec![party()],
            dates: vec![KeyDate::default()],
            ..Default::default()
        };
        let score = confidence_score(&analysis);
        assert_eq!(score, 0.6);
        assert_eq!(format!("{:.2}", score), "0.60");
    }
}
