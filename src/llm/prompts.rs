//! Prompt templates for document analysis.

/// Placeholder replaced with the document text.
pub const DOCUMENT_PLACEHOLDER: &str = "[DOCUMENT_CONTENT]";

/// Instruction sent with every analysis request.
pub const ANALYSIS_PROMPT: &str = r#"Analyze this legal document and provide a structured response with:

1. SUMMARY (2-3 sentences)
2. KEY PARTIES (names and roles)
3. IMPORTANT DATES (deadlines, effective dates, expiration)
4. FINANCIAL TERMS (amounts, payment schedules, penalties)
5. KEY OBLIGATIONS (what each party must do)
6. RISKS (potential legal or business risks)
7. TERMINATION CONDITIONS (how the agreement can end)

Document text: [DOCUMENT_CONTENT]

Format your response as JSON with these exact keys: summary, parties, dates, financial_terms, obligations, risks, termination_conditions

For parties, use this structure: [{"name": "string", "role": "string", "type": "individual|company|organization"}]
For dates, use this structure: [{"type": "string", "date": "YYYY-MM-DD", "description": "string", "importance": "low|medium|high"}]
For financial_terms, use this structure: [{"type": "payment|penalty|fee|amount", "amount": number, "currency": "string", "description": "string", "due_date": "YYYY-MM-DD"}]
For obligations, use this structure: [{"party": "string", "obligation": "string", "deadline": "YYYY-MM-DD", "priority": "low|medium|high"}]
For risks, use this structure: [{"type": "string", "description": "string", "severity": "low|medium|high", "recommendation": "string"}]

Respond only with valid JSON, no additional text."#;

/// Build the analysis prompt for a document's text.
pub fn build_analysis_prompt(document_text: &str) -> String {
    ANALYSIS_PROMPT.replacen(DOCUMENT_PLACEHOLDER, document_text, 1)
}
