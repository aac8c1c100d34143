//! Single-contract compliance analysis.
//!
//! Asks the generator for a bullet-point summary and a list of compliance
//! risks, and parses the JSON object it is asked to return. Models tend to
//! wrap the object in prose, so the parser extracts the outermost `{ … }`
//! span before deserializing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ChatError, Result};
use crate::generation::Generator;

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{.*\}").expect("unreachable error: failed to compile JSON object pattern")
});

/// Summary points and risks identified in a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Key points of the contract.
    #[serde(default)]
    pub summary: Vec<String>,
    /// Potential risks or compliance issues.
    #[serde(default)]
    pub risks: Vec<String>,
}

/// Build the compliance-analysis prompt for `contract_text`.
pub fn build_compliance_prompt(contract_text: &str) -> String {
    format!(
        "You are a legal compliance expert. Analyze the following contract content.\n\
         1. Give a clear summary of the contract in bullet points.\n\
         2. Identify potential risks or compliance issues.\n\n\
         Contract Content:\n{contract_text}\n\n\
         Provide the answer in JSON format with keys 'summary' and 'risks'.\n"
    )
}

/// Extract a [`ComplianceReport`] from raw generated text.
///
/// # Errors
///
/// Returns [`ChatError::MalformedResponse`] carrying the raw text when no
/// JSON object is found or it does not deserialize.
pub fn parse_compliance_report(raw: &str) -> Result<ComplianceReport> {
    let malformed = || ChatError::MalformedResponse { raw: raw.to_string() };

    let span = JSON_OBJECT.find(raw).ok_or_else(malformed)?;
    serde_json::from_str(span.as_str()).map_err(|e| {
        error!(error = %e, "compliance response is not valid JSON");
        malformed()
    })
}

/// Run a compliance analysis over one contract's extracted text.
///
/// # Errors
///
/// - [`ChatError::Extraction`] if `contract_text` is blank.
/// - [`ChatError::GenerationFailure`] if the generator fails.
/// - [`ChatError::MalformedResponse`] if the output cannot be parsed.
pub async fn analyze_contract(
    generator: &dyn Generator,
    contract_text: &str,
) -> Result<ComplianceReport> {
    if contract_text.trim().is_empty() {
        return Err(ChatError::Extraction(
            "could not extract text from the contract; make sure it contains selectable text"
                .to_string(),
        ));
    }

    let prompt = build_compliance_prompt(contract_text);
    let raw = generator.generate(&prompt).await.map_err(|e| match e {
        ChatError::GenerationFailure { .. } => e,
        other => ChatError::generation(generator.name(), other.to_string()),
    })?;

    // Skip the echoed prompt, whose instructions mention JSON but hold no object.
    let completion = raw.strip_prefix(prompt.as_str()).unwrap_or(&raw);
    let report = parse_compliance_report(completion)?;
    info!(summary_points = report.summary.len(), risks = report.risks.len(), "contract analyzed");
    Ok(report)
}
