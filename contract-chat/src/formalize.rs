//! Formalization of construction-agreement sections.
//!
//! The generator rewrites three free-form sections in formal contract
//! language. Its output is split back into sections by header; if generation
//! fails the caller's original text is returned unchanged.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::Generator;

const SCOPE_HEADER: &str = "--- Scope of Work ---";
const TIMELINE_HEADER: &str = "--- Project Timeline ---";
const PAYMENT_HEADER: &str = "--- Payment Details ---";
const INSTRUCTION_END: &str = "[/INST]";

/// The three drafted sections of a construction agreement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementSections {
    /// Work to be performed.
    pub scope_of_work: String,
    /// Milestones and dates.
    pub project_timeline: String,
    /// Amounts and payment schedule.
    pub payment_details: String,
}

/// Build the drafting prompt for `sections`.
pub fn build_formalize_prompt(sections: &AgreementSections) -> String {
    format!(
        "<s>[INST] You are an expert legal contract drafter.\n\
         Rewrite the following construction contract sections into a formal, precise, \
         and professional legal tone suitable for a construction agreement.\n\n\
         Clearly separate the rewritten text into:\n\
         {SCOPE_HEADER}\n{TIMELINE_HEADER}\n{PAYMENT_HEADER}\n\n\
         Do not include any additional commentary or explanations.\n\n\
         {SCOPE_HEADER}\n{}\n\n\
         {TIMELINE_HEADER}\n{}\n\n\
         {PAYMENT_HEADER}\n{} {INSTRUCTION_END}\n",
        sections.scope_of_work, sections.project_timeline, sections.payment_details
    )
}

/// Split generated text into sections by their headers.
///
/// Text before the first header is discarded when the scope header is
/// present. A missing later header leaves the remaining text in the previous
/// section. Without a scope header the whole text becomes the scope.
pub fn parse_sections(generated: &str) -> AgreementSections {
    let mut sections = AgreementSections::default();

    let Some((_, after_scope)) = generated.split_once(SCOPE_HEADER) else {
        sections.scope_of_work = generated.trim().to_string();
        return sections;
    };

    let Some((scope, after_timeline)) = after_scope.split_once(TIMELINE_HEADER) else {
        sections.scope_of_work = after_scope.trim().to_string();
        return sections;
    };
    sections.scope_of_work = scope.trim().to_string();

    match after_timeline.split_once(PAYMENT_HEADER) {
        Some((timeline, payment)) => {
            sections.project_timeline = timeline.trim().to_string();
            sections.payment_details = payment.trim().to_string();
        }
        None => sections.project_timeline = after_timeline.trim().to_string(),
    }

    sections
}

/// Rewrite `sections` in formal contract language.
///
/// Falls back to the input when the generator fails.
pub async fn formalize_agreement(
    generator: &dyn Generator,
    sections: &AgreementSections,
) -> AgreementSections {
    let prompt = build_formalize_prompt(sections);

    let raw = match generator.generate(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(generator = generator.name(), error = %e, "formalization failed, keeping original text");
            return sections.clone();
        }
    };

    let completion = raw.split_once(INSTRUCTION_END).map_or(raw.as_str(), |(_, rest)| rest).trim();
    let formal = parse_sections(completion);
    info!(
        scope_len = formal.scope_of_work.len(),
        timeline_len = formal.project_timeline.len(),
        payment_len = formal.payment_details.len(),
        "agreement formalized"
    );
    formal
}
