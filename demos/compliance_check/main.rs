//! # Contract compliance check
//!
//! Summarizes one contract and lists potential compliance risks using an
//! OpenAI chat model.
//!
//! Requires: `OPENAI_API_KEY` environment variable.
//!
//! Run: `cargo run -p contract-chat-demos --example compliance_check --features openai,pdf -- contract.pdf`

use std::path::Path;

use contract_chat::{
    ChatError, OpenAIGenerator, PlainTextExtractor, TextExtractor, analyze_contract,
};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "pdf")]
fn pdf_text(bytes: &[u8]) -> anyhow::Result<String> {
    Ok(contract_chat::PdfTextExtractor.extract_text(bytes)?)
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(_bytes: &[u8]) -> anyhow::Result<String> {
    anyhow::bail!("rebuild with `--features pdf` to read PDF files")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: compliance_check <contract>"))?;
    let path = Path::new(&path);
    let bytes = std::fs::read(path)?;

    let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let text = if is_pdf { pdf_text(&bytes)? } else { PlainTextExtractor.extract_text(&bytes)? };

    let generator = OpenAIGenerator::from_env()?.with_max_tokens(512);

    match analyze_contract(&generator, &text).await {
        Ok(report) => {
            println!("Contract Summary");
            for (i, point) in report.summary.iter().enumerate() {
                println!("  {}. {point}", i + 1);
            }
            println!("\nPotential Risks");
            for (i, risk) in report.risks.iter().enumerate() {
                println!("  {}. {risk}", i + 1);
            }
        }
        Err(ChatError::MalformedResponse { raw }) => {
            eprintln!("Could not parse the analysis. Raw output:\n{raw}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
