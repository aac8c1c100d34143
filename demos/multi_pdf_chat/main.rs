//! # Multi-document contract chat
//!
//! Loads the contracts named on the command line, then answers questions
//! typed on stdin with one answer per source document.
//!
//! Without the `openai` feature (or without `OPENAI_API_KEY`), it runs fully
//! offline: a hashed bag-of-words embedder ranks chunks and an extractive
//! generator answers with the best-matching sentence.
//!
//! Run: `cargo run -p contract-chat-demos --example multi_pdf_chat --features pdf -- lease.pdf msa.pdf`
//!
//! Commands at the prompt: `history` reprints the chat history, `exit` quits.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use contract_chat::{
    ChatConfig, ChatError, ChatSession, EmbeddingProvider, Generator, HistoryEntry,
    PlainTextExtractor, TextExtractor,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const OFFLINE_DIMENSIONS: usize = 256;

// ---------------------------------------------------------------------------
// Offline collaborators
// ---------------------------------------------------------------------------

/// Hashes each lowercase word into one of a fixed number of buckets.
struct HashedBagOfWords;

fn normalized_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.len() > 2)
}

#[async_trait]
impl EmbeddingProvider for HashedBagOfWords {
    async fn embed(&self, text: &str) -> contract_chat::Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; OFFLINE_DIMENSIONS];
        for word in normalized_words(text) {
            let hash =
                word.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(hash % OFFLINE_DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        OFFLINE_DIMENSIONS
    }

    fn name(&self) -> &str {
        "hashed-bag-of-words"
    }
}

/// Answers with the context sentence sharing the most words with the question.
struct ExtractiveGenerator;

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn generate(&self, prompt: &str) -> contract_chat::Result<String> {
        let context = section(prompt, "Contract Content:", "Question:");
        let question = section(prompt, "Question:", "Answer:");
        let question_words: Vec<String> = normalized_words(question).collect();

        let best = context
            .split_inclusive(['.', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|sentence| {
                let overlap =
                    normalized_words(sentence).filter(|w| question_words.contains(w)).count();
                (overlap, sentence)
            })
            .filter(|(overlap, _)| *overlap > 0)
            .max_by_key(|(overlap, _)| *overlap)
            .map(|(_, sentence)| sentence.to_string())
            .unwrap_or_default();

        Ok(format!("{prompt}{best}"))
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let after = prompt.split_once(start).map_or("", |(_, rest)| rest);
    after.rsplit_once(end).map_or(after, |(body, _)| body)
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn collaborators() -> anyhow::Result<(Arc<dyn EmbeddingProvider>, Arc<dyn Generator>)> {
    #[cfg(feature = "openai")]
    if std::env::var("OPENAI_API_KEY").is_ok() {
        use contract_chat::{OpenAIEmbeddingProvider, OpenAIGenerator};
        info!("using OpenAI embeddings and chat completions");
        return Ok((
            Arc::new(OpenAIEmbeddingProvider::from_env()?),
            Arc::new(OpenAIGenerator::from_env()?),
        ));
    }

    info!("running offline with hashed embeddings and extractive answers");
    Ok((Arc::new(HashedBagOfWords), Arc::new(ExtractiveGenerator)))
}

#[cfg(feature = "pdf")]
fn pdf_extractor(_path: &Path) -> Box<dyn TextExtractor> {
    Box::new(contract_chat::PdfTextExtractor)
}

#[cfg(not(feature = "pdf"))]
fn pdf_extractor(path: &Path) -> Box<dyn TextExtractor> {
    warn!(path = %path.display(), "built without the `pdf` feature; reading as plain text");
    Box::new(PlainTextExtractor)
}

fn extractor_for(path: &Path) -> Box<dyn TextExtractor> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")) {
        pdf_extractor(path)
    } else {
        Box::new(PlainTextExtractor)
    }
}

fn print_entry(entry: &HistoryEntry) {
    println!("\nQ: {}", entry.question);
    for (source, answer) in entry.answers.iter() {
        println!("  Source: {source}");
        println!("  A: {answer}");
        println!("  ---");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: multi_pdf_chat <contract> [<contract> ...]");
    }

    let (embedding_provider, generator) = collaborators()?;
    let mut session = ChatSession::builder()
        .config(ChatConfig::default())
        .embedding_provider(embedding_provider)
        .generator(generator)
        .build()?;

    for path in &paths {
        let path = Path::new(path);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let bytes = std::fs::read(path)?;

        match session.ingest_bytes(&name, &bytes, extractor_for(path).as_ref()).await {
            Ok(report) if report.chunk_count == 0 => {
                println!("{name}: no selectable text found, skipped");
            }
            Ok(report) => println!("{name}: {} chunk(s) indexed", report.chunk_count),
            Err(ChatError::DuplicateDocument { .. }) => println!("{name}: already loaded"),
            Err(e) => return Err(e.into()),
        }
    }

    println!("\nAsk a question about the uploaded contracts (`history`, `exit`).");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();

        match question {
            "" => continue,
            "exit" | "quit" => break,
            "history" => session.history().entries().iter().for_each(print_entry),
            _ => match session.ask(question).await {
                Ok(entry) => print_entry(entry),
                Err(ChatError::EmptyIndex) => println!("No contract text loaded yet."),
                Err(e) => warn!(error = %e, "question failed"),
            },
        }
    }

    Ok(())
}
