//! End-to-end tests for ingest-and-ask sessions.

mod common;

use std::sync::Arc;
use std::time::Duration;

use contract_chat::{
    Answer, ChatConfig, ChatError, ChatSession, Document, NO_RELEVANT_CONTENT, PlainTextExtractor,
};

use common::{KeywordEmbedding, ScriptedGenerator, numbered_words};

const VOCABULARY: &[&str] =
    &["rent", "deposit", "tenant", "warranty", "supplier", "liability", "payment"];

fn lease() -> Document {
    Document::new(
        "lease.pdf",
        "The tenant pays rent on the first day of each month. The deposit is refundable.",
    )
}

fn supply() -> Document {
    Document::new(
        "supply.pdf",
        "The supplier gives a warranty of one year. Liability is capped. Payment is due in \
         thirty days and rent is not applicable.",
    )
}

fn session_with(
    embedder: KeywordEmbedding,
    generator: Arc<ScriptedGenerator>,
    config: ChatConfig,
) -> ChatSession {
    ChatSession::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .generator(generator)
        .build()
        .unwrap()
}

fn session(generator: Arc<ScriptedGenerator>) -> ChatSession {
    session_with(KeywordEmbedding::new(VOCABULARY), generator, ChatConfig::default())
}

#[tokio::test]
async fn single_source_gets_exactly_one_generation_call() {
    let generator = Arc::new(ScriptedGenerator::new("On the first day of the month."));
    let mut session = session(generator.clone());
    session.ingest_document(&lease()).await.unwrap();

    let entry = session.ask("When is rent due?").await.unwrap();

    let sources: Vec<&str> = entry.answers.document_ids().collect();
    assert_eq!(sources, vec!["lease.pdf"]);
    assert_eq!(
        entry.answers.get("lease.pdf"),
        Some(&Answer::Text("On the first day of the month.".into()))
    );
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn answers_are_grouped_by_best_matching_source_first() {
    let generator = Arc::new(ScriptedGenerator::new("See clause 4."));
    let mut session = session(generator.clone());
    session.ingest_document(&lease()).await.unwrap();
    session.ingest_document(&supply()).await.unwrap();

    let entry = session.ask("What warranty does the supplier give?").await.unwrap();

    let sources: Vec<&str> = entry.answers.document_ids().collect();
    assert_eq!(sources, vec!["supply.pdf", "lease.pdf"]);
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn each_prompt_only_contains_its_own_document() {
    let generator = Arc::new(ScriptedGenerator::new("ok"));
    let mut session = session(generator.clone());
    session.ingest_document(&lease()).await.unwrap();
    session.ingest_document(&supply()).await.unwrap();

    session.ask("Who pays rent?").await.unwrap();

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    let lease_prompt = prompts.iter().find(|p| p.contains("tenant pays rent")).unwrap();
    let supply_prompt = prompts.iter().find(|p| p.contains("supplier gives")).unwrap();
    assert!(!lease_prompt.contains("supplier"));
    assert!(!supply_prompt.contains("tenant"));
    assert!(lease_prompt.contains("Question: Who pays rent?"));
    assert!(lease_prompt.trim_end().ends_with("Answer:"));
}

#[tokio::test]
async fn generation_failure_is_isolated_to_its_document() {
    let generator = Arc::new(ScriptedGenerator::new("Monthly.").failing_on("supplier"));
    let mut session = session(generator.clone());
    session.ingest_document(&lease()).await.unwrap();
    session.ingest_document(&supply()).await.unwrap();

    let entry = session.ask("When is payment of rent due?").await.unwrap();

    assert_eq!(entry.answers.len(), 2);
    assert_eq!(entry.answers.get("lease.pdf"), Some(&Answer::Text("Monthly.".into())));
    let failed = entry.answers.get("supply.pdf").unwrap();
    assert!(failed.is_failure());
    assert!(failed.to_string().contains("model unavailable"));
}

#[tokio::test(start_paused = true)]
async fn generation_timeout_is_a_per_document_failure() {
    let generator = Arc::new(
        ScriptedGenerator::new("Monthly.").slow_on("supplier", Duration::from_secs(30)),
    );
    let config = ChatConfig::builder().generation_timeout_secs(2).build().unwrap();
    let mut session = session_with(KeywordEmbedding::new(VOCABULARY), generator, config);
    session.ingest_document(&lease()).await.unwrap();
    session.ingest_document(&supply()).await.unwrap();

    let entry = session.ask("Is rent or payment due monthly?").await.unwrap();

    assert_eq!(entry.answers.get("lease.pdf"), Some(&Answer::Text("Monthly.".into())));
    match entry.answers.get("supply.pdf") {
        Some(Answer::Failed(reason)) => assert!(reason.contains("timed out")),
        other => panic!("expected a timeout failure, got {other:?}"),
    }
}

#[tokio::test]
async fn echo_only_generation_records_the_sentinel() {
    let generator = Arc::new(ScriptedGenerator::new("unused").silent_on("tenant"));
    let mut session = session(generator);
    session.ingest_document(&lease()).await.unwrap();

    let entry = session.ask("Is the deposit refundable?").await.unwrap();
    let answer = entry.answers.get("lease.pdf").unwrap();

    assert_eq!(answer, &Answer::NoRelevantContent);
    assert_eq!(answer.to_string(), NO_RELEVANT_CONTENT);
    assert_eq!(answer.text(), None);
}

#[tokio::test]
async fn asking_before_ingestion_fails_and_records_nothing() {
    let generator = Arc::new(ScriptedGenerator::new("ok"));
    let mut session = session(generator.clone());

    let err = session.ask("Anything?").await.unwrap_err();

    assert!(matches!(err, ChatError::EmptyIndex));
    assert!(session.history().is_empty());
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn query_embedding_failure_fails_the_whole_question() {
    let generator = Arc::new(ScriptedGenerator::new("ok"));
    let embedder = KeywordEmbedding::new(VOCABULARY).failing_on("poison");
    let mut session = session_with(embedder, generator.clone(), ChatConfig::default());
    session.ingest_document(&lease()).await.unwrap();

    let err = session.ask("Is there poison in the rent clause?").await.unwrap_err();

    assert!(matches!(err, ChatError::EmbeddingFailure { .. }));
    assert!(session.history().is_empty());
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn duplicate_ingestion_keeps_the_index_size() {
    let mut session = session(Arc::new(ScriptedGenerator::new("ok")));
    let first = session.ingest_document(&lease()).await.unwrap();
    let size = session.index().size();

    let err = session.ingest_document(&lease()).await.unwrap_err();

    assert_eq!(first.chunk_count, 1);
    assert!(matches!(err, ChatError::DuplicateDocument { .. }));
    assert_eq!(session.index().size(), size);
}

#[tokio::test]
async fn failed_ingestion_can_be_retried() {
    let embedder = KeywordEmbedding::new(VOCABULARY).failing_on("poison");
    let mut session =
        session_with(embedder, Arc::new(ScriptedGenerator::new("ok")), ChatConfig::default());

    let err = session.ingest_document(&Document::new("a.pdf", "poison pill")).await.unwrap_err();
    assert!(matches!(err, ChatError::EmbeddingFailure { .. }));
    assert!(!session.index().is_known("a.pdf"));

    let report = session.ingest_document(&Document::new("a.pdf", "clean rent text")).await.unwrap();
    assert_eq!(report.chunk_count, 1);
    assert!(session.index().is_known("a.pdf"));
}

#[tokio::test]
async fn blank_upload_is_nothing_to_ingest() {
    let mut session = session(Arc::new(ScriptedGenerator::new("ok")));

    let report = session.ingest_bytes("scan.pdf", b" \n\t ", &PlainTextExtractor).await.unwrap();

    assert_eq!(report.chunk_count, 0);
    assert!(session.index().is_empty());
    assert!(session.index().is_known("scan.pdf"));
    let again = session.ingest_bytes("scan.pdf", b"rent", &PlainTextExtractor).await;
    assert!(matches!(again, Err(ChatError::DuplicateDocument { .. })));
}

#[tokio::test]
async fn top_k_limits_the_retrieved_chunks() {
    let generator = Arc::new(ScriptedGenerator::new("ok"));
    let config = ChatConfig::builder().chunk_size(5).chunk_overlap(0).top_k(2).build().unwrap();
    let mut session = session_with(KeywordEmbedding::new(VOCABULARY), generator.clone(), config);
    let report = session.ingest_document(&Document::new("long.pdf", numbered_words(40))).await.unwrap();
    assert_eq!(report.chunk_count, 8);

    let entry = session.ask("w3").await.unwrap();

    assert_eq!(entry.answers.len(), 1);
    let prompt = &generator.prompts()[0];
    // Every score is zero, so the first two chunks win by insertion order.
    assert!(prompt.contains("w0 w1 w2 w3 w4\nw5 w6 w7 w8 w9"));
    assert!(!prompt.contains("w10"));
}

#[tokio::test]
async fn thousand_word_document_keeps_its_chunks_when_another_is_added() {
    let mut session = session(Arc::new(ScriptedGenerator::new("ok")));
    let report = session.ingest_document(&Document::new("A", numbered_words(1000))).await.unwrap();
    assert_eq!(report.chunk_count, 3);
    let before: Vec<String> =
        (0..3).map(|i| session.index().chunk_text(i).unwrap().to_string()).collect();

    session.ingest_document(&Document::new("B", "rent and deposit")).await.unwrap();

    assert_eq!(session.index().size(), 4);
    for (i, text) in before.iter().enumerate() {
        assert_eq!(session.index().chunk_text(i), Some(text.as_str()));
        assert_eq!(session.index().source(i), Some("A"));
    }
}

#[tokio::test]
async fn history_is_chronological_and_append_only() {
    let mut session = session(Arc::new(ScriptedGenerator::new("ok")));
    session.ingest_document(&lease()).await.unwrap();

    session.ask("First question about rent?").await.unwrap();
    session.ask("Second question about the deposit?").await.unwrap();
    let _ = session.ask("").await;

    let questions: Vec<&str> =
        session.history().entries().iter().map(|e| e.question.as_str()).collect();
    assert_eq!(
        questions,
        vec!["First question about rent?", "Second question about the deposit?", ""]
    );
    assert_eq!(session.history().last().unwrap().answers.len(), 1);
}

#[test]
fn builder_requires_every_collaborator() {
    let err = ChatSession::builder().config(ChatConfig::default()).build().err().unwrap();
    assert!(matches!(err, ChatError::InvalidConfiguration(msg) if msg.contains("embedding_provider")));

    let err = ChatSession::builder()
        .embedding_provider(Arc::new(KeywordEmbedding::new(VOCABULARY)))
        .generator(Arc::new(ScriptedGenerator::new("ok")))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ChatError::InvalidConfiguration(msg) if msg.contains("config")));
}

#[test]
fn builder_revalidates_deserialized_config() {
    let config: ChatConfig =
        serde_json::from_str(r#"{"chunk_size": 10, "chunk_overlap": 10}"#).unwrap();

    let result = ChatSession::builder()
        .config(config)
        .embedding_provider(Arc::new(KeywordEmbedding::new(VOCABULARY)))
        .generator(Arc::new(ScriptedGenerator::new("ok")))
        .build();

    assert!(matches!(result, Err(ChatError::InvalidConfiguration(_))));
}
