use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use docrag::embeddings::EmbeddingService;
use docrag::llm::TextGenerator;
use docrag::models::*;
use docrag::rag::*;
use docrag::session::SessionManager;
use docrag::store::DocumentStore;
use docrag::store::InMemoryDocumentStore;
use docrag::AppConfig;
use docrag::DocRagError;
use docrag::Result;

const PROJECT_TEXT: &str = "The project uses React and Node.js. It was supervised by Dr. Smith.";

/// Generator that replays canned replies and remembers its prompts
#[derive(Default)]
struct MockGenerator {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    fn replying(replies: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front().flatten();
        reply.ok_or_else(|| DocRagError::LlmError("rate limit reached".to_string()))
    }
}

fn setup(generator: Arc<MockGenerator>) -> (ChatService, Arc<InMemoryDocumentStore>) {
    let documents = Arc::new(InMemoryDocumentStore::new());
    let service = ChatService::new(
        &AppConfig::default(),
        generator,
        documents.clone(),
        SessionManager::in_memory(),
    );
    (service, documents)
}

#[tokio::test]
async fn test_end_to_end_technical_question() -> Result<()> {
    let generator = MockGenerator::replying(&[Some("React and Node.js")]);
    let (service, documents) = setup(generator.clone());

    let document = service
        .add_document("student-1", "final_project.pdf", PROJECT_TEXT)
        .await?;
    assert_eq!(document.chunks.len(), 1);
    assert_eq!(document.chunks[0].text, PROJECT_TEXT);

    // The pure stages agree with what the pipeline will do
    let question = "What technologies are used?";
    assert_eq!(classify(question), QueryIntent::TechnicalQuery);
    let query = EmbeddingService::default().generate(question);
    let stored = documents.load_chunks("student-1", &document.id).await?;
    let retrieved = Retriever::default().retrieve(&query, &stored);
    assert_eq!(retrieved.len(), 1);
    assert!(retrieved[0].score > 0.0);

    let reply = service.ask("student-1", &document.id, question).await?;
    assert_eq!(reply.answer, "React and Node.js");
    assert_eq!(reply.source, SourceTag::PdfContent);
    assert_eq!(reply.relevant_chunks.len(), 1);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("extracting technical information"));
    assert!(prompts[0].contains(PROJECT_TEXT));
    assert!(prompts[0].contains(question));
    assert!(prompts[0].contains(FALLBACK_ANSWER));
    assert!(prompts[0].contains("final_project.pdf"));

    Ok(())
}

#[tokio::test]
async fn test_session_alternates_over_many_cycles() -> Result<()> {
    let replies: Vec<Option<&str>> = vec![
        Some("Hello!"),
        Some("It is a web project."),
        None,
        None,
        None,
        Some("Dr. Smith."),
        Some("No date is given."),
    ];
    let (service, _) = setup(MockGenerator::replying(&replies));
    let document = service
        .add_document("student-1", "final_project.pdf", PROJECT_TEXT)
        .await?;

    let messages = [
        "hi",
        "What is this about?",
        "What technologies are used?",
        "Who supervised it?",
        "when was it finished",
    ];
    for message in messages {
        service.ask("student-1", &document.id, message).await?;
    }

    let handle = service
        .sessions()
        .get_or_create("student-1", &document.id)
        .await?;
    let session = handle.lock().await;
    assert_eq!(session.turns.len(), messages.len() * 2);
    assert!(session.is_alternating());
    assert_eq!(session.turns[0].role, Role::User);

    let sources: Vec<Option<SourceTag>> = session
        .turns
        .iter()
        .skip(1)
        .step_by(2)
        .map(|t| t.source)
        .collect();
    assert_eq!(
        sources,
        vec![
            Some(SourceTag::Greeting),
            Some(SourceTag::PdfContent),
            Some(SourceTag::Error),
            Some(SourceTag::FallbackNoContext),
            Some(SourceTag::PdfContent),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_on_one_session() -> Result<()> {
    let replies = vec![Some("ok"); 12];
    let (service, _) = setup(MockGenerator::replying(&replies));
    let service = Arc::new(service);
    let document = service
        .add_document("student-1", "final_project.pdf", PROJECT_TEXT)
        .await?;

    let mut tasks = Vec::new();
    for i in 0..12 {
        let service = Arc::clone(&service);
        let document_id = document.id.clone();
        tasks.push(tokio::spawn(async move {
            service
                .ask("student-1", &document_id, &format!("question number {i}"))
                .await
        }));
    }
    for task in tasks {
        task.await.expect("task panicked")?;
    }

    let history = service.history("student-1", &document.id).await?;
    assert_eq!(history.len(), 24);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
    }
    Ok(())
}

#[tokio::test]
async fn test_failure_detail_never_reaches_the_answer() -> Result<()> {
    let generator = MockGenerator::replying(&[None, None]);
    let (service, _) = setup(generator.clone());
    let document = service
        .add_document("student-1", "final_project.pdf", PROJECT_TEXT)
        .await?;

    let reply = service
        .ask("student-1", &document.id, "Who supervised it?")
        .await?;
    assert_eq!(reply.source, SourceTag::Error);
    assert!(!reply.answer.contains("rate limit"));
    assert!(reply
        .diagnostic
        .as_deref()
        .is_some_and(|d| d.contains("rate limit reached")));

    // Grounded attempt plus exactly one retry without context
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Dr. Smith"));
    assert!(!prompts[1].contains("Dr. Smith"));
    Ok(())
}

#[tokio::test]
async fn test_documents_are_private_and_deletion_cascades() -> Result<()> {
    let (service, documents) = setup(MockGenerator::replying(&[Some("a"), Some("b")]));
    let document = service
        .add_document("student-1", "final_project.pdf", PROJECT_TEXT)
        .await?;

    let reply = service.ask("student-2", &document.id, "Summarize it").await?;
    assert_eq!(reply.source, SourceTag::DirectNoDocument);
    assert!(reply.relevant_chunks.is_empty());

    service.ask("student-1", &document.id, "Summarize it").await?;
    assert_eq!(service.sessions().list("student-1").await?.len(), 1);

    service.delete_document("student-1", &document.id).await?;
    assert!(documents.is_empty());
    assert!(service.sessions().list("student-1").await?.is_empty());
    assert_eq!(service.sessions().list("student-2").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_blank_upload_is_rejected() {
    let (service, documents) = setup(MockGenerator::replying(&[]));
    let result = service.add_document("student-1", "scan.pdf", " \n ").await;
    assert!(matches!(result, Err(DocRagError::InvalidInput(_))));
    assert!(documents.is_empty());
}

#[test]
fn test_retrieval_never_empty_with_usable_chunks() {
    let embedder = EmbeddingService::default();
    let chunks: Vec<Chunk> = [
        "Quarterly revenue grew by four percent.",
        "The office moved to a larger building.",
    ]
    .iter()
    .map(|text| Chunk::new(*text, embedder.generate(text)))
    .collect();

    let retriever = Retriever::new(0.99, 5);
    let results = retriever.retrieve(&embedder.generate("zebra migration patterns"), &chunks);
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
}
