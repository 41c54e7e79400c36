//! Prompt, generate, extract

use super::client::TextGenerator;
use super::prompts;
use super::Result;
use crate::content::{extract_and_validate, extract_json_array, ContentKind, Extracted};

/// Quiz and flashcard generation on top of a [`TextGenerator`]
pub struct GenerationService<G> {
    generator: G,
}

impl<G: TextGenerator> GenerationService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn generate_quiz_from_melcs(
        &self,
        subject: &str,
        grade: u8,
        count: usize,
        additional_content: &str,
    ) -> Result<Extracted> {
        let prompt = prompts::quiz_from_melcs_prompt(subject, grade, count, additional_content);
        self.generate_items(&prompt, ContentKind::Quiz).await
    }

    pub async fn generate_quiz_from_document(
        &self,
        document_text: &str,
        subject: &str,
        grade: u8,
        count: usize,
    ) -> Result<Extracted> {
        let prompt = prompts::quiz_from_document_prompt(document_text, subject, grade, count);
        self.generate_items(&prompt, ContentKind::Quiz).await
    }

    pub async fn generate_quiz(&self, subject: &str, grade: u8, count: usize) -> Result<Extracted> {
        let prompt = prompts::quiz_prompt(subject, grade, count);
        self.generate_items(&prompt, ContentKind::Quiz).await
    }

    pub async fn generate_flashcards(
        &self,
        subject: &str,
        grade: u8,
        count: usize,
        additional_content: &str,
    ) -> Result<Extracted> {
        let prompt = prompts::flashcards_prompt(subject, grade, count, additional_content);
        self.generate_items(&prompt, ContentKind::Flashcards).await
    }

    /// Run a caller-supplied prompt and return the JSON array span of the
    /// output, checked for syntax only.
    pub async fn generate_raw(&self, prompt: &str) -> Result<String> {
        let text = self.generator.generate(prompt).await?;
        log::debug!("Raw model output: {}", text);

        let span = extract_json_array(&text).map_err(|e| {
            log::warn!("Rejected raw generation output: {}", e);
            e
        })?;
        Ok(span.to_string())
    }

    async fn generate_items(&self, prompt: &str, kind: ContentKind) -> Result<Extracted> {
        let text = self.generator.generate(prompt).await?;
        log::debug!("Raw model output: {}", text);

        let extracted = extract_and_validate(&text, kind).map_err(|e| {
            log::warn!("Rejected generated {}: {}", kind, e);
            e
        })?;
        log::info!("Generated {} {} item(s)", extracted.items.len(), kind);
        Ok(extracted)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::{ContentError, GeneratedItems};
    use crate::generation::GenerationError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a fixed reply and records the prompts it was given
    pub(crate) struct StubGenerator {
        reply: std::result::Result<String, String>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|message| GenerationError::Api {
                status: 503,
                message,
            })
        }
    }

    pub(crate) const QUIZ_REPLY: &str = r#"Here is your quiz:
[
  {"question": "2 + 2?", "options": ["3", "4", "5", "6"], "correctAnswer": 1},
  {"question": "3 x 3?", "options": ["6", "8", "9", "12"], "correctAnswer": 2}
]
Good luck!"#;

    pub(crate) const FLASHCARD_REPLY: &str =
        r#"[{"question": "Capital of the Philippines?", "answer": "Manila"}]"#;

    #[tokio::test]
    async fn test_generate_quiz_from_melcs() {
        let service = GenerationService::new(StubGenerator::replying(QUIZ_REPLY));
        let extracted = service
            .generate_quiz_from_melcs("Math", 3, 2, "Multiplication")
            .await
            .unwrap();

        match &extracted.items {
            GeneratedItems::Quiz(questions) => {
                assert_eq!(questions.len(), 2);
                assert_eq!(questions[1].correct_option(), "9");
            }
            other => panic!("expected quiz, got {:?}", other),
        }

        // Exactly one generation call, carrying the request parameters
        let prompts = service.generator().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Grade 3 Math"));
        assert!(prompts[0].contains("Multiplication"));
    }

    #[tokio::test]
    async fn test_generate_flashcards() {
        let service = GenerationService::new(StubGenerator::replying(FLASHCARD_REPLY));
        let extracted = service.generate_flashcards("AP", 5, 1, "").await.unwrap();
        assert_eq!(extracted.items.kind(), ContentKind::Flashcards);
        assert_eq!(extracted.raw_json, FLASHCARD_REPLY);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_content_error() {
        // Flashcards where a quiz was requested
        let service = GenerationService::new(StubGenerator::replying(FLASHCARD_REPLY));
        let result = service.generate_quiz("Science", 6, 1).await;
        assert!(matches!(
            result,
            Err(GenerationError::Content(ContentError::Validation { .. }))
        ));
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let service = GenerationService::new(StubGenerator::failing("overloaded"));
        let result = service
            .generate_quiz_from_document("text", "Science", 6, 1)
            .await;
        assert!(matches!(result, Err(GenerationError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_generate_raw() {
        let service = GenerationService::new(StubGenerator::replying("Sure! [1, 2, 3] Done."));
        assert_eq!(service.generate_raw("numbers").await.unwrap(), "[1, 2, 3]");

        let service = GenerationService::new(StubGenerator::replying("no array here"));
        assert!(matches!(
            service.generate_raw("numbers").await,
            Err(GenerationError::Content(ContentError::Extraction))
        ));
    }
}
