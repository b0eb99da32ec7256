// src/services/generation.rs

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{
    client::ApiClient,
    error::GenerationError,
    models::{Question, QuestionKind},
    store::wire::WireQuestion,
};

/// An uploaded source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Only non-empty `.pdf` files are accepted.
    pub fn check_supported(&self) -> Result<(), GenerationError> {
        if !self.file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(GenerationError::UnsupportedFile(format!(
                "'{}' is not a PDF file",
                self.file_name
            )));
        }
        if self.bytes.is_empty() {
            return Err(GenerationError::UnsupportedFile(format!("'{}' is empty", self.file_name)));
        }
        Ok(())
    }
}

/// Turns a document into questions of one kind.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, document: &SourceDocument, kind: QuestionKind) -> Result<Vec<Question>, GenerationError>;
}

/// Returns a fixed five-question set per kind, whatever the document says.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockQuestionGenerator;

#[async_trait]
impl QuestionGenerator for MockQuestionGenerator {
    async fn generate(&self, document: &SourceDocument, kind: QuestionKind) -> Result<Vec<Question>, GenerationError> {
        document.check_supported()?;
        tracing::debug!("Generating {} questions for {}", kind, document.file_name);

        Ok(match kind {
            QuestionKind::MultipleChoice => multiple_choice_set(),
            QuestionKind::OpenEnded => open_ended_set(),
        })
    }
}

fn multiple_choice(id: &str, text: &str, options: [&str; 4], correct: usize, explanation: &str) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_option_index: correct,
        explanation: Some(explanation.to_string()),
        kind: QuestionKind::MultipleChoice,
    }
}

fn open_ended(id: &str, text: &str, explanation: &str) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        options: Vec::new(),
        correct_option_index: 0,
        explanation: Some(explanation.to_string()),
        kind: QuestionKind::OpenEnded,
    }
}

fn multiple_choice_set() -> Vec<Question> {
    vec![
        multiple_choice(
            "1",
            "What is the primary purpose of photosynthesis in plants?",
            [
                "To produce oxygen for animals",
                "To convert light energy into chemical energy",
                "To absorb water from soil",
                "To create chlorophyll",
            ],
            1,
            "Plants convert light energy into chemical energy stored in glucose.",
        ),
        multiple_choice(
            "2",
            "Which of the following best describes machine learning?",
            [
                "A type of computer hardware",
                "A programming language",
                "A method for computers to learn from data without explicit programming",
                "A database management system",
            ],
            2,
            "Machine learning finds patterns in data to make predictions or decisions.",
        ),
        multiple_choice(
            "3",
            "What is the main function of the mitochondria in a cell?",
            ["Protein synthesis", "DNA replication", "Energy production", "Waste disposal"],
            2,
            "Mitochondria produce most of the cell's ATP through cellular respiration.",
        ),
        multiple_choice(
            "4",
            "In object-oriented programming, what is encapsulation?",
            [
                "The process of creating multiple objects",
                "Hiding internal implementation details while exposing a public interface",
                "Inheriting properties from parent classes",
                "Converting code to machine language",
            ],
            1,
            "Encapsulation bundles data with methods and hides internal details.",
        ),
        multiple_choice(
            "5",
            "What is the significance of the greenhouse effect?",
            [
                "It only causes global warming",
                "It helps maintain Earth's temperature suitable for life",
                "It only affects plant growth",
                "It has no impact on climate",
            ],
            1,
            "The greenhouse effect keeps Earth warm enough for life; excess gases drive climate change.",
        ),
    ]
}

fn open_ended_set() -> Vec<Question> {
    vec![
        open_ended(
            "1",
            "Explain the process of photosynthesis and its importance in the ecosystem.",
            "Cover light-to-chemical energy conversion, chlorophyll, glucose and oxygen production, and food chains.",
        ),
        open_ended(
            "2",
            "Describe how machine learning algorithms learn from data and give real-world applications.",
            "Cover pattern recognition, training and testing, learning paradigms, and applications such as recommendations.",
        ),
        open_ended(
            "3",
            "Analyze the role of mitochondria in cellular respiration and energy production.",
            "Cover mitochondrial structure, cellular respiration, ATP production and the electron transport chain.",
        ),
        open_ended(
            "4",
            "Compare and contrast the four main principles of object-oriented programming.",
            "Cover encapsulation, inheritance, polymorphism and abstraction with examples.",
        ),
        open_ended(
            "5",
            "Evaluate the causes and potential solutions for climate change, considering natural and human factors.",
            "Cover emissions, deforestation, industry, renewable energy, policy and individual action.",
        ),
    ]
}

#[derive(Deserialize)]
struct GeneratedQuestions {
    questions: Vec<WireQuestion>,
}

/// Uploads the document to the persistence service's generation endpoint.
#[derive(Debug, Clone)]
pub struct RemoteQuestionGenerator {
    client: ApiClient,
}

impl RemoteQuestionGenerator {
    /// `client` must carry a teacher's bearer token.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuestionGenerator for RemoteQuestionGenerator {
    async fn generate(&self, document: &SourceDocument, kind: QuestionKind) -> Result<Vec<Question>, GenerationError> {
        document.check_supported()?;

        let file = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| GenerationError::Processing(e.to_string()))?;
        let form = Form::new().text("question_type", kind.as_str()).part("file", file);

        let generated: GeneratedQuestions = self.client.post_multipart("api/v1/files/generate", form).await?;
        generated
            .questions
            .into_iter()
            .map(|q| -> Result<Question, GenerationError> {
                let question = Question {
                    id: q.id,
                    text: q.text,
                    options: q.options,
                    correct_option_index: q.correct_option_index,
                    explanation: q.explanation,
                    kind: match q.kind.as_deref() {
                        Some(raw) => raw
                            .parse()
                            .map_err(|e: crate::error::ValidationError| GenerationError::Processing(e.to_string()))?,
                        None => kind,
                    },
                };
                Ok(question)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::validate_questions;

    fn pdf() -> SourceDocument {
        SourceDocument::new("Lecture 1.PDF", b"%PDF-1.7 ...".to_vec())
    }

    #[tokio::test]
    async fn mock_sets_are_valid_for_their_kind() {
        for kind in [QuestionKind::MultipleChoice, QuestionKind::OpenEnded] {
            let questions = MockQuestionGenerator.generate(&pdf(), kind).await.unwrap();
            assert_eq!(questions.len(), 5);
            validate_questions(kind, &questions).unwrap();
        }
    }

    #[tokio::test]
    async fn rejects_non_pdf_and_empty_files() {
        let doc = SourceDocument::new("notes.docx", b"data".to_vec());
        assert!(matches!(
            MockQuestionGenerator.generate(&doc, QuestionKind::OpenEnded).await,
            Err(GenerationError::UnsupportedFile(_))
        ));

        let empty = SourceDocument::new("notes.pdf", Vec::new());
        assert!(empty.check_supported().is_err());
    }
}
