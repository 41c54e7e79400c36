//! Prompt templates
//!
//! Every template asks for a bare JSON array in the exact shape the content
//! extractor validates.

const QUIZ_FORMAT: &str = r#"[
  {
    "question": "What is the capital of the Philippines?",
    "options": ["Manila", "Cebu", "Davao", "Quezon City"],
    "correctAnswer": 0
  }
]"#;

const FLASHCARD_FORMAT: &str = r#"[
  {
    "question": "What is the capital of the Philippines?",
    "answer": "Manila"
  }
]"#;

const JSON_ONLY: &str = "IMPORTANT: Respond with ONLY a valid JSON array. Do not include any additional text, \
explanations, or formatting. The response must be parseable as JSON directly.";

fn quiz_requirements(count: usize) -> String {
    format!(
        "Requirements:
- Generate exactly {count} questions
- Each question must have exactly 4 distinct options
- correctAnswer must be a valid index (0-3) pointing to the correct option
- Make questions clear and unambiguous
- Include one definitively correct answer
- Make incorrect options plausible but clearly wrong"
    )
}

fn additional_section(additional_content: &str) -> String {
    if additional_content.trim().is_empty() {
        String::new()
    } else {
        format!("\n\nAdditional content to consider:\n{}", additional_content.trim())
    }
}

/// Quiz grounded in the DepEd Most Essential Learning Competencies for a
/// subject and grade.
pub fn quiz_from_melcs_prompt(subject: &str, grade: u8, count: usize, additional_content: &str) -> String {
    format!(
        "You are an expert in the Philippine K-12 curriculum, specifically familiar with the DepEd Most \
Essential Learning Competencies (MELCs) for Grade {grade} {subject}. Generate a quiz with {count} questions \
based on the MELCs for this subject and grade level.

Ensure that the content is appropriate and challenging for Grade {grade} students, adhering strictly to the \
DepEd MELCs standards for this grade level and subject.{additional}

{JSON_ONLY}

Generate multiple-choice questions in this exact JSON format:
{QUIZ_FORMAT}

{requirements}
- Ensure the difficulty level is appropriate for Grade {grade}
- Focus on key concepts from the Grade {grade} {subject} curriculum based on DepEd MELCs
- Incorporate the provided additional content into the questions where relevant",
        additional = additional_section(additional_content),
        requirements = quiz_requirements(count),
    )
}

pub fn flashcards_prompt(subject: &str, grade: u8, count: usize, additional_content: &str) -> String {
    format!(
        "You are an expert teacher in {subject} for Grade {grade}, familiar with the DepEd Most Essential \
Learning Competencies (MELCs). Your task is to generate {count} flashcards based on the MELCs for this \
subject and grade level.

Ensure that the content is appropriate and challenging for Grade {grade} students, adhering strictly to the \
DepEd MELCs standards for this grade level and subject.{additional}

{JSON_ONLY}

Generate flashcards in this exact JSON format:
{FLASHCARD_FORMAT}

Requirements:
- Generate exactly {count} flashcards
- Each flashcard must have a question and an answer
- Make questions clear and concise
- Answers should be brief but informative
- Ensure the difficulty level is appropriate for Grade {grade}
- Focus on key concepts covered in {subject} for Grade {grade} based on DepEd MELCs
- Incorporate the provided additional content into the flashcards where relevant",
        additional = additional_section(additional_content),
    )
}

/// Quiz drawn from curriculum text that has already been extracted from a
/// document.
pub fn quiz_from_document_prompt(document_text: &str, subject: &str, grade: u8, count: usize) -> String {
    format!(
        "You are an expert teacher in {subject}. I'm providing you with the full content of a curriculum \
document. Your tasks are:

1. Analyze the document and extract the relevant information for Grade {grade} in {subject}.
2. Based on the extracted information, generate {count} multiple-choice questions.

Here's the document content:

{document_text}

{JSON_ONLY}

Generate multiple-choice questions in this exact JSON format:
{QUIZ_FORMAT}

{requirements}
- Vary the difficulty level
- Focus on key concepts from the Grade {grade} {subject} curriculum in the document",
        requirements = quiz_requirements(count),
    )
}

pub fn quiz_prompt(subject: &str, grade: u8, count: usize) -> String {
    format!(
        "Generate a quiz for {subject} at grade level {grade} with {count} questions.

{JSON_ONLY}

Generate multiple-choice questions in this exact JSON format:
{QUIZ_FORMAT}

{requirements}",
        requirements = quiz_requirements(count),
    )
}
