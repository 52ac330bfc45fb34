//! Composition of the user turn actually sent to the model.

use chatbridge_types::chat::Language;
use chatbridge_types::memory::MemorySnapshot;

/// Embed the memory summary and the recent transcript ahead of the question.
pub fn compose_prompt(memory: &MemorySnapshot, question: &str, language: Option<Language>) -> String {
    let heading = match language {
        Some(language) => {
            format!("## The question you need to answer now (answer in {language}.)")
        }
        None => "## The question you need to answer now".to_string(),
    };
    format!(
        "## Your memory\n\n{}\n## Earlier conversation\n\n{}\n{heading}\n\n{question}",
        memory.summary, memory.raw_transcript
    )
}
