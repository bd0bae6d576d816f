//! Prompt composition
//!
//! Turns a [`GenerationRequest`] into the system instruction and user turn
//! sent upstream. Pure and deterministic: the same request always yields the
//! same prompt.

use crate::llm::Message;
use crate::types::GenerationRequest;

const BASE_INSTRUCTION: &str = "You are a professional writing assistant.";
const CLOSING_INSTRUCTION: &str =
    "Ensure the content is logically clear, well-structured, and has depth.";

/// System instruction paired with the raw description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

impl ComposedPrompt {
    /// Compose the prompt for a request
    pub fn compose(request: &GenerationRequest) -> Self {
        Self {
            system: system_instruction(request),
            user: request.description.clone(),
        }
    }

    /// The two message turns, system first
    pub fn messages(&self) -> [Message; 2] {
        [Message::system(&self.system), Message::user(&self.user)]
    }
}

/// Build the system instruction.
///
/// Base instruction, then the persona verbatim, then the language/tone and
/// keyword directive, then the closing demand for structure and depth.
pub fn system_instruction(request: &GenerationRequest) -> String {
    let mut prompt = String::from(BASE_INSTRUCTION);

    if let Some(role) = request.role() {
        prompt.push(' ');
        prompt.push_str(role);
    }

    prompt.push_str(&format!(
        " Please write in {} with a {} tone,",
        request.language.prompt_name(),
        request.tone.code()
    ));
    prompt.push_str(&format!(
        " about the following keywords: {}.",
        request.keywords
    ));
    prompt.push(' ');
    prompt.push_str(CLOSING_INSTRUCTION);

    prompt
}
