//! Shopping assistant runtime.
//!
//! Turns a free-text question into a grounded answer:
//! 1. **Ranking** - the question goes through the storefront ranking engine
//!    (signal extraction, strict pass, relaxed fallback).
//! 2. **Prompting** (`prompt`) - the shortlist and detected budget are
//!    rendered into a prompt that forbids recommending anything else.
//! 3. **Completion** (`llm`) - an OpenAI-compatible chat endpoint (Groq,
//!    OpenAI, Ollama) phrases the answer.
//!
//! The model never chooses products or prices. When the shortlist is empty
//! the model is not called at all, and when the model is disabled or fails
//! the assistant answers from the shortlist directly.

pub mod llm;
pub mod prompt;
pub mod runtime;

pub use llm::{ChatCompletionsClient, LlmClient};
pub use prompt::PromptRenderer;
pub use runtime::{AssistantReply, ReplySource, ShoppingAssistant};
