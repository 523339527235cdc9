use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use storefront_core::errors::{ApplicationError, DomainError};
use storefront_core::ranking::{RankedShortlist, RankingEngine};

use crate::llm::LlmClient;
use crate::prompt::{format_money, PromptRenderer};

pub const NO_MATCH_ANSWER: &str = "Sorry, I couldn't find any products matching that request. \
Try different keywords or a higher budget.";

/// Where the answer text came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Model,
    Shortlist,
    NoMatch,
}

#[derive(Clone, Debug, Serialize)]
pub struct AssistantReply {
    pub answer: String,
    pub source: ReplySource,
    pub shortlist: RankedShortlist,
}

pub struct ShoppingAssistant {
    engine: RankingEngine,
    llm: Option<Arc<dyn LlmClient>>,
    prompt: PromptRenderer,
}

impl ShoppingAssistant {
    pub fn new(engine: RankingEngine, llm: Option<Arc<dyn LlmClient>>) -> Result<Self> {
        Ok(Self { engine, llm, prompt: PromptRenderer::new()? })
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    pub fn model_enabled(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn answer(&self, question: &str) -> Result<AssistantReply, ApplicationError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::EmptyQuery.into());
        }

        let shortlist = self.engine.search(question).await?;
        if !shortlist.had_results {
            info!(
                event_name = "assistant.answer.no_match",
                pass = ?shortlist.pass,
                "no products matched question"
            );
            return Ok(AssistantReply {
                answer: NO_MATCH_ANSWER.to_string(),
                source: ReplySource::NoMatch,
                shortlist,
            });
        }

        let Some(llm) = &self.llm else {
            return Ok(self.shortlist_reply(shortlist));
        };

        let prompt = self
            .prompt
            .render(question, &shortlist)
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        match llm.complete(&prompt).await {
            Ok(answer) => {
                info!(
                    event_name = "assistant.answer.model",
                    products = shortlist.len(),
                    pass = ?shortlist.pass,
                    "model answered from shortlist"
                );
                Ok(AssistantReply { answer, source: ReplySource::Model, shortlist })
            }
            Err(error) => {
                warn!(
                    event_name = "assistant.answer.model_degraded",
                    error = %error,
                    "model unavailable, answering from shortlist"
                );
                Ok(self.shortlist_reply(shortlist))
            }
        }
    }

    fn shortlist_reply(&self, shortlist: RankedShortlist) -> AssistantReply {
        let listed = shortlist
            .products()
            .take(3)
            .map(|product| format!("{} ({})", product.title, format_money(product.price)))
            .collect::<Vec<_>>()
            .join(", ");
        let budget = shortlist
            .signals
            .budget_ceiling
            .map(|ceiling| format!(" within your {} budget", format_money(ceiling)))
            .unwrap_or_default();
        let answer = format!(
            "I found {} product{}{budget}. Top picks: {listed}.",
            shortlist.len(),
            if shortlist.len() == 1 { "" } else { "s" },
        );

        AssistantReply { answer, source: ReplySource::Shortlist, shortlist }
    }
}
