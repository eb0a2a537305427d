//! Question assistant: retrieval plus an optional language-model answer

use tracing::debug;

use docrag_core::{
    GenerationConfig, GenerationResult, LLMProvider, RAGEngine, RAGQuery, RAGResult, Result,
    rag::{DEFAULT_CONTEXT_LIMIT, DEFAULT_TOP_K},
};

/// Retrieval settings applied to every question
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub top_k: usize,
    pub context_limit: usize,
    pub score_threshold: Option<f32>,
    pub max_tokens: u32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            score_threshold: None,
            max_tokens: 512,
        }
    }
}

/// Retrieval result and, when a model is configured, its answer
#[derive(Debug, Clone)]
pub struct Answer {
    pub retrieval: RAGResult,
    pub completion: Option<GenerationResult>,
}

/// Answers questions against an embedding table
pub struct QuestionAssistant<R: RAGEngine, L: LLMProvider> {
    rag: R,
    llm: Option<L>,
    settings: AssistantSettings,
}

impl<R: RAGEngine, L: LLMProvider> QuestionAssistant<R, L> {
    /// Create an assistant that only builds prompts
    pub fn new(rag: R) -> Self {
        Self {
            rag,
            llm: None,
            settings: AssistantSettings::default(),
        }
    }

    /// Create with a language model that answers the built prompt
    pub fn with_llm(rag: R, llm: L) -> Self {
        Self {
            rag,
            llm: Some(llm),
            settings: AssistantSettings::default(),
        }
    }

    pub fn settings(mut self, settings: AssistantSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn engine(&self) -> &R {
        &self.rag
    }

    /// Retrieve context for `query` and build the prompt
    pub async fn prompt_for(&self, query: &str) -> Result<RAGResult> {
        let rag_query = RAGQuery {
            query: query.to_string(),
            top_k: self.settings.top_k,
            context_limit: self.settings.context_limit,
            score_threshold: self.settings.score_threshold,
        };

        self.rag.retrieve(&rag_query).await
    }

    /// Build the prompt and, when a model is configured, send it
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let retrieval = self.prompt_for(query).await?;

        let Some(llm) = &self.llm else {
            return Ok(Answer {
                retrieval,
                completion: None,
            });
        };

        let config = GenerationConfig {
            model_id: llm.model_id().to_string(),
            max_tokens: self.settings.max_tokens,
            ..Default::default()
        };
        debug!("Sending {} character prompt to {}", retrieval.prompt.chars().count(), config.model_id);

        let completion = llm.generate_with_config(&retrieval.prompt, &config).await?;
        Ok(Answer {
            retrieval,
            completion: Some(completion),
        })
    }
}
