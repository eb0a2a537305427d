//! CLI interface for docrag

mod assistant;
mod ui;

pub use assistant::{Answer, AssistantSettings, QuestionAssistant};
pub use ui::{
    display_banner, format_sources, handle_input_with_history, print_answer, print_help,
    print_indexing_summary, print_retrieval,
};

// Re-export core types
pub use docrag_core::{Error, Result};
