pub mod crossref_client;
pub mod llm_client;
pub mod notion_client;

pub use crossref_client::CrossrefClient;
pub use llm_client::{LanguageModel, LlmClient};
pub use notion_client::NotionClient;
