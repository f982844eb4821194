pub mod article;
pub mod crossref;
pub mod notion;
pub mod subscription;

pub use article::{Article, Enrichment, IssueSummary};
pub use crossref::{CrossrefWork, RecordError};
pub use subscription::Subscription;
