pub mod enrichment;
pub mod metadata_fetcher;
pub mod workspace_store;

pub use enrichment::Enricher;
pub use metadata_fetcher::{ArticleSource, MetadataFetcher};
pub use workspace_store::{NotionWorkspace, WorkspaceStore};
