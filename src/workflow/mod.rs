pub mod journal_processor;

pub use journal_processor::{group_by_issue, IssueGroup, JournalProcessor, ProcessOutcome};
