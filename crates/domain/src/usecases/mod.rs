//! Application use cases / business logic

pub mod analyze;
pub mod assemble;
pub mod curate;
pub mod fetch;
pub mod run;

pub use analyze::{AnalysisInvoker, FAILURE_PREFIX};
pub use assemble::{DEFAULT_EMPTY_MESSAGE, ReportAssembler, RunContext, truncate_chars};
pub use curate::{Curator, Deduplicator, QuotaSelector, RelevanceFilter};
pub use fetch::{ChainOutcome, ChainStrategy, FetchPolicy, SourceChain, SourceSlot};
pub use run::{DigestPlan, DigestRun};
