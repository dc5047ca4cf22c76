//! Shared data types passed between pipeline stages.

mod competitor;
mod context;
mod project;
mod run;

pub use competitor::{
    BasicCompetitor, Candidate, DataSource, EnrichedCompetitor, EnrichedExtraction, SocialLinks,
    SocialMetrics, SwotAnalysis,
};
pub use context::{DiscoveryContext, RequestContext, SubscriptionTier};
pub use project::Project;
pub use run::{DiscoveryRun, RunStatus};
