// Core algorithm exports
pub mod batch;
pub mod behavior;
pub mod engagement;
pub mod location;
pub mod peers;
pub mod scoring;
pub mod semantic;
pub mod signals;
pub mod timing;

pub use batch::{BatchError, DailyMatchJob, MatchSnapshot, MatchingConfig, RunSummary};
pub use behavior::{extract_behavior, InteractionHistory};
pub use engagement::{
    feature_status, is_meaningful, EngagementError, EngagementOutcome, EngagementThresholds,
    EngagementTracker,
};
pub use location::{Gazetteer, Place};
pub use peers::find_similar_peers;
pub use scoring::{calculate_compatibility, compatibility_score, CompatibilityScore, Factor};
pub use semantic::{EmbeddingError, NoopEmbedder, SemanticMatcher, TextEmbedder};
pub use signals::{Explanation, SignalBlender};
pub use timing::timing_refinement;
