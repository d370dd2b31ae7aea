// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BehaviorSignal, Conversation, ConversationId, DailyMatch, EnsembleWeights, FeatureStatus,
    InteractionEvent, InteractionKind, LandlordProfile, ListingId, ListingProfile, MatchedListing,
    MessageEvent, PeerSimilarity, RenterProfile, ScoringWeights, UnlockableFeature, UserId,
};
pub use requests::{
    FeatureStatusQuery, LandlordPreferencesRequest, MessageSentRequest, RenterPreferencesRequest,
    RunMatchesRequest, TodayMatchesQuery,
};
pub use responses::{
    ErrorResponse, HealthResponse, MessageRecordedResponse, RunSummaryResponse,
    TodayMatchesResponse,
};
