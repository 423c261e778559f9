//! @acp:module "Context Observer"
//! @acp:summary "Mid-session re-scoring from live interaction events"
//! @acp:domain personalization
//! @acp:layer feature

pub mod accumulator;
pub mod config;
pub mod events;
pub mod scroll;
pub mod session;

pub use accumulator::{
    ActionRecord, BehaviorAccumulator, ContextObserver, ObserverState, Trigger, ACTION_LOG_LIMIT,
    CLICK_WEIGHT, HOVER_EXPIRY_MS, HOVER_TRACK_LIMIT, HOVER_WEIGHT, SCROLL_WEIGHT,
    VISIBILITY_WEIGHT,
};
pub use config::ObserverConfig;
pub use events::InteractionEvent;
pub use scroll::{ScrollPattern, ScrollTracker};
pub use session::{ObserverHandle, ObserverSession, SessionReport, SessionSummary};
