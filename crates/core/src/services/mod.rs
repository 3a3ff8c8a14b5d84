//! Business logic services.

pub mod ai_task;
pub mod engagement;
pub mod favorite;
pub mod feed;
pub mod history;
pub mod note;
pub mod publisher;
pub mod reaction;
pub mod recent_notes;
pub mod timeline;

#[cfg(test)]
#[allow(clippy::unwrap_used, missing_docs)]
pub(crate) mod test_support;

pub use ai_task::{AiTask, AiTaskOutcome, AiTaskService};
pub use engagement::EngagementService;
pub use favorite::{FavoriteAction, FavoriteService};
pub use feed::{FanOutSummary, FeedService};
pub use history::HistoryService;
pub use note::NoteCacheService;
pub use publisher::{EngagementPublisher, EngagementPublisherService, NoOpEngagementPublisher};
pub use reaction::ReactionService;
pub use recent_notes::RecentNotesService;
pub use timeline::TimelineService;
