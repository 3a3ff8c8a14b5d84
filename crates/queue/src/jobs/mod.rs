//! Job definitions.
//!
//! One job type per queue. The serialized form of each job is the message
//! body of its queue.

#![allow(missing_docs)]

mod ai;
mod favorite;
mod feed;
mod history;
mod react;

pub use ai::AiJob;
pub use favorite::FavoriteJob;
pub use feed::FeedJob;
pub use history::HistoryJob;
pub use react::{ReactAction, ReactJob};

/// Queue names, also used as the storage namespaces.
pub mod queues {
    pub const FAVORITE: &str = "favorite_queue";
    pub const REACT: &str = "react_queue";
    pub const HISTORY: &str = "history_queue";
    pub const FEED: &str = "feed_queue";
    pub const AI: &str = "ai_queue";

    /// Every queue, in declaration order.
    pub const ALL: [&str; 5] = [FAVORITE, REACT, HISTORY, FEED, AI];
}
