//! Feed fan-out service.
//!
//! Fan-out on write: a new public note is pushed onto the cached timeline of
//! every follower of its author. Followers are walked with keyset pagination
//! and each page is written in one pipeline, so memory and round trips stay
//! bounded no matter how many followers an author has.

use engage_common::{AppResult, Cache};
use engage_db::repositories::FollowingRepository;
use tracing::{debug, info, warn};

/// Result of one fan-out run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutSummary {
    /// Followers whose timeline received the note.
    pub delivered: usize,
    /// Followers on pages whose cache write failed.
    pub skipped: usize,
    /// Follower pages loaded.
    pub pages: usize,
}

/// Pushes new notes into follower timelines.
#[derive(Clone)]
pub struct FeedService {
    following: FollowingRepository,
    cache: Cache,
    page_size: u64,
    timeline_max_len: i64,
}

impl FeedService {
    /// Create a new feed service.
    ///
    /// Timelines keep at least one entry; a zero cap would turn the trim into
    /// a no-op.
    #[must_use]
    pub const fn new(
        following: FollowingRepository,
        cache: Cache,
        page_size: u64,
        timeline_max_len: i64,
    ) -> Self {
        Self {
            following,
            cache,
            page_size,
            timeline_max_len: if timeline_max_len < 1 { 1 } else { timeline_max_len },
        }
    }

    /// Push `note_id` onto the timeline of every follower of `author_id`.
    ///
    /// A failed cache write skips that page; readers fall back to the store.
    /// A store error aborts the run so the message is redelivered.
    pub async fn fan_out(&self, author_id: i64, note_id: i64) -> AppResult<FanOutSummary> {
        let mut summary = FanOutSummary::default();
        let mut after = None;
        let page_size = self.page_size.max(1);

        loop {
            let followers = self
                .following
                .find_follower_ids(author_id, after, page_size)
                .await?;
            if followers.is_empty() {
                break;
            }
            summary.pages += 1;

            match self
                .cache
                .push_to_timelines(&followers, note_id, self.timeline_max_len)
                .await
            {
                Ok(()) => summary.delivered += followers.len(),
                Err(e) => {
                    warn!(
                        error = %e,
                        author_id,
                        note_id,
                        followers = followers.len(),
                        "Timeline page write failed, skipping"
                    );
                    summary.skipped += followers.len();
                }
            }

            if (followers.len() as u64) < page_size {
                break;
            }
            after = followers.last().copied();
        }

        if summary.pages == 0 {
            debug!(author_id, note_id, "Author has no followers, nothing to fan out");
        } else {
            info!(
                author_id,
                note_id,
                delivered = summary.delivered,
                skipped = summary.skipped,
                pages = summary.pages,
                "Fanned out note"
            );
        }

        Ok(summary)
    }
}
