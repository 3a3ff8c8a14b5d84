//! Job workers.
//!
//! Every worker acknowledges a message by returning `Ok`, which covers
//! applied changes, replays, benign conflicts and malformed payloads. Only
//! transient store errors return `Err` and leave the job to be retried.

mod ai;
mod favorite;
mod feed;
mod history;
mod react;

pub use ai::{AiContext, ai_worker};
pub use favorite::{FavoriteContext, favorite_worker};
pub use feed::{FeedContext, feed_worker};
pub use history::{HistoryContext, history_worker};
pub use react::{ReactContext, react_worker};

use apalis::prelude::Error;
use engage_common::AppError;
use tracing::{error, warn};
use validator::Validate;

/// Check a decoded job before applying it.
///
/// Invalid jobs are logged and should be acknowledged without side effects.
pub(crate) fn is_valid<J: Validate>(queue: &str, job: &J) -> bool {
    match job.validate() {
        Ok(()) => true,
        Err(e) => {
            warn!(queue, error = %e, "Dropping invalid job");
            false
        }
    }
}

/// Turn a failed apply into the worker result.
///
/// Transient errors are handed back to the runtime for another attempt;
/// anything else would fail the same way again and is dropped.
pub(crate) fn settle(queue: &str, user_id: Option<i64>, note_id: i64, err: AppError) -> Result<(), Error> {
    if err.is_transient() {
        error!(queue, user_id, note_id, error = %err, "Job failed, will retry");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
        Err(Error::Failed(boxed.into()))
    } else {
        warn!(queue, user_id, note_id, error = %err, "Dropping job");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retried() {
        assert!(settle("favorite_queue", Some(1), 2, AppError::Database("reset".to_string())).is_err());
        assert!(settle("feed_queue", None, 2, AppError::Redis("timeout".to_string())).is_err());
    }

    #[test]
    fn test_permanent_errors_are_acknowledged() {
        assert!(settle("favorite_queue", Some(1), 2, AppError::NoteNotFound(2)).is_ok());
        assert!(settle("react_queue", Some(1), 2, AppError::Internal("bad json".to_string())).is_ok());
    }
}
