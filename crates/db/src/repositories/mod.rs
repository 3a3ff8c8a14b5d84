//! Repositories.
//!
//! Each repository owns a shared connection and exposes the reads and the
//! transactional writes for one table.

mod following;
mod note;
mod note_favorite;
mod note_history;
mod reaction;

pub use following::FollowingRepository;
pub use note::NoteRepository;
pub use note_favorite::NoteFavoriteRepository;
pub use note_history::NoteHistoryRepository;
pub use reaction::{ReactionRepository, ReactionToggle, apply_reaction_delta};

use engage_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map a store error on a row that references `note_id`.
///
/// A foreign key violation means the note is gone, which no retry can fix.
pub(crate) fn map_note_ref_err(err: &DbErr, note_id: i64) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::NoteNotFound(note_id),
        _ => AppError::Database(err.to_string()),
    }
}
