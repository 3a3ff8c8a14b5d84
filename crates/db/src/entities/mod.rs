//! Database entities.

#![allow(missing_docs)]

pub mod following;
pub mod note;
pub mod note_favorite;
pub mod note_history;
pub mod reaction;

pub use following::Entity as Following;
pub use note::Entity as Note;
pub use note_favorite::Entity as NoteFavorite;
pub use note_history::Entity as NoteHistory;
pub use reaction::Entity as Reaction;
