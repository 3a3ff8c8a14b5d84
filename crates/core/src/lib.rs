//! Engagement services for notes-engage.
//!
//! The services here sit between the queue workers (or the API layer) and
//! the repositories:
//!
//! - apply side: favorites, reactions, view history, feed fan-out, AI tasks
//! - read side: following timeline, recently viewed notes, cached notes
//! - publish side: [`EngagementService`] turns user intents into queue messages

pub mod ai;
pub mod services;

pub use ai::{OpenAiTextGenerator, TextGenerator};
pub use services::*;
