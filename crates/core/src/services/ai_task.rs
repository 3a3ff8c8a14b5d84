//! AI title and summary generation.

use crate::ai::TextGenerator;
use engage_common::{AppResult, Cache, cache::keys};
use engage_db::repositories::NoteRepository;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TITLE_INSTRUCTION: &str = "Write a title for the following note. \
    Keep it within 15 characters, reply with the title only and do not wrap it in quotes.";

const SUMMARY_INSTRUCTION: &str = "Summarize the following note in one sentence \
    of at most 50 characters. Reply with the summary only.";

/// Generation task carried by `ai_queue` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiTask {
    /// Fill in the note title.
    GenerateTitle,
    /// Fill in the note summary.
    GenerateSummary,
}

impl AiTask {
    const fn instruction(self) -> &'static str {
        match self {
            Self::GenerateTitle => TITLE_INSTRUCTION,
            Self::GenerateSummary => SUMMARY_INSTRUCTION,
        }
    }
}

impl fmt::Display for AiTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenerateTitle => f.write_str("generate_title"),
            Self::GenerateSummary => f.write_str("generate_summary"),
        }
    }
}

/// What an AI task run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiTaskOutcome {
    /// The field was written.
    Applied(String),
    /// The generator failed or returned nothing.
    Skipped,
    /// The note no longer exists.
    NoteMissing,
}

/// Runs AI tasks against notes. Best effort: generator failures are skipped.
#[derive(Clone)]
pub struct AiTaskService {
    notes: NoteRepository,
    generator: Arc<dyn TextGenerator>,
    cache: Cache,
}

impl AiTaskService {
    /// Create a new AI task service.
    #[must_use]
    pub fn new(notes: NoteRepository, generator: Arc<dyn TextGenerator>, cache: Cache) -> Self {
        Self {
            notes,
            generator,
            cache,
        }
    }

    /// Generate and store the title or summary of a note.
    ///
    /// Only the targeted column is written. Store errors are returned.
    pub async fn run(&self, note_id: i64, task: AiTask) -> AppResult<AiTaskOutcome> {
        let Some(note) = self.notes.find_by_id(note_id).await? else {
            debug!(note_id, %task, "Note gone before AI task ran");
            return Ok(AiTaskOutcome::NoteMissing);
        };

        let generated = match self.generator.generate(task.instruction(), &note.content).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, note_id, %task, "Text generation failed, skipping");
                return Ok(AiTaskOutcome::Skipped);
            }
        };
        if generated.is_empty() {
            debug!(note_id, %task, "Text generation returned nothing, skipping");
            return Ok(AiTaskOutcome::Skipped);
        }

        let updated = match task {
            AiTask::GenerateTitle => self.notes.update_title(note_id, &generated).await?,
            AiTask::GenerateSummary => self.notes.update_summary(note_id, &generated).await?,
        };
        if !updated {
            return Ok(AiTaskOutcome::NoteMissing);
        }

        self.cache.del(&keys::note(note_id)).await;
        info!(note_id, %task, "Stored generated text");
        Ok(AiTaskOutcome::Applied(generated))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::{note_model, offline_cache};
    use async_trait::async_trait;
    use engage_common::AppError;
    use engage_db::entities::note;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    struct FixedGenerator(AppResult<String>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _instruction: &str, _input: &str) -> AppResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(AppError::ExternalService("timeout".to_string())),
            }
        }
    }

    fn service(db: MockDatabase, generated: AppResult<String>) -> (AiTaskService, Arc<sea_orm::DatabaseConnection>) {
        let db = Arc::new(db.into_connection());
        let service = AiTaskService::new(
            NoteRepository::new(db.clone()),
            Arc::new(FixedGenerator(generated)),
            offline_cache(),
        );
        (service, db)
    }

    #[test]
    fn test_task_wire_format() {
        assert_eq!(
            serde_json::to_string(&AiTask::GenerateTitle).unwrap(),
            "\"generate_title\""
        );
        assert_eq!(
            serde_json::from_str::<AiTask>("\"generate_summary\"").unwrap(),
            AiTask::GenerateSummary
        );
    }

    #[tokio::test]
    async fn test_title_updates_only_title() {
        let mut untitled = note_model(5, 1);
        untitled.title = None;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![untitled]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let (service, db) = service(db, Ok("Groceries".to_string()));

        let outcome = service.run(5, AiTask::GenerateTitle).await.unwrap();
        assert_eq!(outcome, AiTaskOutcome::Applied("Groceries".to_string()));
        drop(service);

        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains(r#"SET \"title\""#));
        assert!(!log.contains(r#"SET \"summary\""#));
    }

    #[tokio::test]
    async fn test_generator_failure_is_skipped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![note_model(5, 1)]]);
        let (service, _db) = service(db, Err(AppError::ExternalService(String::new())));

        let outcome = service.run(5, AiTask::GenerateSummary).await.unwrap();
        assert_eq!(outcome, AiTaskOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_empty_output_is_skipped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![note_model(5, 1)]]);
        let (service, _db) = service(db, Ok(String::new()));

        let outcome = service.run(5, AiTask::GenerateTitle).await.unwrap();
        assert_eq!(outcome, AiTaskOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_missing_note_is_dropped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<note::Model>::new()]);
        let (service, _db) = service(db, Ok("unused".to_string()));

        let outcome = service.run(404, AiTask::GenerateTitle).await.unwrap();
        assert_eq!(outcome, AiTaskOutcome::NoteMissing);
    }
}
