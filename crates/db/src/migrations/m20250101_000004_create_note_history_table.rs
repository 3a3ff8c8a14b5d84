//! Create note history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NoteHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NoteHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NoteHistory::UserId).big_integer().not_null())
                    .col(ColumnDef::new(NoteHistory::NoteId).big_integer().not_null())
                    .col(
                        ColumnDef::new(NoteHistory::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_history_note")
                            .from(NoteHistory::Table, NoteHistory::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, note_id) - re-views update viewed_at in place
        manager
            .create_index(
                Index::create()
                    .name("idx_note_history_user_note")
                    .table(NoteHistory::Table)
                    .col(NoteHistory::UserId)
                    .col(NoteHistory::NoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, viewed_at) - most recent views first
        manager
            .create_index(
                Index::create()
                    .name("idx_note_history_user_viewed_at")
                    .table(NoteHistory::Table)
                    .col(NoteHistory::UserId)
                    .col(NoteHistory::ViewedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NoteHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NoteHistory {
    Table,
    Id,
    UserId,
    NoteId,
    ViewedAt,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
