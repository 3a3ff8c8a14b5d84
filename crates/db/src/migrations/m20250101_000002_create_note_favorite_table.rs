//! Create note favorite table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NoteFavorite::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(NoteFavorite::UserId).big_integer().not_null())
                    .col(ColumnDef::new(NoteFavorite::NoteId).big_integer().not_null())
                    .col(
                        ColumnDef::new(NoteFavorite::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // The primary key doubles as the idempotency guard for repeated deliveries
                    .primary_key(
                        Index::create()
                            .col(NoteFavorite::UserId)
                            .col(NoteFavorite::NoteId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_favorite_note")
                            .from(NoteFavorite::Table, NoteFavorite::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: note_id (for counting a note's favorites)
        manager
            .create_index(
                Index::create()
                    .name("idx_note_favorite_note_id")
                    .table(NoteFavorite::Table)
                    .col(NoteFavorite::NoteId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NoteFavorite::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NoteFavorite {
    Table,
    UserId,
    NoteId,
    CreatedAt,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
