//! Create reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reaction::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reaction::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Reaction::NoteId).big_integer().not_null())
                    .col(ColumnDef::new(Reaction::Emoji).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Reaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reaction_note")
                            .from(Reaction::Table, Reaction::NoteId)
                            .to(Note::Table, Note::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, note_id) - one active reaction per user per note
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_user_note")
                    .table(Reaction::Table)
                    .col(Reaction::UserId)
                    .col(Reaction::NoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: note_id (for tallying reactions on a note)
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_note_id")
                    .table(Reaction::Table)
                    .col(Reaction::NoteId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reaction {
    Table,
    Id,
    UserId,
    NoteId,
    Emoji,
    CreatedAt,
}

#[derive(Iden)]
enum Note {
    Table,
    Id,
}
