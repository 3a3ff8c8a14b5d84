//! Note favorite entity.

use sea_orm::entity::prelude::*;

/// Note favorite entity. One row per (user, note).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "note_favorite")]
pub struct Model {
    /// User who favorited the note.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    /// Note that was favorited.
    #[sea_orm(primary_key, auto_increment = false)]
    pub note_id: i64,

    /// When the favorite was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::note::Entity",
        from = "Column::NoteId",
        to = "super::note::Column::Id",
        on_delete = "Cascade"
    )]
    Note,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
