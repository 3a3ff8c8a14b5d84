//! Note entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "note")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: i64,

    /// Title, generated when the author left it empty
    #[sea_orm(nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Generated summary
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// Private notes never reach follower timelines
    #[sea_orm(default_value = false)]
    pub is_private: bool,

    /// Number of favorite edges (maintained by the favorite worker)
    #[sea_orm(default_value = 0)]
    pub favorite_count: i32,

    /// Reactions (emoji -> count), zero entries removed
    #[sea_orm(column_type = "JsonBinary")]
    pub reaction_counts: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::note_favorite::Entity")]
    NoteFavorite,
    #[sea_orm(has_many = "super::reaction::Entity")]
    Reaction,
    #[sea_orm(has_many = "super::note_history::Entity")]
    NoteHistory,
}

impl Related<super::note_favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NoteFavorite.def()
    }
}

impl Related<super::reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reaction.def()
    }
}

impl Related<super::note_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NoteHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
