//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: i64,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Tag set, stored sorted and de-duplicated
    pub tags: Vec<String>,

    /// Optimistic concurrency stamp, starts at 1
    pub version: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    /// Edges whose followed user is this post's author
    #[sea_orm(
        belongs_to = "super::follower::Entity",
        from = "Column::UserId",
        to = "super::follower::Column::UserId"
    )]
    AuthorFollowers,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
