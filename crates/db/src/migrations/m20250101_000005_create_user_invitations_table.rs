//! Create user invitations table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserInvitations::TokenHash)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserInvitations::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserInvitations::Expiry)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_invitations_user")
                            .from(UserInvitations::Table, UserInvitations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (purge on activation / rollback)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_invitations_user_id")
                    .table(UserInvitations::Table)
                    .col(UserInvitations::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserInvitations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserInvitations {
    Table,
    TokenHash,
    UserId,
    Expiry,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
