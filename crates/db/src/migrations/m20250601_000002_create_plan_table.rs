//! Create `plan` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plan::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plan::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Plan::Description).text())
                    .col(ColumnDef::new(Plan::StartDate).date().not_null())
                    .col(ColumnDef::new(Plan::EndDate).date().not_null())
                    .col(ColumnDef::new(Plan::Tone).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Plan::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Plan::ApprovalStatus)
                            .string_len(16)
                            .not_null()
                            .default("none"),
                    )
                    .col(ColumnDef::new(Plan::ApproverId).string_len(32))
                    .col(ColumnDef::new(Plan::ApprovalNotes).text())
                    .col(ColumnDef::new(Plan::TeamId).string_len(32).not_null())
                    .col(ColumnDef::new(Plan::CreatorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Plan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Plan::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plan_team")
                    .table(Plan::Table)
                    .col(Plan::TeamId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plan_approval_status")
                    .table(Plan::Table)
                    .col(Plan::ApprovalStatus)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Plan::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Plan {
    Table,
    Id,
    Title,
    Description,
    StartDate,
    EndDate,
    Tone,
    Status,
    ApprovalStatus,
    ApproverId,
    ApprovalNotes,
    TeamId,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}
