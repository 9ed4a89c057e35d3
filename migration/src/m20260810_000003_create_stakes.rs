use sea_orm_migration::prelude::*;

use super::{
  m20260810_000001_create_accounts::Accounts,
  m20260810_000002_create_packages::Packages,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Stakes::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Stakes::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Stakes::AccountId).integer().not_null())
          .col(ColumnDef::new(Stakes::PackageId).integer().not_null())
          .col(
            ColumnDef::new(Stakes::PrincipalAmount)
              .decimal_len(20, 8)
              .not_null(),
          )
          .col(
            ColumnDef::new(Stakes::DailyYieldPercentage)
              .decimal_len(5, 4)
              .not_null(),
          )
          .col(
            ColumnDef::new(Stakes::DailyRewardAmount)
              .decimal_len(20, 8)
              .not_null(),
          )
          .col(
            ColumnDef::new(Stakes::TotalRewardsEarned)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Stakes::TotalRewardsClaimed)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Stakes::StartDate).date_time().not_null())
          .col(ColumnDef::new(Stakes::EndDate).date_time().not_null())
          .col(ColumnDef::new(Stakes::UnlockDate).date_time().not_null())
          .col(ColumnDef::new(Stakes::LastRewardDate).date_time().null())
          .col(
            ColumnDef::new(Stakes::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(
            ColumnDef::new(Stakes::IsLocked).boolean().not_null().default(true),
          )
          .col(
            ColumnDef::new(Stakes::LockPeriodDays)
              .integer()
              .not_null()
              .default(365),
          )
          .col(
            ColumnDef::new(Stakes::DaysElapsed).integer().not_null().default(0),
          )
          .col(
            ColumnDef::new(Stakes::DaysRemaining)
              .integer()
              .not_null()
              .default(365),
          )
          .col(
            ColumnDef::new(Stakes::CompletionPercentage)
              .decimal_len(5, 2)
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Stakes::PaymentTxHash).string_len(255).null())
          .col(ColumnDef::new(Stakes::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_stakes_account")
              .from(Stakes::Table, Stakes::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_stakes_package")
              .from(Stakes::Table, Stakes::PackageId)
              .to(Packages::Table, Packages::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_stakes_account_status")
          .table(Stakes::Table)
          .col(Stakes::AccountId)
          .col(Stakes::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Stakes::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Stakes {
  Table,
  Id,
  AccountId,
  PackageId,
  PrincipalAmount,
  DailyYieldPercentage,
  DailyRewardAmount,
  TotalRewardsEarned,
  TotalRewardsClaimed,
  StartDate,
  EndDate,
  UnlockDate,
  LastRewardDate,
  Status,
  IsLocked,
  LockPeriodDays,
  DaysElapsed,
  DaysRemaining,
  CompletionPercentage,
  PaymentTxHash,
  CreatedAt,
}
