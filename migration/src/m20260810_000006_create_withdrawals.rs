use sea_orm_migration::prelude::*;

use super::m20260810_000001_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Withdrawals::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Withdrawals::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Withdrawals::AccountId).integer().not_null())
          .col(
            ColumnDef::new(Withdrawals::Amount).decimal_len(20, 8).not_null(),
          )
          .col(ColumnDef::new(Withdrawals::Currency).string().not_null())
          .col(
            ColumnDef::new(Withdrawals::WalletAddress)
              .string_len(255)
              .not_null(),
          )
          .col(
            ColumnDef::new(Withdrawals::Network)
              .string_len(50)
              .not_null()
              .default("BEP20"),
          )
          .col(
            ColumnDef::new(Withdrawals::WithdrawalFee)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Withdrawals::NetAmount)
              .decimal_len(20, 8)
              .not_null(),
          )
          .col(
            ColumnDef::new(Withdrawals::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(
            ColumnDef::new(Withdrawals::BalanceBefore)
              .decimal_len(20, 8)
              .not_null(),
          )
          .col(
            ColumnDef::new(Withdrawals::BalanceAfter)
              .decimal_len(20, 8)
              .not_null(),
          )
          .col(ColumnDef::new(Withdrawals::ProcessedAt).date_time().null())
          .col(ColumnDef::new(Withdrawals::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_withdrawals_account")
              .from(Withdrawals::Table, Withdrawals::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_withdrawals_account_status")
          .table(Withdrawals::Table)
          .col(Withdrawals::AccountId)
          .col(Withdrawals::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Withdrawals {
  Table,
  Id,
  AccountId,
  Amount,
  Currency,
  WalletAddress,
  Network,
  WithdrawalFee,
  NetAmount,
  Status,
  BalanceBefore,
  BalanceAfter,
  ProcessedAt,
  CreatedAt,
}
