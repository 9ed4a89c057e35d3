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
          .table(Transactions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Transactions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Transactions::AccountId).integer().not_null())
          .col(ColumnDef::new(Transactions::TxType).string().not_null())
          .col(
            ColumnDef::new(Transactions::Amount).decimal_len(20, 8).not_null(),
          )
          .col(
            ColumnDef::new(Transactions::Currency)
              .string()
              .not_null()
              .default("GSD"),
          )
          .col(
            ColumnDef::new(Transactions::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Transactions::Description).text().null())
          .col(ColumnDef::new(Transactions::ReferenceId).string_len(255).null())
          .col(
            ColumnDef::new(Transactions::ReferenceType).string_len(50).null(),
          )
          .col(ColumnDef::new(Transactions::TxHash).string_len(255).null())
          .col(ColumnDef::new(Transactions::BlockNumber).integer().null())
          .col(
            ColumnDef::new(Transactions::ExchangeRate).decimal_len(20, 8).null(),
          )
          .col(
            ColumnDef::new(Transactions::BalanceBefore)
              .decimal_len(20, 8)
              .null(),
          )
          .col(
            ColumnDef::new(Transactions::BalanceAfter)
              .decimal_len(20, 8)
              .null(),
          )
          .col(ColumnDef::new(Transactions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_transactions_account")
              .from(Transactions::Table, Transactions::AccountId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_transactions_account_type")
          .table(Transactions::Table)
          .col(Transactions::AccountId)
          .col(Transactions::TxType)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_transactions_reference")
          .table(Transactions::Table)
          .col(Transactions::ReferenceType)
          .col(Transactions::ReferenceId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Transactions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Transactions {
  Table,
  Id,
  AccountId,
  TxType,
  Amount,
  Currency,
  Status,
  Description,
  ReferenceId,
  ReferenceType,
  TxHash,
  BlockNumber,
  ExchangeRate,
  BalanceBefore,
  BalanceAfter,
  CreatedAt,
}
