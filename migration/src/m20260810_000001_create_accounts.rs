use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Accounts::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Accounts::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Accounts::Email)
              .string_len(255)
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Accounts::FirstName).string_len(100).not_null())
          .col(ColumnDef::new(Accounts::LastName).string_len(100).not_null())
          .col(ColumnDef::new(Accounts::WalletAddress).string_len(255).null())
          .col(
            ColumnDef::new(Accounts::ReferralCode)
              .string_len(50)
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Accounts::ReferredBy).string_len(50).null())
          .col(
            ColumnDef::new(Accounts::TokenBalance)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Accounts::UsdtBalance)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Accounts::TotalInvested)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Accounts::TotalEarned)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Accounts::TotalWithdrawn)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Accounts::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Accounts::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_accounts_referred_by")
          .table(Accounts::Table)
          .col(Accounts::ReferredBy)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Accounts::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Accounts {
  Table,
  Id,
  Email,
  FirstName,
  LastName,
  WalletAddress,
  ReferralCode,
  ReferredBy,
  TokenBalance,
  UsdtBalance,
  TotalInvested,
  TotalEarned,
  TotalWithdrawn,
  IsActive,
  CreatedAt,
}
