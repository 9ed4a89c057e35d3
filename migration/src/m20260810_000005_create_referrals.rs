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
          .table(Referrals::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Referrals::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Referrals::ReferrerId).integer().not_null())
          .col(ColumnDef::new(Referrals::ReferredId).integer().not_null())
          .col(ColumnDef::new(Referrals::Level).integer().not_null().default(1))
          .col(
            ColumnDef::new(Referrals::CommissionRate)
              .decimal_len(5, 4)
              .not_null(),
          )
          .col(
            ColumnDef::new(Referrals::TotalEarned)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Referrals::TotalInvested)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Referrals::DirectCashbackPaid)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Referrals::NetworkCashbackPaid)
              .decimal_len(20, 8)
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Referrals::ReferralPath).text().null())
          .col(
            ColumnDef::new(Referrals::IsQualified)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Referrals::QualificationDate).date_time().null())
          .col(
            ColumnDef::new(Referrals::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Referrals::JoinedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_referrals_referrer")
              .from(Referrals::Table, Referrals::ReferrerId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_referrals_referred")
              .from(Referrals::Table, Referrals::ReferredId)
              .to(Accounts::Table, Accounts::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_referrals_pair")
          .table(Referrals::Table)
          .col(Referrals::ReferrerId)
          .col(Referrals::ReferredId)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_referrals_referrer_level")
          .table(Referrals::Table)
          .col(Referrals::ReferrerId)
          .col(Referrals::Level)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Referrals::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Referrals {
  Table,
  Id,
  ReferrerId,
  ReferredId,
  Level,
  CommissionRate,
  TotalEarned,
  TotalInvested,
  DirectCashbackPaid,
  NetworkCashbackPaid,
  ReferralPath,
  IsQualified,
  QualificationDate,
  IsActive,
  JoinedAt,
}
