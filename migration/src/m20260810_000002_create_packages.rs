use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Packages::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Packages::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Packages::Name)
              .string_len(100)
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Packages::Description).text().null())
          .col(ColumnDef::new(Packages::MinStake).decimal_len(20, 8).not_null())
          .col(ColumnDef::new(Packages::MaxStake).decimal_len(20, 8).null())
          .col(
            ColumnDef::new(Packages::DailyYieldPercentage)
              .decimal_len(5, 4)
              .not_null(),
          )
          .col(
            ColumnDef::new(Packages::LockPeriodDays)
              .integer()
              .not_null()
              .default(365),
          )
          .col(
            ColumnDef::new(Packages::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(Packages::SortOrder)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Packages::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_packages_is_active")
          .table(Packages::Table)
          .col(Packages::IsActive)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Packages::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Packages {
  Table,
  Id,
  Name,
  Description,
  MinStake,
  MaxStake,
  DailyYieldPercentage,
  LockPeriodDays,
  IsActive,
  SortOrder,
  CreatedAt,
}
