use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create buildings table
        manager
            .create_table(
                Table::create()
                    .table(Buildings::Table)
                    .if_not_exists()
                    .col(pk_auto(Buildings::Id))
                    .col(string(Buildings::Name))
                    .col(string_null(Buildings::Address))
                    .col(integer(Buildings::MillsBasis).default(1000))
                    .col(decimal_len_null(Buildings::ReserveFundGoal, 19, 4))
                    .col(integer_null(Buildings::ReserveFundMonths))
                    .col(date_null(Buildings::ReserveFundStart))
                    .col(decimal_len_null(Buildings::ManagementFeePerApartment, 19, 4))
                    .col(date_null(Buildings::FinancialStart))
                    .to_owned(),
            )
            .await?;

        // Create apartments table
        manager
            .create_table(
                Table::create()
                    .table(Apartments::Table)
                    .if_not_exists()
                    .col(pk_auto(Apartments::Id))
                    .col(integer(Apartments::BuildingId))
                    .col(string(Apartments::Number))
                    .col(string(Apartments::OwnerName))
                    .col(string_null(Apartments::TenantName))
                    .col(integer_null(Apartments::ParticipationMills))
                    .col(integer_null(Apartments::HeatingMills))
                    .col(decimal_len(Apartments::CurrentBalance, 19, 4).default(0))
                    .col(decimal_len(Apartments::PreviousBalance, 19, 4).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_apartment_building")
                            .from(Apartments::Table, Apartments::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_apartment_building_number")
                    .table(Apartments::Table)
                    .col(Apartments::BuildingId)
                    .col(Apartments::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create recurring_expenses table
        manager
            .create_table(
                Table::create()
                    .table(RecurringExpenses::Table)
                    .if_not_exists()
                    .col(pk_auto(RecurringExpenses::Id))
                    .col(integer(RecurringExpenses::BuildingId))
                    .col(string(RecurringExpenses::Title))
                    .col(decimal_len(RecurringExpenses::Amount, 19, 4))
                    .col(string(RecurringExpenses::Category))
                    .col(string(RecurringExpenses::DistributionType))
                    .col(string(RecurringExpenses::PayerResponsibility))
                    .col(decimal_len_null(RecurringExpenses::SplitRatio, 5, 4))
                    .col(integer(RecurringExpenses::DayOfMonth))
                    .col(date(RecurringExpenses::StartDate))
                    .col(date_null(RecurringExpenses::EndDate))
                    .col(boolean(RecurringExpenses::Active).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_expense_building")
                            .from(RecurringExpenses::Table, RecurringExpenses::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create expenses table
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(pk_auto(Expenses::Id))
                    .col(integer(Expenses::BuildingId))
                    .col(string(Expenses::Title))
                    .col(decimal_len(Expenses::Amount, 19, 4))
                    .col(date(Expenses::Date))
                    .col(string(Expenses::Category))
                    .col(string(Expenses::DistributionType))
                    .col(string(Expenses::PayerResponsibility))
                    .col(decimal_len_null(Expenses::SplitRatio, 5, 4))
                    .col(string_null(Expenses::ProjectRef))
                    .col(json_null(Expenses::AuditTrail))
                    .col(integer_null(Expenses::RecurringExpenseId))
                    .col(integer_null(Expenses::PeriodYear))
                    .col(integer_null(Expenses::PeriodMonth))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_building")
                            .from(Expenses::Table, Expenses::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_recurring_expense")
                            .from(Expenses::Table, Expenses::RecurringExpenseId)
                            .to(RecurringExpenses::Table, RecurringExpenses::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Idempotency guard for recurring generation: at most one generated
        // expense per (template, year, month).
        manager
            .create_index(
                Index::create()
                    .name("uq_expense_generation_period")
                    .table(Expenses::Table)
                    .col(Expenses::RecurringExpenseId)
                    .col(Expenses::PeriodYear)
                    .col(Expenses::PeriodMonth)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::ApartmentId))
                    .col(decimal_len(Payments::Amount, 19, 4))
                    .col(date(Payments::Date))
                    .col(string(Payments::Method))
                    .col(string(Payments::PayerType))
                    .col(string_null(Payments::PayerName))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_apartment")
                            .from(Payments::Table, Payments::ApartmentId)
                            .to(Apartments::Table, Apartments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create monthly_balances table
        manager
            .create_table(
                Table::create()
                    .table(MonthlyBalances::Table)
                    .if_not_exists()
                    .col(pk_auto(MonthlyBalances::Id))
                    .col(integer(MonthlyBalances::BuildingId))
                    .col(integer(MonthlyBalances::Year))
                    .col(integer(MonthlyBalances::Month))
                    .col(decimal_len(MonthlyBalances::CarryForward, 19, 4))
                    .col(decimal_len(MonthlyBalances::PreviousObligations, 19, 4))
                    .col(decimal_len(MonthlyBalances::CurrentObligations, 19, 4))
                    .col(decimal_len(MonthlyBalances::PaymentsReceived, 19, 4))
                    .col(decimal_len(MonthlyBalances::TotalObligations, 19, 4))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_monthly_balance_building")
                            .from(MonthlyBalances::Table, MonthlyBalances::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Upsert key for the derived snapshot.
        manager
            .create_index(
                Index::create()
                    .name("uq_monthly_balance_period")
                    .table(MonthlyBalances::Table)
                    .col(MonthlyBalances::BuildingId)
                    .col(MonthlyBalances::Year)
                    .col(MonthlyBalances::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create webhook_events table
        manager
            .create_table(
                Table::create()
                    .table(WebhookEvents::Table)
                    .if_not_exists()
                    .col(pk_auto(WebhookEvents::Id))
                    .col(string(WebhookEvents::Provider))
                    .col(string(WebhookEvents::EventId))
                    .col(json(WebhookEvents::Payload))
                    .col(timestamp_with_time_zone(WebhookEvents::ReceivedAt))
                    .col(string(WebhookEvents::ProcessingStatus))
                    .to_owned(),
            )
            .await?;

        // Replay protection: one stored event per provider event id.
        manager
            .create_index(
                Index::create()
                    .name("uq_webhook_event_provider_event")
                    .table(WebhookEvents::Table)
                    .col(WebhookEvents::Provider)
                    .col(WebhookEvents::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Apartments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Buildings::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Buildings {
    Table,
    Id,
    Name,
    Address,
    MillsBasis,
    ReserveFundGoal,
    ReserveFundMonths,
    ReserveFundStart,
    ManagementFeePerApartment,
    FinancialStart,
}

#[derive(DeriveIden)]
enum Apartments {
    Table,
    Id,
    BuildingId,
    Number,
    OwnerName,
    TenantName,
    ParticipationMills,
    HeatingMills,
    CurrentBalance,
    PreviousBalance,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    BuildingId,
    Title,
    Amount,
    Date,
    Category,
    DistributionType,
    PayerResponsibility,
    SplitRatio,
    ProjectRef,
    AuditTrail,
    RecurringExpenseId,
    PeriodYear,
    PeriodMonth,
}

#[derive(DeriveIden)]
enum RecurringExpenses {
    Table,
    Id,
    BuildingId,
    Title,
    Amount,
    Category,
    DistributionType,
    PayerResponsibility,
    SplitRatio,
    DayOfMonth,
    StartDate,
    EndDate,
    Active,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    ApartmentId,
    Amount,
    Date,
    Method,
    PayerType,
    PayerName,
}

#[derive(DeriveIden)]
enum MonthlyBalances {
    Table,
    Id,
    BuildingId,
    Year,
    Month,
    CarryForward,
    PreviousObligations,
    CurrentObligations,
    PaymentsReceived,
    TotalObligations,
}

#[derive(DeriveIden)]
enum WebhookEvents {
    Table,
    Id,
    Provider,
    EventId,
    Payload,
    ReceivedAt,
    ProcessingStatus,
}
