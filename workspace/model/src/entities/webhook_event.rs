use sea_orm::entity::prelude::*;

/// External system posting webhook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum WebhookProvider {
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "email")]
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ProcessingStatus {
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "processed")]
    Processed,
}

/// Raw webhook event stored for idempotent replay protection. The unique
/// (provider, event_id) pair makes a redelivered event a no-op.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub provider: WebhookProvider,
    /// Provider-assigned event id, unique per provider.
    pub event_id: String,
    #[sea_orm(column_type = "Json")]
    pub payload: Json,
    pub received_at: DateTimeUtc,
    pub processing_status: ProcessingStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
