use axum::http::StatusCode;
use axum::response::Json;
use common::{
    AllocationResult, ApartmentBalance, ApartmentShare, GenerationOutcome, IntegrityIssue,
    IntegrityReport, IssueCode, MonthlyDashboard,
};
use compute::error::ComputeError;
use model::entities::expense::{DistributionType, ExpenseCategory, PayerResponsibility};
use model::entities::payment::{PayerType, PaymentMethod};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Dashboard(MonthlyDashboard),
    Allocation(AllocationResult),
}

/// Query parameters selecting a billing period
#[derive(Debug, Deserialize, ToSchema)]
pub struct PeriodQuery {
    /// Year of the period (e.g., 2024)
    pub year: i32,
    /// Month of the period (1-12)
    pub month: u32,
}

/// Query parameters for the integrity check endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntegrityQuery {
    /// Building to check
    pub building_id: i32,
    /// Apply safe automatic fixes (default: false)
    pub auto_fix: Option<bool>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Error type returned by all handlers
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build an error response with a status code and machine-readable code
pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Map a compute-layer error onto an HTTP error response
pub fn map_compute_error(err: ComputeError) -> ApiError {
    match err {
        ComputeError::DataIntegrity(message) => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, "DATA_INTEGRITY", message)
        }
        ComputeError::BuildingNotFound(id) => api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Building {} not found", id),
        ),
        ComputeError::Date(message) => api_error(StatusCode::BAD_REQUEST, "BAD_PERIOD", message),
        ComputeError::Database(db_error) => {
            error!("Database error: {}", db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal server error",
            )
        }
    }
}

/// Expense category as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ExpenseCategoryDto {
    General,
    Heating,
    Elevator,
    Cleaning,
    Maintenance,
    ReserveFund,
    Management,
    Other,
}

impl From<ExpenseCategoryDto> for ExpenseCategory {
    fn from(dto: ExpenseCategoryDto) -> Self {
        match dto {
            ExpenseCategoryDto::General => ExpenseCategory::General,
            ExpenseCategoryDto::Heating => ExpenseCategory::Heating,
            ExpenseCategoryDto::Elevator => ExpenseCategory::Elevator,
            ExpenseCategoryDto::Cleaning => ExpenseCategory::Cleaning,
            ExpenseCategoryDto::Maintenance => ExpenseCategory::Maintenance,
            ExpenseCategoryDto::ReserveFund => ExpenseCategory::ReserveFund,
            ExpenseCategoryDto::Management => ExpenseCategory::Management,
            ExpenseCategoryDto::Other => ExpenseCategory::Other,
        }
    }
}

impl From<ExpenseCategory> for ExpenseCategoryDto {
    fn from(value: ExpenseCategory) -> Self {
        match value {
            ExpenseCategory::General => ExpenseCategoryDto::General,
            ExpenseCategory::Heating => ExpenseCategoryDto::Heating,
            ExpenseCategory::Elevator => ExpenseCategoryDto::Elevator,
            ExpenseCategory::Cleaning => ExpenseCategoryDto::Cleaning,
            ExpenseCategory::Maintenance => ExpenseCategoryDto::Maintenance,
            ExpenseCategory::ReserveFund => ExpenseCategoryDto::ReserveFund,
            ExpenseCategory::Management => ExpenseCategoryDto::Management,
            ExpenseCategory::Other => ExpenseCategoryDto::Other,
        }
    }
}

/// Distribution method as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DistributionTypeDto {
    EqualShare,
    ByMills,
    ByHeatingMills,
}

impl From<DistributionTypeDto> for DistributionType {
    fn from(dto: DistributionTypeDto) -> Self {
        match dto {
            DistributionTypeDto::EqualShare => DistributionType::EqualShare,
            DistributionTypeDto::ByMills => DistributionType::ByMills,
            DistributionTypeDto::ByHeatingMills => DistributionType::ByHeatingMills,
        }
    }
}

impl From<DistributionType> for DistributionTypeDto {
    fn from(value: DistributionType) -> Self {
        match value {
            DistributionType::EqualShare => DistributionTypeDto::EqualShare,
            DistributionType::ByMills => DistributionTypeDto::ByMills,
            DistributionType::ByHeatingMills => DistributionTypeDto::ByHeatingMills,
        }
    }
}

/// Payer responsibility as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PayerResponsibilityDto {
    Owner,
    Tenant,
    Split,
}

impl From<PayerResponsibilityDto> for PayerResponsibility {
    fn from(dto: PayerResponsibilityDto) -> Self {
        match dto {
            PayerResponsibilityDto::Owner => PayerResponsibility::Owner,
            PayerResponsibilityDto::Tenant => PayerResponsibility::Tenant,
            PayerResponsibilityDto::Split => PayerResponsibility::Split,
        }
    }
}

impl From<PayerResponsibility> for PayerResponsibilityDto {
    fn from(value: PayerResponsibility) -> Self {
        match value {
            PayerResponsibility::Owner => PayerResponsibilityDto::Owner,
            PayerResponsibility::Tenant => PayerResponsibilityDto::Tenant,
            PayerResponsibility::Split => PayerResponsibilityDto::Split,
        }
    }
}

/// Payment method as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethodDto {
    Cash,
    BankTransfer,
    Card,
    Other,
}

impl From<PaymentMethodDto> for PaymentMethod {
    fn from(dto: PaymentMethodDto) -> Self {
        match dto {
            PaymentMethodDto::Cash => PaymentMethod::Cash,
            PaymentMethodDto::BankTransfer => PaymentMethod::BankTransfer,
            PaymentMethodDto::Card => PaymentMethod::Card,
            PaymentMethodDto::Other => PaymentMethod::Other,
        }
    }
}

impl From<PaymentMethod> for PaymentMethodDto {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cash => PaymentMethodDto::Cash,
            PaymentMethod::BankTransfer => PaymentMethodDto::BankTransfer,
            PaymentMethod::Card => PaymentMethodDto::Card,
            PaymentMethod::Other => PaymentMethodDto::Other,
        }
    }
}

/// Payer type as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PayerTypeDto {
    Owner,
    Tenant,
}

impl From<PayerTypeDto> for PayerType {
    fn from(dto: PayerTypeDto) -> Self {
        match dto {
            PayerTypeDto::Owner => PayerType::Owner,
            PayerTypeDto::Tenant => PayerType::Tenant,
        }
    }
}

impl From<PayerType> for PayerTypeDto {
    fn from(value: PayerType) -> Self {
        match value {
            PayerType::Owner => PayerTypeDto::Owner,
            PayerType::Tenant => PayerTypeDto::Tenant,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::buildings::create_building,
        crate::handlers::buildings::get_buildings,
        crate::handlers::buildings::get_building,
        crate::handlers::buildings::update_building,
        crate::handlers::buildings::delete_building,
        crate::handlers::apartments::create_apartment,
        crate::handlers::apartments::get_building_apartments,
        crate::handlers::apartments::get_apartment,
        crate::handlers::apartments::update_apartment,
        crate::handlers::apartments::delete_apartment,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_building_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::get_apartment_payments,
        crate::handlers::recurring_expenses::create_recurring_expense,
        crate::handlers::recurring_expenses::get_building_recurring_expenses,
        crate::handlers::recurring_expenses::update_recurring_expense,
        crate::handlers::recurring_expenses::delete_recurring_expense,
        crate::handlers::recurring_expenses::generate_recurring_expenses,
        crate::handlers::allocations::get_building_allocation,
        crate::handlers::dashboard::get_building_dashboard,
        crate::handlers::integrity::run_integrity_check,
        crate::handlers::webhooks::receive_webhook,
    ),
    components(
        schemas(
            crate::handlers::buildings::CreateBuildingRequest,
            crate::handlers::buildings::UpdateBuildingRequest,
            crate::handlers::buildings::BuildingResponse,
            crate::handlers::apartments::CreateApartmentRequest,
            crate::handlers::apartments::UpdateApartmentRequest,
            crate::handlers::apartments::ApartmentResponse,
            crate::handlers::expenses::CreateExpenseRequest,
            crate::handlers::expenses::UpdateExpenseRequest,
            crate::handlers::expenses::ExpenseResponse,
            crate::handlers::payments::CreatePaymentRequest,
            crate::handlers::payments::PaymentResponse,
            crate::handlers::recurring_expenses::CreateRecurringExpenseRequest,
            crate::handlers::recurring_expenses::UpdateRecurringExpenseRequest,
            crate::handlers::recurring_expenses::RecurringExpenseResponse,
            crate::handlers::webhooks::WebhookAck,
            ErrorResponse,
            HealthResponse,
            PeriodQuery,
            IntegrityQuery,
            ExpenseCategoryDto,
            DistributionTypeDto,
            PayerResponsibilityDto,
            PaymentMethodDto,
            PayerTypeDto,
            ApiResponse<AllocationResult>,
            ApiResponse<MonthlyDashboard>,
            ApiResponse<IntegrityReport>,
            ApiResponse<GenerationOutcome>,
            AllocationResult,
            ApartmentShare,
            MonthlyDashboard,
            ApartmentBalance,
            IntegrityReport,
            IntegrityIssue,
            IssueCode,
            GenerationOutcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "buildings", description = "Building management endpoints"),
        (name = "apartments", description = "Apartment management endpoints"),
        (name = "expenses", description = "Expense management endpoints"),
        (name = "payments", description = "Payment recording endpoints"),
        (name = "recurring-expenses", description = "Recurring expense templates and generation"),
        (name = "allocations", description = "Common expense allocation endpoints"),
        (name = "dashboard", description = "Monthly financial dashboard endpoints"),
        (name = "integrity", description = "Financial data integrity endpoints"),
        (name = "webhooks", description = "Inbound webhook endpoints"),
    ),
    info(
        title = "CondoLedger API",
        description = "Condominium management API - common expense allocation, balances and reconciliation",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
