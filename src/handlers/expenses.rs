use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{building, expense};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{
    api_error, map_compute_error, ApiError, ApiResponse, AppState, DistributionTypeDto,
    ExpenseCategoryDto, PayerResponsibilityDto,
};

/// Request body for creating a new expense
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    /// Expense title
    #[validate(length(min = 1))]
    pub title: String,
    /// Amount in the building's currency
    pub amount: Decimal,
    /// Date the expense was incurred
    pub date: NaiveDate,
    /// Expense category
    pub category: ExpenseCategoryDto,
    /// How the amount is split across apartments
    pub distribution_type: DistributionTypeDto,
    /// Who is liable for each apartment's share
    pub payer_responsibility: PayerResponsibilityDto,
    /// Owner fraction when responsibility is Split (0-1, default 0.5)
    pub split_ratio: Option<Decimal>,
    /// Free-form reference to a maintenance project
    pub project_ref: Option<String>,
    /// Provenance notes stored alongside the expense
    #[schema(value_type = Option<Object>)]
    pub audit_trail: Option<serde_json::Value>,
}

/// Request body for updating an expense
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<ExpenseCategoryDto>,
    pub distribution_type: Option<DistributionTypeDto>,
    pub payer_responsibility: Option<PayerResponsibilityDto>,
    pub split_ratio: Option<Decimal>,
    pub project_ref: Option<String>,
}

/// Optional period filter for listing expenses
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExpenseListQuery {
    /// Year to filter by
    pub year: Option<i32>,
    /// Month to filter by (requires year)
    pub month: Option<u32>,
}

/// Expense response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: i32,
    pub building_id: i32,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: ExpenseCategoryDto,
    pub distribution_type: DistributionTypeDto,
    pub payer_responsibility: PayerResponsibilityDto,
    pub split_ratio: Option<Decimal>,
    pub project_ref: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub audit_trail: Option<serde_json::Value>,
    pub recurring_expense_id: Option<i32>,
    pub period_year: Option<i32>,
    pub period_month: Option<i32>,
}

impl From<expense::Model> for ExpenseResponse {
    fn from(model: expense::Model) -> Self {
        Self {
            id: model.id,
            building_id: model.building_id,
            title: model.title,
            amount: model.amount,
            date: model.date,
            category: model.category.into(),
            distribution_type: model.distribution_type.into(),
            payer_responsibility: model.payer_responsibility.into(),
            split_ratio: model.split_ratio,
            project_ref: model.project_ref,
            audit_trail: model.audit_trail,
            recurring_expense_id: model.recurring_expense_id,
            period_year: model.period_year,
            period_month: model.period_month,
        }
    }
}

fn validate_amount(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Expense amount must be positive",
        ));
    }
    Ok(())
}

fn validate_split_ratio(ratio: Option<Decimal>) -> Result<(), ApiError> {
    if let Some(ratio) = ratio {
        if ratio < Decimal::ZERO || ratio > Decimal::ONE {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION",
                "split_ratio must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

/// Create a new expense for a building
#[utoipa::path(
    post,
    path = "/api/v1/buildings/{building_id}/expenses",
    tag = "expenses",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created successfully", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_expense(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), ApiError> {
    trace!("Entering create_expense function for building_id: {}", building_id);
    debug!(
        "Creating expense '{}' of {} for building {}",
        request.title, request.amount, building_id
    );

    if let Err(validation_error) = request.validate() {
        warn!("Invalid create expense request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }
    validate_amount(request.amount)?;
    validate_split_ratio(request.split_ratio)?;

    match building::Entity::find_by_id(building_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Building with ID {} not found", building_id);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Building {} not found", building_id),
            ));
        }
        Err(db_error) => {
            error!("Failed to lookup building {}: {}", building_id, db_error);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to create expense",
            ));
        }
    }

    let audit_trail = request
        .audit_trail
        .clone()
        .unwrap_or_else(|| json!({"source": "api"}));

    let new_expense = expense::ActiveModel {
        building_id: Set(building_id),
        title: Set(request.title.clone()),
        amount: Set(request.amount),
        date: Set(request.date),
        category: Set(request.category.into()),
        distribution_type: Set(request.distribution_type.into()),
        payer_responsibility: Set(request.payer_responsibility.into()),
        split_ratio: Set(request.split_ratio),
        project_ref: Set(request.project_ref.clone()),
        audit_trail: Set(Some(audit_trail)),
        ..Default::default()
    };

    match new_expense.insert(&state.db).await {
        Ok(expense_model) => {
            info!(
                "Expense created with ID: {}, title: '{}' for building {}",
                expense_model.id, expense_model.title, building_id
            );
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ExpenseResponse::from(expense_model),
                message: "Expense created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create expense '{}' for building {}: {}",
                request.title, building_id, db_error
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to create expense",
            ))
        }
    }
}

/// Get expenses of a building, optionally filtered by period
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}/expenses",
    tag = "expenses",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
        ("year" = Option<i32>, Query, description = "Year to filter by"),
        ("month" = Option<u32>, Query, description = "Month to filter by (requires year)"),
    ),
    responses(
        (status = 200, description = "Expenses retrieved successfully", body = ApiResponse<Vec<ExpenseResponse>>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_building_expenses(
    Path(building_id): Path<i32>,
    Query(query): Query<ExpenseListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, ApiError> {
    trace!("Entering get_building_expenses for building_id: {}", building_id);

    let mut select = expense::Entity::find()
        .filter(expense::Column::BuildingId.eq(building_id))
        .order_by_asc(expense::Column::Date);

    if let (Some(year), Some(month)) = (query.year, query.month) {
        let (start, end) = compute::period::month_bounds(year, month).map_err(map_compute_error)?;
        debug!("Filtering expenses to period {}-{:02}", year, month);
        select = select
            .filter(expense::Column::Date.gte(start))
            .filter(expense::Column::Date.lte(end));
    }

    match select.all(&state.db).await {
        Ok(expenses) => {
            debug!("Retrieved {} expenses for building {}", expenses.len(), building_id);
            let response = ApiResponse {
                data: expenses.into_iter().map(ExpenseResponse::from).collect(),
                message: "Expenses retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve expenses for building {}: {}", building_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve expenses",
            ))
        }
    }
}

/// Get a specific expense by ID
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ApiError> {
    trace!("Entering get_expense function for expense_id: {}", expense_id);

    match expense::Entity::find_by_id(expense_id).one(&state.db).await {
        Ok(Some(expense_model)) => {
            info!("Retrieved expense {}: '{}'", expense_model.id, expense_model.title);
            let response = ApiResponse {
                data: ExpenseResponse::from(expense_model),
                message: "Expense retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Expense with ID {} not found", expense_id);
            Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Expense {} not found", expense_id),
            ))
        }
        Err(db_error) => {
            error!("Failed to retrieve expense {}: {}", expense_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve expense",
            ))
        }
    }
}

/// Update an expense
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated successfully", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Expense not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ApiError> {
    trace!("Entering update_expense function for expense_id: {}", expense_id);

    if let Err(validation_error) = request.validate() {
        warn!("Invalid update expense request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }
    if let Some(amount) = request.amount {
        validate_amount(amount)?;
    }
    validate_split_ratio(request.split_ratio)?;

    let existing = match expense::Entity::find_by_id(expense_id).one(&state.db).await {
        Ok(Some(expense_model)) => expense_model,
        Ok(None) => {
            warn!("Expense with ID {} not found for update", expense_id);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Expense {} not found", expense_id),
            ));
        }
        Err(db_error) => {
            error!("Failed to lookup expense {} for update: {}", expense_id, db_error);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update expense",
            ));
        }
    };

    let mut active: expense::ActiveModel = existing.into();
    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(date) = request.date {
        active.date = Set(date);
    }
    if let Some(category) = request.category {
        active.category = Set(category.into());
    }
    if let Some(distribution) = request.distribution_type {
        active.distribution_type = Set(distribution.into());
    }
    if let Some(responsibility) = request.payer_responsibility {
        active.payer_responsibility = Set(responsibility.into());
    }
    if let Some(ratio) = request.split_ratio {
        active.split_ratio = Set(Some(ratio));
    }
    if let Some(project_ref) = request.project_ref {
        active.project_ref = Set(Some(project_ref));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Expense {} updated successfully", updated.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ExpenseResponse::from(updated),
                message: "Expense updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update expense {}: {}", expense_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update expense",
            ))
        }
    }
}

/// Delete an expense
#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 204, description = "Expense deleted successfully"),
        (status = 404, description = "Expense not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_expense function for expense_id: {}", expense_id);

    match expense::Entity::delete_by_id(expense_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected == 0 {
                warn!("Expense with ID {} not found for deletion", expense_id);
                Err(api_error(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Expense {} not found", expense_id),
                ))
            } else {
                info!("Expense {} deleted successfully", expense_id);
                state.cache.invalidate_all();
                Ok(StatusCode::NO_CONTENT)
            }
        }
        Err(db_error) => {
            error!("Failed to delete expense {}: {}", expense_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete expense",
            ))
        }
    }
}
