use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::GenerationOutcome;
use model::entities::{building, recurring_expense};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{
    api_error, map_compute_error, ApiError, ApiResponse, AppState, DistributionTypeDto,
    ExpenseCategoryDto, PayerResponsibilityDto, PeriodQuery,
};

/// Request body for creating a recurring expense template
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateRecurringExpenseRequest {
    /// Template title
    #[validate(length(min = 1))]
    pub title: String,
    /// Amount of each generated expense
    pub amount: Decimal,
    /// Expense category
    pub category: ExpenseCategoryDto,
    /// How generated expenses are split
    pub distribution_type: DistributionTypeDto,
    /// Who is liable for each apartment's share
    pub payer_responsibility: PayerResponsibilityDto,
    /// Owner fraction when responsibility is Split
    pub split_ratio: Option<Decimal>,
    /// Day of month the generated expense is dated at (1-31, clamped)
    #[validate(range(min = 1, max = 31))]
    pub day_of_month: i32,
    /// First period the template applies to
    pub start_date: NaiveDate,
    /// Last period the template applies to
    pub end_date: Option<NaiveDate>,
}

/// Request body for updating a recurring expense template
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateRecurringExpenseRequest {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<ExpenseCategoryDto>,
    pub distribution_type: Option<DistributionTypeDto>,
    pub payer_responsibility: Option<PayerResponsibilityDto>,
    pub split_ratio: Option<Decimal>,
    #[validate(range(min = 1, max = 31))]
    pub day_of_month: Option<i32>,
    pub end_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

/// Recurring expense template response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecurringExpenseResponse {
    pub id: i32,
    pub building_id: i32,
    pub title: String,
    pub amount: Decimal,
    pub category: ExpenseCategoryDto,
    pub distribution_type: DistributionTypeDto,
    pub payer_responsibility: PayerResponsibilityDto,
    pub split_ratio: Option<Decimal>,
    pub day_of_month: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
}

impl From<recurring_expense::Model> for RecurringExpenseResponse {
    fn from(model: recurring_expense::Model) -> Self {
        Self {
            id: model.id,
            building_id: model.building_id,
            title: model.title,
            amount: model.amount,
            category: model.category.into(),
            distribution_type: model.distribution_type.into(),
            payer_responsibility: model.payer_responsibility.into(),
            split_ratio: model.split_ratio,
            day_of_month: model.day_of_month,
            start_date: model.start_date,
            end_date: model.end_date,
            active: model.active,
        }
    }
}

/// Create a recurring expense template for a building
#[utoipa::path(
    post,
    path = "/api/v1/buildings/{building_id}/recurring-expenses",
    tag = "recurring-expenses",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    request_body = CreateRecurringExpenseRequest,
    responses(
        (status = 201, description = "Template created successfully", body = ApiResponse<RecurringExpenseResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_recurring_expense(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateRecurringExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecurringExpenseResponse>>), ApiError> {
    trace!("Entering create_recurring_expense for building_id: {}", building_id);
    debug!("Creating recurring expense '{}' for building {}", request.title, building_id);

    if let Err(validation_error) = request.validate() {
        warn!("Invalid create recurring expense request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }
    if request.amount <= Decimal::ZERO {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Recurring expense amount must be positive",
        ));
    }

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
                "Failed to create recurring expense",
            ));
        }
    }

    let new_template = recurring_expense::ActiveModel {
        building_id: Set(building_id),
        title: Set(request.title.clone()),
        amount: Set(request.amount),
        category: Set(request.category.into()),
        distribution_type: Set(request.distribution_type.into()),
        payer_responsibility: Set(request.payer_responsibility.into()),
        split_ratio: Set(request.split_ratio),
        day_of_month: Set(request.day_of_month),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        active: Set(true),
        ..Default::default()
    };

    match new_template.insert(&state.db).await {
        Ok(template) => {
            info!(
                "Recurring expense template created with ID: {}, title: '{}'",
                template.id, template.title
            );
            let response = ApiResponse {
                data: RecurringExpenseResponse::from(template),
                message: "Recurring expense created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create recurring expense '{}' for building {}: {}",
                request.title, building_id, db_error
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to create recurring expense",
            ))
        }
    }
}

/// Get all recurring expense templates of a building
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}/recurring-expenses",
    tag = "recurring-expenses",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    responses(
        (status = 200, description = "Templates retrieved successfully", body = ApiResponse<Vec<RecurringExpenseResponse>>),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_building_recurring_expenses(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RecurringExpenseResponse>>>, ApiError> {
    trace!("Entering get_building_recurring_expenses for building_id: {}", building_id);

    match recurring_expense::Entity::find()
        .filter(recurring_expense::Column::BuildingId.eq(building_id))
        .order_by_asc(recurring_expense::Column::Id)
        .all(&state.db)
        .await
    {
        Ok(templates) => {
            debug!("Retrieved {} templates for building {}", templates.len(), building_id);
            let response = ApiResponse {
                data: templates
                    .into_iter()
                    .map(RecurringExpenseResponse::from)
                    .collect(),
                message: "Recurring expenses retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to retrieve recurring expenses for building {}: {}",
                building_id, db_error
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve recurring expenses",
            ))
        }
    }
}

/// Update a recurring expense template
#[utoipa::path(
    put,
    path = "/api/v1/recurring-expenses/{recurring_expense_id}",
    tag = "recurring-expenses",
    params(
        ("recurring_expense_id" = i32, Path, description = "Recurring expense ID"),
    ),
    request_body = UpdateRecurringExpenseRequest,
    responses(
        (status = 200, description = "Template updated successfully", body = ApiResponse<RecurringExpenseResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Template not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_recurring_expense(
    Path(recurring_expense_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateRecurringExpenseRequest>,
) -> Result<Json<ApiResponse<RecurringExpenseResponse>>, ApiError> {
    trace!(
        "Entering update_recurring_expense for recurring_expense_id: {}",
        recurring_expense_id
    );

    if let Err(validation_error) = request.validate() {
        warn!("Invalid update recurring expense request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }

    let existing = match recurring_expense::Entity::find_by_id(recurring_expense_id)
        .one(&state.db)
        .await
    {
        Ok(Some(template)) => template,
        Ok(None) => {
            warn!("Recurring expense with ID {} not found", recurring_expense_id);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Recurring expense {} not found", recurring_expense_id),
            ));
        }
        Err(db_error) => {
            error!(
                "Failed to lookup recurring expense {}: {}",
                recurring_expense_id, db_error
            );
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update recurring expense",
            ));
        }
    };

    let mut active: recurring_expense::ActiveModel = existing.into();
    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(amount) = request.amount {
        if amount <= Decimal::ZERO {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION",
                "Recurring expense amount must be positive",
            ));
        }
        active.amount = Set(amount);
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
    if let Some(day) = request.day_of_month {
        active.day_of_month = Set(day);
    }
    if let Some(end_date) = request.end_date {
        active.end_date = Set(Some(end_date));
    }
    if let Some(is_active) = request.active {
        active.active = Set(is_active);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Recurring expense {} updated successfully", updated.id);
            let response = ApiResponse {
                data: RecurringExpenseResponse::from(updated),
                message: "Recurring expense updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to update recurring expense {}: {}",
                recurring_expense_id, db_error
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update recurring expense",
            ))
        }
    }
}

/// Delete a recurring expense template
///
/// Already-generated expense rows keep their history; their template link
/// is cleared by the foreign key.
#[utoipa::path(
    delete,
    path = "/api/v1/recurring-expenses/{recurring_expense_id}",
    tag = "recurring-expenses",
    params(
        ("recurring_expense_id" = i32, Path, description = "Recurring expense ID"),
    ),
    responses(
        (status = 204, description = "Template deleted successfully"),
        (status = 404, description = "Template not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_recurring_expense(
    Path(recurring_expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    trace!(
        "Entering delete_recurring_expense for recurring_expense_id: {}",
        recurring_expense_id
    );

    match recurring_expense::Entity::delete_by_id(recurring_expense_id)
        .exec(&state.db)
        .await
    {
        Ok(delete_result) => {
            if delete_result.rows_affected == 0 {
                warn!("Recurring expense with ID {} not found for deletion", recurring_expense_id);
                Err(api_error(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Recurring expense {} not found", recurring_expense_id),
                ))
            } else {
                info!("Recurring expense {} deleted successfully", recurring_expense_id);
                Ok(StatusCode::NO_CONTENT)
            }
        }
        Err(db_error) => {
            error!(
                "Failed to delete recurring expense {}: {}",
                recurring_expense_id, db_error
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete recurring expense",
            ))
        }
    }
}

/// Generate concrete expenses from a building's recurring templates
///
/// Safe to call repeatedly for the same period; already-generated rows are
/// skipped by the unique generation constraint.
#[utoipa::path(
    post,
    path = "/api/v1/buildings/{building_id}/recurring-expenses/generate",
    tag = "recurring-expenses",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
        ("year" = i32, Query, description = "Year of the period"),
        ("month" = u32, Query, description = "Month of the period (1-12)"),
    ),
    responses(
        (status = 200, description = "Generation completed", body = ApiResponse<GenerationOutcome>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn generate_recurring_expenses(
    Path(building_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GenerationOutcome>>, ApiError> {
    trace!(
        "Entering generate_recurring_expenses for building {} period {}-{:02}",
        building_id, query.year, query.month
    );

    let outcome = compute::recurring::generate_for_period(&state.db, building_id, query.year, query.month)
        .await
        .map_err(map_compute_error)?;

    info!(
        "Recurring generation for building {} period {}-{:02}: {} created, {} skipped",
        building_id, query.year, query.month, outcome.created, outcome.skipped
    );
    if outcome.created > 0 {
        state.cache.invalidate_all();
    }

    let response = ApiResponse {
        data: outcome,
        message: "Recurring expense generation completed".to_string(),
        success: true,
    };
    Ok(Json(response))
}
