use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{apartment, building, expense, payment};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    QueryTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{api_error, ApiError, ApiResponse, AppState};

/// Request body for creating a new building
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateBuildingRequest {
    /// Building name
    #[validate(length(min = 1))]
    pub name: String,
    /// Street address
    pub address: Option<String>,
    /// Basis the apartments' mills are expected to sum to (default: 1000)
    #[validate(range(min = 1))]
    pub mills_basis: Option<i32>,
    /// Reserve fund savings target
    pub reserve_fund_goal: Option<Decimal>,
    /// Months the reserve fund is collected over
    #[validate(range(min = 1))]
    pub reserve_fund_months: Option<i32>,
    /// First month of reserve fund collection
    pub reserve_fund_start: Option<NaiveDate>,
    /// Flat management fee per apartment per month
    pub management_fee_per_apartment: Option<Decimal>,
    /// First date the ledgers are authoritative
    pub financial_start: Option<NaiveDate>,
}

/// Request body for updating a building
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateBuildingRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub reserve_fund_goal: Option<Decimal>,
    #[validate(range(min = 1))]
    pub reserve_fund_months: Option<i32>,
    pub reserve_fund_start: Option<NaiveDate>,
    pub management_fee_per_apartment: Option<Decimal>,
    pub financial_start: Option<NaiveDate>,
}

/// Building response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildingResponse {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub mills_basis: i32,
    pub reserve_fund_goal: Option<Decimal>,
    pub reserve_fund_months: Option<i32>,
    pub reserve_fund_start: Option<NaiveDate>,
    pub management_fee_per_apartment: Option<Decimal>,
    pub financial_start: Option<NaiveDate>,
}

impl From<building::Model> for BuildingResponse {
    fn from(model: building::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            mills_basis: model.mills_basis,
            reserve_fund_goal: model.reserve_fund_goal,
            reserve_fund_months: model.reserve_fund_months,
            reserve_fund_start: model.reserve_fund_start,
            management_fee_per_apartment: model.management_fee_per_apartment,
            financial_start: model.financial_start,
        }
    }
}

/// Create a new building
#[utoipa::path(
    post,
    path = "/api/v1/buildings",
    tag = "buildings",
    request_body = CreateBuildingRequest,
    responses(
        (status = 201, description = "Building created successfully", body = ApiResponse<BuildingResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_building(
    State(state): State<AppState>,
    Json(request): Json<CreateBuildingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BuildingResponse>>), ApiError> {
    trace!("Entering create_building function");
    debug!("Creating building with name: {}", request.name);

    if let Err(validation_error) = request.validate() {
        warn!("Invalid create building request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }

    let new_building = building::ActiveModel {
        name: Set(request.name.clone()),
        address: Set(request.address.clone()),
        mills_basis: Set(request.mills_basis.unwrap_or(1000)),
        reserve_fund_goal: Set(request.reserve_fund_goal),
        reserve_fund_months: Set(request.reserve_fund_months),
        reserve_fund_start: Set(request.reserve_fund_start),
        management_fee_per_apartment: Set(request.management_fee_per_apartment),
        financial_start: Set(request.financial_start),
        ..Default::default()
    };

    match new_building.insert(&state.db).await {
        Ok(building_model) => {
            info!(
                "Building created successfully with ID: {}, name: {}",
                building_model.id, building_model.name
            );
            let response = ApiResponse {
                data: BuildingResponse::from(building_model),
                message: "Building created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create building '{}': {}", request.name, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to create building",
            ))
        }
    }
}

/// Get all buildings
#[utoipa::path(
    get,
    path = "/api/v1/buildings",
    tag = "buildings",
    responses(
        (status = 200, description = "Buildings retrieved successfully", body = ApiResponse<Vec<BuildingResponse>>),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_buildings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BuildingResponse>>>, ApiError> {
    trace!("Entering get_buildings function");

    match building::Entity::find().all(&state.db).await {
        Ok(buildings) => {
            debug!("Retrieved {} buildings from database", buildings.len());
            let response = ApiResponse {
                data: buildings.into_iter().map(BuildingResponse::from).collect(),
                message: "Buildings retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve buildings: {}", db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve buildings",
            ))
        }
    }
}

/// Get a specific building by ID
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}",
    tag = "buildings",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    responses(
        (status = 200, description = "Building retrieved successfully", body = ApiResponse<BuildingResponse>),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_building(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BuildingResponse>>, ApiError> {
    trace!("Entering get_building function for building_id: {}", building_id);

    match building::Entity::find_by_id(building_id).one(&state.db).await {
        Ok(Some(building_model)) => {
            info!("Retrieved building {}: {}", building_model.id, building_model.name);
            let response = ApiResponse {
                data: BuildingResponse::from(building_model),
                message: "Building retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Building with ID {} not found", building_id);
            Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Building {} not found", building_id),
            ))
        }
        Err(db_error) => {
            error!("Failed to retrieve building {}: {}", building_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve building",
            ))
        }
    }
}

/// Update a building
#[utoipa::path(
    put,
    path = "/api/v1/buildings/{building_id}",
    tag = "buildings",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    request_body = UpdateBuildingRequest,
    responses(
        (status = 200, description = "Building updated successfully", body = ApiResponse<BuildingResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_building(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBuildingRequest>,
) -> Result<Json<ApiResponse<BuildingResponse>>, ApiError> {
    trace!("Entering update_building function for building_id: {}", building_id);

    if let Err(validation_error) = request.validate() {
        warn!("Invalid update building request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }

    let existing = match building::Entity::find_by_id(building_id).one(&state.db).await {
        Ok(Some(building_model)) => building_model,
        Ok(None) => {
            warn!("Building with ID {} not found for update", building_id);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Building {} not found", building_id),
            ));
        }
        Err(db_error) => {
            error!("Failed to lookup building {} for update: {}", building_id, db_error);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update building",
            ));
        }
    };

    let mut active: building::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(address) = request.address {
        active.address = Set(Some(address));
    }
    if let Some(goal) = request.reserve_fund_goal {
        active.reserve_fund_goal = Set(Some(goal));
    }
    if let Some(months) = request.reserve_fund_months {
        active.reserve_fund_months = Set(Some(months));
    }
    if let Some(start) = request.reserve_fund_start {
        active.reserve_fund_start = Set(Some(start));
    }
    if let Some(fee) = request.management_fee_per_apartment {
        active.management_fee_per_apartment = Set(Some(fee));
    }
    if let Some(financial_start) = request.financial_start {
        active.financial_start = Set(Some(financial_start));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Building {} updated successfully", updated.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: BuildingResponse::from(updated),
                message: "Building updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update building {}: {}", building_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update building",
            ))
        }
    }
}

/// Delete a building
///
/// Refused while expenses or payments still reference the building, so
/// financial history can never disappear by cascade.
#[utoipa::path(
    delete,
    path = "/api/v1/buildings/{building_id}",
    tag = "buildings",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    responses(
        (status = 204, description = "Building deleted successfully"),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Building still has financial records", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_building(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_building function for building_id: {}", building_id);

    let expense_count = expense::Entity::find()
        .filter(expense::Column::BuildingId.eq(building_id))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count expenses for building {}: {}", building_id, db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete building",
            )
        })?;

    let payment_count = payment::Entity::find()
        .filter(
            payment::Column::ApartmentId.in_subquery(
                apartment::Entity::find()
                    .select_only()
                    .column(apartment::Column::Id)
                    .filter(apartment::Column::BuildingId.eq(building_id))
                    .into_query(),
            ),
        )
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count payments for building {}: {}", building_id, db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete building",
            )
        })?;

    if expense_count > 0 || payment_count > 0 {
        warn!(
            "Refusing to delete building {}: {} expenses, {} payments still reference it",
            building_id, expense_count, payment_count
        );
        return Err(api_error(
            StatusCode::CONFLICT,
            "BUILDING_HAS_RECORDS",
            "Building still has financial records and cannot be deleted",
        ));
    }

    match building::Entity::delete_by_id(building_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected == 0 {
                warn!("Building with ID {} not found for deletion", building_id);
                Err(api_error(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Building {} not found", building_id),
                ))
            } else {
                info!("Building {} deleted successfully", building_id);
                state.cache.invalidate_all();
                Ok(StatusCode::NO_CONTENT)
            }
        }
        Err(db_error) => {
            error!("Failed to delete building {}: {}", building_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete building",
            ))
        }
    }
}
