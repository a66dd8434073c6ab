use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{apartment, building, payment};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::{api_error, ApiError, ApiResponse, AppState};

/// Request body for creating a new apartment
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateApartmentRequest {
    /// Door number or label, unique within the building
    #[validate(length(min = 1))]
    pub number: String,
    /// Owner's name
    #[validate(length(min = 1))]
    pub owner_name: String,
    /// Tenant's name, if rented out
    pub tenant_name: Option<String>,
    /// Ownership share in mills (0-1000)
    #[validate(range(min = 0, max = 1000))]
    pub participation_mills: Option<i32>,
    /// Heating share in mills (0-1000)
    #[validate(range(min = 0, max = 1000))]
    pub heating_mills: Option<i32>,
    /// Opening balance carried into the system
    pub previous_balance: Option<Decimal>,
}

/// Request body for updating an apartment
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateApartmentRequest {
    #[validate(length(min = 1))]
    pub number: Option<String>,
    #[validate(length(min = 1))]
    pub owner_name: Option<String>,
    pub tenant_name: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    pub participation_mills: Option<i32>,
    #[validate(range(min = 0, max = 1000))]
    pub heating_mills: Option<i32>,
}

/// Apartment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApartmentResponse {
    pub id: i32,
    pub building_id: i32,
    pub number: String,
    pub owner_name: String,
    pub tenant_name: Option<String>,
    pub participation_mills: Option<i32>,
    pub heating_mills: Option<i32>,
    pub current_balance: Decimal,
    pub previous_balance: Decimal,
}

impl From<apartment::Model> for ApartmentResponse {
    fn from(model: apartment::Model) -> Self {
        Self {
            id: model.id,
            building_id: model.building_id,
            number: model.number,
            owner_name: model.owner_name,
            tenant_name: model.tenant_name,
            participation_mills: model.participation_mills,
            heating_mills: model.heating_mills,
            current_balance: model.current_balance,
            previous_balance: model.previous_balance,
        }
    }
}

/// Create a new apartment in a building
#[utoipa::path(
    post,
    path = "/api/v1/buildings/{building_id}/apartments",
    tag = "apartments",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    request_body = CreateApartmentRequest,
    responses(
        (status = 201, description = "Apartment created successfully", body = ApiResponse<ApartmentResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_apartment(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateApartmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApartmentResponse>>), ApiError> {
    trace!("Entering create_apartment function for building_id: {}", building_id);
    debug!("Creating apartment {} in building {}", request.number, building_id);

    if let Err(validation_error) = request.validate() {
        warn!("Invalid create apartment request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
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
                "Failed to create apartment",
            ));
        }
    }

    let opening_balance = request.previous_balance.unwrap_or_default();
    let new_apartment = apartment::ActiveModel {
        building_id: Set(building_id),
        number: Set(request.number.clone()),
        owner_name: Set(request.owner_name.clone()),
        tenant_name: Set(request.tenant_name.clone()),
        participation_mills: Set(request.participation_mills),
        heating_mills: Set(request.heating_mills),
        current_balance: Set(opening_balance),
        previous_balance: Set(opening_balance),
        ..Default::default()
    };

    match new_apartment.insert(&state.db).await {
        Ok(apartment_model) => {
            info!(
                "Apartment created with ID: {}, number: {} in building {}",
                apartment_model.id, apartment_model.number, building_id
            );
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ApartmentResponse::from(apartment_model),
                message: "Apartment created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create apartment '{}' in building {}: {}",
                request.number, building_id, db_error
            );
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to create apartment",
            ))
        }
    }
}

/// Get all apartments of a building
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}/apartments",
    tag = "apartments",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
    ),
    responses(
        (status = 200, description = "Apartments retrieved successfully", body = ApiResponse<Vec<ApartmentResponse>>),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_building_apartments(
    Path(building_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ApartmentResponse>>>, ApiError> {
    trace!("Entering get_building_apartments for building_id: {}", building_id);

    match apartment::Entity::find()
        .filter(apartment::Column::BuildingId.eq(building_id))
        .order_by_asc(apartment::Column::Id)
        .all(&state.db)
        .await
    {
        Ok(apartments) => {
            debug!("Retrieved {} apartments for building {}", apartments.len(), building_id);
            let response = ApiResponse {
                data: apartments.into_iter().map(ApartmentResponse::from).collect(),
                message: "Apartments retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve apartments for building {}: {}", building_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve apartments",
            ))
        }
    }
}

/// Get a specific apartment by ID
#[utoipa::path(
    get,
    path = "/api/v1/apartments/{apartment_id}",
    tag = "apartments",
    params(
        ("apartment_id" = i32, Path, description = "Apartment ID"),
    ),
    responses(
        (status = 200, description = "Apartment retrieved successfully", body = ApiResponse<ApartmentResponse>),
        (status = 404, description = "Apartment not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_apartment(
    Path(apartment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ApartmentResponse>>, ApiError> {
    trace!("Entering get_apartment function for apartment_id: {}", apartment_id);

    match apartment::Entity::find_by_id(apartment_id).one(&state.db).await {
        Ok(Some(apartment_model)) => {
            info!("Retrieved apartment {}: {}", apartment_model.id, apartment_model.number);
            let response = ApiResponse {
                data: ApartmentResponse::from(apartment_model),
                message: "Apartment retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Apartment with ID {} not found", apartment_id);
            Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Apartment {} not found", apartment_id),
            ))
        }
        Err(db_error) => {
            error!("Failed to retrieve apartment {}: {}", apartment_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve apartment",
            ))
        }
    }
}

/// Update an apartment
#[utoipa::path(
    put,
    path = "/api/v1/apartments/{apartment_id}",
    tag = "apartments",
    params(
        ("apartment_id" = i32, Path, description = "Apartment ID"),
    ),
    request_body = UpdateApartmentRequest,
    responses(
        (status = 200, description = "Apartment updated successfully", body = ApiResponse<ApartmentResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Apartment not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_apartment(
    Path(apartment_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateApartmentRequest>,
) -> Result<Json<ApiResponse<ApartmentResponse>>, ApiError> {
    trace!("Entering update_apartment function for apartment_id: {}", apartment_id);

    if let Err(validation_error) = request.validate() {
        warn!("Invalid update apartment request: {}", validation_error);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            validation_error.to_string(),
        ));
    }

    let existing = match apartment::Entity::find_by_id(apartment_id).one(&state.db).await {
        Ok(Some(apartment_model)) => apartment_model,
        Ok(None) => {
            warn!("Apartment with ID {} not found for update", apartment_id);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Apartment {} not found", apartment_id),
            ));
        }
        Err(db_error) => {
            error!("Failed to lookup apartment {} for update: {}", apartment_id, db_error);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update apartment",
            ));
        }
    };

    let mut active: apartment::ActiveModel = existing.into();
    if let Some(number) = request.number {
        active.number = Set(number);
    }
    if let Some(owner_name) = request.owner_name {
        active.owner_name = Set(owner_name);
    }
    if let Some(tenant_name) = request.tenant_name {
        active.tenant_name = Set(Some(tenant_name));
    }
    if let Some(mills) = request.participation_mills {
        active.participation_mills = Set(Some(mills));
    }
    if let Some(heating) = request.heating_mills {
        active.heating_mills = Set(Some(heating));
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Apartment {} updated successfully", updated.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ApartmentResponse::from(updated),
                message: "Apartment updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update apartment {}: {}", apartment_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to update apartment",
            ))
        }
    }
}

/// Delete an apartment
///
/// Refused while payments still reference the apartment.
#[utoipa::path(
    delete,
    path = "/api/v1/apartments/{apartment_id}",
    tag = "apartments",
    params(
        ("apartment_id" = i32, Path, description = "Apartment ID"),
    ),
    responses(
        (status = 204, description = "Apartment deleted successfully"),
        (status = 404, description = "Apartment not found", body = crate::schemas::ErrorResponse),
        (status = 409, description = "Apartment still has payments", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_apartment(
    Path(apartment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_apartment function for apartment_id: {}", apartment_id);

    let payment_count = payment::Entity::find()
        .filter(payment::Column::ApartmentId.eq(apartment_id))
        .count(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to count payments for apartment {}: {}", apartment_id, db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete apartment",
            )
        })?;

    if payment_count > 0 {
        warn!(
            "Refusing to delete apartment {}: {} payments still reference it",
            apartment_id, payment_count
        );
        return Err(api_error(
            StatusCode::CONFLICT,
            "APARTMENT_HAS_RECORDS",
            "Apartment still has recorded payments and cannot be deleted",
        ));
    }

    match apartment::Entity::delete_by_id(apartment_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected == 0 {
                warn!("Apartment with ID {} not found for deletion", apartment_id);
                Err(api_error(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Apartment {} not found", apartment_id),
                ))
            } else {
                info!("Apartment {} deleted successfully", apartment_id);
                state.cache.invalidate_all();
                Ok(StatusCode::NO_CONTENT)
            }
        }
        Err(db_error) => {
            error!("Failed to delete apartment {}: {}", apartment_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to delete apartment",
            ))
        }
    }
}
