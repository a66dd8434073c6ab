use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use common::AllocationResult;
use tracing::{debug, info, instrument, trace};

use crate::schemas::{
    map_compute_error, ApiError, ApiResponse, AppState, CachedData, PeriodQuery,
};

/// Get the common expense allocation of a building for one period
///
/// Distributes every expense dated in the period across the building's
/// apartments and returns per-apartment shares with owner/tenant and
/// category breakdowns. The shares always sum to the period total.
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}/allocations",
    tag = "allocations",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
        ("year" = i32, Query, description = "Year of the period"),
        ("month" = u32, Query, description = "Month of the period (1-12)"),
    ),
    responses(
        (status = 200, description = "Allocation computed successfully", body = ApiResponse<AllocationResult>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 422, description = "Mills configuration is inconsistent", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_building_allocation(
    Path(building_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AllocationResult>>, ApiError> {
    trace!(
        "Entering get_building_allocation for building {} period {}-{:02}",
        building_id, query.year, query.month
    );

    let cache_key = format!("allocation_{}_{}_{}", building_id, query.year, query.month);
    if let Some(CachedData::Allocation(cached)) = state.cache.get(&cache_key).await {
        debug!("Returning cached allocation for {}", cache_key);
        return Ok(Json(ApiResponse {
            data: cached,
            message: "Allocation retrieved from cache".to_string(),
            success: true,
        }));
    }

    let allocation =
        compute::allocation::allocate_for_period(&state.db, building_id, query.year, query.month)
            .await
            .map_err(map_compute_error)?;

    info!(
        "Allocated {} expenses totalling {} for building {} period {}",
        allocation.expense_count, allocation.total, building_id, allocation.period
    );
    state
        .cache
        .insert(cache_key, CachedData::Allocation(allocation.clone()))
        .await;

    let response = ApiResponse {
        data: allocation,
        message: "Allocation computed successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
