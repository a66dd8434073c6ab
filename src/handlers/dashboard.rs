use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use common::MonthlyDashboard;
use tracing::{debug, info, instrument, trace};

use crate::schemas::{
    map_compute_error, ApiError, ApiResponse, AppState, CachedData, PeriodQuery,
};

/// Get the monthly financial dashboard of a building
///
/// Aggregates carry-forward, previous and current obligations and payments
/// received for the period, with a per-apartment breakdown that sums exactly
/// to the building figures. Previous obligations are recomputed from the
/// ledgers on every call; the stored monthly snapshot is refreshed as a side
/// effect but never read back.
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}/dashboard",
    tag = "dashboard",
    params(
        ("building_id" = i32, Path, description = "Building ID"),
        ("year" = i32, Query, description = "Year of the period"),
        ("month" = u32, Query, description = "Month of the period (1-12)"),
    ),
    responses(
        (status = 200, description = "Dashboard computed successfully", body = ApiResponse<MonthlyDashboard>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 422, description = "Mills configuration is inconsistent", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_building_dashboard(
    Path(building_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MonthlyDashboard>>, ApiError> {
    trace!(
        "Entering get_building_dashboard for building {} period {}-{:02}",
        building_id, query.year, query.month
    );

    let cache_key = format!("dashboard_{}_{}_{}", building_id, query.year, query.month);
    if let Some(CachedData::Dashboard(cached)) = state.cache.get(&cache_key).await {
        debug!("Returning cached dashboard for {}", cache_key);
        return Ok(Json(ApiResponse {
            data: cached,
            message: "Dashboard retrieved from cache".to_string(),
            success: true,
        }));
    }

    let dashboard =
        compute::dashboard::build_dashboard(&state.db, building_id, query.year, query.month)
            .await
            .map_err(map_compute_error)?;

    info!(
        "Dashboard for building {} period {}: total obligations {}, payments {}",
        building_id, dashboard.period, dashboard.total_obligations, dashboard.payments_received
    );
    state
        .cache
        .insert(cache_key, CachedData::Dashboard(dashboard.clone()))
        .await;

    let response = ApiResponse {
        data: dashboard,
        message: "Dashboard computed successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
