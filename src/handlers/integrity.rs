use axum::{
    extract::{Query, State},
    response::Json,
};
use common::IntegrityReport;
use tracing::{info, instrument, trace, warn};

use crate::schemas::{
    map_compute_error, ApiError, ApiResponse, AppState, IntegrityQuery,
};

/// Run the financial integrity check for a building
///
/// Verifies the mills configuration, looks for orphaned payments and for
/// duplicate recurring-generated expenses. With `auto_fix=true`, small mills
/// deviations and duplicate generated rows are repaired; orphaned payments
/// are only ever reported.
#[utoipa::path(
    get,
    path = "/api/v1/integrity-check",
    tag = "integrity",
    params(
        ("building_id" = i32, Query, description = "Building to check"),
        ("auto_fix" = Option<bool>, Query, description = "Apply safe automatic fixes (default: false)"),
    ),
    responses(
        (status = 200, description = "Integrity check completed", body = ApiResponse<IntegrityReport>),
        (status = 404, description = "Building not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn run_integrity_check(
    Query(query): Query<IntegrityQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IntegrityReport>>, ApiError> {
    let auto_fix = query.auto_fix.unwrap_or(false);
    trace!(
        "Entering run_integrity_check for building {} (auto_fix: {})",
        query.building_id, auto_fix
    );

    let report = compute::integrity::check_building(&state.db, query.building_id, auto_fix)
        .await
        .map_err(map_compute_error)?;

    if report.success {
        info!(
            "Integrity check passed for building {} ({} fixes applied)",
            query.building_id,
            report.fixes_applied.len()
        );
    } else {
        warn!(
            "Integrity check found {} issues for building {}",
            report.issues.len(),
            query.building_id
        );
    }
    if !report.fixes_applied.is_empty() {
        state.cache.invalidate_all();
    }

    let response = ApiResponse {
        data: report,
        message: "Integrity check completed".to_string(),
        success: true,
    };
    Ok(Json(response))
}
