use crate::handlers::{
    allocations::get_building_allocation,
    apartments::{
        create_apartment, delete_apartment, get_apartment, get_building_apartments,
        update_apartment,
    },
    buildings::{
        create_building, delete_building, get_building, get_buildings, update_building,
    },
    dashboard::get_building_dashboard,
    expenses::{
        create_expense, delete_expense, get_building_expenses, get_expense, update_expense,
    },
    health::health_check,
    integrity::run_integrity_check,
    payments::{create_payment, get_apartment_payments},
    recurring_expenses::{
        create_recurring_expense, delete_recurring_expense, generate_recurring_expenses,
        get_building_recurring_expenses, update_recurring_expense,
    },
    webhooks::receive_webhook,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Building CRUD routes
        .route("/api/v1/buildings", post(create_building))
        .route("/api/v1/buildings", get(get_buildings))
        .route("/api/v1/buildings/:building_id", get(get_building))
        .route("/api/v1/buildings/:building_id", put(update_building))
        .route("/api/v1/buildings/:building_id", delete(delete_building))
        // Apartment CRUD routes
        .route("/api/v1/buildings/:building_id/apartments", post(create_apartment))
        .route("/api/v1/buildings/:building_id/apartments", get(get_building_apartments))
        .route("/api/v1/apartments/:apartment_id", get(get_apartment))
        .route("/api/v1/apartments/:apartment_id", put(update_apartment))
        .route("/api/v1/apartments/:apartment_id", delete(delete_apartment))
        // Expense CRUD routes
        .route("/api/v1/buildings/:building_id/expenses", post(create_expense))
        .route("/api/v1/buildings/:building_id/expenses", get(get_building_expenses))
        .route("/api/v1/expenses/:expense_id", get(get_expense))
        .route("/api/v1/expenses/:expense_id", put(update_expense))
        .route("/api/v1/expenses/:expense_id", delete(delete_expense))
        // Payment routes (append-only)
        .route("/api/v1/apartments/:apartment_id/payments", post(create_payment))
        .route("/api/v1/apartments/:apartment_id/payments", get(get_apartment_payments))
        // Recurring expense templates and generation
        .route(
            "/api/v1/buildings/:building_id/recurring-expenses",
            post(create_recurring_expense),
        )
        .route(
            "/api/v1/buildings/:building_id/recurring-expenses",
            get(get_building_recurring_expenses),
        )
        .route(
            "/api/v1/recurring-expenses/:recurring_expense_id",
            put(update_recurring_expense),
        )
        .route(
            "/api/v1/recurring-expenses/:recurring_expense_id",
            delete(delete_recurring_expense),
        )
        .route(
            "/api/v1/buildings/:building_id/recurring-expenses/generate",
            post(generate_recurring_expenses),
        )
        // Financial views
        .route("/api/v1/buildings/:building_id/allocations", get(get_building_allocation))
        .route("/api/v1/buildings/:building_id/dashboard", get(get_building_dashboard))
        // Integrity check
        .route("/api/v1/integrity-check", get(run_integrity_check))
        // Inbound webhooks
        .route("/api/v1/webhooks/:provider", post(receive_webhook))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
