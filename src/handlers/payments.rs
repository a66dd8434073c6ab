use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{apartment, payment};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::schemas::{api_error, ApiError, ApiResponse, AppState, PayerTypeDto, PaymentMethodDto};

/// Request body for recording a payment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreatePaymentRequest {
    /// Amount paid
    pub amount: Decimal,
    /// Date the payment was received
    pub date: NaiveDate,
    /// How the payment was made
    pub method: PaymentMethodDto,
    /// Whether the owner or the tenant paid
    pub payer_type: PayerTypeDto,
    /// Name of the person who paid, if recorded
    pub payer_name: Option<String>,
}

/// Payment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub apartment_id: i32,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethodDto,
    pub payer_type: PayerTypeDto,
    pub payer_name: Option<String>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            apartment_id: model.apartment_id,
            amount: model.amount,
            date: model.date,
            method: model.method.into(),
            payer_type: model.payer_type.into(),
            payer_name: model.payer_name,
        }
    }
}

/// Record a payment for an apartment
///
/// Inserts the payment row and bumps the apartment's running balance in one
/// transaction. Payments are append-only; there is no update or delete.
#[utoipa::path(
    post,
    path = "/api/v1/apartments/{apartment_id}/payments",
    tag = "payments",
    params(
        ("apartment_id" = i32, Path, description = "Apartment ID"),
    ),
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid request", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Apartment not found", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_payment(
    Path(apartment_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ApiError> {
    trace!("Entering create_payment function for apartment_id: {}", apartment_id);
    debug!("Recording payment of {} for apartment {}", request.amount, apartment_id);

    if request.amount <= Decimal::ZERO {
        warn!("Rejecting non-positive payment amount: {}", request.amount);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Payment amount must be positive",
        ));
    }

    let txn = state.db.begin().await.map_err(|db_error| {
        error!("Failed to begin transaction: {}", db_error);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Failed to record payment",
        )
    })?;

    let apartment_model = match apartment::Entity::find_by_id(apartment_id).one(&txn).await {
        Ok(Some(apartment_model)) => apartment_model,
        Ok(None) => {
            warn!("Apartment with ID {} not found", apartment_id);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Apartment {} not found", apartment_id),
            ));
        }
        Err(db_error) => {
            error!("Failed to lookup apartment {}: {}", apartment_id, db_error);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to record payment",
            ));
        }
    };

    let new_payment = payment::ActiveModel {
        apartment_id: Set(apartment_id),
        amount: Set(request.amount),
        date: Set(request.date),
        method: Set(request.method.into()),
        payer_type: Set(request.payer_type.into()),
        payer_name: Set(request.payer_name.clone()),
        ..Default::default()
    };

    let inserted = new_payment.insert(&txn).await.map_err(|db_error| {
        error!("Failed to insert payment for apartment {}: {}", apartment_id, db_error);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Failed to record payment",
        )
    })?;

    let new_balance = apartment_model.current_balance + request.amount;
    let mut apartment_active: apartment::ActiveModel = apartment_model.into();
    apartment_active.current_balance = Set(new_balance);
    apartment_active.update(&txn).await.map_err(|db_error| {
        error!("Failed to update balance for apartment {}: {}", apartment_id, db_error);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Failed to record payment",
        )
    })?;

    txn.commit().await.map_err(|db_error| {
        error!("Failed to commit payment transaction: {}", db_error);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Failed to record payment",
        )
    })?;

    info!(
        "Payment {} of {} recorded for apartment {}, new balance {}",
        inserted.id, inserted.amount, apartment_id, new_balance
    );
    state.cache.invalidate_all();

    let response = ApiResponse {
        data: PaymentResponse::from(inserted),
        message: "Payment recorded successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all payments of an apartment
#[utoipa::path(
    get,
    path = "/api/v1/apartments/{apartment_id}/payments",
    tag = "payments",
    params(
        ("apartment_id" = i32, Path, description = "Apartment ID"),
    ),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_apartment_payments(
    Path(apartment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ApiError> {
    trace!("Entering get_apartment_payments for apartment_id: {}", apartment_id);

    match payment::Entity::find()
        .filter(payment::Column::ApartmentId.eq(apartment_id))
        .order_by_asc(payment::Column::Date)
        .all(&state.db)
        .await
    {
        Ok(payments) => {
            debug!("Retrieved {} payments for apartment {}", payments.len(), apartment_id);
            let response = ApiResponse {
                data: payments.into_iter().map(PaymentResponse::from).collect(),
                message: "Payments retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve payments for apartment {}: {}", apartment_id, db_error);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to retrieve payments",
            ))
        }
    }
}
