#[cfg(test)]
mod integration_tests {
    use crate::handlers::apartments::{ApartmentResponse, CreateApartmentRequest};
    use crate::handlers::buildings::{
        BuildingResponse, CreateBuildingRequest, UpdateBuildingRequest,
    };
    use crate::handlers::expenses::{CreateExpenseRequest, ExpenseResponse};
    use crate::handlers::payments::{CreatePaymentRequest, PaymentResponse};
    use crate::handlers::recurring_expenses::{
        CreateRecurringExpenseRequest, RecurringExpenseResponse,
    };
    use crate::handlers::webhooks::WebhookAck;
    use crate::schemas::{
        ApiResponse, DistributionTypeDto, ExpenseCategoryDto, PayerResponsibilityDto,
        PayerTypeDto, PaymentMethodDto,
    };
    use crate::test_utils::test_utils::{
        seed_building, setup_test_app, setup_test_app_state, setup_test_app_with_state,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use common::{AllocationResult, GenerationOutcome, IntegrityReport, MonthlyDashboard};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn money(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn building_request(name: &str) -> CreateBuildingRequest {
        CreateBuildingRequest {
            name: name.to_string(),
            address: Some("12 Acacia Avenue".to_string()),
            mills_basis: None,
            reserve_fund_goal: None,
            reserve_fund_months: None,
            reserve_fund_start: None,
            management_fee_per_apartment: None,
            financial_start: None,
        }
    }

    fn expense_request(
        title: &str,
        amount: &str,
        expense_date: NaiveDate,
        distribution: DistributionTypeDto,
    ) -> CreateExpenseRequest {
        CreateExpenseRequest {
            title: title.to_string(),
            amount: money(amount),
            date: expense_date,
            category: ExpenseCategoryDto::General,
            distribution_type: distribution,
            payer_responsibility: PayerResponsibilityDto::Owner,
            split_ratio: None,
            project_ref: None,
            audit_trail: None,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_and_get_building() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/buildings")
            .json(&building_request("Sunset Court"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<BuildingResponse> = response.json();
        assert!(body.success);
        assert_eq!(body.data.name, "Sunset Court");
        assert_eq!(body.data.mills_basis, 1000);

        let get_response = server
            .get(&format!("/api/v1/buildings/{}", body.data.id))
            .await;
        get_response.assert_status(StatusCode::OK);
        let fetched: ApiResponse<BuildingResponse> = get_response.json();
        assert_eq!(fetched.data.name, "Sunset Court");
    }

    #[tokio::test]
    async fn test_update_building() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created: ApiResponse<BuildingResponse> = server
            .post("/api/v1/buildings")
            .json(&building_request("Old Name"))
            .await
            .json();

        let update = UpdateBuildingRequest {
            name: Some("New Name".to_string()),
            address: None,
            reserve_fund_goal: Some(money("12000")),
            reserve_fund_months: Some(24),
            reserve_fund_start: None,
            management_fee_per_apartment: None,
            financial_start: None,
        };
        let response = server
            .put(&format!("/api/v1/buildings/{}", created.data.id))
            .json(&update)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<BuildingResponse> = response.json();
        assert_eq!(body.data.name, "New Name");
        assert_eq!(body.data.reserve_fund_months, Some(24));
    }

    #[tokio::test]
    async fn test_get_missing_building_returns_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/buildings/999").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_apartment_rejects_out_of_range_mills() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let created: ApiResponse<BuildingResponse> = server
            .post("/api/v1/buildings")
            .json(&building_request("Mills Check"))
            .await
            .json();

        let request = CreateApartmentRequest {
            number: "A1".to_string(),
            owner_name: "Alex".to_string(),
            tenant_name: None,
            participation_mills: Some(1500),
            heating_mills: None,
            previous_balance: None,
        };
        let response = server
            .post(&format!("/api/v1/buildings/{}/apartments", created.data.id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_building_with_expenses_is_refused() {
        let state = setup_test_app_state().await;
        let (building_id, _) = seed_building(&state.db, &[Some(600), Some(400)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let response = server
            .post(&format!("/api/v1/buildings/{}/expenses", building_id))
            .json(&expense_request(
                "Roof repair",
                "850.00",
                date(2024, 3, 10),
                DistributionTypeDto::ByMills,
            ))
            .await;
        response.assert_status(StatusCode::CREATED);

        let delete_response = server
            .delete(&format!("/api/v1/buildings/{}", building_id))
            .await;
        delete_response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_allocation_by_mills_shares() {
        let state = setup_test_app_state().await;
        let (building_id, apartment_ids) =
            seed_building(&state.db, &[Some(500), Some(300), Some(200)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        server
            .post(&format!("/api/v1/buildings/{}/expenses", building_id))
            .json(&expense_request(
                "Electricity",
                "100.00",
                date(2024, 3, 5),
                DistributionTypeDto::ByMills,
            ))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/v1/buildings/{}/allocations", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<AllocationResult> = response.json();
        assert_eq!(body.data.expense_count, 1);
        assert_eq!(body.data.total, money("100.00"));

        let amounts: Vec<Decimal> = apartment_ids
            .iter()
            .map(|id| {
                body.data
                    .shares
                    .iter()
                    .find(|share| share.apartment_id == *id)
                    .map(|share| share.amount)
                    .unwrap()
            })
            .collect();
        assert_eq!(amounts, vec![money("50.00"), money("30.00"), money("20.00")]);
    }

    #[tokio::test]
    async fn test_allocation_zero_mills_is_unprocessable() {
        let state = setup_test_app_state().await;
        let (building_id, _) = seed_building(&state.db, &[Some(0), Some(0)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        server
            .post(&format!("/api/v1/buildings/{}/expenses", building_id))
            .json(&expense_request(
                "Electricity",
                "100.00",
                date(2024, 3, 5),
                DistributionTypeDto::ByMills,
            ))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/v1/buildings/{}/allocations", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_allocation_missing_building_returns_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/api/v1/buildings/42/allocations")
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_expense_list_period_filter() {
        let state = setup_test_app_state().await;
        let (building_id, _) = seed_building(&state.db, &[Some(1000)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        for (title, expense_date) in [
            ("March cleaning", date(2024, 3, 1)),
            ("April cleaning", date(2024, 4, 1)),
        ] {
            server
                .post(&format!("/api/v1/buildings/{}/expenses", building_id))
                .json(&expense_request(
                    title,
                    "40.00",
                    expense_date,
                    DistributionTypeDto::EqualShare,
                ))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!("/api/v1/buildings/{}/expenses", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<ExpenseResponse>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].title, "March cleaning");

        let unfiltered: ApiResponse<Vec<ExpenseResponse>> = server
            .get(&format!("/api/v1/buildings/{}/expenses", building_id))
            .await
            .json();
        assert_eq!(unfiltered.data.len(), 2);
    }

    #[tokio::test]
    async fn test_payment_updates_apartment_balance() {
        let state = setup_test_app_state().await;
        let (_, apartment_ids) = seed_building(&state.db, &[Some(1000)]).await;
        let apartment_id = apartment_ids[0];
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let request = CreatePaymentRequest {
            amount: money("75.50"),
            date: date(2024, 3, 12),
            method: PaymentMethodDto::BankTransfer,
            payer_type: PayerTypeDto::Owner,
            payer_name: Some("Alex".to_string()),
        };
        let response = server
            .post(&format!("/api/v1/apartments/{}/payments", apartment_id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<PaymentResponse> = response.json();
        assert_eq!(created.data.amount, money("75.50"));

        let apartment: ApiResponse<ApartmentResponse> = server
            .get(&format!("/api/v1/apartments/{}", apartment_id))
            .await
            .json();
        assert_eq!(apartment.data.current_balance, money("75.50"));

        let payments: ApiResponse<Vec<PaymentResponse>> = server
            .get(&format!("/api/v1/apartments/{}/payments", apartment_id))
            .await
            .json();
        assert_eq!(payments.data.len(), 1);
    }

    #[tokio::test]
    async fn test_payment_rejects_non_positive_amount() {
        let state = setup_test_app_state().await;
        let (_, apartment_ids) = seed_building(&state.db, &[Some(1000)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let request = CreatePaymentRequest {
            amount: money("0"),
            date: date(2024, 3, 12),
            method: PaymentMethodDto::Cash,
            payer_type: PayerTypeDto::Owner,
            payer_name: None,
        };
        let response = server
            .post(&format!("/api/v1/apartments/{}/payments", apartment_ids[0]))
            .json(&request)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_reconciles_building_and_apartment_figures() {
        let state = setup_test_app_state().await;
        let (building_id, apartment_ids) =
            seed_building(&state.db, &[Some(600), Some(400)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        server
            .post(&format!("/api/v1/buildings/{}/expenses", building_id))
            .json(&expense_request(
                "Elevator service",
                "100.00",
                date(2024, 3, 5),
                DistributionTypeDto::ByMills,
            ))
            .await
            .assert_status(StatusCode::CREATED);

        let payment = CreatePaymentRequest {
            amount: money("30.00"),
            date: date(2024, 3, 10),
            method: PaymentMethodDto::Cash,
            payer_type: PayerTypeDto::Owner,
            payer_name: None,
        };
        server
            .post(&format!("/api/v1/apartments/{}/payments", apartment_ids[0]))
            .json(&payment)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/v1/buildings/{}/dashboard", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<MonthlyDashboard> = response.json();
        let dashboard = body.data;

        assert_eq!(dashboard.current_obligations, money("100.00"));
        assert_eq!(dashboard.payments_received, money("30.00"));

        let current_sum: Decimal = dashboard
            .apartments
            .iter()
            .map(|apartment| apartment.current_obligation)
            .sum();
        let payments_sum: Decimal = dashboard
            .apartments
            .iter()
            .map(|apartment| apartment.payments)
            .sum();
        assert_eq!(current_sum, dashboard.current_obligations);
        assert_eq!(payments_sum, dashboard.payments_received);
    }

    #[tokio::test]
    async fn test_dashboard_is_cached_until_mutation() {
        let state = setup_test_app_state().await;
        let (building_id, _) = seed_building(&state.db, &[Some(1000)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let first = server
            .get(&format!("/api/v1/buildings/{}/dashboard", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        first.assert_status(StatusCode::OK);

        let second = server
            .get(&format!("/api/v1/buildings/{}/dashboard", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        second.assert_status(StatusCode::OK);
        let cached: ApiResponse<MonthlyDashboard> = second.json();
        assert_eq!(cached.message, "Dashboard retrieved from cache");

        server
            .post(&format!("/api/v1/buildings/{}/expenses", building_id))
            .json(&expense_request(
                "New expense",
                "10.00",
                date(2024, 3, 20),
                DistributionTypeDto::EqualShare,
            ))
            .await
            .assert_status(StatusCode::CREATED);

        let after_mutation = server
            .get(&format!("/api/v1/buildings/{}/dashboard", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        after_mutation.assert_status(StatusCode::OK);
        let fresh: ApiResponse<MonthlyDashboard> = after_mutation.json();
        assert_eq!(fresh.message, "Dashboard computed successfully");
        assert_eq!(fresh.data.current_obligations, money("10.00"));
    }

    #[tokio::test]
    async fn test_recurring_generation_is_idempotent() {
        let state = setup_test_app_state().await;
        let (building_id, _) = seed_building(&state.db, &[Some(600), Some(400)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let template = CreateRecurringExpenseRequest {
            title: "Monthly cleaning".to_string(),
            amount: money("80.00"),
            category: ExpenseCategoryDto::Cleaning,
            distribution_type: DistributionTypeDto::EqualShare,
            payer_responsibility: PayerResponsibilityDto::Tenant,
            split_ratio: None,
            day_of_month: 1,
            start_date: date(2024, 1, 1),
            end_date: None,
        };
        let created = server
            .post(&format!("/api/v1/buildings/{}/recurring-expenses", building_id))
            .json(&template)
            .await;
        created.assert_status(StatusCode::CREATED);
        let created_body: ApiResponse<RecurringExpenseResponse> = created.json();
        assert!(created_body.data.active);

        let first = server
            .post(&format!(
                "/api/v1/buildings/{}/recurring-expenses/generate",
                building_id
            ))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        first.assert_status(StatusCode::OK);
        let first_outcome: ApiResponse<GenerationOutcome> = first.json();
        assert_eq!(first_outcome.data.created, 1);
        assert_eq!(first_outcome.data.skipped, 0);

        let second = server
            .post(&format!(
                "/api/v1/buildings/{}/recurring-expenses/generate",
                building_id
            ))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await;
        second.assert_status(StatusCode::OK);
        let second_outcome: ApiResponse<GenerationOutcome> = second.json();
        assert_eq!(second_outcome.data.created, 0);
        assert_eq!(second_outcome.data.skipped, 1);

        let expenses: ApiResponse<Vec<ExpenseResponse>> = server
            .get(&format!("/api/v1/buildings/{}/expenses", building_id))
            .add_query_param("year", 2024)
            .add_query_param("month", 3)
            .await
            .json();
        assert_eq!(expenses.data.len(), 1);
        assert_eq!(expenses.data[0].recurring_expense_id, Some(created_body.data.id));
    }

    #[tokio::test]
    async fn test_integrity_check_reports_and_fixes_mills_shortfall() {
        let state = setup_test_app_state().await;
        let (building_id, _) = seed_building(&state.db, &[Some(500), Some(495)]).await;
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let report_only = server
            .get("/api/v1/integrity-check")
            .add_query_param("building_id", building_id)
            .await;
        report_only.assert_status(StatusCode::OK);
        let report: ApiResponse<IntegrityReport> = report_only.json();
        assert!(!report.data.success);
        assert!(!report.data.issues.is_empty());
        assert!(report.data.fixes_applied.is_empty());

        let fixed = server
            .get("/api/v1/integrity-check")
            .add_query_param("building_id", building_id)
            .add_query_param("auto_fix", true)
            .await;
        fixed.assert_status(StatusCode::OK);
        let fixed_report: ApiResponse<IntegrityReport> = fixed.json();
        assert!(!fixed_report.data.fixes_applied.is_empty());

        // A second auto-fix run finds nothing left to repair.
        let rerun = server
            .get("/api/v1/integrity-check")
            .add_query_param("building_id", building_id)
            .add_query_param("auto_fix", true)
            .await;
        let rerun_report: ApiResponse<IntegrityReport> = rerun.json();
        assert!(rerun_report.data.success);
        assert!(rerun_report.data.fixes_applied.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_redelivery_is_acknowledged_as_duplicate() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let payload = serde_json::json!({
            "event_id": "evt_123",
            "amount": "50.00",
        });

        let first = server.post("/api/v1/webhooks/payment").json(&payload).await;
        first.assert_status(StatusCode::OK);
        let first_ack: ApiResponse<WebhookAck> = first.json();
        assert_eq!(first_ack.data.processing_status, "processed");

        let second = server.post("/api/v1/webhooks/payment").json(&payload).await;
        second.assert_status(StatusCode::OK);
        let second_ack: ApiResponse<WebhookAck> = second.json();
        assert_eq!(second_ack.data.event_id, "evt_123");
        assert_eq!(second_ack.data.processing_status, "duplicate");
    }

    #[tokio::test]
    async fn test_webhook_same_event_id_across_providers_is_distinct() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let payload = serde_json::json!({"event_id": "evt_shared"});

        let payment: ApiResponse<WebhookAck> = server
            .post("/api/v1/webhooks/payment")
            .json(&payload)
            .await
            .json();
        assert_eq!(payment.data.processing_status, "processed");

        let email: ApiResponse<WebhookAck> = server
            .post("/api/v1/webhooks/email")
            .json(&payload)
            .await
            .json();
        assert_eq!(email.data.processing_status, "processed");
    }

    #[tokio::test]
    async fn test_webhook_missing_event_id_is_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/webhooks/payment")
            .json(&serde_json::json!({"amount": "10.00"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_unknown_provider_is_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/webhooks/fax")
            .json(&serde_json::json!({"event_id": "evt_1"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
