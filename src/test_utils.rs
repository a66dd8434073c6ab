#[cfg(test)]
pub mod test_utils {
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let cache = Cache::new(100);
        AppState { db, cache }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();
        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Create axum app for testing against an already prepared state
    pub fn setup_test_app_with_state(state: AppState) -> Router {
        let _ = init_test_tracing();
        create_router(state)
    }

    /// Seed a building with apartments carrying the given participation
    /// mills. Heating mills mirror the participation mills.
    pub async fn seed_building(
        db: &DatabaseConnection,
        mills: &[Option<i32>],
    ) -> (i32, Vec<i32>) {
        let building = model::entities::building::ActiveModel {
            name: Set("Test Building".to_string()),
            mills_basis: Set(1000),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed building");

        let mut apartment_ids = Vec::with_capacity(mills.len());
        for (index, share) in mills.iter().enumerate() {
            let apartment = model::entities::apartment::ActiveModel {
                building_id: Set(building.id),
                number: Set(format!("A{}", index + 1)),
                owner_name: Set(format!("Owner {}", index + 1)),
                participation_mills: Set(*share),
                heating_mills: Set(*share),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to seed apartment");
            apartment_ids.push(apartment.id);
        }

        (building.id, apartment_ids)
    }
}
