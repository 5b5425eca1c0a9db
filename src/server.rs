//! # Server Configuration
//!
//! Application state, router assembly and the HTTP server loop for gymledger.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::gyms::GymService;
use crate::handlers::{self, gyms, ledger, members, reports};
use crate::import::ImportReconciler;
use crate::ledger::LedgerRecorder;
use crate::membership::MembershipManager;
use crate::reporting::ReportingEngine;
use crate::repositories::{
    GymRepository, GymStore, LedgerRepository, LedgerStore, MemberRepository, MembershipStore,
};
use crate::telemetry;

/// Application state containing the configured services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present when backed by a database; used by the health check
    pub db: Option<DatabaseConnection>,
    pub gyms: GymService,
    pub members: MembershipManager,
    pub ledger: LedgerRecorder,
    pub imports: ImportReconciler,
    pub reports: ReportingEngine,
}

impl AppState {
    /// Wires the services over the given stores.
    pub fn from_stores(
        config: Arc<AppConfig>,
        gym_store: Arc<dyn GymStore>,
        member_store: Arc<dyn MembershipStore>,
        ledger_store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = LedgerRecorder::new(ledger_store.clone(), gym_store.clone(), clock.clone());
        let members = MembershipManager::new(
            member_store.clone(),
            gym_store.clone(),
            ledger.clone(),
            clock.clone(),
        );
        let imports = ImportReconciler::new(members.clone(), config.membership.clone());
        let reports = ReportingEngine::new(
            member_store.clone(),
            ledger_store,
            clock.clone(),
            config.membership.expiring_soon_days,
        );
        let gyms = GymService::new(gym_store, member_store, clock);

        Self {
            config,
            db: None,
            gyms,
            members,
            ledger,
            imports,
            reports,
        }
    }

    /// Services backed by the SeaORM repositories and the system clock.
    pub fn from_database(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        let shared = Arc::new(db.clone());
        let mut state = Self::from_stores(
            config,
            Arc::new(GymRepository::new(shared.clone())),
            Arc::new(MemberRepository::new(shared.clone())),
            Arc::new(LedgerRepository::new(shared)),
            Arc::new(SystemClock),
        );
        state.db = Some(db);
        state
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::health))
        .route("/api/v1/gyms", get(gyms::list_gyms).post(gyms::create_gym))
        .route(
            "/api/v1/gyms/{gym_id}",
            get(gyms::get_gym)
                .put(gyms::update_gym)
                .delete(gyms::delete_gym),
        )
        .route("/api/v1/gyms/{gym_id}/plan", put(gyms::set_gym_plan))
        .route(
            "/api/v1/gyms/{gym_id}/members",
            get(members::list_members).post(members::create_member),
        )
        .route(
            "/api/v1/gyms/{gym_id}/members/import",
            post(members::import_members),
        )
        .route(
            "/api/v1/gyms/{gym_id}/members/export",
            get(members::export_members),
        )
        .route(
            "/api/v1/gyms/{gym_id}/members/{member_id}",
            get(members::get_member)
                .put(members::edit_member)
                .delete(members::delete_member),
        )
        .route(
            "/api/v1/gyms/{gym_id}/members/{member_id}/renew",
            post(members::renew_member),
        )
        .route(
            "/api/v1/gyms/{gym_id}/ledger",
            get(ledger::list_entries).post(ledger::record_entry),
        )
        .route(
            "/api/v1/gyms/{gym_id}/ledger/{entry_id}",
            get(ledger::get_entry)
                .patch(ledger::edit_entry)
                .delete(ledger::delete_entry),
        )
        .route(
            "/api/v1/gyms/{gym_id}/reports/dashboard",
            get(reports::dashboard),
        )
        .route("/api/v1/gyms/{gym_id}/reports/sales", get(reports::sales))
        .route("/api/v1/gyms/{gym_id}/reports/chart", get(reports::chart))
        .layer(middleware::from_fn_with_state(
            config,
            auth::identity_middleware,
        ))
        .layer(middleware::from_fn(telemetry::trace_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::from_database(Arc::new(config), db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Registers the bearer token scheme referenced by the secured paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::gyms::create_gym,
        crate::handlers::gyms::list_gyms,
        crate::handlers::gyms::get_gym,
        crate::handlers::gyms::update_gym,
        crate::handlers::gyms::set_gym_plan,
        crate::handlers::gyms::delete_gym,
        crate::handlers::members::list_members,
        crate::handlers::members::get_member,
        crate::handlers::members::create_member,
        crate::handlers::members::edit_member,
        crate::handlers::members::renew_member,
        crate::handlers::members::delete_member,
        crate::handlers::members::import_members,
        crate::handlers::members::export_members,
        crate::handlers::ledger::list_entries,
        crate::handlers::ledger::record_entry,
        crate::handlers::ledger::get_entry,
        crate::handlers::ledger::edit_entry,
        crate::handlers::ledger::delete_entry,
        crate::handlers::reports::dashboard,
        crate::handlers::reports::sales,
        crate::handlers::reports::chart,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::gyms::GymDetails,
            crate::gyms::NewGym,
            crate::handlers::gyms::SetPlanRequest,
            crate::models::gym::GymPlan,
            crate::models::gym::GymResponse,
            crate::membership::MemberDraft,
            crate::membership::Renewal,
            crate::membership::MemberStatus,
            crate::models::member::MemberResponse,
            crate::import::ImportReport,
            crate::import::ImportedMember,
            crate::import::SkippedRow,
            crate::import::RowError,
            crate::ledger::ManualEntry,
            crate::ledger::LedgerEdit,
            crate::models::ledger_entry::LedgerKind,
            crate::models::ledger_entry::LedgerEntryResponse,
            crate::reporting::DashboardSnapshot,
            crate::reporting::ExpiringMember,
            crate::reporting::SalesStatistics,
            crate::reporting::SalesWindow,
            crate::reporting::ChartSeries,
            crate::reporting::ChartPeriod,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information"),
        (name = "gyms", description = "Gym administration"),
        (name = "members", description = "Membership lifecycle, import and export"),
        (name = "ledger", description = "Per-gym financial ledger"),
        (name = "reports", description = "Dashboard, sales and chart aggregations"),
    ),
    info(
        title = "gymledger API",
        description = "Multi-tenant gym membership, ledger and reporting API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
