pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::catalog_service::CatalogService;
use application::contact_service::ContactService;
use application::dashboard_service::DashboardService;
use application::order_service::OrderService;
use application::review_service::ReviewService;
use application::user_service::{IdentityResolver, UserService};
use domain::ports::Mailer;
use errors::AppError;
use infrastructure::catalog_repo::DieselCatalogRepository;
use infrastructure::contact_repo::DieselContactRepository;
use infrastructure::dashboard_repo::DieselDashboardRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::review_repo::DieselReviewRepository;
use infrastructure::security::TokenIssuer;
use infrastructure::user_repo::DieselUserRepository;
use openapi::ApiDoc;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type Users = UserService<DieselUserRepository>;
pub type Orders = OrderService<DieselOrderRepository>;
pub type Catalog = CatalogService<DieselCatalogRepository>;
pub type Reviews = ReviewService<DieselReviewRepository>;
pub type Contacts = ContactService<DieselContactRepository, DieselUserRepository>;
pub type Dashboard = DashboardService<DieselDashboardRepository>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Services shared by every worker. Cloning only bumps the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    tokens: web::Data<TokenIssuer>,
    identities: web::Data<dyn IdentityResolver>,
    users: web::Data<Users>,
    orders: web::Data<Orders>,
    catalog: web::Data<Catalog>,
    reviews: web::Data<Reviews>,
    contacts: web::Data<Contacts>,
    dashboard: web::Data<Dashboard>,
}

impl AppState {
    pub fn new(pool: DbPool, tokens: TokenIssuer, mailer: Arc<dyn Mailer>) -> Self {
        let users = web::Data::new(UserService::new(
            DieselUserRepository::new(pool.clone()),
            tokens.clone(),
        ));
        let identities: Arc<dyn IdentityResolver> = users.clone().into_inner();
        Self {
            identities: web::Data::from(identities),
            users,
            orders: web::Data::new(OrderService::new(
                DieselOrderRepository::new(pool.clone()),
                mailer,
            )),
            catalog: web::Data::new(CatalogService::new(DieselCatalogRepository::new(
                pool.clone(),
            ))),
            reviews: web::Data::new(ReviewService::new(DieselReviewRepository::new(
                pool.clone(),
            ))),
            contacts: web::Data::new(ContactService::new(
                DieselContactRepository::new(pool.clone()),
                DieselUserRepository::new(pool.clone()),
            )),
            dashboard: web::Data::new(DashboardService::new(DieselDashboardRepository::new(
                pool,
            ))),
            tokens: web::Data::new(tokens),
        }
    }

    /// Registers shared data, extractor error handlers and all routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.tokens.clone())
            .app_data(self.identities.clone())
            .app_data(self.users.clone())
            .app_data(self.orders.clone())
            .app_data(self.catalog.clone())
            .app_data(self.reviews.clone())
            .app_data(self.contacts.clone())
            .app_data(self.dashboard.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .configure(handlers::routes);
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
    use actix_web::App;
    use diesel::pg::PgConnection;
    use diesel::r2d2::{ConnectionManager, Pool};

    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::user::{Identity, Role};
    use crate::infrastructure::mailer::LogMailer;

    const SECRET: &[u8] = b"lib-test-secret";

    /// Every account exists and currently holds `0`.
    struct CurrentRole(Role);

    impl IdentityResolver for CurrentRole {
        fn resolve(&self, claimed: Identity) -> Result<Identity, DomainError> {
            Ok(Identity {
                user_id: claimed.user_id,
                role: self.0,
            })
        }
    }

    /// A pool that never connects; fine for requests rejected before any query.
    fn state(current: Role) -> AppState {
        let manager = ConnectionManager::<PgConnection>::new("postgres://nobody@127.0.0.1:1/none");
        let pool = Pool::builder().build_unchecked(manager);
        let mut state = AppState::new(pool, TokenIssuer::new(SECRET, 60), Arc::new(LogMailer));
        let resolver: Arc<dyn IdentityResolver> = Arc::new(CurrentRole(current));
        state.identities = web::Data::from(resolver);
        state
    }

    fn bearer(role: Role) -> String {
        let token = TokenIssuer::new(SECRET, 60)
            .issue(Identity {
                user_id: uuid::Uuid::new_v4(),
                role,
            })
            .unwrap();
        format!("Bearer {token}")
    }

    macro_rules! app {
        () => {
            app!(Role::Customer)
        };
        ($current:expr) => {{
            let state = state($current);
            init_service(App::new().configure(|cfg| state.configure(cfg))).await
        }};
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let app = app!();
        let resp = call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn protected_route_without_token_is_401() {
        let app = app!();
        let req = TestRequest::get().uri("/api/users/me").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["error"], "Missing bearer token");
    }

    #[actix_web::test]
    async fn customer_on_dashboard_is_403() {
        let app = app!(Role::Customer);
        let req = TestRequest::get()
            .uri("/api/dashboard/stats")
            .insert_header(("Authorization", bearer(Role::Customer)))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn demoted_admin_token_on_dashboard_is_403() {
        let app = app!(Role::Customer);
        let req = TestRequest::get()
            .uri("/api/dashboard/stats")
            .insert_header(("Authorization", bearer(Role::Admin)))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["error"], "Admin access required");
    }

    #[actix_web::test]
    async fn malformed_json_is_400_with_error_body() {
        let app = app!();
        let req = TestRequest::post()
            .uri("/api/users/register")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"full_name\": ")
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn bad_status_filter_is_400() {
        let app = app!(Role::Admin);
        let req = TestRequest::get()
            .uri("/api/orders/admin/all?status=lost")
            .insert_header(("Authorization", bearer(Role::Admin)))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn openapi_document_has_bearer_scheme() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("bearer_auth"));
        assert!(json.contains("/api/books/{id}"));
    }
}
