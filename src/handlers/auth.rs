//! Bearer-token extractors. A handler that takes [`Identity`] requires a
//! valid token for an account that still exists, carrying that account's
//! current role; one that takes [`AdminIdentity`] also requires the admin
//! role. `Option<Identity>` accepts anonymous callers.

use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};

use crate::application::user_service::IdentityResolver;
use crate::domain::user::Identity;
use crate::errors::AppError;
use crate::infrastructure::security::TokenIssuer;

type Extracted<T> = Pin<Box<dyn Future<Output = Result<T, AppError>>>>;

fn bearer_identity(req: &HttpRequest) -> Result<Identity, AppError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| AppError::Internal("token issuer is not configured".to_string()))?;
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    Ok(issuer.verify(token)?)
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Extracted<Self>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claimed = bearer_identity(req);
        let resolver = req.app_data::<web::Data<dyn IdentityResolver>>().cloned();
        Box::pin(async move {
            let claimed = claimed?;
            let resolver = resolver.ok_or_else(|| {
                AppError::Internal("identity resolver is not configured".to_string())
            })?;
            let current = web::block(move || resolver.resolve(claimed)).await??;
            Ok(current)
        })
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Identity);

impl FromRequest for AdminIdentity {
    type Error = AppError;
    type Future = Extracted<Self>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);
        Box::pin(async move {
            let identity = identity.await?;
            if identity.is_admin() {
                Ok(AdminIdentity(identity))
            } else {
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use actix_web::http::StatusCode;
    use actix_web::{test, App, HttpResponse};
    use uuid::Uuid;

    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::user::Role;

    /// Accounts keyed by id, holding their current role.
    #[derive(Default)]
    struct Accounts(Mutex<HashMap<Uuid, Role>>);

    impl IdentityResolver for Accounts {
        fn resolve(&self, claimed: Identity) -> Result<Identity, DomainError> {
            let role = self
                .0
                .lock()
                .unwrap()
                .get(&claimed.user_id)
                .copied()
                .ok_or_else(|| DomainError::Unauthorized("User no longer exists".to_string()))?;
            Ok(Identity {
                user_id: claimed.user_id,
                role,
            })
        }
    }

    async fn whoami(identity: Identity) -> HttpResponse {
        HttpResponse::Ok().body(identity.user_id.to_string())
    }

    async fn admin_only(_: AdminIdentity) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    async fn maybe(identity: Option<Identity>) -> HttpResponse {
        HttpResponse::Ok().body(if identity.is_some() { "user" } else { "guest" })
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"extractor-secret", 30)
    }

    /// Registers an account with `role` and returns its id and a token.
    fn token(accounts: &Accounts, role: Role) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        accounts.0.lock().unwrap().insert(user_id, role);
        let token = issuer().issue(Identity { user_id, role }).unwrap();
        (user_id, token)
    }

    macro_rules! app {
        ($accounts:expr) => {{
            let resolver: Arc<dyn IdentityResolver> = $accounts.clone();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(issuer()))
                    .app_data(web::Data::from(resolver))
                    .route("/me", web::get().to(whoami))
                    .route("/admin", web::get().to(admin_only))
                    .route("/maybe", web::get().to(maybe)),
            )
            .await
        }};
    }

    fn get(uri: &str, token: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
    }

    #[actix_web::test]
    async fn missing_token_is_401() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn garbage_token_is_401() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let resp = test::call_service(&app, get("/me", "not.a.jwt").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_yields_identity() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let (user_id, token) = token(&accounts, Role::Customer);
        let body = test::call_and_read_body(&app, get("/me", &token).to_request()).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn customer_on_admin_route_is_403() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let (_, customer) = token(&accounts, Role::Customer);
        let (_, admin) = token(&accounts, Role::Admin);

        let resp = test::call_service(&app, get("/admin", &customer).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, get("/admin", &admin).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn demoted_admin_token_is_403() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let (admin_id, admin) = token(&accounts, Role::Admin);
        accounts.0.lock().unwrap().insert(admin_id, Role::Customer);

        let resp = test::call_service(&app, get("/admin", &admin).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn deleted_account_token_is_401() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let (user_id, token) = token(&accounts, Role::Admin);
        accounts.0.lock().unwrap().remove(&user_id);

        let resp = test::call_service(&app, get("/me", &token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthorized: User no longer exists");

        let body = test::call_and_read_body(&app, get("/maybe", &token).to_request()).await;
        assert_eq!(body, "guest".as_bytes());
    }

    #[actix_web::test]
    async fn optional_identity_allows_guests() {
        let accounts = Arc::new(Accounts::default());
        let app = app!(accounts);
        let body = test::call_and_read_body(
            &app,
            test::TestRequest::get().uri("/maybe").to_request(),
        )
        .await;
        assert_eq!(body, "guest".as_bytes());
    }
}
