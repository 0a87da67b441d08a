use std::io;
use std::sync::Arc;

use bookstore_service::config::Settings;
use bookstore_service::domain::ports::Mailer;
use bookstore_service::infrastructure::mailer::{LogMailer, SmtpMailer};
use bookstore_service::infrastructure::security::TokenIssuer;
use bookstore_service::{build_server, create_pool, run_migrations, AppState};
use dotenvy::dotenv;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| startup_error("configuration", e))?;

    let pool = create_pool(&settings.database_url)
        .map_err(|e| startup_error("database pool", e))?;
    run_migrations(&pool).map_err(|e| startup_error("migrations", e))?;

    let mailer: Arc<dyn Mailer> = match &settings.smtp {
        Some(smtp) => {
            log::info!("sending mail through {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpMailer::new(smtp).map_err(|e| startup_error("smtp", e))?)
        }
        None => {
            log::warn!("SMTP_HOST not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let tokens = TokenIssuer::new(settings.jwt_secret.as_bytes(), settings.token_ttl_minutes);
    let state = AppState::new(pool, tokens, mailer);

    log::info!("Starting server at http://{}:{}", settings.host, settings.port);

    build_server(state, &settings.host, settings.port)?.await
}
