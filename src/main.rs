//! Alta - Two-track onboarding backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alta::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAccessCodeRepository, SqlxCompanyRepository, SqlxContactRepository,
            SqlxRateLimitRepository, SqlxSubmissionRepository,
        },
    },
    services::{
        AccessCodeService, HttpProposalBackend, RateLimiter, SessionService, SmtpMailer,
        SubmissionService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alta=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Alta onboarding backend...");

    // Load configuration (file + ALTA_* env overrides), fail fast on a weak secret
    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let access_code_repo = Arc::new(SqlxAccessCodeRepository::new(pool.clone()));
    let rate_limit_repo = Arc::new(SqlxRateLimitRepository::new(pool.clone()));
    let submission_repo = SqlxSubmissionRepository::boxed(pool.clone());
    let company_repo = SqlxCompanyRepository::boxed(pool.clone());
    let contact_repo = Arc::new(SqlxContactRepository::new(pool.clone()));

    // Initialize services
    let sessions = Arc::new(SessionService::new(&config.session.secret)?);
    let access_codes = Arc::new(AccessCodeService::new(access_code_repo));
    let limiter = Arc::new(RateLimiter::new(rate_limit_repo));
    let backend = Arc::new(HttpProposalBackend::new(config.services.clone()));
    let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));
    let submissions = Arc::new(SubmissionService::new(
        submission_repo,
        company_repo,
        backend,
        mailer,
    ));

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        access_codes,
        sessions,
        submissions,
        contacts: contact_repo,
        limiter,
        secure_cookie: config.session.secure_cookie,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
