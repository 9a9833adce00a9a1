//! HelpDesk API server

use std::sync::Arc;

use anyhow::Context;
use helpdesk_api::{build_router, ApiConfig, ApiState, TokenKeys};
use helpdesk_core::infrastructure::{InMemoryStore, LogSink, NotificationDispatcher, SmtpSink};
use helpdesk_core::{AccountService, AccountUseCases, NotificationSink, TicketService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env().context("loading configuration")?;

    let store = Arc::new(InMemoryStore::open(config.data_file.clone()).context("opening store")?);

    let sink: Arc<dyn NotificationSink> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "mail notifications via SMTP");
            Arc::new(SmtpSink::new(smtp).context("configuring SMTP")?)
        }
        None => {
            tracing::info!("SMTP not configured; notifications are logged only");
            Arc::new(LogSink)
        }
    };
    let notifications = Arc::new(NotificationDispatcher::spawn(vec![sink]));

    let accounts = Arc::new(AccountService::new(store.clone()));
    for seed in config.seed_users.iter().cloned() {
        let email = seed.email.clone();
        let user = accounts.seed(seed).await.with_context(|| format!("seeding {email}"))?;
        tracing::info!(user_id = %user.id, role = %user.role, "seed account ready");
    }

    let tickets = Arc::new(TicketService::new(store.clone(), store.clone(), store.clone(), notifications.clone()));

    let state = ApiState {
        tickets,
        accounts,
        tokens: TokenKeys::new(config.jwt_secret.as_bytes(), config.token_ttl_hours),
        version: env!("CARGO_PKG_VERSION").into(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("HelpDesk API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("shutting down");
    notifications.shutdown().await;
    store.flush().context("flushing store")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
