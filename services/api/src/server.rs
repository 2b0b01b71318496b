use crate::cli::ServeArgs;
use crate::infra::{AppState, CommentaryBackend, InMemoryPortfolioRepository};
use crate::routes::with_portfolio_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_insight::config::AppConfig;
use credit_insight::error::AppError;
use credit_insight::portfolio::{PortfolioService, PortfolioServiceError};
use credit_insight::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let commentary = CommentaryBackend::from_config(&config.commentary, Handle::current())
        .map_err(PortfolioServiceError::from)?;
    match &commentary {
        CommentaryBackend::Http(client) => {
            info!(endpoint = client.endpoint(), "commentary transport enabled")
        }
        CommentaryBackend::Disabled(_) => {
            info!("commentary not configured; reports stay metrics-only")
        }
    }

    let repository = Arc::new(InMemoryPortfolioRepository::default());
    let portfolio_service = Arc::new(PortfolioService::new(
        repository,
        Arc::new(commentary),
        config.portfolio.clone(),
        config.commentary.clone(),
    ));

    let app = with_portfolio_routes(portfolio_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "credit insight service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
