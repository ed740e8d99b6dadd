use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trial_rescue::{build_router, initialize_app_state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trial_rescue=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = match initialize_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            return Err(e);
        },
    };

    let bind_address = state.config.bind_address.clone();
    info!(
        "Starting TrialRescue API on {} ({})",
        bind_address, state.config.environment
    );

    let listener = tokio::net::TcpListener::bind(bind_address.as_str()).await?;
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
