use std::sync::Arc;

use anyhow::Error;
use axum::Server;
use tower::{
    limit::GlobalConcurrencyLimitLayer, load_shed::LoadShedLayer, make::Shared, ServiceBuilder,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meeveem::{
    brevo::Brevo,
    config::Config,
    relay::{router, RelayState},
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    if config.brevo_api_key.is_none() {
        tracing::warn!("BREVO_API_KEY is not configured, contact submissions will fail");
    }

    let upstream = Brevo::new(config.brevo_url.clone())?;

    let state = Arc::new(RelayState::new(config.brevo_api_key, Arc::new(upstream)));

    let make_service = Shared::new(
        ServiceBuilder::new()
            .layer(LoadShedLayer::new())
            .layer(GlobalConcurrencyLimitLayer::new(config.request_limit))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(true)),
            )
            .service(router(state)),
    );

    tracing::info!("Listening on {}", config.bind_addr);
    Server::bind(&config.bind_addr).serve(make_service).await?;

    Ok(())
}
