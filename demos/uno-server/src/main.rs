use shedder::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), ShedderError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("SHEDDER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    tracing::info!(%bind, "starting uno server");

    let server = ShedderServerBuilder::new().bind(&bind).build().await?;
    server.run().await
}
