use tokio_util::sync::CancellationToken;
use visionproxy_core::Config;

// Use mimalloc as the global allocator for lower fragmentation in long-running containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Cancelled on shutdown; every generation run hangs off this token
    let shutdown = CancellationToken::new();

    // Initialize the application (database, services, routes)
    let (_state, router) =
        visionproxy_api::setup::initialize_app(config.clone(), shutdown.clone()).await?;

    // Start the server
    visionproxy_api::setup::server::start_server(&config, router, shutdown).await?;

    Ok(())
}
