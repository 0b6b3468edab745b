use sigcheck_server::{
    config::Config,
    schedule::UpdateScheduler,
    server::Server,
    setup::setup,
    telemetry,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = Config::load()?;
    tracing::info!("Loaded configuration: {:?}", config);

    let state = setup(&config).await?;

    let scheduler = UpdateScheduler::start(&config.ingest.schedule, state.updates.clone()).await?;
    if config.ingest.run_on_startup {
        state.updates.trigger();
    }

    let server = Server::new(state, &config.server).await?;
    let result = server.run().await;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown failed: {e}");
    }
    result
}
