use rust_fibrouter::api::{run_server, AppState};
use rust_fibrouter::config::{AppConfig, FeedKind};
use rust_fibrouter::data::feed::{HttpFeed, MarketDataProvider, StoreFeed};
use rust_fibrouter::data::store::MarketStore;
use rust_fibrouter::execution::build_executor;
use rust_fibrouter::services::aggregator::AdapterAggregator;
use rust_fibrouter::services::journal::EventJournal;
use rust_fibrouter::services::router::SignalRouter;
use rust_fibrouter::services::scheduler::TickScheduler;
use rust_fibrouter::services::smoother::DecisionSmoother;
use rust_fibrouter::strategies::{SourceFactory, SourceRegistry};
use rust_fibrouter::EventBus;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Setup Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting FibRouter...");

    // Load Configuration
    let config = AppConfig::load()?;
    info!("Loaded Configuration: {:?}", config);

    let event_bus = EventBus::default();
    let journal = EventJournal::new();
    journal.start(&event_bus);

    // Market data
    let store = MarketStore::new(config.feed.store_limit);
    let feed: Arc<dyn MarketDataProvider> = match config.feed.kind {
        FeedKind::Store => Arc::new(StoreFeed::new(store.clone(), config.router.symbol.clone())),
        FeedKind::Http => {
            let url = config.feed.url.clone().unwrap_or_default();
            Arc::new(HttpFeed::new(&url, config.router.symbol.clone(), config.router.timeframe.clone())?)
        }
    };
    info!("📡 Market data via {} feed", feed.name());

    // Strategy sources
    let factory = SourceFactory::new(config.strategy.clone());
    let registry = SourceRegistry::from_ids(&factory, &config.router.enabled_sources);
    if registry.is_empty() {
        warn!("⚠️ No strategy sources enabled - every tick will HOLD");
    }
    let secondary = factory.build(&config.router.secondary_source)?;
    let aggregator = AdapterAggregator::new(registry, config.aggregation.clone());

    let executor = build_executor(&config, Some(store.clone()))?;
    info!("⚡ Orders via {} executor", executor.name());

    let router = Arc::new(SignalRouter::new(
        config.router.symbol.clone(),
        feed,
        aggregator,
        secondary,
        DecisionSmoother::new(&config.smoother),
        executor,
        event_bus.clone(),
        config.router.agreement_boost,
    ));

    let scheduler = TickScheduler::new(router.clone(), config.router.tick_cron.clone());
    scheduler.start().await?;

    if !config.api.enabled {
        info!("ℹ️ API disabled - running scheduler only");
        tokio::signal::ctrl_c().await?;
        scheduler.stop().await?;
        return Ok(());
    }

    // Start API Server
    let app_state = Arc::new(AppState {
        router,
        scheduler,
        store,
        journal,
        config,
    });
    run_server(app_state).await?;

    Ok(())
}
