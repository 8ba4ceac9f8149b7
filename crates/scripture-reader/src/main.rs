use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use lexicon_db::LexiconCache;
use scripture_types::LexiconFamily;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scripture_reader::{AppState, ServiceConfig, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_process();
    info!(?config, "starting scripture-reader");

    let lexicon = Arc::new(LexiconCache::from_dir(
        config.lexicon.dir.clone(),
        config.lexicon.mode,
    ));
    warm_lexicon(Arc::clone(&lexicon)).await;

    let state = AppState {
        lexicon,
        max_text_bytes: config.max_text_bytes,
        disable_cache: !config.cache_headers,
    };
    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Load the lexicons before taking traffic. A failure is logged and the
/// service still starts: tokenizing works without them, and lookups answer
/// 503 until a later request loads them.
async fn warm_lexicon(lexicon: Arc<LexiconCache>) {
    let start = Instant::now();
    let loaded = tokio::task::spawn_blocking(move || lexicon.get()).await;
    match loaded {
        Ok(Ok(dict)) => info!(
            greek = dict.len(LexiconFamily::Greek),
            hebrew = dict.len(LexiconFamily::Hebrew),
            "lexicons loaded in {} ms",
            start.elapsed().as_millis()
        ),
        Ok(Err(err)) => warn!("lexicons not loaded, lookups will retry on demand: {err:#}"),
        Err(err) => warn!("lexicon warm-up task failed: {err}"),
    }
}
