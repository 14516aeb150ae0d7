//! Local Library catalog application.
//!
//! Resource modules for authors, books, genres and book copies, the form
//! validation layer and the startup sequence shared by the binaries.

use std::sync::Arc;

use anyhow::Context;
use library_db::{DocumentStore, MemoryStore};
use library_http::view::JsonRenderer;
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;
pub mod state;
pub mod utils;
pub mod validation;

pub use state::AppState;

/// Build the shared application state, seeding the store when a seed file is set
pub async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let store = MemoryStore::new();
    let seed_file = settings
        .database
        .seed_file
        .as_ref()
        .filter(|path| !path.as_os_str().is_empty());
    if let Some(seed_file) = seed_file {
        let loaded = store
            .load_seed(seed_file)
            .await
            .with_context(|| format!("failed to seed store from {}", seed_file.display()))?;
        tracing::info!(seed_file = %seed_file.display(), documents = loaded, "store seeded");
    }

    Ok(AppState::new(Arc::new(store), Arc::new(JsonRenderer))
        .with_base_path(&settings.server.base_path))
}

/// Register, initialize and serve every module until ctrl-c
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = build_state(&settings).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &state)?;

    let store: Arc<dyn DocumentStore> = Arc::clone(&state.store);
    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = library_http::start_server(&registry, &settings, shutdown_signal()).await;
    registry.stop_modules().await?;
    served
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
