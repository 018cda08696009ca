use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::data::shelter::AnimalShelter;
use crate::data::store::{DocumentStore, StoreError};

pub mod api;
pub mod routes;
pub mod static_files;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared handler state. The mutex makes every event run to completion before the
/// next one is looked at.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<Dashboard>>,
    pub logo: Arc<static_files::Logo>,
}

impl AppState {
    pub fn new(dashboard: Dashboard, logo: static_files::Logo) -> Self {
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
            logo: Arc::new(logo),
        }
    }
}

/// Connect, load the initial view, serve until Ctrl-C, then release the store. The
/// store is released on bind and serve failures too.
pub async fn run_server(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<(), ServerError> {
    let shelter = AnimalShelter::connect(store).await?;
    let dashboard = Dashboard::open(shelter.clone(), config.read_limit).await;
    let logo = static_files::Logo::locate(&config.assets_dir, &config.logo);
    let app = routes::router(AppState::new(dashboard, logo), &config.assets_dir);

    let result = serve(&config.bind, app).await;
    shelter.close().await;
    result
}

async fn serve(bind: &str, app: Router) -> Result<(), ServerError> {
    let listener = TcpListener::bind(bind).await?;
    info!("shelterdash server listening on http://{bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;
    Ok(())
}
