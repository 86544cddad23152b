pub mod api;
pub mod auth;
pub mod capture;
pub mod cli;
pub mod display;
pub mod handoff;
pub mod models;
pub mod plants;
pub mod progress;
pub mod settings;
mod utils;
pub mod workflow;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use api::{ApiClient, QueryCache};
use auth::{AuthSession, TokenStore};
use handoff::ResultHandoff;
use models::PlantRecord;
use plants::PlantService;
use settings::SettingsStore;
use workflow::WorkflowConfig;

const ENABLE_LOGS: bool = true;

const CAPTURE_DIR: &str = "captures";
const DEBUG_LOADING_INTERVAL: Duration = Duration::from_millis(300);

/// Long-lived services shared by every screen.
pub struct AppState {
    pub(crate) settings: SettingsStore,
    pub(crate) api: ApiClient,
    pub(crate) cache: QueryCache,
    pub(crate) auth: AuthSession,
    pub(crate) plants: PlantService,
    pub(crate) handoff: ResultHandoff<PlantRecord>,
    data_dir: PathBuf,
    debug: bool,
}

impl AppState {
    /// Loads settings and the token store from `data_dir` and builds the
    /// HTTP client. `base_url` overrides the environment and stored value.
    pub fn open(data_dir: PathBuf, base_url: Option<String>, debug: bool) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::in_dir(&data_dir)?;
        let tokens = TokenStore::in_dir(&data_dir)?;
        let base_url = match base_url {
            Some(url) => settings::resolve_base_url(Some(url), None)?,
            None => settings.base_url()?,
        };
        let client_settings = settings.get();

        let api = ApiClient::new(&base_url, client_settings.request_timeout(), tokens)
            .context("Failed to build HTTP client")?;
        let cache = QueryCache::new(client_settings.query_stale_after());
        let auth = AuthSession::new(api.clone());
        let plants = PlantService::new(Arc::new(api.clone()), cache.clone());

        crate::log_info!("using backend {base_url}, data in {}", data_dir.display());

        Ok(Self {
            settings,
            api,
            cache,
            auth,
            plants,
            handoff: ResultHandoff::new(),
            data_dir,
            debug,
        })
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    pub fn capture_dir(&self) -> PathBuf {
        self.data_dir.join(CAPTURE_DIR)
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        let mut config = WorkflowConfig::from_settings(&self.settings.get(), self.capture_dir());
        if self.debug {
            config.loading_interval = DEBUG_LOADING_INTERVAL;
        }
        config
    }
}

/// Entry point of the `plantcare` binary.
pub fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let debug = cli.debug || settings::debug_mode();
    utils::logging::init(debug);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(cli::execute(cli::Cli { debug, ..cli }))
}
