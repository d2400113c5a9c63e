pub mod commands;
pub mod db;
pub mod errors;
pub mod interaction;
pub mod labels;
pub mod models;
pub mod predict;
pub mod recording;
pub mod session;
pub mod settings;
pub mod utils;
pub mod view;

use std::path::PathBuf;

use anyhow::Context;
use commands::{Command, HELP};
use db::Database;
use log::{error, info, warn};
use predict::PredictionController;
use session::LabelSession;
use settings::SettingsStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use view::ViewStateCache;

const DATA_DIR_ENV: &str = "LABELIZER_DATA_DIR";
const DEFAULT_DATA_DIR: &str = ".labelizer";

pub struct AppState {
    pub(crate) db: Database,
    pub(crate) session: LabelSession,
    pub(crate) settings: SettingsStore,
    pub(crate) predictions: PredictionController,
}

impl AppState {
    /// Open the data directory, restore cached views and the default label file.
    pub async fn initialize(data_dir: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let labeling = settings.labeling();

        let database = Database::new(data_dir.join("labelizer.sqlite3"))?;
        let views: ViewStateCache = database
            .get_view_states()
            .await
            .context("failed to read saved views")?
            .into_iter()
            .collect();
        info!("Restored {} saved views", views.len());

        let predictions = PredictionController::from_settings(&labeling);
        let labels_path = labeling.labels_path.clone();
        let mut session = LabelSession::new(labeling).with_views(views);

        // The previous session's labels come back automatically when present.
        if labels_path.exists() {
            match session.load_labels(&labels_path) {
                Ok(count) => info!("Loaded {count} labels from {}", labels_path.display()),
                Err(err) => warn!("Could not load {}: {err}", labels_path.display()),
            }
        }

        Ok(Self {
            db: database,
            session,
            settings,
            predictions,
        })
    }
}

fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

async fn serve(mut state: AppState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                println!("error: {err}");
                continue;
            }
        };
        let quit = command == Command::Quit;

        match state.execute(command).await {
            Ok(reply) => println!("{reply}"),
            Err(err) => println!("error: {err}"),
        }
        if quit {
            break;
        }
    }

    if let Err(err) = state.persist_current_view().await {
        error!("Failed to save view on exit: {err}");
    }
    info!("Labelizer shutting down");
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    utils::logging::init();

    info!("Labelizer starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let state = AppState::initialize(data_dir()).await?;
        serve(state).await
    })
}
