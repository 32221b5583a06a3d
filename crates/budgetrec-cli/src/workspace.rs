//! Persisted state between CLI invocations.

use anyhow::{Context, Result};
use budgetrec_core::{InteractionStore, PricingCatalog, Recommender, RecommenderConfig};
use budgetrec_factor::FactorModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;

const WORKSPACE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Default)]
struct WorkspaceFile {
    version: u32,
    #[serde(with = "time::serde::iso8601::option", default)]
    updated_at: Option<OffsetDateTime>,
    store: InteractionStore,
    catalog: PricingCatalog,
}

impl WorkspaceFile {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                version: WORKSPACE_VERSION,
                ..Self::default()
            });
        }
        let file = File::open(path)?;
        let workspace: WorkspaceFile = serde_json::from_reader(file)?;
        if workspace.version != WORKSPACE_VERSION {
            anyhow::bail!(
                "Workspace version mismatch: expected {}, found {}",
                WORKSPACE_VERSION,
                workspace.version
            );
        }
        Ok(workspace)
    }

    fn save(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Recommender plus the files it was loaded from.
pub struct Session {
    workspace_path: PathBuf,
    model_path: PathBuf,
    pub engine: Recommender<FactorModel>,
}

impl Session {
    /// Loads the workspace (empty if missing) and the model (untrained if missing).
    pub fn open(workspace_path: &Path, model_path: &Path, config: RecommenderConfig) -> Result<Self> {
        let workspace = WorkspaceFile::load(workspace_path)
            .with_context(|| format!("Failed to load workspace {:?}", workspace_path))?;
        let mut engine = Recommender::from_parts(workspace.store, workspace.catalog, config);

        if model_path.exists() {
            let json = std::fs::read_to_string(model_path)
                .with_context(|| format!("Failed to read model {:?}", model_path))?;
            let model = FactorModel::from_json(&json)
                .with_context(|| format!("Failed to parse model {:?}", model_path))?;
            engine.install_oracle(Arc::new(model));
        }

        Ok(Self {
            workspace_path: workspace_path.to_path_buf(),
            model_path: model_path.to_path_buf(),
            engine,
        })
    }

    pub fn save_workspace(&self) -> Result<()> {
        WorkspaceFile {
            version: WORKSPACE_VERSION,
            updated_at: Some(OffsetDateTime::now_utc()),
            store: self.engine.store().clone(),
            catalog: self.engine.catalog().clone(),
        }
        .save(&self.workspace_path)
        .context("Failed to save workspace")
    }

    pub fn save_model(&self) -> Result<()> {
        let Some(model) = self.engine.oracle() else {
            return Ok(());
        };
        ensure_parent(&self.model_path)?;
        std::fs::write(&self.model_path, model.to_json()?).context("Failed to save model")
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
