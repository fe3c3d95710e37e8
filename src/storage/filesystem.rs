//! File System Function Store
//!
//! Information Hiding:
//! - Directory layout ({base}/definitions/*.json, {base}/code/*) hidden
//! - Serialization format hidden from trait users
//! - Copy-then-persist ordering (no partial state on failure) internalized

use super::FunctionStore;
use crate::core::function::{FunctionDefinition, FunctionSpec};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem-backed store. Definitions are one JSON file per function under
/// `definitions/`; file-based sources are copied under `code/` and the
/// persisted definition carries the managed-relative path.
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_path.join("definitions"))
            .await
            .context("Failed to create definitions directory")?;
        fs::create_dir_all(base_path.join("code"))
            .await
            .context("Failed to create managed code directory")?;
        Ok(Self { base_path })
    }

    fn definition_path(&self, name: &str) -> PathBuf {
        self.base_path.join("definitions").join(format!("{name}.json"))
    }

    fn managed_relative(name: &str, original: &str) -> String {
        let ext = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("txt");
        format!("code/{name}.{ext}")
    }
}

#[async_trait]
impl FunctionStore for FileSystemStore {
    async fn save(&self, spec: FunctionSpec) -> Result<FunctionDefinition> {
        let now = Utc::now();

        let mut copied: Option<PathBuf> = None;
        let code_path = match &spec.code_path {
            Some(original) => {
                let relative = Self::managed_relative(&spec.name, original);
                let destination = self.base_path.join(&relative);
                let content = fs::read_to_string(original)
                    .await
                    .with_context(|| format!("Failed to read source file {original}"))?;
                fs::write(&destination, content)
                    .await
                    .with_context(|| format!("Failed to copy source to {destination:?}"))?;
                copied = Some(destination);
                Some(relative)
            }
            None => None,
        };

        let definition = FunctionDefinition {
            name: spec.name,
            description: spec.description,
            language: spec.language,
            inline_code: spec.inline_code,
            code_path,
            entry_point: spec.entry_point,
            parameter_schema: spec.parameter_schema,
            returns_description: spec.returns_description,
            dependencies: spec.dependencies,
            timeout_ms: spec.timeout_ms,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string_pretty(&definition)
            .context("Failed to serialize function definition")?;
        let path = self.definition_path(&definition.name);
        if let Err(e) = fs::write(&path, json).await {
            // A failed registration must not leave a copied file behind.
            if let Some(destination) = copied {
                let _ = fs::remove_file(destination).await;
            }
            return Err(e).with_context(|| format!("Failed to write definition file {path:?}"));
        }

        tracing::debug!(
            "[FileSystemStore] Saved definition '{}' to {:?}",
            definition.name,
            path
        );
        Ok(definition)
    }

    async fn load_code(&self, definition: &FunctionDefinition) -> Result<String> {
        if let Some(inline) = &definition.inline_code {
            return Ok(inline.clone());
        }
        if let Some(relative) = &definition.code_path {
            let path = self.base_path.join(relative);
            return fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read managed code file {path:?}"));
        }
        bail!(
            "function '{}' has neither inline code nor a code path",
            definition.name
        )
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.definition_path(name);
        if !path.exists() {
            tracing::debug!("[FileSystemStore] Function '{}' does not exist, nothing to delete", name);
            return Ok(false);
        }

        // Remove the managed code copy first, while we can still read the
        // definition to find it.
        let json = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read definition file {path:?}"))?;
        if let Ok(definition) = serde_json::from_str::<FunctionDefinition>(&json) {
            if let Some(relative) = definition.code_path {
                let _ = fs::remove_file(self.base_path.join(relative)).await;
            }
        }

        fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete definition file {path:?}"))?;
        tracing::debug!("[FileSystemStore] Deleted function '{}'", name);
        Ok(true)
    }

    async fn load_all(&self) -> Result<Vec<FunctionDefinition>> {
        let mut definitions = Vec::new();
        let dir = self.base_path.join("definitions");
        let mut entries = fs::read_dir(&dir)
            .await
            .context("Failed to read definitions directory")?;

        while let Some(entry) = entries.next_entry().await.context("Failed to read directory entry")? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read definition file {path:?}"))?;
            match serde_json::from_str::<FunctionDefinition>(&json) {
                Ok(definition) => definitions.push(definition),
                Err(e) => {
                    tracing::warn!("[FileSystemStore] Skipping unreadable definition {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!("[FileSystemStore] Loaded {} definitions", definitions.len());
        Ok(definitions)
    }
}
