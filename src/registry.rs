//! Function Registry
//!
//! Information Hiding:
//! - Registration pipeline (security gate, structural validation, persist)
//!   hidden behind `validate_and_register`
//! - In-memory map and its single-writer discipline internalized
//!
//! The registry is the only writer of function state: all mutations go
//! through `validate_and_register`/`remove`, while invocations only read.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::function::{FunctionDefinition, FunctionSpec};
use crate::core::security::{SecurityError, SecurityValidator};
use crate::core::validation::{FunctionValidator, ValidationError};
use crate::executors::ExecutorSet;
use crate::storage::FunctionStore;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("a function named '{0}' is already registered")]
    Duplicate(String),

    #[error("security validation failed: {0}")]
    Security(#[from] SecurityError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to persist function: {0}")]
    Store(#[from] anyhow::Error),
}

/// In-memory registry of persisted functions, rebuilt from the store at
/// startup.
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDefinition>,
    store: Arc<dyn FunctionStore>,
    security: SecurityValidator,
    validator: FunctionValidator,
}

impl FunctionRegistry {
    /// Build a registry, loading every persisted definition.
    /// `max_timeout_ms` is the configured ceiling enforced on `timeoutMs`.
    pub async fn new(
        store: Arc<dyn FunctionStore>,
        executors: ExecutorSet,
        max_timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        let mut functions = HashMap::new();
        for definition in store.load_all().await? {
            tracing::info!("Loaded function '{}'", definition.name);
            functions.insert(definition.name.clone(), definition);
        }
        Ok(Self {
            functions,
            store,
            security: SecurityValidator::with_default_patterns(),
            validator: FunctionValidator::new(executors, max_timeout_ms),
        })
    }

    /// Run the full registration pipeline. Nothing is persisted unless every
    /// gate passes; the security gate runs before structural validation for
    /// file-based specs, and before any file IO on the store side.
    pub async fn validate_and_register(
        &mut self,
        spec: FunctionSpec,
    ) -> Result<FunctionDefinition, RegistrationError> {
        if self.functions.contains_key(&spec.name) {
            return Err(RegistrationError::Duplicate(spec.name));
        }

        if let Some(code_path) = &spec.code_path {
            self.security
                .validate_file_path(code_path, spec.language, spec.has_custom_entry_point())
                .await?;
        }

        self.validator.validate(&spec).await?;

        let definition = self.store.save(spec).await?;
        tracing::info!("Registered function '{}'", definition.name);
        self.functions
            .insert(definition.name.clone(), definition.clone());
        Ok(definition)
    }

    /// Remove a function and its persisted state. Returns false when no such
    /// function exists.
    pub async fn remove(&mut self, name: &str) -> anyhow::Result<bool> {
        let existed = self.store.delete(name).await?;
        if self.functions.remove(name).is_some() || existed {
            tracing::info!("Removed function '{name}'");
            return Ok(true);
        }
        Ok(false)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn list(&self) -> Vec<FunctionDefinition> {
        let mut all: Vec<FunctionDefinition> = self.functions.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
