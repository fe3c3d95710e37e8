//! Function Storage Abstraction
//!
//! Information Hiding:
//! - Storage backend implementation details hidden behind trait
//! - Managed-directory layout and JSON format encapsulated per backend
//! - Callers resolve code through `load_code` without knowing where it lives

use anyhow::Result;
use async_trait::async_trait;

use crate::core::function::{FunctionDefinition, FunctionSpec};

pub mod filesystem;

pub use filesystem::FileSystemStore;

/// Trait defining function persistence.
///
/// `save` assigns timestamps and, for file-based specs, copies the source
/// into managed storage and rewrites the path to a managed-relative one.
#[async_trait]
pub trait FunctionStore: Send + Sync {
    /// Persist a validated spec, returning the stored definition.
    async fn save(&self, spec: FunctionSpec) -> Result<FunctionDefinition>;

    /// Resolve the source text for a definition (inline or managed copy).
    /// Fails if the definition carries neither source, which validation
    /// should have made impossible.
    async fn load_code(&self, definition: &FunctionDefinition) -> Result<String>;

    /// Remove a definition and any managed code copy.
    /// Returns false if no such function was stored.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Load every stored definition (used to rebuild the registry at startup).
    async fn load_all(&self) -> Result<Vec<FunctionDefinition>>;
}
