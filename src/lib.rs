//! Toolsmith - Runtime-registered multi-language functions exposed as tools
//!
//! Users register ad-hoc functions written in Python, JavaScript/TypeScript,
//! Bash, or Ruby; each becomes an invocable tool over an MCP-style JSON-RPC
//! protocol. Registration passes a security gate (for file-based sources) and
//! structural validation; invocation wraps the source in a per-language
//! harness, runs it as an isolated child process, and races it against a
//! hard timeout.

pub mod cli;
pub mod config;
pub mod core;
pub mod executors;
pub mod registry;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::Settings;
pub use core::function::{ExecutionOutcome, FunctionDefinition, FunctionSpec, Language};
pub use core::orchestrator::Orchestrator;
pub use registry::FunctionRegistry;
pub use server::McpServer;
pub use storage::{FileSystemStore, FunctionStore};
