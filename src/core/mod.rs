//! Core execution subsystem: data model, security gate, registration
//! validation, and the invocation orchestrator.

pub mod function;
pub mod orchestrator;
pub mod security;
pub mod validation;
