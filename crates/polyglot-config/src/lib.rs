// polyglot-config/src/lib.rs
// ============================================================================
// Module: Polyglot Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for polyglot.toml semantics.
// Dependencies: polyglot-core, polyglot-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `polyglot-config` defines the configuration model for the catalog server
//! and CLI. It provides strict, fail-closed validation: a config that loads
//! is safe to serve with.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
