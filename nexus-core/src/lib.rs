//! Nexus Core - Foundation crate for the Nexus analysis platform
//!
//! This crate provides the pieces shared by the orchestrator and the
//! bootstrap binary:
//!
//! # Modules
//!
//! - [`config`] — Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] — Analyzer plugin contract and the Unified Data Model (UDM)
//! - [`logging`] — Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! nexus-core/
//! ├── domain/
//! │   ├── plugin/   # AnalyzerPlugin trait, factories, plugin errors
//! │   └── udm/      # Canonical, versioned project description
//! ├── config/       # Configuration management and validation
//! └── logging.rs    # tracing-subscriber initialisation
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use nexus_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `NEXUS__` prefix with double underscore separators:
//!
//! ```bash
//! NEXUS__EXECUTION__MODE=distributed
//! NEXUS__QUEUE__URL=redis://127.0.0.1:6379/0
//! ```

pub mod config;
pub mod domain;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
