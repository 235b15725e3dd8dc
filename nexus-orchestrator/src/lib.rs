//! Nexus Orchestrator - Analyzer orchestration and job lifecycle engine
//!
//! This crate selects an analyzer plugin for a project directory, normalizes
//! its output into the Unified Data Model and runs that work as a tracked job
//! on either a distributed task queue or inside the accepting process.
//!
//! # Features
//!
//! - **Plugin Registry** — Compiled-in analyzer plugins, deduplicated by name
//! - **Orchestrator** — Path resolution, first-match plugin selection, UDM normalization
//! - **Job Workflow** — Validated `pending → running → completed | failed` transitions
//! - **Dual-mode execution** — Redis/Dragonfly worker pool or inline tokio tasks
//! - **Status reconciliation** — One status vocabulary for both execution modes
//!
//! # Architecture
//!
//! ```text
//! nexus-orchestrator/
//! ├── application/        # Use cases
//! │   ├── orchestrator.rs # Plugin selection and invocation
//! │   ├── workflow.rs     # Job state machine
//! │   ├── execution.rs    # One job run with checkpoints
//! │   ├── dispatch.rs     # Submit / status / report read paths
//! │   └── reconciler.rs   # Native task state → job status
//! ├── infrastructure/     # External integrations
//! │   ├── plugin_registry.rs
//! │   ├── report_store/   # In-memory and PostgreSQL records
//! │   ├── task_queue/     # In-memory and Redis queues
//! │   └── job_worker.rs   # Background worker pool
//! └── domain/             # Domain models and service traits
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
