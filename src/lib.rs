//! Racepipe - Race-Video Batch Pipeline Orchestrator
//!
//! Hexagonal Architecture:
//! - domain/: Pure job/stage descriptions and pipeline planning
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (remote service CLI tools)
//! - application/: Generic services
//! - config: Run configuration
//!
//! The pipeline submits four dependent map/reduce stages to a remote
//! compute service: transcription, optional webm transcoding, race
//! extraction, and corpus-wide aggregation.

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use config::PipelineConfig;
