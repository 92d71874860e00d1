//! Domain layer - Pure job and stage descriptions.

// Job descriptions and the open-job handle state machine
pub mod jobs;

// Stage catalog and pipeline planning
pub mod plan;

// Worker-side command templates with declared placeholders
pub mod template;
