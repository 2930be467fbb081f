//! Parameter definitions with units and documented semantics.
//!
//! Every tunable lives here as a plain `Default` struct; the CLI only
//! overrides fields.

mod audio;
mod render;

// Re-export all types
pub use audio::{note_ladder, AnalysisConfig, CaptureConfig};
pub use render::{Layout, RenderConfig};
