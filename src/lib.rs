//! av-strip - live audio-reactive spectrum strip
//!
//! Microphone input is analysed at a fixed ladder of musical frequencies and
//! drawn every frame as a coloured strip or ring.

pub mod audio;
pub mod error;
pub mod params;
pub mod rendering;
pub mod strip;
