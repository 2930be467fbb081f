//! Microphone capture and Goertzel spectral analysis.
//!
//! The capture callback fills a lock-free [`SampleRing`]; once per rendered
//! frame the [`SpectralBank`] rescans the ring and yields one squared
//! magnitude per target frequency.

pub mod capture;
pub mod goertzel;
pub mod ring;
pub mod synth;

pub use capture::{list_input_devices, AudioCapture, CaptureContext, InputDeviceInfo, StreamFormat};
pub use goertzel::SpectralBank;
pub use ring::{RingReader, RingWriter, SampleRing};
