//! Compiles a pulse-sequence schedule (a tree of timing/phase/amplitude
//! instructions over a fixed set of channels) into per-channel complex
//! baseband waveforms ready for an AWG.
//!
//! Although [`schedule::Element`] nodes hold `Arc` children, it is not
//! possible to create cyclic references because the tree is never mutated
//! after construction.

// TODO: remove this
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

pub mod driver;
pub mod envelope;
pub mod error;
pub mod layout;
pub mod pulse;
pub mod quant;
pub mod schedule;
pub mod shape;
pub mod tracker;

pub use driver::{Channel, ChannelWaveform, Request, ShapeInfo, compile};
pub use error::Error;

use num::Complex;

type Complex64 = Complex<f64>;
