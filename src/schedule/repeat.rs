use anyhow::{Result, bail};

use crate::quant::{ChannelId, Time};

use super::{ElementRef, Measure};

/// A single child tiled `count` times with `spacing` between consecutive
/// copies. The child is measured once; every copy shares that duration.
#[derive(Debug, Clone)]
pub struct Repeat {
    child: ElementRef,
    count: usize,
    spacing: Time,
}

impl Repeat {
    pub fn new(child: ElementRef, count: usize, spacing: Time) -> Result<Self> {
        if !spacing.value().is_finite() || spacing < Time::ZERO {
            bail!("invalid repeat spacing {spacing:?}");
        }
        Ok(Self { child, count, spacing })
    }

    #[must_use]
    pub fn child(&self) -> &ElementRef {
        &self.child
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn spacing(&self) -> Time {
        self.spacing
    }

    /// The per-copy slot duration once the parent has allocated
    /// `final_duration` for the whole run: `(final - spacing*(n-1)) / n`.
    #[must_use]
    pub fn step(&self, final_duration: Time) -> Time {
        if self.count == 0 {
            return Time::ZERO;
        }
        #[expect(clippy::cast_precision_loss)]
        let n = self.count as f64;
        let per_copy = (final_duration - self.spacing * (n - 1.0)) / n;
        per_copy + self.spacing
    }
}

impl Measure for Repeat {
    fn measure(&self) -> Time {
        if self.count == 0 {
            return Time::ZERO;
        }
        #[expect(clippy::cast_precision_loss)]
        let n = self.count as f64;
        self.child.measure() * n + self.spacing * (n - 1.0)
    }

    fn channels(&self) -> &[ChannelId] {
        self.child.channels()
    }
}
