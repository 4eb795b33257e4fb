//! Per-channel accumulator of timed, phased pulse items and the sampler
//! that renders them to complex samples (component C3).
//!
//! Grounded in `pulsegen_client/runner/_pulse_list.py`: a flat, ordered list
//! of pulse items rather than the bin-grouped `HashMap<ListBin, Vec<_>>>`
//! representation the teacher's current `pulse.rs` uses for its crosstalk-
//! mixing sampler. That grouping exists to support multi-channel crosstalk
//! mixing, which is out of this crate's scope (see `DESIGN.md`); a flat
//! list matching the original client is the simpler, directly-grounded
//! choice here.

use anyhow::Result;

use crate::{
    Complex64,
    envelope::Envelope,
    error::Error,
    quant::{AlignedIndex, Amplitude, Frequency, Phase, Time},
};

#[derive(Debug, Clone)]
pub struct PulseItem {
    time: Time,
    envelope: Envelope,
    amp: Complex64,
    drag_amp: Complex64,
    freq_global: Frequency,
    freq_local: Frequency,
    delay_accum: Time,
}

#[derive(Debug, Clone, Default)]
pub struct PulseList {
    items: Vec<PulseItem>,
}

impl PulseList {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: vec![] }
    }

    /// Appends a pulse item, a no-op if `amp == 0`. `amp` is rotated by
    /// `phase` (in cycles) and `drag_amp` is derived as `i * amp * drag_coef`.
    pub fn add_pulse(
        &mut self,
        envelope: Envelope,
        freq_global: Frequency,
        freq_local: Frequency,
        time: Time,
        phase: Phase,
        amplitude: Amplitude,
        drag_coef: f64,
    ) {
        if amplitude.value() == 0.0 {
            return;
        }
        let amp = amplitude.value() * phase.phaser();
        let drag_amp = amp * Complex64::i() * drag_coef;
        self.items.push(PulseItem {
            time,
            envelope,
            amp,
            drag_amp,
            freq_global,
            freq_local,
            delay_accum: Time::ZERO,
        });
    }

    /// Shifts every item's emission time by `delta`, accumulating the shift
    /// so the sampler can apply the matching phase correction.
    pub fn delay(&mut self, delta: Time) {
        for item in &mut self.items {
            item.time += delta;
            item.delay_accum += delta;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Renders every item onto a complex buffer of `length` samples at
    /// `sample_rate`, snapping each item's start time to `align_level`
    /// before sampling.
    pub fn sample(&self, length: usize, sample_rate: Frequency, align_level: i32) -> Result<Vec<Complex64>> {
        let mut y = vec![Complex64::new(0.0, 0.0); length];
        let dt = sample_rate.dt();
        for item in &self.items {
            render_item(item, sample_rate, dt, align_level, &mut y)?;
        }
        Ok(y)
    }
}

impl std::ops::Mul<Complex64> for PulseList {
    type Output = Self;

    /// Scalar complex multiplication: scales every item's `amp` and
    /// `drag_amp` in place.
    fn mul(mut self, rhs: Complex64) -> Self::Output {
        for item in &mut self.items {
            item.amp *= rhs;
            item.drag_amp *= rhs;
        }
        self
    }
}

fn render_item(
    item: &PulseItem,
    sample_rate: Frequency,
    dt: Time,
    align_level: i32,
    y: &mut [Complex64],
) -> Result<()> {
    let aligned = AlignedIndex::new(item.time, sample_rate, align_level)?;
    let i0 = aligned.floor().value();
    let i1 = (aligned.value() + item.envelope.duration().value() * sample_rate.value()).ceil();
    #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let i0 = i0.max(0.0) as usize;
    #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let i1 = (i1.max(0.0) as usize).min(y.len());
    if i0 >= i1 {
        return Ok(());
    }
    if i0 >= y.len() {
        return Err(Error::OutOfRange(format!(
            "pulse start index {i0} is out of bounds for a {}-sample channel",
            y.len()
        ))
        .into());
    }

    let aligned_time = aligned.value() * dt.value();
    let env_y: Vec<f64> = (i0..i1)
        .map(|n| {
            let local_t = n as f64 * dt.value() - aligned_time;
            item.envelope
                .sample(Time::new(local_t).expect("finite local time"))
        })
        .collect();
    let env_dy = central_difference(&env_y, sample_rate.value());

    let total_freq = item.freq_global + item.freq_local;
    #[expect(clippy::cast_precision_loss)]
    let phase_shift =
        std::f64::consts::TAU * item.freq_global.value() * (i0 as f64 * dt.value() - item.delay_accum.value());
    let dphase = std::f64::consts::TAU * total_freq.value() * dt.value();
    #[expect(clippy::cast_precision_loss)]
    let local_t0 = i0 as f64 * dt.value() - aligned_time;

    let mut phase = std::f64::consts::TAU * total_freq.value() * local_t0 + phase_shift;
    for (out, &ey, &edy) in itertools::izip!(&mut y[i0..i1], &env_y, &env_dy) {
        let carrier = Complex64::new(phase.cos(), phase.sin());
        *out += (item.amp * ey + item.drag_amp * edy) * carrier;
        phase += dphase;
    }
    Ok(())
}

/// Central-difference numeric derivative, scaled by `sample_rate` to give a
/// derivative with respect to time. Out-of-range neighbors are treated as
/// zero, matching `np.gradient`'s one-sided edge behavior and reproducing
/// the edge-spike DRAG contribution the spec calls out for rectangular
/// (constant) envelopes.
fn central_difference(y: &[f64], sample_rate: f64) -> Vec<f64> {
    (0..y.len())
        .map(|i| {
            let left = if i > 0 { y[i - 1] } else { 0.0 };
            let right = if i + 1 < y.len() { y[i + 1] } else { 0.0 };
            (right - left) / 2.0 * sample_rate
        })
        .collect()
}
