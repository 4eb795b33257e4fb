//! Per-channel running frequency/phase state; dispatches instruction
//! effects onto each channel's [`PulseList`] (component C4).
//!
//! Grounded in `pulsegen_client/runner/phase_tracker.py` and the commented-
//! out `Channel`/`Executor` pair the teacher's snapshot carries in
//! `src/executor.rs` — the same `shift_freq`/`set_freq`/`shift_phase`/
//! `set_phase`/`swap_phase`/`total_freq` algebra, revived here as the
//! tracker the render pass threads through explicitly.

use crate::{
    envelope::Envelope,
    pulse::PulseList,
    quant::{Amplitude, ChannelId, Frequency, Phase, Time},
    shape::Shape,
};

#[derive(Debug, Clone)]
struct ChannelState {
    base_freq: Frequency,
    delta_freq: Frequency,
    phase: Phase,
    pulses: PulseList,
}

impl ChannelState {
    fn new(base_freq: Frequency) -> Self {
        Self {
            base_freq,
            delta_freq: Frequency::ZERO,
            phase: Phase::ZERO,
            pulses: PulseList::new(),
        }
    }

    fn total_freq(&self) -> Frequency {
        self.base_freq + self.delta_freq
    }
}

#[derive(Debug, Clone)]
pub struct PhaseTracker {
    channels: Vec<ChannelState>,
}

impl PhaseTracker {
    #[must_use]
    pub fn new(base_freqs: impl IntoIterator<Item = Frequency>) -> Self {
        Self {
            channels: base_freqs.into_iter().map(ChannelState::new).collect(),
        }
    }

    fn channel(&mut self, id: ChannelId) -> &mut ChannelState {
        &mut self.channels[id.index()]
    }

    /// `phase -= delta * t; delta_freq += delta` — preserves the
    /// instantaneous phase at time `t`.
    pub fn shift_freq(&mut self, id: ChannelId, delta: Frequency, t: Time) {
        let channel = self.channel(id);
        channel.phase -= delta * t;
        channel.delta_freq += delta;
    }

    /// `phase -= (f - delta_freq) * t; delta_freq = f`.
    pub fn set_freq(&mut self, id: ChannelId, freq: Frequency, t: Time) {
        let channel = self.channel(id);
        let delta = freq - channel.delta_freq;
        channel.phase -= delta * t;
        channel.delta_freq = freq;
    }

    /// `phase += delta` — instantaneous, no time dependence.
    pub fn shift_phase(&mut self, id: ChannelId, delta: Phase) {
        self.channel(id).phase += delta;
    }

    /// `phase = p - delta_freq * t` — the displayed phase at `t` becomes `p`.
    pub fn set_phase(&mut self, id: ChannelId, phase: Phase, t: Time) {
        let channel = self.channel(id);
        channel.phase = phase - channel.delta_freq * t;
    }

    /// With `d = total_freq(a) - total_freq(b)`, swaps the two channels'
    /// phases as observed at time `t`.
    pub fn swap_phase(&mut self, a: ChannelId, b: ChannelId, t: Time) {
        if a == b {
            return;
        }
        let delta = self.channels[a.index()].total_freq() - self.channels[b.index()].total_freq();
        let phase_a = self.channels[a.index()].phase;
        let phase_b = self.channels[b.index()].phase;
        self.channels[a.index()].phase = phase_b - delta * t;
        self.channels[b.index()].phase = phase_a + delta * t;
    }

    /// Appends a pulse to channel `ch`'s list with
    /// `freq_global = total_freq(ch)`, `phase = channel.phase + phase_local`.
    #[expect(clippy::too_many_arguments)]
    pub fn play(
        &mut self,
        ch: ChannelId,
        shape: Option<Shape>,
        time: Time,
        width: Time,
        plateau: Time,
        amplitude: Amplitude,
        drag_coef: f64,
        freq_local: Frequency,
        phase_local: Phase,
    ) {
        let channel = self.channel(ch);
        let envelope = Envelope::new(shape, width, plateau);
        let freq_global = channel.total_freq();
        let phase = channel.phase + phase_local;
        channel.pulses.add_pulse(
            envelope,
            freq_global,
            freq_local,
            time,
            phase,
            amplitude,
            drag_coef,
        );
    }

    /// Consumes the tracker, returning each channel's finished pulse list
    /// in channel order.
    #[must_use]
    pub fn finish(self) -> Vec<PulseList> {
        self.channels.into_iter().map(|c| c.pulses).collect()
    }
}
