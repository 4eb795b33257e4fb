//! Binds the request data model to the layout pass and assembles per-channel
//! I/Q waveforms (component C6, spec §4.6).
//!
//! `compile` is the single validation boundary: everything downstream
//! (`schedule`, `layout`, `tracker`, `pulse`) is built from types that are
//! already internally consistent (an `Element` tree is only ever
//! constructed through validating builders), so the checks this module runs
//! are exactly the ones that cut *across* the request — channel/shape id
//! references resolving into the sibling `channels`/`shapes` lists, and the
//! per-channel numeric bounds spec §7 assigns to `InvalidRequest`.

use rayon::prelude::*;

use crate::{
    Complex64,
    error::Error,
    layout,
    quant::{Frequency, Label, Time},
    schedule::{ElementRef, Measure},
    shape::Shape,
    tracker::PhaseTracker,
};

/// One output stream: its own base frequency, sample rate, sample-grid
/// alignment, post-hoc delay, and fixed output length (spec §3).
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: Label,
    pub base_freq: Frequency,
    pub sample_rate: Frequency,
    pub delay: Time,
    /// Signed at this boundary because the wire contract this crate sits
    /// behind carries plain integers; a negative value is a validation
    /// error (`Error::InvalidRequest`), not a type-level impossibility.
    pub length: i64,
    pub align_level: i32,
}

/// One entry of `Request::shapes`. There is no "rectangular" variant here:
/// that is `Play::shape_id() == None` (wire `-1`) at the `schedule` layer,
/// never an index into this list.
#[derive(Debug, Clone)]
pub enum ShapeInfo {
    Hann,
    Triangle,
    Interpolated { xs: Vec<f64>, ys: Vec<f64> },
}

impl ShapeInfo {
    fn materialize(&self) -> anyhow::Result<Shape> {
        match self {
            Self::Hann => Ok(Shape::new_hann()),
            Self::Triangle => Ok(Shape::new_triangle()),
            Self::Interpolated { xs, ys } => Shape::new_interpolated(xs.clone(), ys.clone()),
        }
    }
}

/// The single input to the compiler: channel metadata, the shape
/// dictionary, and the root of the schedule tree (spec §6).
#[derive(Debug, Clone)]
pub struct Request {
    pub channels: Vec<Channel>,
    pub shapes: Vec<ShapeInfo>,
    pub schedule: ElementRef,
}

/// One channel's rendered output: equal-length in-phase and quadrature
/// sample arrays (spec §6).
#[derive(Debug, Clone)]
pub struct ChannelWaveform {
    pub name: String,
    pub i: Vec<f64>,
    pub q: Vec<f64>,
}

/// Runs the full compile: resolves shapes, builds a [`PhaseTracker`], drives
/// the layout pass over `request.schedule`, then samples each channel's
/// finished pulse list in parallel. Mirrors the driver steps of spec §4.6.
pub fn compile(request: &Request) -> Result<Vec<ChannelWaveform>, Error> {
    validate_channels(&request.channels)?;
    validate_channel_refs(&request.channels, &request.schedule)?;
    let shapes = materialize_shapes(&request.shapes)?;

    let mut tracker = PhaseTracker::new(request.channels.iter().map(|c| c.base_freq));
    layout::run(&request.schedule, &mut tracker, &shapes).map_err(Error::from_anyhow)?;
    let pulses = tracker.finish();

    request
        .channels
        .par_iter()
        .zip(pulses.into_par_iter())
        .map(|(channel, mut pulse_list)| {
            pulse_list.delay(channel.delay);
            let length = validated_length(channel)?;
            let samples = pulse_list
                .sample(length, channel.sample_rate, channel.align_level)
                .map_err(Error::from_anyhow)?;
            let (i, q) = split_iq(&samples);
            Ok(ChannelWaveform {
                name: channel.name.as_str().to_owned(),
                i,
                q,
            })
        })
        .collect()
}

fn validate_channels(channels: &[Channel]) -> Result<(), Error> {
    for (idx, channel) in channels.iter().enumerate() {
        if !(channel.sample_rate.value().is_finite() && channel.sample_rate.value() > 0.0) {
            return Err(Error::InvalidRequest(format!(
                "channel {idx} ({}) has non-positive sample_rate {:?}",
                channel.name.as_str(),
                channel.sample_rate.value()
            )));
        }
        if !channel.base_freq.value().is_finite() {
            return Err(Error::InvalidRequest(format!(
                "channel {idx} ({}) has non-finite base_freq",
                channel.name.as_str()
            )));
        }
        if !channel.delay.value().is_finite() {
            return Err(Error::InvalidRequest(format!(
                "channel {idx} ({}) has non-finite delay",
                channel.name.as_str()
            )));
        }
        if channel.length < 0 {
            return Err(Error::InvalidRequest(format!(
                "channel {idx} ({}) has negative length {}",
                channel.name.as_str(),
                channel.length
            )));
        }
    }
    Ok(())
}

fn validated_length(channel: &Channel) -> Result<usize, Error> {
    usize::try_from(channel.length).map_err(|_| {
        Error::InvalidRequest(format!(
            "channel {} has negative length {}",
            channel.name.as_str(),
            channel.length
        ))
    })
}

/// Every channel id reachable anywhere in the schedule tree is exposed
/// transitively through `Measure::channels`, since every container variant
/// merges its children's channel sets (`schedule::merge_channel_ids`); a
/// single pass over the root's channel set is therefore exhaustive.
fn validate_channel_refs(channels: &[Channel], schedule: &ElementRef) -> Result<(), Error> {
    for id in schedule.channels() {
        if id.index() >= channels.len() {
            return Err(Error::InvalidRequest(format!(
                "schedule references channel id {} but only {} channels were provided",
                id.index(),
                channels.len()
            )));
        }
    }
    Ok(())
}

fn materialize_shapes(shapes: &[ShapeInfo]) -> Result<Vec<Shape>, Error> {
    shapes
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            s.materialize().map_err(|e| {
                Error::InvalidRequest(format!("shape {idx} is malformed: {e}"))
            })
        })
        .collect()
}

fn split_iq(samples: &[Complex64]) -> (Vec<f64>, Vec<f64>) {
    samples.iter().map(|c| (c.re, c.im)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        quant::{Amplitude, ChannelId},
        schedule::{Absolute, AbsoluteEntry, Element, ElementCommonBuilder, Play},
    };

    fn channel(name: &str, sample_rate: f64, length: i64) -> Channel {
        Channel {
            name: Label::new(name),
            base_freq: Frequency::ZERO,
            sample_rate: Frequency::new(sample_rate).unwrap(),
            delay: Time::ZERO,
            length,
            align_level: 0,
        }
    }

    fn rect_play_schedule(width: f64) -> ElementRef {
        let common = ElementCommonBuilder::new().build().unwrap();
        let play = Play::new(
            ChannelId::new(0),
            None,
            Amplitude::new(1.0).unwrap(),
            Time::new(width).unwrap(),
        )
        .unwrap();
        let leaf = ElementRef::new(Element::new(common, play));
        let entry = AbsoluteEntry::new(Time::ZERO, leaf).unwrap();
        let common = ElementCommonBuilder::new().build().unwrap();
        ElementRef::new(Element::new(common, Absolute::new(vec![entry])))
    }

    #[test]
    fn single_rectangular_pulse_fills_the_whole_buffer() {
        let request = Request {
            channels: vec![channel("q0", 2e9, 10)],
            shapes: vec![],
            schedule: rect_play_schedule(5e-9),
        };
        let result = compile(&request).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "q0");
        assert_eq!(result[0].i, vec![1.0; 10]);
        assert_eq!(result[0].q, vec![0.0; 10]);
    }

    #[test]
    fn rejects_out_of_range_channel_id() {
        let common = ElementCommonBuilder::new().build().unwrap();
        let play = Play::new(ChannelId::new(3), None, Amplitude::new(1.0).unwrap(), Time::ZERO).unwrap();
        let schedule = ElementRef::new(Element::new(common, play));
        let request = Request {
            channels: vec![channel("q0", 1e9, 1)],
            shapes: vec![],
            schedule,
        };
        assert!(matches!(compile(&request), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        let request = Request {
            channels: vec![channel("q0", 0.0, 1)],
            shapes: vec![],
            schedule: rect_play_schedule(1e-9),
        };
        assert!(matches!(compile(&request), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn rejects_negative_length() {
        let request = Request {
            channels: vec![channel("q0", 1e9, -1)],
            shapes: vec![],
            schedule: rect_play_schedule(1e-9),
        };
        assert!(matches!(compile(&request), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn rejects_unresolvable_shape_id() {
        let common = ElementCommonBuilder::new().build().unwrap();
        let play = Play::new(
            ChannelId::new(0),
            Some(crate::quant::ShapeId::new(0)),
            Amplitude::new(1.0).unwrap(),
            Time::new(1e-9).unwrap(),
        )
        .unwrap();
        let leaf = ElementRef::new(Element::new(common, play));
        let entry = AbsoluteEntry::new(Time::ZERO, leaf).unwrap();
        let common = ElementCommonBuilder::new().build().unwrap();
        let schedule = ElementRef::new(Element::new(common, Absolute::new(vec![entry])));
        let request = Request {
            channels: vec![channel("q0", 1e9, 10)],
            shapes: vec![],
            schedule,
        };
        assert!(matches!(compile(&request), Err(Error::InvalidRequest(_))));
    }
}
