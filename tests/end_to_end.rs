//! End-to-end scenarios exercising the full `driver::compile` pipeline,
//! matching the six scenarios laid out for the compiler as a whole.

use pulsegen_core::{Channel, ChannelWaveform, Request, ShapeInfo, compile};
use pulsegen_core::quant::{Amplitude, ChannelId, Frequency, Label, Phase, ShapeId, Time};
use pulsegen_core::schedule::{
    Absolute, AbsoluteEntry, Direction, Element, ElementCommonBuilder, ElementRef, Grid, GridEntry,
    GridLength, Play, Repeat, Stack,
};

fn channel(name: &str, sample_rate: f64, length: i64) -> Channel {
    channel_with_freq(name, 0.0, sample_rate, length)
}

fn channel_with_freq(name: &str, base_freq: f64, sample_rate: f64, length: i64) -> Channel {
    Channel {
        name: Label::new(name),
        base_freq: Frequency::new(base_freq).unwrap(),
        sample_rate: Frequency::new(sample_rate).unwrap(),
        delay: Time::ZERO,
        length,
        align_level: 0,
    }
}

fn leaf(variant: impl Into<pulsegen_core::schedule::ElementVariant>) -> ElementRef {
    let common = ElementCommonBuilder::new().build().unwrap();
    ElementRef::new(Element::new(common, variant))
}

fn rect_play(channel: usize, width: f64) -> ElementRef {
    leaf(Play::new(ChannelId::new(channel), None, Amplitude::new(1.0).unwrap(), Time::new(width).unwrap()).unwrap())
}

fn output_for<'a>(waveforms: &'a [ChannelWaveform], name: &str) -> &'a ChannelWaveform {
    waveforms.iter().find(|w| w.name == name).expect("channel present in output")
}

/// Scenario 1: a single rectangular pulse spanning the whole output buffer.
#[test]
fn scenario_1_single_rectangular_pulse() {
    let schedule = leaf(Absolute::new(vec![AbsoluteEntry::new(Time::ZERO, rect_play(0, 5e-9)).unwrap()]));
    let request = Request {
        channels: vec![channel("q0", 2e9, 10)],
        shapes: vec![],
        schedule,
    };
    let waveforms = compile(&request).unwrap();
    let out = output_for(&waveforms, "q0");
    assert_eq!(out.i, vec![1.0; 10]);
    assert_eq!(out.q, vec![0.0; 10]);
}

/// Scenario 2: a Hann pulse centered mid-channel, zero at both edges.
#[test]
fn scenario_2_hann_pulse_centered() {
    let play = Play::new(
        ChannelId::new(0),
        Some(ShapeId::new(0)),
        Amplitude::new(1.0).unwrap(),
        Time::new(10e-9).unwrap(),
    )
    .unwrap();
    let schedule = leaf(Absolute::new(vec![AbsoluteEntry::new(Time::new(5e-9).unwrap(), leaf(play)).unwrap()]));
    let request = Request {
        channels: vec![channel("q0", 1e9, 20)],
        shapes: vec![ShapeInfo::Hann],
        schedule,
    };
    let waveforms = compile(&request).unwrap();
    let out = output_for(&waveforms, "q0");
    for v in &out.i[0..5] {
        assert!(v.abs() < 1e-9);
    }
    for v in &out.i[15..20] {
        assert!(v.abs() < 1e-9);
    }
    let peak = out.i.iter().copied().fold(f64::MIN, f64::max);
    assert!((peak - 1.0).abs() < 1e-6);
}

/// Scenario 3: a phase-shifted, detuned carrier rotates most of its energy
/// from I into Q by the time it reaches its envelope peak.
#[test]
fn scenario_3_phase_shifted_carrier() {
    let play = Play::new(
        ChannelId::new(0),
        Some(ShapeId::new(0)),
        Amplitude::new(1.0).unwrap(),
        Time::new(20e-9).unwrap(),
    )
    .unwrap()
    .with_phase(Phase::new(0.25).unwrap())
    .unwrap();
    let schedule = leaf(Absolute::new(vec![AbsoluteEntry::new(Time::ZERO, leaf(play)).unwrap()]));
    let request = Request {
        channels: vec![channel_with_freq("q0", 100e6, 1e9, 20)],
        shapes: vec![ShapeInfo::Hann],
        schedule,
    };
    let waveforms = compile(&request).unwrap();
    let out = output_for(&waveforms, "q0");
    let peak_index = out
        .i
        .iter()
        .zip(&out.q)
        .enumerate()
        .max_by(|a, b| (a.1.0.hypot(*a.1.1)).total_cmp(&b.1.0.hypot(*b.1.1)))
        .unwrap()
        .0;
    assert!(out.i[peak_index].abs() < out.q[peak_index].abs());
}

/// Scenario 4: two 10 ns Plays stacked backwards under a 100 ns duration —
/// the second ends at 100 ns, the first at 90 ns.
#[test]
fn scenario_4_stack_backwards_two_plays() {
    let stack = Stack::new(vec![rect_play(0, 10e-9), rect_play(0, 10e-9)], Direction::Backward);
    let common = ElementCommonBuilder::new().duration(Some(Time::new(100e-9).unwrap())).build().unwrap();
    let schedule = ElementRef::new(Element::new(common, stack));
    let request = Request {
        channels: vec![channel("q0", 1e9, 100)],
        shapes: vec![],
        schedule,
    };
    let waveforms = compile(&request).unwrap();
    let out = output_for(&waveforms, "q0");
    assert!(out.i[95] > 0.5);
    assert!(out.i[85] > 0.5);
    assert!(out.i[70] < 0.5);
}

/// Scenario 5: Repeat{count=3, spacing=5ns} of a 10 ns Play — emissions
/// land flush at 0, 15, and 30 ns.
#[test]
fn scenario_5_repeat_with_spacing() {
    let repeat = Repeat::new(rect_play(0, 10e-9), 3, Time::new(5e-9).unwrap()).unwrap();
    let schedule = leaf(repeat);
    let request = Request {
        channels: vec![channel("q0", 1e9, 40)],
        shapes: vec![],
        schedule,
    };
    let waveforms = compile(&request).unwrap();
    let out = output_for(&waveforms, "q0");
    assert!(out.i[0] > 0.5 && out.i[9] > 0.5 && out.i[10] < 0.5);
    assert!(out.i[15] > 0.5 && out.i[24] > 0.5);
    assert!(out.i[30] > 0.5 && out.i[39] > 0.5);
}

/// Scenario 6: a Grid with `[Star(1), Star(2)]` columns arranged to 90 ns
/// splits into 30 ns / 60 ns columns; each child right-aligns (default
/// `Alignment::End`) within its own column.
#[test]
fn scenario_6_grid_with_star_columns() {
    let columns = vec![GridLength::star(1.0).unwrap(), GridLength::star(2.0).unwrap()];
    let entries = vec![
        GridEntry::new(rect_play(0, 20e-9), 0, 1),
        GridEntry::new(rect_play(0, 40e-9), 1, 1),
    ];
    let grid = Grid::new(entries, columns);
    let common = ElementCommonBuilder::new().duration(Some(Time::new(90e-9).unwrap())).build().unwrap();
    let schedule = ElementRef::new(Element::new(common, grid));
    let request = Request {
        channels: vec![channel("q0", 1e9, 90)],
        shapes: vec![],
        schedule,
    };
    let waveforms = compile(&request).unwrap();
    let out = output_for(&waveforms, "q0");
    // column 0 spans [0, 30); the 20 ns play right-aligns to [10, 30).
    assert!(out.i[10..20].iter().all(|&v| v > 0.5));
    // column 1 spans [30, 90); the 40 ns play right-aligns to [50, 90).
    assert!(out.i[60..70].iter().all(|&v| v > 0.5));
}

/// A DRAG-corrected pulse carries a nonzero derivative correction on the
/// rising/falling edges of its envelope, so a Hann pulse with `drag_coef`
/// set picks up energy in the quadrature that a plain (non-DRAG) pulse at
/// `phase = 0` never would.
#[test]
fn drag_pulse_adds_quadrature_on_the_envelope_slopes() {
    let width = 10e-9;
    let plain = Play::new(ChannelId::new(0), Some(ShapeId::new(0)), Amplitude::new(1.0).unwrap(), Time::new(width).unwrap()).unwrap();
    let drag = Play::new(ChannelId::new(0), Some(ShapeId::new(0)), Amplitude::new(1.0).unwrap(), Time::new(width).unwrap())
        .unwrap()
        .with_drag_coef(0.3)
        .unwrap();

    let waveform_for = |play: Play| {
        let schedule = leaf(Absolute::new(vec![AbsoluteEntry::new(Time::ZERO, leaf(play)).unwrap()]));
        let request = Request {
            channels: vec![channel("q0", 1e9, 10)],
            shapes: vec![ShapeInfo::Hann],
            schedule,
        };
        compile(&request).unwrap().remove(0)
    };

    let plain_out = waveform_for(plain);
    let drag_out = waveform_for(drag);

    // away from the carrier-free DC case, DRAG only perturbs the quadrature
    // (the derivative term is purely imaginary at zero detuning/phase).
    assert!(plain_out.q.iter().all(|&v| v.abs() < 1e-12));
    assert!(drag_out.q.iter().any(|&v| v.abs() > 1e-6));
    // the in-phase envelope itself is unaffected by the DRAG correction.
    for (p, d) in plain_out.i.iter().zip(&drag_out.i) {
        assert!((p - d).abs() < 1e-9);
    }
}
