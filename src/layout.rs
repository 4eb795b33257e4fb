//! Two-pass layout engine over the immutable [`crate::schedule::Element`]
//! tree (component C5, spec §4.5).
//!
//! Conceptually each node moves through `Fresh -> Measured -> Arranged ->
//! Rendered`: `measure` asks "how much time do you want", `arrange` (folded
//! into the per-variant `render_*` functions below, since nothing here
//! needs to remember an arranged position past the single render pass)
//! hands a node the box it was actually given, and `render` walks the
//! arranged tree dispatching pulse/tracker effects. The `Element` tree
//! itself never changes: every pass is a pure function of `(&Element,
//! available budget)`, so there is no separate mutable node to go stale —
//! a node is "Rendered" simply by virtue of `render` having returned.
//!
//! Grounded in the teacher's commented-out `src/executor.rs` dispatch
//! (`execute_dispatch`/`execute_play`/`execute_repeat`/...), generalized
//! from its closed `ArrangedElement` representation to compute child
//! placement on the fly from each variant's own measured sizes.

use anyhow::Result;

use crate::{
    error::Error,
    quant::Time,
    schedule::{Absolute, Alignment, Element, ElementRef, ElementVariant, Grid, Measure, Play, Repeat, Stack},
    shape::Shape,
    tracker::PhaseTracker,
};

/// Runs the full measure/arrange/render pipeline over `root`, dispatching
/// every leaf's effect into `tracker`. Returns the root's measured
/// duration (the schedule's total length before the driver pads/truncates
/// per channel in step 6).
pub fn run(root: &ElementRef, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<Time> {
    let total = root.measure();
    render(root, Time::ZERO, total, tracker, shapes)?;
    Ok(total)
}

/// Applies a child's own alignment within a `duration`-wide slot at
/// `slot_offset`: `Stretch` fills the slot, everything else uses the
/// child's natural (measured) size positioned per `Start`/`Center`/`End`.
fn place_child(child: &ElementRef, slot_offset: Time, slot_duration: Time) -> (Time, Time) {
    let desired = child.measure();
    let duration = if child.common.alignment() == Alignment::Stretch {
        slot_duration
    } else {
        desired.min(slot_duration)
    };
    let offset = match child.common.alignment() {
        Alignment::End => slot_duration - duration,
        Alignment::Center => (slot_duration - duration) / 2.0,
        Alignment::Start | Alignment::Stretch => Time::ZERO,
    };
    (slot_offset + offset, duration)
}

fn render(element: &ElementRef, time: Time, duration: Time, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<()> {
    if !element.common.visibility() {
        return Ok(());
    }
    let (margin_start, margin_end) = element.common.margin();
    let inner_time = time + margin_start;
    let inner_duration = (duration - margin_start - margin_end).max(Time::ZERO);

    match &element.variant {
        ElementVariant::Play(p) => render_play(p, inner_time, inner_duration, tracker, shapes),
        ElementVariant::ShiftPhase(p) => {
            tracker.shift_phase(*p.channel_id(), p.phase());
            Ok(())
        }
        ElementVariant::SetPhase(p) => {
            tracker.set_phase(*p.channel_id(), p.phase(), inner_time);
            Ok(())
        }
        ElementVariant::ShiftFreq(p) => {
            tracker.shift_freq(*p.channel_id(), p.frequency(), inner_time);
            Ok(())
        }
        ElementVariant::SetFreq(p) => {
            tracker.set_freq(*p.channel_id(), p.frequency(), inner_time);
            Ok(())
        }
        ElementVariant::SwapPhase(p) => {
            tracker.swap_phase(*p.channel_id1(), *p.channel_id2(), inner_time);
            Ok(())
        }
        ElementVariant::Barrier(_) => Ok(()),
        ElementVariant::Repeat(r) => render_repeat(r, inner_time, inner_duration, tracker, shapes),
        ElementVariant::Stack(s) => render_stack(s, inner_time, inner_duration, tracker, shapes),
        ElementVariant::Absolute(a) => render_absolute(a, inner_time, inner_duration, tracker, shapes),
        ElementVariant::Grid(g) => render_grid(g, inner_time, inner_duration, tracker, shapes),
    }
}

fn render_play(play: &Play, time: Time, duration: Time, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<()> {
    let shape = play
        .shape_id()
        .map(|id| {
            shapes
                .get(id.index())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("shape id {} out of range for {} resolved shapes", id.index(), shapes.len()))
        })
        .transpose()?;
    let width = play.width();
    let plateau = if play.flexible() {
        (duration - width).max(Time::ZERO)
    } else {
        play.plateau()
    };
    tracker.play(
        *play.channel_id(),
        shape,
        time,
        width,
        plateau,
        play.amplitude(),
        play.drag_coef(),
        play.frequency(),
        play.phase(),
    );
    Ok(())
}

fn render_repeat(repeat: &Repeat, time: Time, duration: Time, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<()> {
    let count = repeat.count();
    if count == 0 {
        return Ok(());
    }
    let step = repeat.step(duration);
    let slot_duration = (step - repeat.spacing()).max(Time::ZERO);
    let child = repeat.child();
    for i in 0..count {
        #[expect(clippy::cast_precision_loss)]
        let child_time = time + step * i as f64;
        let (t, d) = place_child(child, child_time, slot_duration);
        render(child, t, d, tracker, shapes)?;
    }
    Ok(())
}

fn render_stack(stack: &Stack, time: Time, duration: Time, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<()> {
    let timings = stack.child_timings(duration);
    if timings.len() != stack.children().len() {
        return Err(Error::OutOfRange(format!(
            "stack produced {} timings for {} children",
            timings.len(),
            stack.children().len()
        ))
        .into());
    }
    for (child, timing) in stack.children().iter().zip(timings) {
        let (t, d) = place_child(child, time + timing.offset, timing.duration);
        render(child, t, d, tracker, shapes)?;
    }
    Ok(())
}

fn render_absolute(absolute: &Absolute, time: Time, _duration: Time, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<()> {
    for entry in absolute.children() {
        let slot_duration = entry.element().measure();
        let (t, d) = place_child(entry.element(), time + entry.time(), slot_duration);
        render(entry.element(), t, d, tracker, shapes)?;
    }
    Ok(())
}

fn render_grid(grid: &Grid, time: Time, duration: Time, tracker: &mut PhaseTracker, shapes: &[Shape]) -> Result<()> {
    let slots = grid.child_slots(duration);
    if slots.len() != grid.children().len() {
        return Err(Error::OutOfRange(format!(
            "grid produced {} slots for {} children",
            slots.len(),
            grid.children().len()
        ))
        .into());
    }
    for (entry, slot) in grid.children().iter().zip(slots) {
        let (t, d) = place_child(entry.element(), time + slot.offset, slot.duration);
        render(entry.element(), t, d, tracker, shapes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        quant::{Amplitude, ChannelId, Frequency, Phase},
        schedule::{Direction, ElementCommonBuilder, ShiftPhase},
    };

    fn play(channel: usize, width: f64) -> ElementRef {
        let common = ElementCommonBuilder::new().build().unwrap();
        let variant = Play::new(
            ChannelId::new(channel),
            None,
            Amplitude::new(1.0).unwrap(),
            Time::new(width).unwrap(),
        )
        .unwrap();
        ElementRef::new(Element::new(common, variant))
    }

    #[test]
    fn invisible_elements_are_skipped() {
        let common = ElementCommonBuilder::new().visibility(false).build().unwrap();
        let element = ElementRef::new(Element::new(
            common,
            ShiftPhase::new(ChannelId::new(0), Phase::new(0.5).unwrap()).unwrap(),
        ));
        let mut tracker = PhaseTracker::new([Frequency::ZERO]);
        run(&element, &mut tracker, &[]).unwrap();
        let pulses = tracker.finish();
        assert!(pulses[0].is_empty());
    }

    #[test]
    fn stack_places_two_plays_sequentially_on_one_channel() {
        let stack = Stack::new(vec![play(0, 1.0), play(0, 2.0)], Direction::Forward);
        let common = ElementCommonBuilder::new().build().unwrap();
        let element = ElementRef::new(Element::new(common, stack));
        assert_eq!(element.measure(), Time::new(3.0).unwrap());

        let mut tracker = PhaseTracker::new([Frequency::ZERO]);
        let total = run(&element, &mut tracker, &[]).unwrap();
        assert_eq!(total, Time::new(3.0).unwrap());
        let pulses = tracker.finish();
        assert_eq!(pulses[0].len(), 2);
    }
}
