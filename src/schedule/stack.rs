mod helper;

use anyhow::Result;

use crate::quant::{ChannelId, Time};

use super::{Measure, merge_channel_ids};
use self::helper::Helper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Lays out children sequentially per channel: a child is placed right
/// after the latest point any of its channels is currently occupied until,
/// then those channels advance to the child's end. Channels not touched by
/// a child are left where they were. `Backward` runs the same simulation
/// over the reversed child order and mirrors the resulting offsets, so
/// later-in-list children land earlier in time.
#[derive(Debug, Clone)]
pub struct Stack {
    children: Vec<super::ElementRef>,
    direction: Direction,
    channel_ids: Vec<ChannelId>,
}

/// A child's placement within its parent's measured duration, produced by
/// [`Stack::child_timings`] and consumed by `crate::layout`'s
/// `arrange_override` for this variant.
#[derive(Debug, Clone, Copy)]
pub struct ChildTiming {
    pub offset: Time,
    pub duration: Time,
}

impl Stack {
    #[must_use]
    pub fn new(children: Vec<super::ElementRef>, direction: Direction) -> Self {
        let channel_ids = merge_channel_ids(children.iter().map(|e| e.channels()));
        Self {
            children,
            direction,
            channel_ids,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[super::ElementRef] {
        &self.children
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Final per-child `(offset, duration)` pairs within a parent arranged
    /// to `final_duration`, in original child order.
    pub fn child_timings(&self, final_duration: Time) -> Vec<ChildTiming> {
        let MeasureResult { child_timings, .. } = measure_stack(&self.children, &self.channel_ids, self.direction);
        child_timings
            .into_iter()
            .map(|(offset, duration)| {
                let offset = match self.direction {
                    Direction::Forward => offset,
                    Direction::Backward => final_duration - offset - duration,
                };
                ChildTiming { offset, duration }
            })
            .collect()
    }
}

impl Measure for Stack {
    fn measure(&self) -> Time {
        measure_stack(&self.children, &self.channel_ids, self.direction).total_duration
    }

    fn channels(&self) -> &[ChannelId] {
        &self.channel_ids
    }
}

#[derive(Debug, Clone)]
struct MeasureResult {
    total_duration: Time,
    child_timings: Vec<(Time, Time)>,
}

fn measure_stack<I>(children: I, channels: &[ChannelId], direction: Direction) -> MeasureResult
where
    I: IntoIterator,
    I::IntoIter: DoubleEndedIterator,
    I::Item: Measure,
{
    let mut helper = Helper::new(channels);
    let child_timings = map_and_collect_by_direction(children, direction, |child| {
        let child_channels = child.channels();
        let child_duration = child.measure();
        let child_offset = helper.get_usage(child_channels);
        helper.update_usage(child_offset + child_duration, child_channels);
        Ok((child_offset, child_duration))
    })
    .expect("map_and_collect_by_direction never errors");
    MeasureResult {
        total_duration: helper.into_max_usage(),
        child_timings,
    }
}

/// Map by direction but collect in the original order.
fn map_and_collect_by_direction<I, F, T>(source: I, direction: Direction, f: F) -> Result<Vec<T>>
where
    I: IntoIterator,
    I::IntoIter: DoubleEndedIterator,
    F: FnMut(I::Item) -> Result<T>,
{
    let mut ret: Vec<_> = match direction {
        Direction::Forward => source.into_iter().map(f).collect::<Result<_>>(),
        Direction::Backward => source.into_iter().rev().map(f).collect(),
    }?;
    if direction == Direction::Backward {
        ret.reverse();
    }
    Ok(ret)
}
