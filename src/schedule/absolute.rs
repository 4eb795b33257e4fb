use anyhow::{Result, bail};

use crate::quant::{ChannelId, Time};

use super::{ElementRef, Measure, merge_channel_ids};

#[derive(Debug, Clone)]
pub struct Entry {
    time: Time,
    element: ElementRef,
}

impl Entry {
    pub fn new(time: Time, element: ElementRef) -> Result<Self> {
        if !time.value().is_finite() {
            bail!("invalid absolute time {time:?}");
        }
        Ok(Self { time, element })
    }

    #[must_use]
    pub const fn time(&self) -> Time {
        self.time
    }

    #[must_use]
    pub fn element(&self) -> &ElementRef {
        &self.element
    }
}

/// Children placed at explicit, independent start times rather than
/// sequenced relative to one another. The element's own duration is used
/// as-is; nothing stretches or pushes a sibling out of the way.
#[derive(Debug, Clone)]
pub struct Absolute {
    children: Vec<Entry>,
    channel_ids: Vec<ChannelId>,
}

impl Absolute {
    #[must_use]
    pub fn new(children: Vec<Entry>) -> Self {
        let channel_ids = merge_channel_ids(children.iter().map(|e| e.element.channels()));
        Self { children, channel_ids }
    }

    #[must_use]
    pub fn children(&self) -> &[Entry] {
        &self.children
    }
}

impl Measure for Absolute {
    fn measure(&self) -> Time {
        self.children
            .iter()
            .map(|e| e.time + e.element.measure())
            .fold(Time::ZERO, Time::max)
    }

    fn channels(&self) -> &[ChannelId] {
        &self.channel_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Element, ElementCommonBuilder, SetPhase};

    fn leaf(duration: Time) -> ElementRef {
        let common = ElementCommonBuilder::new().duration(Some(duration)).build().unwrap();
        ElementRef::new(Element::new(common, SetPhase::new(ChannelId::new(0), crate::quant::Phase::ZERO).unwrap()))
    }

    #[test]
    fn measure_is_the_latest_child_end() {
        let a = Entry::new(Time::new(1.0).unwrap(), leaf(Time::new(2.0).unwrap())).unwrap();
        let b = Entry::new(Time::new(5.0).unwrap(), leaf(Time::new(1.0).unwrap())).unwrap();
        let absolute = Absolute::new(vec![a, b]);
        assert_eq!(absolute.measure(), Time::new(6.0).unwrap());
    }
}
