//! The immutable element tree (component of C5's data model): a closed sum
//! type over the ten element variants named in the spec, each carrying the
//! common layout attributes (margin, alignment, visibility, duration
//! bounds). Builder-validated at construction; the layout pass in
//! [`crate::layout`] mirrors this tree with its own mutable scratch state
//! rather than mutating elements in place — see `DESIGN.md`.

pub mod absolute;
pub mod grid;
pub mod play;
pub mod repeat;
pub mod simple;
pub mod stack;

use std::sync::Arc;

use anyhow::Result;
use hashbrown::HashSet;

use crate::{
    error::GeometryError,
    quant::{ChannelId, Label, Time},
};

pub use self::{
    absolute::{Absolute, Entry as AbsoluteEntry},
    grid::{Entry as GridEntry, Grid, GridLength, GridLengthUnit},
    play::Play,
    repeat::Repeat,
    simple::{Barrier, SetFreq, SetPhase, ShiftFreq, ShiftPhase, SwapPhase},
    stack::{Direction, Stack},
};

pub type ElementRef = Arc<Element>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    End,
    Start,
    Center,
    Stretch,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub common: ElementCommon,
    pub variant: ElementVariant,
}

#[derive(Debug, Clone)]
pub struct ElementCommon {
    margin: (Time, Time),
    alignment: Alignment,
    visibility: bool,
    duration: Option<Time>,
    max_duration: Time,
    min_duration: Time,
    label: Option<Label>,
}

#[derive(Debug, Clone)]
pub struct ElementCommonBuilder(ElementCommon);

/// Bounds a node's content budget/result to `[min_duration, max_duration]`.
#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: Time,
    max: Time,
}

/// Every element variant reports a "natural" inner duration (before margin
/// and duration-bound clamping) and the set of channels it addresses.
/// `ElementVariant::measure` in this module is the undecorated
/// `measure_override` of spec §4.5; the margin/duration wrapper lives in
/// [`crate::layout`].
pub trait Measure {
    fn measure(&self) -> Time;
    fn channels(&self) -> &[ChannelId];
}

macro_rules! impl_variant {
    ($($variant:ident),*$(,)?) => {
        #[derive(Debug, Clone)]
        pub enum ElementVariant {
            $($variant($variant),)*
        }

        $(
        impl From<$variant> for ElementVariant {
            fn from(v: $variant) -> Self {
                Self::$variant(v)
            }
        }
        )*

        impl Measure for ElementVariant {
            fn measure(&self) -> Time {
                match self {
                    $(ElementVariant::$variant(v) => v.measure(),)*
                }
            }

            fn channels(&self) -> &[ChannelId] {
                match self {
                    $(ElementVariant::$variant(v) => v.channels(),)*
                }
            }
        }
    };
}

impl_variant!(
    Play, ShiftPhase, SetPhase, ShiftFreq, SetFreq, SwapPhase, Barrier, Repeat, Stack, Absolute,
    Grid,
);

impl Element {
    pub fn new(common: ElementCommon, variant: impl Into<ElementVariant>) -> Self {
        Self {
            common,
            variant: variant.into(),
        }
    }
}

impl ElementCommon {
    #[must_use]
    pub const fn margin(&self) -> (Time, Time) {
        self.margin
    }

    #[must_use]
    pub const fn alignment(&self) -> Alignment {
        self.alignment
    }

    #[must_use]
    pub const fn visibility(&self) -> bool {
        self.visibility
    }

    #[must_use]
    pub const fn duration(&self) -> Option<Time> {
        self.duration
    }

    #[must_use]
    pub const fn max_duration(&self) -> Time {
        self.max_duration
    }

    #[must_use]
    pub const fn min_duration(&self) -> Time {
        self.min_duration
    }

    #[must_use]
    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    fn min_max_duration(&self) -> MinMax {
        let min_max = MinMax::new(self.min_duration, self.max_duration);
        let max = min_max.clamp(self.duration.unwrap_or(Time::INFINITY));
        let min = min_max.clamp(self.duration.unwrap_or(Time::ZERO));
        MinMax::new(min, max)
    }

    fn total_margin(&self) -> Time {
        self.margin.0 + self.margin.1
    }
}

impl ElementCommonBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn margin(&mut self, margin: (Time, Time)) -> &mut Self {
        self.0.margin = margin;
        self
    }

    /// Expands a bare scalar margin `m` into `(m, m)`, matching the wire
    /// contract's `float | (float, float)` margin field.
    pub const fn margin_uniform(&mut self, margin: Time) -> &mut Self {
        self.0.margin = (margin, margin);
        self
    }

    pub const fn alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.0.alignment = alignment;
        self
    }

    pub const fn visibility(&mut self, visibility: bool) -> &mut Self {
        self.0.visibility = visibility;
        self
    }

    pub const fn duration(&mut self, duration: Option<Time>) -> &mut Self {
        self.0.duration = duration;
        self
    }

    pub const fn max_duration(&mut self, max_duration: Time) -> &mut Self {
        self.0.max_duration = max_duration;
        self
    }

    pub const fn min_duration(&mut self, min_duration: Time) -> &mut Self {
        self.0.min_duration = min_duration;
        self
    }

    pub fn label(&mut self, label: Option<Label>) -> &mut Self {
        self.0.label = label;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.0;
        if !(v.margin.0.value().is_finite() && v.margin.1.value().is_finite()) {
            return Err(GeometryError(format!("invalid margin {:?}", v.margin)).into());
        }
        if let Some(d) = v.duration {
            if !(d.value().is_finite() && d >= Time::ZERO) {
                return Err(GeometryError(format!("invalid duration {d:?}")).into());
            }
        }
        if !(v.min_duration.value().is_finite() && v.min_duration >= Time::ZERO) {
            return Err(GeometryError(format!("invalid min_duration {:?}", v.min_duration)).into());
        }
        if v.max_duration < Time::ZERO {
            return Err(GeometryError(format!("invalid max_duration {:?}", v.max_duration)).into());
        }
        if v.min_duration > v.max_duration {
            return Err(GeometryError(format!(
                "min_duration {:?} exceeds max_duration {:?}",
                v.min_duration, v.max_duration
            ))
            .into());
        }
        Ok(())
    }

    pub fn build(&self) -> Result<ElementCommon> {
        self.validate()?;
        Ok(self.0.clone())
    }
}

impl Default for ElementCommonBuilder {
    fn default() -> Self {
        Self(ElementCommon {
            margin: (Time::ZERO, Time::ZERO),
            alignment: Alignment::End,
            visibility: true,
            duration: None,
            max_duration: Time::INFINITY,
            min_duration: Time::ZERO,
            label: None,
        })
    }
}

impl MinMax {
    const fn new(min: Time, max: Time) -> Self {
        Self { min, max }
    }

    fn clamp(&self, value: Time) -> Time {
        value.min(self.max).max(self.min)
    }
}

impl Measure for Element {
    /// The undecorated duration plus this node's own margin, clamped to its
    /// own `[min_duration, max_duration]` — used by containers (Stack,
    /// Grid, Absolute) when asking a child "how much room do you want".
    /// The margin/available-budget wrapper described in spec §4.5 is
    /// applied in [`crate::layout`] around a call to this.
    fn measure(&self) -> Time {
        let inner = self.variant.measure();
        let min_max = self.common.min_max_duration();
        let duration = min_max.clamp(inner) + self.common.total_margin();
        duration.max(Time::ZERO)
    }

    fn channels(&self) -> &[ChannelId] {
        self.variant.channels()
    }
}

pub(crate) fn min_max_content_budget(common: &ElementCommon, available: Time) -> (Time, Time) {
    let min_max = common.min_max_duration();
    let margin = common.total_margin();
    let budget = min_max.clamp((available - margin).max(Time::ZERO));
    (min_max.min, budget.max(min_max.min).min(min_max.max))
}

pub(crate) fn merge_channel_ids<'a, I>(ids: I) -> Vec<ChannelId>
where
    I: IntoIterator<Item: IntoIterator<Item = &'a ChannelId>>,
{
    let set = ids.into_iter().flatten().collect::<HashSet<_>>();
    set.into_iter().copied().collect()
}
