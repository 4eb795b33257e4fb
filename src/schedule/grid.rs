mod helper;

use std::str::FromStr;

use anyhow::Result;

use crate::{
    error::GridLengthError,
    quant::{ChannelId, Time},
};

use self::helper::Helper;
use super::{ElementRef, Measure, merge_channel_ids};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLengthUnit {
    Second,
    Auto,
    Star,
}

/// A grid column's size: a fixed duration (`Second`), `Auto` (grows to fit
/// its widest single-span child), or `Star` (shares remaining space by
/// ratio with other star columns), mirroring the wire `GridLength` variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLength {
    value: f64,
    unit: GridLengthUnit,
}

impl GridLength {
    pub fn fixed(value: Time) -> Result<Self> {
        if !value.value().is_finite() || value < Time::ZERO {
            return Err(GridLengthError(format!("invalid fixed grid length {value:?}")).into());
        }
        Ok(Self {
            value: value.value(),
            unit: GridLengthUnit::Second,
        })
    }

    #[must_use]
    pub const fn auto() -> Self {
        Self {
            value: 0.0,
            unit: GridLengthUnit::Auto,
        }
    }

    pub fn star(ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(GridLengthError(format!("invalid star grid length ratio {ratio}")).into());
        }
        Ok(Self {
            value: ratio,
            unit: GridLengthUnit::Star,
        })
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self.unit, GridLengthUnit::Second)
    }

    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self.unit, GridLengthUnit::Auto)
    }

    #[must_use]
    pub const fn is_star(&self) -> bool {
        matches!(self.unit, GridLengthUnit::Star)
    }
}

impl FromStr for GridLength {
    type Err = anyhow::Error;

    /// Accepts `"auto"`, `"*"`/`"<ratio>*"`, or a bare number as seconds —
    /// the textual shorthand this module's unit tests use.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::auto());
        }
        if let Some(prefix) = trimmed.strip_suffix('*') {
            let ratio: f64 = if prefix.is_empty() {
                1.0
            } else {
                prefix
                    .parse()
                    .map_err(|e| GridLengthError(format!("unparsable grid length {s:?}: {e}")))?
            };
            return Self::star(ratio);
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|e| GridLengthError(format!("unparsable grid length {s:?}: {e}")))?;
        Self::fixed(Time::new(value).map_err(|e| GridLengthError(format!("invalid grid length {s:?}: {e}")))?)
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    element: ElementRef,
    column: usize,
    span: usize,
}

impl Entry {
    #[must_use]
    pub const fn new(element: ElementRef, column: usize, span: usize) -> Self {
        Self { element, column, span }
    }

    #[must_use]
    pub fn element(&self) -> &ElementRef {
        &self.element
    }
}

/// Columns laid out left-to-right with CSS-grid-like sizing; children
/// occupy a `(column, span)` cell range and size the span's columns to fit
/// (single-span requirements resolved before multi-span ones, matching the
/// two-pass algorithm `schedule/grid/helper.rs` implements).
#[derive(Debug, Clone)]
pub struct Grid {
    children: Vec<Entry>,
    columns: Vec<GridLength>,
    channel_ids: Vec<ChannelId>,
}

/// A child's placement within its parent's arranged duration: the absolute
/// column-span start offset and width. The child's own alignment then
/// places it inside this slot (see `crate::layout`).
#[derive(Debug, Clone, Copy)]
pub struct ChildSlot {
    pub offset: Time,
    pub duration: Time,
}

impl Grid {
    #[must_use]
    pub fn new(children: Vec<Entry>, mut columns: Vec<GridLength>) -> Self {
        if columns.is_empty() {
            columns = vec![GridLength::star(1.0).expect("1.0 is a valid star ratio")];
        }
        let channel_ids = merge_channel_ids(children.iter().map(|e| e.element.channels()));
        Self {
            children,
            columns,
            channel_ids,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[GridLength] {
        &self.columns
    }

    #[must_use]
    pub fn children(&self) -> &[Entry] {
        &self.children
    }

    fn column_sizes(&self) -> Vec<Time> {
        let mut helper = Helper::new(&self.columns);
        let requirements: Vec<_> = self
            .children
            .iter()
            .map(|e| (e.element.measure(), e.column, e.span))
            .collect();
        for &(duration, column, span) in &requirements {
            let span = helper.normalize_span(column, span);
            if span.span() == 1 {
                helper.expand_span_to_fit(span, duration);
            }
        }
        for &(duration, column, span) in &requirements {
            let span = helper.normalize_span(column, span);
            if span.span() != 1 {
                helper.expand_span_to_fit(span, duration);
            }
        }
        helper.into_column_sizes()
    }

    /// Slots for each child (in original order) once the grid has been
    /// allocated `final_duration` of total width.
    pub fn child_slots(&self, final_duration: Time) -> Vec<ChildSlot> {
        let column_sizes = self.column_sizes();
        let mut helper = Helper::new_with_column_sizes(&self.columns, column_sizes);
        helper.expand_to_fit(final_duration);
        let column_starts = helper.column_starts();
        self.children
            .iter()
            .map(|e| {
                let span = helper.normalize_span(e.column, e.span);
                let start = span.start();
                let span = span.span();
                ChildSlot {
                    offset: column_starts[start],
                    duration: column_starts[start + span] - column_starts[start],
                }
            })
            .collect()
    }
}

impl Measure for Grid {
    fn measure(&self) -> Time {
        self.column_sizes().iter().copied().sum()
    }

    fn channels(&self) -> &[ChannelId] {
        &self.channel_ids
    }
}
