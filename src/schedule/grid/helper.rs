use crate::{quant::Time, schedule::GridLength};

#[derive(Debug, Clone, Copy)]
pub(super) struct NormalizedSpan {
    start: usize,
    span: usize,
}

#[derive(Debug)]
pub(super) struct Helper<'a> {
    column_sizes: Vec<Time>,
    columns: &'a [GridLength],
}

impl NormalizedSpan {
    pub(super) const fn start(&self) -> usize {
        self.start
    }

    pub(super) const fn span(&self) -> usize {
        self.span
    }
}

impl<'a> Helper<'a> {
    pub(super) fn new(columns: &'a [GridLength]) -> Self {
        let column_sizes = columns
            .iter()
            .map(|c| {
                if c.is_fixed() {
                    Time::new(c.value()).expect("fixed GridLength values are validated finite")
                } else {
                    Time::ZERO
                }
            })
            .collect();
        Self {
            column_sizes,
            columns,
        }
    }

    pub(super) fn new_with_column_sizes(columns: &'a [GridLength], column_sizes: Vec<Time>) -> Self {
        assert!(columns.len() == column_sizes.len());
        Self {
            column_sizes,
            columns,
        }
    }

    pub(super) fn column_starts(&self) -> Vec<Time> {
        prefix_sum(&self.column_sizes)
    }

    pub(super) fn into_column_sizes(self) -> Vec<Time> {
        self.column_sizes
    }

    pub(super) fn normalize_span(&self, col: usize, span: usize) -> NormalizedSpan {
        let n_col = self.columns.len();
        let col = col.min(n_col - 1);
        let span = span.min(n_col - col);
        NormalizedSpan { start: col, span }
    }

    pub(super) fn expand_to_fit(&mut self, required: Time) -> bool {
        let span = NormalizedSpan {
            start: 0,
            span: self.columns.len(),
        };
        self.expand_span_to_fit(span, required)
    }

    /// Expand span of columns to fit the new duration, return true if expanded
    /// or already fit.
    pub(super) fn expand_span_to_fit(&mut self, span: NormalizedSpan, required: Time) -> bool {
        let NormalizedSpan { start, span } = span;
        let current: Time = self.column_sizes.iter().skip(start).take(span).sum();
        if current >= required {
            return true;
        }
        if span == 1 {
            return if self.columns[start].is_fixed() {
                false
            } else {
                self.column_sizes[start] = required;
                true
            };
        }
        let remaining = required - current;
        let span = NormalizedSpan { start, span };
        self.expand_span_by_star_ratio(span, remaining) || self.expand_span_by_auto_count(span, remaining)
    }

    fn expand_span_by_auto_count(&mut self, span: NormalizedSpan, remaining: Time) -> bool {
        let NormalizedSpan { start, span } = span;
        let n_auto = self.columns.iter().skip(start).take(span).filter(|c| c.is_auto()).count();
        if n_auto == 0 {
            return false;
        }
        #[expect(clippy::cast_precision_loss)]
        let increment = remaining / n_auto as f64;
        self.column_sizes
            .iter_mut()
            .zip(self.columns)
            .skip(start)
            .take(span)
            .filter(|(_, c)| c.is_auto())
            .for_each(|(s, _)| *s += increment);
        true
    }

    fn expand_span_by_star_ratio(&mut self, span: NormalizedSpan, mut remaining: Time) -> bool {
        let NormalizedSpan { start, span } = span;
        let mut sorted = {
            let mut items: Vec<StarItem<'_>> = self
                .column_sizes
                .iter_mut()
                .zip(self.columns)
                .skip(start)
                .take(span)
                .filter(|(_, column)| column.is_star())
                .map(|(column_size, column)| StarItem {
                    size_per_star: *column_size / column.value(),
                    column_size,
                    star: column.value(),
                })
                .collect();
            if items.is_empty() {
                return false;
            }
            items.sort_by_key(|x| x.size_per_star);
            items
        };
        let mut star_count = 0.0;
        for i in 0..sorted.len() {
            let next_size_per_star = sorted.get(i + 1).map_or(Time::INFINITY, |x| x.size_per_star);
            star_count += sorted[i].star;
            remaining += *sorted[i].column_size;
            let new_size_per_star = remaining / star_count;
            if new_size_per_star < next_size_per_star {
                for item in sorted.iter_mut().take(i + 1) {
                    *item.column_size = new_size_per_star * item.star;
                }
                break;
            }
        }
        return true;

        struct StarItem<'a> {
            size_per_star: Time,
            column_size: &'a mut Time,
            star: f64,
        }
    }
}

fn prefix_sum<T>(arr: &[T]) -> Vec<T>
where
    T: std::ops::Add<Output = T> + Copy + Default,
{
    let mut res = Vec::with_capacity(arr.len() + 1);
    let mut sum = T::default();
    res.push(sum);
    for &x in arr {
        sum = sum + x;
        res.push(sum);
    }
    res
}
