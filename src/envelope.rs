//! Width+plateau composition over a [`Shape`] (component C2).

use crate::{
    quant::Time,
    shape::Shape,
};

/// `shape = None` is represented as a flat envelope: the constructor folds
/// `width` into `plateau` and zeroes `width`, matching the teacher's
/// `Envelope::new` normalization so downstream code has a single flat-vs-
/// shaped branch to worry about.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    shape: Option<Shape>,
    width: Time,
    plateau: Time,
}

impl Envelope {
    #[must_use]
    pub fn new(mut shape: Option<Shape>, mut width: Time, plateau: Time) -> Self {
        let mut plateau = plateau;
        if shape.is_none() {
            plateau += width;
            width = Time::ZERO;
        }
        if width == Time::ZERO {
            shape = None;
        }
        Self {
            shape,
            width,
            plateau,
        }
    }

    #[must_use]
    pub const fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    #[must_use]
    pub const fn width(&self) -> Time {
        self.width
    }

    #[must_use]
    pub const fn plateau(&self) -> Time {
        self.plateau
    }

    #[must_use]
    pub fn duration(&self) -> Time {
        self.width + self.plateau
    }

    /// `sample(t)` per the three-region piecewise definition: rising half,
    /// flat plateau, falling half, zero elsewhere.
    #[must_use]
    pub fn sample(&self, t: Time) -> f64 {
        let Some(shape) = &self.shape else {
            let t = t.value();
            return if (0.0..self.plateau.value()).contains(&t) {
                1.0
            } else {
                0.0
            };
        };
        let t = t.value();
        let w = self.width.value();
        let p = self.plateau.value();
        if (0.0..w / 2.0).contains(&t) {
            shape.sample(t / w - 0.5)
        } else if (w / 2.0..w / 2.0 + p).contains(&t) {
            1.0
        } else if (w / 2.0 + p..w + p).contains(&t) {
            shape.sample((t - p) / w - 0.5)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_envelope_folds_width_into_plateau() {
        let env = Envelope::new(None, Time::new(5.0).unwrap(), Time::new(3.0).unwrap());
        assert_eq!(env.width(), Time::ZERO);
        assert_eq!(env.plateau(), Time::new(8.0).unwrap());
        assert_eq!(env.duration(), Time::new(8.0).unwrap());
        assert_eq!(env.sample(Time::new(7.9).unwrap()), 1.0);
        assert_eq!(env.sample(Time::new(8.1).unwrap()), 0.0);
    }

    #[test]
    fn shaped_envelope_is_continuous_at_region_boundaries() {
        let env = Envelope::new(
            Some(Shape::new_hann()),
            Time::new(10.0).unwrap(),
            Time::new(4.0).unwrap(),
        );
        assert_eq!(env.duration(), Time::new(14.0).unwrap());
        // At t = w/2 the shape argument is 0, Hann(0) = 1, matching the flat
        // plateau value on the other side of the boundary.
        assert_eq!(env.sample(Time::new(5.0).unwrap()), 1.0);
        assert_eq!(env.sample(Time::new(9.0).unwrap()), 1.0);
        assert_eq!(env.sample(Time::ZERO), 0.0);
        assert_eq!(env.sample(Time::new(14.0).unwrap()), 0.0);
    }
}
