//! Unit newtypes for the quantities that flow through the compiler.
//!
//! Everything here wraps [`NotNan<f64>`] (or a plain integer) so that a NaN
//! arising from a malformed request is caught at construction instead of
//! silently propagating through the layout and sampling math.

use std::{
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
    sync::Arc,
};

use anyhow::Result;
use ordered_float::NotNan;

use crate::Complex64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Time(NotNan<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Frequency(NotNan<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Phase(NotNan<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amplitude(NotNan<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlignedIndex(NotNan<f64>);

/// Index of a channel in `Request::channels`; also the identifier elements
/// use to refer to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(usize);

/// Index of a shape in `Request::shapes`. The wire-level sentinel `-1`
/// ("no shape", rectangular envelope) is represented as `Option::None` at
/// this layer rather than as a value of `ShapeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(Arc<str>);

macro_rules! impl_notnan_newtype {
    ($t:ident) => {
        impl $t {
            pub const ZERO: Self = Self(unsafe_notnan_zero());

            pub fn new(value: f64) -> Result<Self> {
                Ok(Self(NotNan::new(value)?))
            }

            #[must_use]
            pub const fn value(&self) -> f64 {
                self.0.into_inner()
            }
        }

        impl Add for $t {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $t {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $t {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl SubAssign for $t {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $t {
            type Output = Self;

            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $t {
            type Output = Self;

            fn mul(self, rhs: f64) -> Self::Output {
                Self::new(self.value() * rhs).expect("finite operands stay finite")
            }
        }

        impl Div<f64> for $t {
            type Output = Self;

            fn div(self, rhs: f64) -> Self::Output {
                Self::new(self.value() / rhs).expect("finite operands stay finite")
            }
        }

        impl Sum for $t {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::ZERO, Add::add)
            }
        }

        impl<'a> Sum<&'a $t> for $t {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                iter.copied().fold(Self::ZERO, Add::add)
            }
        }
    };
}

/// `NotNan::new` is not `const`; `0.0` is never NaN, so this is sound.
const fn unsafe_notnan_zero() -> NotNan<f64> {
    match NotNan::new(0.0) {
        Ok(v) => v,
        Err(_) => unreachable!(),
    }
}

impl_notnan_newtype!(Time);
impl_notnan_newtype!(Frequency);
impl_notnan_newtype!(Phase);
impl_notnan_newtype!(Amplitude);

impl Time {
    pub const INFINITY: Self = Self(unsafe_notnan_infinity());

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    #[must_use]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }
}

const fn unsafe_notnan_infinity() -> NotNan<f64> {
    match NotNan::new(f64::INFINITY) {
        Ok(v) => v,
        Err(_) => unreachable!(),
    }
}

impl Mul<Time> for Frequency {
    type Output = Phase;

    /// Phase (in cycles) accumulated by running at this frequency for the
    /// given duration.
    fn mul(self, rhs: Time) -> Self::Output {
        Phase::new(self.value() * rhs.value()).expect("finite operands stay finite")
    }
}

impl Mul<Frequency> for Time {
    type Output = Phase;

    fn mul(self, rhs: Frequency) -> Self::Output {
        rhs * self
    }
}

impl Frequency {
    /// Sample period `1/sample_rate`.
    #[must_use]
    pub fn dt(&self) -> Time {
        Time::new(1.0 / self.value()).expect("positive sample rate yields finite dt")
    }
}

impl Phase {
    /// `exp(i * 2*pi * phase)`, the unit carrier for this phase (in cycles).
    #[must_use]
    pub fn phaser(&self) -> Complex64 {
        let angle = std::f64::consts::TAU * self.value();
        Complex64::new(angle.cos(), angle.sin())
    }
}

impl AlignedIndex {
    pub fn new(time: Time, sample_rate: Frequency, align_level: i32) -> Result<Self> {
        fn scaleb(x: f64, s: i32) -> f64 {
            x * (s as f64).exp2()
        }
        let scaled_sr = scaleb(sample_rate.value(), -align_level);
        let i = (time.value() * scaled_sr).round();
        let aligned_index = scaleb(i, align_level);
        Ok(Self(NotNan::new(aligned_index)?))
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0.into_inner()
    }

    #[must_use]
    pub fn ceil(&self) -> Self {
        Self(NotNan::new(self.0.ceil()).expect("ceil of a finite value stays finite"))
    }

    #[must_use]
    pub fn floor(&self) -> Self {
        Self(NotNan::new(self.0.floor()).expect("floor of a finite value stays finite"))
    }
}

impl ChannelId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl ShapeId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl Label {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
