//! Primitives for scoring a position in terms of centipawns.
//!
//! A [`Score`] holds a midgame and an endgame value which are blended by
//! the evaluator according to the remaining material.

use std::fmt;
use std::ops::*;

/// An evaluation value, in internal centipawns.
pub type Value = i32;

/// A midgame / endgame score pair.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct Score(pub Value, pub Value);

impl Score {
    pub const ZERO: Score = Score(0, 0);

    /// Creates a new score from a midgame and endgame value.
    #[inline(always)]
    pub const fn new(mg: Value, eg: Value) -> Self {
        Score(mg, eg)
    }

    /// The midgame half of the score.
    #[inline(always)]
    pub const fn mg(self) -> Value {
        self.0
    }

    /// The endgame half of the score.
    #[inline(always)]
    pub const fn eg(self) -> Value {
        self.1
    }
}

impl Add for Score {
    type Output = Score;

    #[inline(always)]
    fn add(self, other: Score) -> Score {
        Score(self.0 + other.0, self.1 + other.1)
    }
}

impl AddAssign for Score {
    #[inline(always)]
    fn add_assign(&mut self, other: Score) {
        *self = *self + other;
    }
}

impl Sub for Score {
    type Output = Score;

    #[inline(always)]
    fn sub(self, other: Score) -> Score {
        Score(self.0 - other.0, self.1 - other.1)
    }
}

impl SubAssign for Score {
    #[inline(always)]
    fn sub_assign(&mut self, other: Score) {
        *self = *self - other;
    }
}

impl Neg for Score {
    type Output = Score;

    #[inline(always)]
    fn neg(self) -> Score {
        Score(-self.0, -self.1)
    }
}

impl Mul<Value> for Score {
    type Output = Score;

    #[inline(always)]
    fn mul(self, rhs: Value) -> Score {
        Score(self.0 * rhs, self.1 * rhs)
    }
}

impl Mul<Score> for Value {
    type Output = Score;

    #[inline(always)]
    fn mul(self, rhs: Score) -> Score {
        rhs * self
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}
