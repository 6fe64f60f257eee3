use crate::prelude::{ColideError, ColideResult};
use serde::{Deserialize, Serialize};

/// Piecewise-linear membership function over strictly increasing knots.
///
/// Inputs below the first knot map to the first value, inputs above the last
/// knot map to the last value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyFunction {
    knots: Vec<(f32, f32)>,
}

impl FuzzyFunction {
    pub fn new(knots: Vec<(f32, f32)>) -> ColideResult<Self> {
        let function = Self { knots };
        function.validate()?;
        Ok(function)
    }

    /// Function that is 0 at or below `low` and 1 at or above `high`.
    pub fn ramp(low: f32, high: f32) -> Self {
        Self {
            knots: vec![(low, 0.0), (high, 1.0)],
        }
    }

    /// Function that is 1 at or below `low` and 0 at or above `high`.
    pub fn falling(low: f32, high: f32) -> Self {
        Self {
            knots: vec![(low, 1.0), (high, 0.0)],
        }
    }

    /// 0 outside `[a, d]`, 1 on `[b, c]`, linear in between.
    pub fn trapezoid(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            knots: vec![(a, 0.0), (b, 1.0), (c, 1.0), (d, 0.0)],
        }
    }

    pub fn constant(value: f32) -> Self {
        Self {
            knots: vec![(0.0, value)],
        }
    }

    pub fn knots(&self) -> &[(f32, f32)] {
        &self.knots
    }

    pub fn validate(&self) -> ColideResult<()> {
        if self.knots.is_empty() {
            return Err(ColideError::InvalidConfig(
                "fuzzy function needs at least one knot".into(),
            ));
        }
        if self
            .knots
            .iter()
            .any(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ColideError::InvalidConfig(
                "fuzzy function knots must be finite".into(),
            ));
        }
        if self.knots.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
            return Err(ColideError::InvalidConfig(
                "fuzzy function knots must be strictly increasing in x".into(),
            ));
        }
        Ok(())
    }

    pub fn apply(&self, x: f32) -> f32 {
        let (first, last) = match (self.knots.first(), self.knots.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        for pair in self.knots.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
            }
        }
        last.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ramp_clamps_and_interpolates() {
        let f = FuzzyFunction::ramp(10.0, 20.0);
        assert_eq!(f.apply(-5.0), 0.0);
        assert_eq!(f.apply(25.0), 1.0);
        assert_abs_diff_eq!(f.apply(15.0), 0.5);
    }

    #[test]
    fn trapezoid_is_piecewise() {
        let f = FuzzyFunction::new(vec![(0.0, 0.0), (1.0, 1.0), (3.0, 1.0), (4.0, 0.0)]).unwrap();
        assert_abs_diff_eq!(f.apply(0.5), 0.5);
        assert_abs_diff_eq!(f.apply(2.0), 1.0);
        assert_abs_diff_eq!(f.apply(3.75), 0.25);
    }

    #[test]
    fn unordered_knots_are_rejected() {
        assert!(FuzzyFunction::new(vec![(1.0, 0.0), (1.0, 1.0)]).is_err());
        assert!(FuzzyFunction::new(Vec::new()).is_err());
    }

    #[test]
    fn single_knot_is_constant() {
        let f = FuzzyFunction::constant(0.7);
        assert_eq!(f.apply(-100.0), 0.7);
        assert_eq!(f.apply(100.0), 0.7);
    }
}
