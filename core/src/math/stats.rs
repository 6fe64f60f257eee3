pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f32]) -> Option<f32> {
        if samples.is_empty() {
            return None;
        }
        let sum: f32 = samples.iter().sum();
        Some(sum / samples.len() as f32)
    }

    /// Population variance; `None` for fewer than two samples.
    pub fn variance(samples: &[f32]) -> Option<f32> {
        if samples.len() < 2 {
            return None;
        }
        let mean = Self::mean(samples)?;
        let sum_sq: f32 = samples.iter().map(|&v| (v - mean) * (v - mean)).sum();
        Some(sum_sq / samples.len() as f32)
    }

    pub fn std_dev(samples: &[f32]) -> Option<f32> {
        Self::variance(samples).map(f32::sqrt)
    }

    pub fn max(samples: &[f32]) -> Option<f32> {
        samples.iter().copied().reduce(f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_sequence_has_no_statistics() {
        assert_eq!(StatsHelper::mean(&[]), None);
        assert_eq!(StatsHelper::variance(&[]), None);
        assert_eq!(StatsHelper::max(&[]), None);
    }

    #[test]
    fn variance_needs_two_samples() {
        assert_eq!(StatsHelper::variance(&[4.0]), None);
        assert_abs_diff_eq!(StatsHelper::variance(&[1.0, 3.0]).unwrap(), 1.0);
        assert_abs_diff_eq!(StatsHelper::std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 2.0);
    }

    #[test]
    fn max_handles_negatives() {
        assert_eq!(StatsHelper::max(&[-3.0, -1.0, -2.0]), Some(-1.0));
    }
}
