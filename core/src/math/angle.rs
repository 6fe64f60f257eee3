//! Angle helpers shared by the template families. All angles are degrees.

/// Folds any angle into [0, 360).
pub fn fold_full_turn(angle: f32) -> f32 {
    let folded = angle.rem_euclid(360.0);
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Unsigned separation of two directions, in [0, 180].
pub fn separation(a: f32, b: f32) -> f32 {
    let diff = fold_full_turn(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Bearing of the vector from `(from_x, from_y)` to `(to_x, to_y)`, in [0, 360).
pub fn bearing(from_x: f32, from_y: f32, to_x: f32, to_y: f32) -> f32 {
    fold_full_turn((to_y - from_y).atan2(to_x - from_x).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn full_turn_fold_wraps_negatives() {
        assert_abs_diff_eq!(fold_full_turn(-45.0), 315.0);
        assert_abs_diff_eq!(fold_full_turn(720.0), 0.0);
    }

    #[test]
    fn separation_is_symmetric_and_bounded() {
        assert_abs_diff_eq!(separation(10.0, 350.0), 20.0);
        assert_abs_diff_eq!(separation(350.0, 10.0), 20.0);
        assert_abs_diff_eq!(separation(0.0, 180.0), 180.0);
    }

    #[test]
    fn bearing_follows_grid_axes() {
        assert_abs_diff_eq!(bearing(0.0, 0.0, 5.0, 0.0), 0.0);
        assert_abs_diff_eq!(bearing(0.0, 0.0, 0.0, 5.0), 90.0);
        assert_abs_diff_eq!(bearing(0.0, 0.0, 0.0, -5.0), 270.0);
    }
}
