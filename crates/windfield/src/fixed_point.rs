// Fixed-point encoding for the integer accumulation channels

use crate::constants::FIXED_POINT_SCALE;
use glam::Vec3;

/// Largest magnitude that survives encoding without saturating
pub const MAX_REPRESENTABLE: f32 = i32::MAX as f32 / FIXED_POINT_SCALE;

/// Encode a single wind component. Values outside the representable range saturate.
pub fn encode(value: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    // `as` saturates on overflow
    (value * FIXED_POINT_SCALE).round() as i32
}

pub fn decode(value: i32) -> f32 {
    value as f32 / FIXED_POINT_SCALE
}

pub fn encode_vec3(v: Vec3) -> [i32; 3] {
    [encode(v.x), encode(v.y), encode(v.z)]
}

pub fn decode_vec3(v: [i32; 3]) -> Vec3 {
    Vec3::new(decode(v[0]), decode(v[1]), decode(v[2]))
}

/// Scale an encoded value by a real factor, rounding back to the grid
pub fn scale(value: i32, factor: f32) -> i32 {
    (value as f64 * factor as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const QUANTUM: f32 = 1.0 / FIXED_POINT_SCALE;

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-1.0)]
    #[case(0.333_333)]
    #[case(-17.25)]
    #[case(1234.567)]
    fn test_round_trip_within_one_quantum(#[case] v: f32) {
        let decoded = decode(encode(v));
        assert!(
            (decoded - v).abs() <= QUANTUM,
            "{} decoded as {}",
            v,
            decoded
        );
    }

    #[test]
    fn test_saturates_out_of_range() {
        assert_eq!(encode(MAX_REPRESENTABLE * 4.0), i32::MAX);
        assert_eq!(encode(-MAX_REPRESENTABLE * 4.0), i32::MIN);
    }

    #[test]
    fn test_non_finite_encodes_to_zero() {
        assert_eq!(encode(f32::NAN), 0);
        assert_eq!(encode(f32::INFINITY), 0);
    }

    #[test]
    fn test_opposite_values_cancel_exactly() {
        let a = encode_vec3(Vec3::new(1.0, -0.3, 0.7));
        let b = encode_vec3(Vec3::new(-1.0, 0.3, -0.7));
        let sum = [a[0] + b[0], a[1] + b[1], a[2] + b[2]];
        assert_eq!(sum, [0, 0, 0]);
    }
}
