// Transfer functions and gamut conversions used by the screenshot encoder.
//
// All HDR math runs in linear BT.2020 nits, the reference space between the
// source surface encoding and the delivery encoding.

use super::ColorSpace;

/// scRGB 1.0 in nits.
pub const SCRGB_WHITE_NITS: f32 = 80.0;

/// PQ reference ceiling in nits.
pub const PQ_MAX_NITS: f32 = 10000.0;

const PQ_M1: f32 = 2610.0 / 16384.0;
const PQ_M2: f32 = 2523.0 / 4096.0 * 128.0;
const PQ_C1: f32 = 3424.0 / 4096.0;
const PQ_C2: f32 = 2413.0 / 4096.0 * 32.0;
const PQ_C3: f32 = 2392.0 / 4096.0 * 32.0;

pub type Mat3 = [[f32; 3]; 3];

pub const BT709_TO_BT2020: Mat3 = [
    [0.627_403_9, 0.329_283_04, 0.043_313_07],
    [0.069_097_29, 0.919_540_4, 0.011_362_32],
    [0.016_391_44, 0.088_013_31, 0.895_595_25],
];

pub const BT2020_TO_BT709: Mat3 = [
    [1.660_491, -0.587_641_1, -0.072_849_86],
    [-0.124_550_47, 1.132_899_9, -0.008_349_42],
    [-0.018_150_76, -0.100_578_9, 1.118_729_6],
];

/// How the captured surface encodes its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Linear BT.709, 1.0 = 80 nits.
    ScRgb,
    /// PQ-encoded BT.2020.
    Pq,
    /// sRGB-encoded BT.709 (SDR).
    Gamma,
}

impl From<ColorSpace> for SourceEncoding {
    fn from(space: ColorSpace) -> Self {
        match space {
            ColorSpace::RgbFullG22P709 => SourceEncoding::Gamma,
            ColorSpace::RgbFullG2084P2020 => SourceEncoding::Pq,
            ColorSpace::RgbFullG10P709 => SourceEncoding::ScRgb,
        }
    }
}

pub fn mul(m: &Mat3, v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

pub fn linear_to_srgb(channel: f32) -> f32 {
    if channel <= 0.003_130_8 {
        channel * 12.92
    } else {
        1.055 * channel.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.040_45 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// PQ signal (0-1) → absolute luminance in nits.
pub fn pq_to_nits(signal: f32) -> f32 {
    let e = signal.clamp(0.0, 1.0).powf(1.0 / PQ_M2);
    let num = (e - PQ_C1).max(0.0);
    let den = PQ_C2 - PQ_C3 * e;
    (num / den).powf(1.0 / PQ_M1) * PQ_MAX_NITS
}

/// Absolute luminance in nits → PQ signal (0-1).
pub fn nits_to_pq(nits: f32) -> f32 {
    let y = (nits / PQ_MAX_NITS).clamp(0.0, 1.0).powf(PQ_M1);
    ((PQ_C1 + PQ_C2 * y) / (1.0 + PQ_C3 * y)).powf(PQ_M2)
}

/// Decode a source pixel into linear BT.2020 nits.
pub fn to_bt2020_nits(rgb: [f32; 3], encoding: SourceEncoding) -> [f32; 3] {
    match encoding {
        SourceEncoding::ScRgb => mul(&BT709_TO_BT2020, rgb.map(|c| c * SCRGB_WHITE_NITS)),
        SourceEncoding::Pq => rgb.map(pq_to_nits),
        SourceEncoding::Gamma => mul(
            &BT709_TO_BT2020,
            rgb.map(|c| srgb_to_linear(c.clamp(0.0, 1.0)) * SCRGB_WHITE_NITS),
        ),
    }
}

/// HDR delivery transform: source → BT.2020 nits → clamp to `[0, peak_nits]`
/// → linear scRGB (BT.709, 1.0 = 80 nits).
///
/// Out-of-709 colors come back as negative scRGB components, which is the
/// expected representation.
pub fn hdr_to_scrgb(rgb: [f32; 3], encoding: SourceEncoding, peak_nits: f32) -> [f32; 3] {
    let ceiling = peak_nits.max(0.0);
    let nits = to_bt2020_nits(rgb, encoding).map(|c| c.clamp(0.0, ceiling));
    mul(&BT2020_TO_BT709, nits).map(|c| c / SCRGB_WHITE_NITS)
}

/// SDR delivery transform: source → sRGB-encoded 8-bit BT.709.
pub fn sdr_to_srgb8(rgb: [f32; 3], encoding: SourceEncoding) -> [u8; 3] {
    let encoded = match encoding {
        SourceEncoding::Gamma => rgb,
        SourceEncoding::ScRgb => rgb.map(|c| linear_to_srgb(c.clamp(0.0, 1.0))),
        SourceEncoding::Pq => {
            let linear = mul(&BT2020_TO_BT709, rgb.map(pq_to_nits));
            linear.map(|c| linear_to_srgb((c / SCRGB_WHITE_NITS).clamp(0.0, 1.0)))
        }
    };
    encoded.map(quantize_u8)
}

pub fn quantize_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_pq_reference_points() {
        assert!(approx(pq_to_nits(0.0), 0.0, 1e-3));
        assert!(approx(pq_to_nits(1.0), 10000.0, 0.5));
        // 100 nits ≈ 0.508 PQ
        assert!(approx(nits_to_pq(100.0), 0.508, 1e-3));
        assert!(approx(pq_to_nits(nits_to_pq(1000.0)), 1000.0, 0.5));
    }

    #[test]
    fn test_srgb_round_trip_midpoint() {
        let encoded = linear_to_srgb(0.18);
        assert!(approx(srgb_to_linear(encoded), 0.18, 1e-5));
        assert!(approx(linear_to_srgb(1.0), 1.0, 1e-6));
    }

    #[test]
    fn test_gamut_matrices_are_inverse() {
        let v = mul(&BT2020_TO_BT709, mul(&BT709_TO_BT2020, [0.3, 0.6, 0.9]));
        assert!(approx(v[0], 0.3, 1e-4));
        assert!(approx(v[1], 0.6, 1e-4));
        assert!(approx(v[2], 0.9, 1e-4));
    }

    #[test]
    fn test_hdr_clamp_to_peak() {
        // 50.0 scRGB white = 4000 nits, clamped to 1000 nits = 12.5 scRGB
        let out = hdr_to_scrgb([50.0, 50.0, 50.0], SourceEncoding::ScRgb, 1000.0);
        for c in out {
            assert!(approx(c, 12.5, 1e-2), "got {}", c);
        }
    }

    #[test]
    fn test_hdr_scrgb_passthrough_below_peak() {
        let out = hdr_to_scrgb([0.5, 0.25, 0.125], SourceEncoding::ScRgb, 10000.0);
        assert!(approx(out[0], 0.5, 1e-3));
        assert!(approx(out[1], 0.25, 1e-3));
        assert!(approx(out[2], 0.125, 1e-3));
    }

    #[test]
    fn test_hdr_negative_values_are_clamped() {
        let out = hdr_to_scrgb([-1.0, -1.0, -1.0], SourceEncoding::ScRgb, 1000.0);
        for c in out {
            assert!(approx(c, 0.0, 1e-6));
        }
    }

    #[test]
    fn test_hdr_pq_white() {
        let signal = nits_to_pq(80.0);
        let out = hdr_to_scrgb([signal; 3], SourceEncoding::Pq, 10000.0);
        for c in out {
            assert!(approx(c, 1.0, 1e-2), "got {}", c);
        }
    }

    #[test]
    fn test_sdr_encode() {
        assert_eq!(sdr_to_srgb8([1.0, 0.0, 2.0], SourceEncoding::ScRgb), [255, 0, 255]);
        assert_eq!(sdr_to_srgb8([0.5, 0.5, 0.5], SourceEncoding::Gamma), [128, 128, 128]);
        let mid = sdr_to_srgb8([0.2140, 0.2140, 0.2140], SourceEncoding::ScRgb);
        assert!(mid[0] >= 127 && mid[0] <= 128);
    }
}
