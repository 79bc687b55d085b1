//! Fixed-stride downsampling of raw RGBA pixel data.

/// Keep every `stride`-th channel value, normalized to `[0, 1]`.
///
/// Order is preserved and the result has `ceil(data.len() / stride)` entries,
/// entry `i` being `data[i * stride] / 255`. A zero stride is treated as 1.
pub fn downsample(data: &[u8], stride: usize) -> Vec<f64> {
    data.iter()
        .step_by(stride.max(1))
        .map(|&channel| f64::from(channel) / 255.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SAMPLE_STRIDE, SURFACE_HEIGHT, SURFACE_WIDTH};

    #[test]
    fn test_full_surface_sample_shape() {
        let len = (SURFACE_WIDTH * SURFACE_HEIGHT * 4) as usize;
        let buffer: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();

        let sample = downsample(&buffer, SAMPLE_STRIDE);
        assert_eq!(sample.len(), 1600);
        for (i, value) in sample.iter().enumerate() {
            assert!((0.0..=1.0).contains(value));
            assert_eq!(*value, f64::from(buffer[i * SAMPLE_STRIDE]) / 255.0);
        }
    }

    #[test]
    fn test_partial_trailing_window_is_kept() {
        let buffer = vec![255u8; 250];
        let sample = downsample(&buffer, 100);
        assert_eq!(sample, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_and_zero_stride() {
        assert!(downsample(&[], 100).is_empty());
        assert_eq!(downsample(&[0, 51, 255], 0), vec![0.0, 0.2, 1.0]);
    }
}
