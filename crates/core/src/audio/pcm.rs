//! Float to 16-bit PCM conversion and block-wise encoding.

use crate::capability::BlockEncoder;
use crate::error::Result;

/// Samples per channel fed to the encoder in one call.
pub const PCM_BLOCK_SIZE: usize = 1152;

/// Map a float sample to signed 16-bit.
///
/// The input is clamped to [-1, 1]; negative samples scale by 32768 and
/// non-negative ones by 32767, so both ends land exactly on the i16 range.
/// NaN maps to silence.
#[inline]
pub fn quantize_sample(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Quantize a whole channel.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| quantize_sample(s)).collect()
}

/// Aligned `(left, right)` block pairs of at most [`PCM_BLOCK_SIZE`] samples.
/// The last pair may be shorter.
pub fn pcm_blocks<'a>(
    left: &'a [i16],
    right: &'a [i16],
) -> impl Iterator<Item = (&'a [i16], &'a [i16])> + 'a {
    left.chunks(PCM_BLOCK_SIZE).zip(right.chunks(PCM_BLOCK_SIZE))
}

fn append(output: &mut Vec<u8>, chunk: Vec<u8>) {
    if !chunk.is_empty() {
        output.extend_from_slice(&chunk);
    }
}

/// Feed every block to `encoder`, appending the non-empty outputs to
/// `output` in call order. The encoder is not flushed.
pub fn encode_pcm(
    encoder: &mut dyn BlockEncoder,
    left: &[i16],
    right: &[i16],
    output: &mut Vec<u8>,
) -> Result<()> {
    for (l, r) in pcm_blocks(left, right) {
        append(output, encoder.encode_block(l, r)?);
    }
    Ok(())
}

/// Drain the encoder's buffered frames onto `output`.
pub fn flush_encoder(encoder: &mut dyn BlockEncoder, output: &mut Vec<u8>) -> Result<()> {
    append(output, encoder.flush()?);
    Ok(())
}

/// Feed every block to `encoder`, then flush it, concatenating the non-empty
/// outputs in call order. Any encoder error discards everything.
pub fn encode_blocks(encoder: &mut dyn BlockEncoder, left: &[i16], right: &[i16]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_pcm(encoder, left, right, &mut output)?;
    flush_encoder(encoder, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;

    #[test]
    fn test_quantize_range_ends() {
        assert_eq!(quantize_sample(-1.0), -32768);
        assert_eq!(quantize_sample(1.0), 32767);
        assert_eq!(quantize_sample(0.0), 0);
    }

    #[test]
    fn test_quantize_clamps_out_of_range() {
        assert_eq!(quantize_sample(-3.5), -32768);
        assert_eq!(quantize_sample(1.0001), 32767);
        assert_eq!(quantize_sample(f32::INFINITY), 32767);
        assert_eq!(quantize_sample(f32::NAN), 0);
    }

    #[test]
    fn test_quantize_is_asymmetric() {
        assert_eq!(quantize_sample(0.5), 16383);
        assert_eq!(quantize_sample(-0.5), -16384);
    }

    #[test]
    fn test_blocks_are_fixed_size_with_short_tail() {
        let samples = vec![0i16; PCM_BLOCK_SIZE * 2 + 100];
        let sizes: Vec<usize> = pcm_blocks(&samples, &samples).map(|(l, _)| l.len()).collect();
        assert_eq!(sizes, vec![PCM_BLOCK_SIZE, PCM_BLOCK_SIZE, 100]);
    }

    /// Records block sizes; emits one byte per block after the first.
    struct Recorder {
        calls: Vec<String>,
        fail_on: Option<usize>,
    }

    impl BlockEncoder for Recorder {
        fn encode_block(&mut self, left: &[i16], right: &[i16]) -> Result<Vec<u8>> {
            assert_eq!(left.len(), right.len());
            let n = self.calls.len();
            self.calls.push(format!("block:{}", left.len()));
            if self.fail_on == Some(n) {
                return Err(ConversionError::encoding("MP3", "rejected"));
            }
            Ok(if n == 0 { vec![] } else { vec![n as u8] })
        }

        fn flush(&mut self) -> Result<Vec<u8>> {
            self.calls.push("flush".to_string());
            Ok(vec![0xFF])
        }
    }

    #[test]
    fn test_encode_blocks_concatenates_in_order_then_flushes() {
        let samples = vec![1i16; PCM_BLOCK_SIZE * 2 + 1];
        let mut encoder = Recorder {
            calls: vec![],
            fail_on: None,
        };
        let out = encode_blocks(&mut encoder, &samples, &samples).unwrap();
        assert_eq!(
            encoder.calls,
            vec!["block:1152", "block:1152", "block:1", "flush"]
        );
        assert_eq!(out, vec![1, 2, 0xFF]);
    }

    #[test]
    fn test_encode_blocks_aborts_without_output_on_error() {
        let samples = vec![1i16; PCM_BLOCK_SIZE * 3];
        let mut encoder = Recorder {
            calls: vec![],
            fail_on: Some(1),
        };
        let err = encode_blocks(&mut encoder, &samples, &samples).unwrap_err();
        assert!(matches!(err, ConversionError::EncodingFailure { .. }));
        assert!(!encoder.calls.contains(&"flush".to_string()));
    }

    #[test]
    fn test_encode_pcm_leaves_flush_to_the_caller() {
        let samples = vec![1i16; PCM_BLOCK_SIZE + 1];
        let mut encoder = Recorder {
            calls: vec![],
            fail_on: None,
        };
        let mut out = vec![0xAA];
        encode_pcm(&mut encoder, &samples, &samples, &mut out).unwrap();
        assert_eq!(encoder.calls, vec!["block:1152", "block:1"]);
        assert_eq!(out, vec![0xAA, 1]);

        flush_encoder(&mut encoder, &mut out).unwrap();
        assert_eq!(encoder.calls.last().map(String::as_str), Some("flush"));
        assert_eq!(out, vec![0xAA, 1, 0xFF]);
    }

    #[test]
    fn test_empty_input_still_flushes() {
        let mut encoder = Recorder {
            calls: vec![],
            fail_on: None,
        };
        let out = encode_blocks(&mut encoder, &[], &[]).unwrap();
        assert_eq!(encoder.calls, vec!["flush"]);
        assert_eq!(out, vec![0xFF]);
    }
}
