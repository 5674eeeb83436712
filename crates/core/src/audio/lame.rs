//! Native MP3 encoding through LAME.

use crate::capability::{BlockEncoder, Mp3EncoderFactory};
use crate::error::{ConversionError, Result};
use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, Quality};

/// Bytes LAME may emit when flushing.
const FLUSH_RESERVE: usize = 7200;

fn mp3_error(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::encoding("MP3", e.to_string())
}

fn bitrate(kbps: u32) -> Result<Bitrate> {
    Ok(match kbps {
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => return Err(mp3_error(format!("unsupported bitrate {} kbps", other))),
    })
}

/// Creates stereo LAME encoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct LameEncoderFactory;

impl Mp3EncoderFactory for LameEncoderFactory {
    fn create(&self, sample_rate: u32, bitrate_kbps: u32) -> Result<Box<dyn BlockEncoder>> {
        let mut builder = Builder::new().ok_or_else(|| mp3_error("failed to allocate LAME"))?;
        builder.set_num_channels(2).map_err(mp3_error)?;
        builder.set_sample_rate(sample_rate).map_err(mp3_error)?;
        builder.set_brate(bitrate(bitrate_kbps)?).map_err(mp3_error)?;
        builder.set_quality(Quality::Good).map_err(mp3_error)?;
        let encoder = builder.build().map_err(mp3_error)?;
        Ok(Box::new(LameBlockEncoder { encoder }))
    }
}

struct LameBlockEncoder {
    encoder: Encoder,
}

impl BlockEncoder for LameBlockEncoder {
    fn encode_block(&mut self, left: &[i16], right: &[i16]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(left.len()));
        self.encoder
            .encode_to_vec(DualPcm { left, right }, &mut out)
            .map_err(mp3_error)?;
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(FLUSH_RESERVE);
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(mp3_error)?;
        Ok(out)
    }
}
