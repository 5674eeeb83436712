//! Audio re-encoding pipeline: decode, quantize to 16-bit PCM, encode MP3.
//!
//! The pipeline is a strict sequence of stages tracked by [`AudioStage`].
//! Any failure moves it to [`AudioStage::Failed`] and no output is produced.

pub mod decode;
#[cfg(feature = "lame")]
pub mod lame;
pub mod pcm;

pub use decode::{DecodedAudio, SymphoniaDecoder};
pub use pcm::{
    encode_blocks, encode_pcm, flush_encoder, pcm_blocks, quantize, quantize_sample,
    PCM_BLOCK_SIZE,
};

use crate::capability::{AudioDecoder, Mp3EncoderFactory};
use crate::config::AudioConfig;
use crate::error::Result;
use std::fmt;
use tracing::{debug, error};

/// Progress of one re-encoding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStage {
    Idle,
    Decoding,
    Quantizing,
    Encoding,
    Flushing,
    Done,
    Failed,
}

impl fmt::Display for AudioStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioStage::Idle => "idle",
            AudioStage::Decoding => "decoding",
            AudioStage::Quantizing => "quantizing",
            AudioStage::Encoding => "encoding",
            AudioStage::Flushing => "flushing",
            AudioStage::Done => "done",
            AudioStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Stereo PCM ready for the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoPcm {
    pub sample_rate: u32,
    pub left: Vec<i16>,
    /// `None` for mono sources: the left channel feeds both inputs.
    pub right: Option<Vec<i16>>,
}

impl StereoPcm {
    /// Quantize decoded audio. Mono stays a single channel; beyond two
    /// channels only the first two are kept.
    pub fn from_decoded(decoded: &DecodedAudio) -> Self {
        let left = decoded
            .channels
            .first()
            .map(|c| quantize(c))
            .unwrap_or_default();
        let right = decoded.channels.get(1).map(|c| quantize(c));
        Self {
            sample_rate: decoded.sample_rate,
            left,
            right,
        }
    }

    /// The right encoder input: the right channel, or the left one again.
    pub fn right(&self) -> &[i16] {
        self.right.as_deref().unwrap_or(&self.left)
    }
}

/// Runs decode → quantize → encode → flush for one input.
pub struct AudioPipeline<'a> {
    decoder: &'a dyn AudioDecoder,
    encoder: &'a dyn Mp3EncoderFactory,
    config: AudioConfig,
    stage: AudioStage,
}

impl<'a> AudioPipeline<'a> {
    pub fn new(
        decoder: &'a dyn AudioDecoder,
        encoder: &'a dyn Mp3EncoderFactory,
        config: AudioConfig,
    ) -> Self {
        Self {
            decoder,
            encoder,
            config,
            stage: AudioStage::Idle,
        }
    }

    pub fn stage(&self) -> AudioStage {
        self.stage
    }

    fn advance(&mut self, next: AudioStage) {
        debug!("Audio pipeline: {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Re-encode `bytes` to an MP3 stream.
    pub fn run(&mut self, bytes: &[u8], extension_hint: Option<&str>) -> Result<Vec<u8>> {
        match self.run_stages(bytes, extension_hint) {
            Ok(output) => {
                self.advance(AudioStage::Done);
                Ok(output)
            }
            Err(e) => {
                error!("Audio pipeline failed while {}: {}", self.stage, e);
                self.advance(AudioStage::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, bytes: &[u8], extension_hint: Option<&str>) -> Result<Vec<u8>> {
        self.config.validate()?;

        self.advance(AudioStage::Decoding);
        let decoded = self.decoder.decode(bytes, extension_hint)?;

        self.advance(AudioStage::Quantizing);
        let pcm = StereoPcm::from_decoded(&decoded);
        drop(decoded);

        self.advance(AudioStage::Encoding);
        let mut encoder = self.encoder.create(pcm.sample_rate, self.config.bitrate_kbps)?;
        let mut output = Vec::new();
        encode_pcm(encoder.as_mut(), &pcm.left, pcm.right(), &mut output)?;

        self.advance(AudioStage::Flushing);
        flush_encoder(encoder.as_mut(), &mut output)?;

        debug!(
            "Encoded {} frames at {} Hz into {} bytes",
            pcm.left.len(),
            pcm.sample_rate,
            output.len()
        );
        Ok(output)
    }
}

/// Re-encode an audio or video file's first audio track as MP3.
pub fn reencode(
    decoder: &dyn AudioDecoder,
    encoder: &dyn Mp3EncoderFactory,
    config: &AudioConfig,
    bytes: &[u8],
    extension_hint: Option<&str>,
) -> Result<Vec<u8>> {
    AudioPipeline::new(decoder, encoder, config.clone()).run(bytes, extension_hint)
}
