//! Whole-stream audio decoding with symphonia.

use crate::capability::AudioDecoder;
use crate::error::{ConversionError, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Planar float samples of a fully decoded stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// One sample vector per channel, all the same length.
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }
}

/// [`AudioDecoder`] over every codec and container symphonia bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

fn unsupported(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::UnsupportedAudioCodec(e.to_string())
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8], extension_hint: Option<&str>) -> Result<DecodedAudio> {
        let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
        let mut hint = Hint::new();
        if let Some(extension) = extension_hint {
            hint.with_extension(extension);
        }

        let detected = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(unsupported)?;
        let mut format = detected.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| unsupported("no decodable audio track"))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(unsupported)?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut skipped = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => return Err(unsupported(e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    skipped += 1;
                    debug!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(unsupported(e)),
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }
            sample_rate.get_or_insert(spec.rate);

            let count = spec.channels.count();
            if channels.is_empty() {
                channels = vec![Vec::new(); count];
            }

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_planar_ref(decoded);
            for (channel, plane) in channels.iter_mut().zip(buffer.samples().chunks(frames)) {
                channel.extend_from_slice(plane);
            }
        }

        if skipped > 0 {
            warn!("Skipped {} undecodable packets", skipped);
        }
        let sample_rate = sample_rate.ok_or_else(|| unsupported("unknown sample rate"))?;
        if channels.iter().all(Vec::is_empty) {
            return Err(unsupported("stream contains no audio samples"));
        }

        let decoded = DecodedAudio {
            sample_rate,
            channels,
        };
        debug!(
            "Decoded {} channels x {} frames at {} Hz",
            decoded.channel_count(),
            decoded.frames(),
            decoded.sample_rate
        );
        Ok(decoded)
    }
}
