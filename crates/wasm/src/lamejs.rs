//! MP3 encoding through a page-provided `lamejs` global.
//!
//! `lamejs.Mp3Encoder(channels, sampleRate, kbps)` exposes
//! `encodeBuffer(left, right)` and `flush()`, both returning `Int8Array`
//! chunks of encoded frames.

use conversion_heaven_core::capability::{BlockEncoder, Mp3EncoderFactory};
use conversion_heaven_core::{ConversionError, Result};
use js_sys::{Array, Function, Int16Array, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const GLOBAL_NAME: &str = "lamejs";

fn mp3_error(e: &JsValue) -> ConversionError {
    ConversionError::EncodingFailure {
        format: "MP3",
        message: crate::describe(e),
    }
}

/// Factory bound to the `lamejs.Mp3Encoder` constructor.
pub struct LameJsFactory {
    constructor: Function,
}

impl LameJsFactory {
    /// Look up the encoder on the global object. `None` when the script
    /// was not loaded.
    pub fn detect() -> Option<Self> {
        let global = js_sys::global();
        if !Reflect::has(&global, &GLOBAL_NAME.into()).unwrap_or(false) {
            return None;
        }
        let lamejs = Reflect::get(&global, &GLOBAL_NAME.into()).ok()?;
        let constructor = Reflect::get(&lamejs, &"Mp3Encoder".into())
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(Self { constructor })
    }
}

impl Mp3EncoderFactory for LameJsFactory {
    fn create(&self, sample_rate: u32, bitrate_kbps: u32) -> Result<Box<dyn BlockEncoder>> {
        // Always stereo; mono sources arrive as dual-mono blocks.
        let args = Array::of3(&2.into(), &sample_rate.into(), &bitrate_kbps.into());
        let encoder = Reflect::construct(&self.constructor, &args).map_err(|e| mp3_error(&e))?;
        Ok(Box::new(LameJsEncoder { encoder }))
    }
}

struct LameJsEncoder {
    encoder: JsValue,
}

impl LameJsEncoder {
    fn call(&self, method: &str, args: &Array) -> Result<Vec<u8>> {
        let function: Function = Reflect::get(&self.encoder, &method.into())
            .map_err(|e| mp3_error(&e))?
            .dyn_into()
            .map_err(|e| mp3_error(&e))?;
        let chunk = function.apply(&self.encoder, args).map_err(|e| mp3_error(&e))?;
        // Int8Array -> Uint8Array reinterprets each byte.
        Ok(Uint8Array::new(&chunk).to_vec())
    }
}

impl BlockEncoder for LameJsEncoder {
    fn encode_block(&mut self, left: &[i16], right: &[i16]) -> Result<Vec<u8>> {
        let args = Array::of2(&Int16Array::from(left), &Int16Array::from(right));
        self.call("encodeBuffer", &args)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        self.call("flush", &Array::new())
    }
}
