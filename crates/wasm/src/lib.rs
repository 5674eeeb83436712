//! Browser bindings for conversion-heaven.
//!
//! Wires the core pipeline to the page: a selected `File` is the byte
//! source, finished artifacts are saved through a Blob download, and
//! progress is reported to optional JS callbacks.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { ConversionHeaven } from 'conversion-heaven-wasm';
//!
//! await init();
//! const heaven = new ConversionHeaven();
//!
//! input.accept = heaven.accept('pdf-to-word');
//! input.onchange = async () => {
//!     const file = input.files[0];
//!     if (!heaven.isAccepted('pdf-to-word', file)) {
//!         alert(heaven.rejectionMessage('pdf-to-word'));
//!         return;
//!     }
//!     try {
//!         const filename = await heaven.convert('pdf-to-word', file, {
//!             onStart: (kind, name) => spinner.show(),
//!             onSuccess: (name) => spinner.hide(),
//!         });
//!         console.log('saved', filename);
//!     } catch (message) {
//!         alert(message);
//!     }
//! };
//! ```
//!
//! Load `lamejs` before calling the constructor to enable MP3 output.

use std::rc::Rc;

use conversion_heaven_core::{
    CapabilityRegistry, ConversionKind, ConversionOutcome, Converter, ConverterConfig, Dispatcher,
};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod download;
pub mod file_source;
pub mod lamejs;
pub mod notify;

pub use download::{BlobDownload, ObjectUrl};
pub use file_source::BrowserFile;
pub use lamejs::LameJsFactory;
pub use notify::JsObserver;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    tracing::info!("conversion-heaven-wasm initialized");
}

/// Best-effort text of a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{:?}", value),
    }
}

fn kind_from_id(kind_id: &str) -> Result<ConversionKind, JsValue> {
    ConversionKind::from_id(kind_id).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Value for an `<input type="file" accept>` attribute.
pub fn accept_attribute(kind: ConversionKind) -> String {
    kind.accept().join(",")
}

/// Message shown when a dropped file does not match the accept filter.
pub fn rejection_message(kind: ConversionKind) -> String {
    format!(
        "Invalid file type. Please drop a supported file ({}).",
        accept_attribute(kind)
    )
}

/// Ids of every registered conversion.
#[wasm_bindgen]
pub fn conversions() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&ConversionKind::ALL).map_err(JsValue::from)
}

/// The conversion front end for one page.
#[wasm_bindgen]
pub struct ConversionHeaven {
    converter: Rc<Converter>,
}

#[wasm_bindgen]
impl ConversionHeaven {
    /// Build the converter. `config` is an optional `ConverterConfig`
    /// object; `undefined` selects the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ConversionHeaven, JsValue> {
        let config: ConverterConfig = if config.is_undefined() || config.is_null() {
            ConverterConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let mut registry = CapabilityRegistry::with_defaults();
        match LameJsFactory::detect() {
            Some(factory) => registry = registry.with_mp3_encoder(factory),
            None => tracing::warn!("lamejs not found; MP3 output disabled"),
        }

        let converter =
            Converter::new(config, registry).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            converter: Rc::new(converter),
        })
    }

    /// Names of the capabilities that loaded.
    pub fn capabilities(&self) -> Vec<String> {
        self.converter
            .registry()
            .available()
            .into_iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Accept-filter patterns for a conversion, comma separated.
    pub fn accept(&self, kind_id: &str) -> Result<String, JsValue> {
        Ok(accept_attribute(kind_from_id(kind_id)?))
    }

    /// Whether `file` passes the accept filter of a conversion.
    #[wasm_bindgen(js_name = isAccepted)]
    pub fn is_accepted(&self, kind_id: &str, file: &web_sys::File) -> Result<bool, JsValue> {
        Ok(kind_from_id(kind_id)?.accepts(&file.name(), &file.type_()))
    }

    #[wasm_bindgen(js_name = rejectionMessage)]
    pub fn rejection_message(&self, kind_id: &str) -> Result<String, JsValue> {
        Ok(rejection_message(kind_from_id(kind_id)?))
    }

    /// Convert `file` and download the result.
    ///
    /// Resolves with the downloaded filename; rejects with the
    /// `Conversion failed: ...` message.
    pub fn convert(&self, kind_id: String, file: web_sys::File, callbacks: JsValue) -> Promise {
        let converter = Rc::clone(&self.converter);
        wasm_bindgen_futures::future_to_promise(async move {
            let source = BrowserFile::new(file);
            let dispatcher =
                Dispatcher::new(&converter, BlobDownload).with_observer(JsObserver::new(callbacks));
            match dispatcher.run(&kind_id, &source).await {
                ConversionOutcome::Delivered { filename } => Ok(JsValue::from_str(&filename)),
                ConversionOutcome::Failed { message } => Err(JsValue::from_str(&message)),
            }
        })
    }
}
