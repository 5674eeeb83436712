//! Delivery through a Blob object URL and a synthetic anchor click.

use conversion_heaven_core::{ConversionError, Delivery, OutputArtifact, Result};
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// Milliseconds the object URL stays alive after the click.
const REVOKE_DELAY_MS: i32 = 500;

/// Saves artifacts as browser downloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobDownload;

impl Delivery for BlobDownload {
    fn deliver(&self, artifact: OutputArtifact) -> Result<()> {
        trigger_download(&artifact).map_err(|e| {
            ConversionError::InvalidConfig(format!(
                "download of {} failed: {}",
                artifact.filename,
                crate::describe(&e)
            ))
        })
    }
}

/// An object URL that is revoked when dropped, unless handed to
/// [`ObjectUrl::revoke_later`].
pub struct ObjectUrl {
    url: Option<String>,
}

impl ObjectUrl {
    pub fn new(blob: &Blob) -> std::result::Result<Self, JsValue> {
        Ok(Self {
            url: Some(Url::create_object_url_with_blob(blob)?),
        })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    /// Revoke after `delay_ms` on a timer. When no timer can be set the URL
    /// is revoked right away.
    pub fn revoke_later(
        mut self,
        window: &web_sys::Window,
        delay_ms: i32,
    ) -> std::result::Result<(), JsValue> {
        let Some(url) = self.url.take() else {
            return Ok(());
        };
        let pending = url.clone();
        let revoke = Closure::once_into_js(move || {
            let _ = Url::revoke_object_url(&pending);
        });
        if let Err(e) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(revoke.unchecked_ref(), delay_ms)
        {
            let _ = Url::revoke_object_url(&url);
            return Err(e);
        }
        Ok(())
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Some(url) = self.url.take() {
            let _ = Url::revoke_object_url(&url);
        }
    }
}

fn trigger_download(artifact: &OutputArtifact) -> std::result::Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let parts = Array::of1(&Uint8Array::from(artifact.bytes.as_slice()));
    let options = BlobPropertyBag::new();
    options.set_type(artifact.mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

    let url = ObjectUrl::new(&blob)?;
    click_anchor(&document, url.as_str(), &artifact.filename)?;
    url.revoke_later(&window, REVOKE_DELAY_MS)?;

    tracing::debug!("Download started: {} ({} bytes)", artifact.filename, artifact.bytes.len());
    Ok(())
}

fn click_anchor(
    document: &web_sys::Document,
    url: &str,
    filename: &str,
) -> std::result::Result<(), JsValue> {
    let body = document.body().ok_or("no document body")?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(url);
    anchor.set_download(filename);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    Ok(())
}
