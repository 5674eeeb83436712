//! Browser tests for the conversion-heaven bindings.
//!
//! Run with: wasm-pack test --headless --firefox crates/wasm

#![cfg(target_arch = "wasm32")]

use conversion_heaven_core::{ByteSource, ConversionKind, ConversionObserver};
use conversion_heaven_wasm::{BrowserFile, JsObserver, ObjectUrl};
use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Blob, File, FilePropertyBag};

wasm_bindgen_test_configure!(run_in_browser);

fn bytes_array(bytes: &[u8]) -> Array {
    Array::of1(&Uint8Array::from(bytes))
}

fn text_blob(text: &str) -> Blob {
    Blob::new_with_u8_array_sequence(&bytes_array(text.as_bytes())).unwrap()
}

async fn fetch_succeeds(url: &str) -> bool {
    let window = web_sys::window().unwrap();
    JsFuture::from(window.fetch_with_str(url)).await.is_ok()
}

#[wasm_bindgen_test]
async fn test_browser_file_reads_bytes_and_text() {
    let options = FilePropertyBag::new();
    options.set_type("text/plain");
    let file = File::new_with_u8_array_sequence_and_options(
        &bytes_array(b"line1\nline2"),
        "notes.txt",
        &options,
    )
    .unwrap();

    let source = BrowserFile::new(file);
    assert_eq!(source.name(), "notes.txt");
    assert_eq!(source.mime_type(), "text/plain");
    assert_eq!(source.size(), 11.0);
    assert_eq!(source.read_bytes().await.unwrap(), b"line1\nline2".to_vec());
    assert_eq!(source.read_text().await.unwrap(), "line1\nline2");
}

#[wasm_bindgen_test]
fn test_js_observer_calls_present_callbacks_only() {
    let events = Array::new();
    let callbacks = Object::new();
    Reflect::set(&callbacks, &"events".into(), &events).unwrap();
    let on_start = Function::new_with_args(
        "kind, name",
        "this.events.push('start ' + kind + ' ' + name)",
    );
    let on_success = Function::new_with_args("name", "this.events.push('ok ' + name)");
    Reflect::set(&callbacks, &"onStart".into(), &on_start).unwrap();
    Reflect::set(&callbacks, &"onSuccess".into(), &on_success).unwrap();

    let observer = JsObserver::new(callbacks.into());
    observer.on_start(ConversionKind::TxtToPdf, "a.txt");
    observer.on_success("a.pdf");
    observer.on_failure("Conversion failed: nothing listens");

    let seen: Vec<String> = events.iter().filter_map(|v| v.as_string()).collect();
    assert_eq!(seen, vec!["start txt-to-pdf a.txt", "ok a.pdf"]);
}

#[wasm_bindgen_test]
fn test_js_observer_without_callbacks_is_silent() {
    let observer = JsObserver::new(JsValue::UNDEFINED);
    observer.on_start(ConversionKind::CsvToExcel, "data.csv");
    observer.on_failure("Conversion failed: x");
}

#[wasm_bindgen_test]
async fn test_dropped_object_url_is_revoked() {
    let url = {
        let object_url = ObjectUrl::new(&text_blob("scratch")).unwrap();
        assert!(object_url.as_str().starts_with("blob:"));
        object_url.as_str().to_string()
    };
    assert!(!fetch_succeeds(&url).await);
}

#[wasm_bindgen_test]
async fn test_object_url_handed_to_timer_stays_valid() {
    let window = web_sys::window().unwrap();
    let object_url = ObjectUrl::new(&text_blob("kept")).unwrap();
    let url = object_url.as_str().to_string();
    object_url.revoke_later(&window, 500).unwrap();
    assert!(fetch_succeeds(&url).await);
}
