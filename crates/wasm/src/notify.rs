//! Notifications forwarded to page callbacks.

use conversion_heaven_core::{ConversionKind, ConversionObserver};
use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Calls `onStart(kind, name)`, `onSuccess(filename)` and
/// `onFailure(message)` on a JS object when present. Missing callbacks are
/// skipped; every event is also logged.
pub struct JsObserver {
    callbacks: JsValue,
}

impl JsObserver {
    pub fn new(callbacks: JsValue) -> Self {
        Self { callbacks }
    }

    fn call(&self, name: &str, args: &[&JsValue]) {
        if !self.callbacks.is_object() {
            return;
        }
        let Some(function) = Reflect::get(&self.callbacks, &name.into())
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
        else {
            return;
        };
        let result = match args {
            [a] => function.call1(&self.callbacks, a),
            [a, b] => function.call2(&self.callbacks, a, b),
            _ => function.call0(&self.callbacks),
        };
        if let Err(e) = result {
            tracing::warn!("{} callback threw: {}", name, crate::describe(&e));
        }
    }
}

impl ConversionObserver for JsObserver {
    fn on_start(&self, kind: ConversionKind, source_name: &str) {
        tracing::info!("Converting {} ({})", source_name, kind);
        self.call("onStart", &[&kind.id().into(), &source_name.into()]);
    }

    fn on_success(&self, filename: &str) {
        tracing::info!("Conversion finished: {}", filename);
        self.call("onSuccess", &[&filename.into()]);
    }

    fn on_failure(&self, message: &str) {
        tracing::error!("{}", message);
        self.call("onFailure", &[&message.into()]);
    }
}
