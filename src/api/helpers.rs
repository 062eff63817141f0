//! Browser-console logging and JS value conversion for the MEI API
//!
//! Documents cross the boundary as XML strings; configuration, identifier
//! maps and edit scripts cross as plain JS objects via serde-wasm-bindgen.
//! Every failure becomes a `JsValue` string that names the entry point.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

const PREFIX: &str = "[mei-compare]";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn info(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn warn(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn error(s: &str);
}

// ============================================================================
// Console macros
// ============================================================================

/// Debug line on the browser console
#[macro_export]
macro_rules! wasm_log {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_debug(&format!($($arg)*))
    };
}

/// Info line, e.g. the size of an edit script
#[macro_export]
macro_rules! wasm_info {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_info(&format!($($arg)*))
    };
}

/// Warning, used for merge conflicts the user has to resolve
#[macro_export]
macro_rules! wasm_warn {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_warn(&format!($($arg)*))
    };
}

/// Error line for failed calls
#[macro_export]
macro_rules! wasm_error {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_error(&format!($($arg)*))
    };
}

pub fn log_debug(msg: &str) {
    log(&format!("{} {}", PREFIX, msg));
}

pub fn log_info(msg: &str) {
    info(&format!("{} {}", PREFIX, msg));
}

pub fn log_warn(msg: &str) {
    warn(&format!("{} {}", PREFIX, msg));
}

pub fn log_error(msg: &str) {
    error(&format!("{} {}", PREFIX, msg));
}

// ============================================================================
// Conversion
// ============================================================================

/// Read a serde value passed in from JavaScript
pub fn deserialize<T: DeserializeOwned>(value: JsValue, entry_point: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(entry_point, e))
}

/// Like [`deserialize`], with `undefined`/`null` meaning the default (e.g. an omitted `CompareConfig`)
pub fn deserialize_or_default<T: DeserializeOwned + Default>(
    value: JsValue,
    entry_point: &str,
) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        deserialize(value, entry_point)
    }
}

/// Hand a response object back to JavaScript
pub fn serialize<T: Serialize>(value: &T, entry_point: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| js_error(entry_point, e))
}

/// Log a failure of `entry_point` and turn it into the thrown JS value
pub fn js_error(entry_point: &str, err: impl Display) -> JsValue {
    let msg = format!("{}: {}", entry_point, err);
    log_error(&msg);
    JsValue::from_str(&msg)
}
