//! Diff oracle backed by a JavaScript callback
//!
//! The callback receives both intermediate documents as XML strings plus the
//! diff options, and returns the edit script as an array of action objects
//! (`{ action: "UpdateAttrib", node, name, value }`, ...).

use crate::converters::xml::write_mei;
use crate::diff::{DiffOptions, DiffOracle, EditAction};
use crate::errors::OracleError;
use crate::models::MeiTree;
use wasm_bindgen::prelude::*;

pub struct JsOracle {
    callback: js_sys::Function,
}

impl JsOracle {
    pub fn new(callback: js_sys::Function) -> Self {
        Self { callback }
    }
}

impl DiffOracle for JsOracle {
    fn diff(&self, a: &MeiTree, b: &MeiTree, options: &DiffOptions) -> Result<Vec<EditAction>, OracleError> {
        let a_xml = write_mei(a).map_err(|e| OracleError(e.to_string()))?;
        let b_xml = write_mei(b).map_err(|e| OracleError(e.to_string()))?;
        let options = serde_wasm_bindgen::to_value(options).map_err(|e| OracleError(e.to_string()))?;

        let script = self
            .callback
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(&a_xml),
                &JsValue::from_str(&b_xml),
                &options,
            )
            .map_err(|e| OracleError(format!("{:?}", e)))?;

        serde_wasm_bindgen::from_value(script).map_err(|e| OracleError(e.to_string()))
    }
}
