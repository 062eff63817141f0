//! MEI comparison WASM API
//!
//! The JavaScript-facing entry points used by the web layer: normalize a
//! document, compare two documents, merge the layers of a measure, and check
//! whether a compared document is fully resolved. Documents cross the
//! boundary as XML strings.

pub mod helpers;
pub mod oracle;

use crate::compare::{CompareConfig, ComparisonStrategy, TreeComparison};
use crate::converters::xml::{parse_mei, write_mei};
use crate::diff::EditAction;
use crate::merge::{is_resolved, merge_layers};
use crate::transform::{IdMap, MeiTransformer};
use crate::{wasm_error, wasm_info, wasm_log, wasm_warn};
use helpers::{deserialize_or_default, js_error, serialize};
use oracle::JsOracle;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizeResponse {
    xml: String,
    id_map: IdMap,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    diff: String,
    a: String,
    b: String,
    script: Vec<EditAction>,
}

/// Normalize an MEI document
///
/// # Returns
/// `{ xml, idMap }` where `idMap` maps previous identifiers to new ones
#[wasm_bindgen(js_name = normalizeMei)]
pub fn normalize_mei(xml: &str, keep_existing: bool) -> Result<JsValue, JsValue> {
    let mut transformer = MeiTransformer::from_xml_str(xml).map_err(|e| js_error("normalizeMei", e))?;
    let remapped = transformer.normalize(keep_existing).len();
    wasm_log!("normalizeMei: {} identifiers remapped", remapped);
    let response = NormalizeResponse {
        xml: transformer.to_xml_string().map_err(|e| js_error("normalizeMei", e))?,
        id_map: transformer.id_map().clone(),
    };
    serialize(&response, "normalizeMei")
}

/// Compare two normalized MEI documents
///
/// `oracle` is called as `oracle(aXml, bXml, options)` and must return the
/// edit script. `config` may be omitted for the default colors.
///
/// # Returns
/// `{ diff, a, b, script }`
#[wasm_bindgen(js_name = compareMei)]
pub fn compare_mei(
    a_xml: &str,
    b_xml: &str,
    oracle: js_sys::Function,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    let config: CompareConfig = deserialize_or_default(config, "compareMei config")?;
    let comparison = TreeComparison::with_config(JsOracle::new(oracle), config);

    let result = comparison.compare_xml(a_xml, b_xml).map_err(|e| {
        wasm_error!("compareMei failed: {}", e);
        JsValue::from_str(&e.to_string())
    })?;
    wasm_info!("compareMei: {} edit actions", result.script.len());

    let response = CompareResponse {
        diff: write_mei(&result.diff).map_err(|e| js_error("compareMei", e))?,
        a: write_mei(&result.a).map_err(|e| js_error("compareMei", e))?,
        b: write_mei(&result.b).map_err(|e| js_error("compareMei", e))?,
        script: result.script,
    };
    serialize(&response, "compareMei")
}

/// Merge the paired layers of a single measure
///
/// # Returns
/// The measure with each layer pair replaced by one merged layer
#[wasm_bindgen(js_name = mergeMeasureLayers)]
pub fn merge_measure_layers(measure_xml: &str) -> Result<String, JsValue> {
    let measure = parse_mei(measure_xml).map_err(|e| js_error("mergeMeasureLayers", e))?;
    let merged = merge_layers(measure).map_err(|e| {
        wasm_warn!("mergeMeasureLayers: {}", e);
        JsValue::from_str(&e.to_string())
    })?;
    write_mei(&merged).map_err(|e| js_error("mergeMeasureLayers", e))
}

/// True once every layer of the document is resolved
#[wasm_bindgen(js_name = isResolvedMei)]
pub fn is_resolved_mei(xml: &str) -> Result<bool, JsValue> {
    let tree = parse_mei(xml).map_err(|e| js_error("isResolvedMei", e))?;
    Ok(is_resolved(&tree))
}
