/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Flattening of [`SnmpResult`] into the fixed-field-order JSON record the
//! binding boundary expects. A plain `#[derive(Serialize)]` struct is used
//! rather than `serde_json::json!`, since struct field order — not
//! `preserve_order` — is what fixes the output layout.

use serde::Serialize;

use crate::decode::SnmpResult;

#[derive(Serialize)]
struct ResultJson {
    #[serde(rename = "OID")]
    oid: String,
    #[serde(rename = "Type")]
    ty: &'static str,
    #[serde(rename = "IsNull")]
    is_null: bool,
    #[serde(rename = "IsUnknown")]
    is_unknown: bool,
    #[serde(rename = "IsNoSuchInstance")]
    is_no_such_instance: bool,
    #[serde(rename = "IsNoSuchObject")]
    is_no_such_object: bool,
    #[serde(rename = "IsEndOfMibView")]
    is_end_of_mib_view: bool,
    #[serde(rename = "BoolValue")]
    bool_value: bool,
    #[serde(rename = "IntValue")]
    int_value: i64,
    #[serde(rename = "FloatValue")]
    float_value: f64,
    #[serde(rename = "ByteArrayValue")]
    byte_array_value: Option<Vec<u8>>,
    #[serde(rename = "StringValue")]
    string_value: String,
}

/// Serialize one result to the fixed-layout JSON record. Never fails: every
/// field has a default, and `oid.to_string()` cannot error.
pub fn to_json(result: &SnmpResult) -> String {
    let mut record = ResultJson {
        oid: result.oid().to_string(),
        ty: result.type_str(),
        is_null: false,
        is_unknown: false,
        is_no_such_instance: false,
        is_no_such_object: false,
        is_end_of_mib_view: false,
        bool_value: false,
        int_value: 0,
        float_value: 0.0,
        byte_array_value: None,
        string_value: String::new(),
    };

    match result {
        SnmpResult::NoSuchInstance { .. } => record.is_no_such_instance = true,
        SnmpResult::NoSuchObject { .. } => record.is_no_such_object = true,
        SnmpResult::EndOfMibView { .. } => record.is_end_of_mib_view = true,
        SnmpResult::Bool { value, .. } => record.bool_value = *value,
        SnmpResult::Int { value, .. } => record.int_value = *value,
        SnmpResult::Float { value, .. } => record.float_value = *value,
        SnmpResult::ByteArray { value, .. } => record.byte_array_value = Some(value.clone()),
        SnmpResult::String { value, .. } => record.string_value = value.clone(),
    }

    serde_json::to_string(&record).expect("ResultJson is always representable")
}

/// The literal fallback used when a result could not be produced at all.
pub const EMPTY: &str = "{}";
