//! Resolution of labelled allocation constraints.
//!
//! An allocation response carries, next to the machine itself, a
//! `constraints_by_type` document mapping each storage and interface label the
//! caller asked for to the ids that satisfied it:
//!
//! ```json
//! {"constraints_by_type": {"storage": {"root": [23]}, "interfaces": {"eth": [99]}}}
//! ```
//!
//! The ids are resolved against the machine decoded from the same payload.

use std::collections::HashMap;

use maas_core::Error;
use serde_json::{Map, Value};

use crate::models::{BlockDevice, Machine, NetworkInterface};
use crate::Result;

/// Entities that satisfied each labelled constraint of an allocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintMatches {
    /// Interface label to matching interfaces.
    pub interfaces: HashMap<String, Vec<NetworkInterface>>,
    /// Storage label to matching block devices.
    pub storage: HashMap<String, Vec<BlockDevice>>,
}

/// Parse the `constraints_by_type` section of an allocation response.
///
/// # Errors
///
/// Returns `Error::Decode` when the section is missing or malformed, or when
/// an id does not belong to `machine`.
pub fn parse_constraint_matches(source: &Value, machine: &Machine) -> Result<ConstraintMatches> {
    let by_type = source
        .get("constraints_by_type")
        .ok_or_else(|| Error::Decode("missing constraints_by_type".to_string()))?
        .as_object()
        .ok_or_else(|| Error::Decode("constraints_by_type: expected object".to_string()))?;

    let mut matches = ConstraintMatches::default();

    for (label, ids) in labelled_ids(by_type, "interfaces")? {
        let resolved = ids
            .into_iter()
            .map(|id| {
                machine.interface(id).cloned().ok_or_else(|| {
                    Error::Decode(format!(
                        "constraint match interface {label:?}: {id} does not match an interface for the machine"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        matches.interfaces.insert(label, resolved);
    }

    for (label, ids) in labelled_ids(by_type, "storage")? {
        let resolved = ids
            .into_iter()
            .map(|id| {
                machine.block_device(id).cloned().ok_or_else(|| {
                    Error::Decode(format!(
                        "constraint match storage {label:?}: {id} does not match a block device for the machine"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        matches.storage.insert(label, resolved);
    }

    Ok(matches)
}

/// Read an optional `label -> [id]` object from `by_type[key]`.
fn labelled_ids(by_type: &Map<String, Value>, key: &str) -> Result<Vec<(String, Vec<i64>)>> {
    let Some(section) = by_type.get(key) else {
        return Ok(Vec::new());
    };
    if section.is_null() {
        return Ok(Vec::new());
    }
    let section = section
        .as_object()
        .ok_or_else(|| Error::Decode(format!("constraints_by_type.{key}: expected object")))?;

    section
        .iter()
        .map(|(label, ids)| -> Result<(String, Vec<i64>)> {
            let ids = ids.as_array().ok_or_else(|| {
                Error::Decode(format!("constraints_by_type.{key}.{label}: expected list"))
            })?;
            let ids = ids
                .iter()
                .map(|value| {
                    as_id(value).ok_or_else(|| {
                        Error::Decode(format!(
                            "constraints_by_type.{key}.{label}: expected id, got {value}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((label.clone(), ids))
        })
        .collect()
}

/// Accept integers, integral floats and numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
