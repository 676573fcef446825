//! Guided mode flattens the five wizards into one form.

use serde_json::{Map, Value};

use crate::models::{Brand, FlywheelProgress, Phase};

/// Shallow-merges every phase payload in chain order, so a key set by a
/// later phase replaces the same key from an earlier one, then overlays
/// the brand name and description.
///
/// Both brand keys are always written, as `null` when there is no brand or
/// no description, so values left in phase payloads never show through.
/// Payloads that are not JSON objects contribute nothing.
pub fn merge_guided_data(progress: &FlywheelProgress, brand: Option<&Brand>) -> Map<String, Value> {
    let mut merged = Map::new();

    for phase in Phase::ALL {
        if let Value::Object(fields) = &progress.phase(phase).data {
            for (key, value) in fields {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    let name = brand.map(|b| Value::String(b.name.clone()));
    let description = brand
        .and_then(|b| b.description.clone())
        .map(Value::String);
    merged.insert("brandName".into(), name.unwrap_or(Value::Null));
    merged.insert("brandDescription".into(), description.unwrap_or(Value::Null));

    merged
}
