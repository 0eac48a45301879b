use std::collections::HashMap;

use serde_json::Value;

/// A JSON object flattened into dotted-path keys
pub type FlatRecord = HashMap<String, Value>;

/// Flatten nested objects into dotted keys
///
/// `{"data": {"propertyInfo": {"bedrooms": 3}}}` becomes
/// `{"data.propertyInfo.bedrooms": 3}`. Arrays and scalars are leaves.
/// A non-object root yields an empty record.
pub fn flatten(value: &Value) -> FlatRecord {
    let mut flat = FlatRecord::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            flatten_into(key.clone(), child, &mut flat);
        }
    }
    flat
}

fn flatten_into(prefix: String, value: &Value, out: &mut FlatRecord) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(format!("{}.{}", prefix, key), child, out);
            }
        }
        // An empty object carries no fields
        Value::Object(_) => {}
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}
