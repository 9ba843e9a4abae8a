use serde_json::{Map, Value};

use super::{FieldDefinition, FieldSet, HandleUndefined};

/// Fill the gaps between stored data and the schema it is rendered against.
///
/// Returns the union of `raw` with a computed default for every key the
/// definition declares that `raw` lacks. Keys present in `raw` are kept
/// verbatim, including keys the definition does not know about: stored data
/// routinely drifts from the current design and dropping fields would lose
/// report content. Pure: the input map is never mutated.
pub fn conform(raw: &Map<String, Value>, definition: &FieldSet, handle: HandleUndefined) -> Map<String, Value> {
    let mut out = raw.clone();
    for (name, field) in definition {
        if !out.contains_key(name) {
            out.insert(name.clone(), default_value(field, handle));
        }
    }
    out
}

/// Type-appropriate default for a single absent field
fn default_value(field: &FieldDefinition, handle: HandleUndefined) -> Value {
    if handle == HandleUndefined::FillNull {
        return Value::Null;
    }
    match field {
        FieldDefinition::Plain | FieldDefinition::User => Value::Null,
        // empty sentinel, formats to the empty choice later
        FieldDefinition::Enum { .. } => Value::String(String::new()),
        FieldDefinition::Cvss => Value::String(String::new()),
        FieldDefinition::List { .. } => Value::Array(Vec::new()),
        FieldDefinition::Object { properties } => {
            Value::Object(conform(&Map::new(), properties, HandleUndefined::FillDefault))
        }
    }
}
