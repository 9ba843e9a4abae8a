pub mod conform;
pub mod format;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One choice of an enum field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumChoice {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl EnumChoice {
    /// Sentinel substituted when a stored value matches no declared choice
    pub fn empty() -> Self {
        EnumChoice {
            value: String::new(),
            label: String::new(),
        }
    }
}

/// One node of a report or finding schema.
///
/// Designs declare fields with a `type` tag; the scalar design types
/// (`string`, `markdown`, `date`, ...) all behave identically in this
/// pipeline and collapse into `Plain`. Nested definitions exist only for
/// the composite tags: `choices` for enums, `items` for lists, `properties`
/// for objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldDefinition {
    #[serde(
        alias = "string",
        alias = "markdown",
        alias = "date",
        alias = "number",
        alias = "boolean"
    )]
    Plain,
    Enum {
        #[serde(default)]
        choices: Vec<EnumChoice>,
    },
    Cvss,
    User,
    List {
        items: Box<FieldDefinition>,
    },
    Object {
        #[serde(default)]
        properties: FieldSet,
    },
}

/// Named fields of an object node or of a whole report/finding schema
pub type FieldSet = BTreeMap<String, FieldDefinition>;

/// Policy for schema-declared keys absent from stored data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleUndefined {
    /// Fill with the type-appropriate default (empty list, empty object, ...)
    FillDefault,
    /// Fill every missing key with null regardless of type
    FillNull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_definition() {
        let raw = serde_json::json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "severity": {"type": "cvss"},
                "refs": {"type": "list", "items": {"type": "string"}},
                "status": {"type": "enum", "choices": [
                    {"value": "open", "label": "Open"},
                    {"value": "closed", "label": "Closed"},
                ]},
            }
        });
        let def: FieldDefinition = serde_json::from_value(raw).unwrap();
        let FieldDefinition::Object { properties } = def else {
            panic!("expected object definition");
        };
        assert_eq!(properties.len(), 4);
        assert_eq!(properties["title"], FieldDefinition::Plain);
        assert_eq!(properties["severity"], FieldDefinition::Cvss);
        assert!(matches!(properties["refs"], FieldDefinition::List { .. }));
        let FieldDefinition::Enum { ref choices } = properties["status"] else {
            panic!("expected enum definition");
        };
        assert_eq!(choices[0].label, "Open");
    }

    #[test]
    fn scalar_design_types_collapse_to_plain() {
        for tag in ["string", "markdown", "date", "number", "boolean", "plain"] {
            let def: FieldDefinition =
                serde_json::from_value(serde_json::json!({"type": tag})).unwrap();
            assert_eq!(def, FieldDefinition::Plain, "tag {tag}");
        }
    }
}
