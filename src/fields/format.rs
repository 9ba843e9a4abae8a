use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::cvss;
use crate::report::model::{MemberLookup, ProjectMember};

use super::conform::conform;
use super::{EnumChoice, FieldDefinition, FieldSet, HandleUndefined};

/// Everything user reference resolution can draw on during one formatting
/// pass. Imported members are tried before the persisted lookup.
pub struct FormatContext<'a> {
    pub imported_members: &'a [Map<String, Value>],
    pub members: &'a dyn MemberLookup,
}

impl<'a> FormatContext<'a> {
    pub fn new(imported_members: &'a [Map<String, Value>], members: &'a dyn MemberLookup) -> Self {
        FormatContext {
            imported_members,
            members,
        }
    }
}

/// Replace a leaf value with its rendering-ready representation, dispatching
/// on the definition tag. Total over the field type union; malformed values
/// degrade to empty/null output instead of failing the render.
pub fn format_field(value: Value, definition: &FieldDefinition, ctx: &FormatContext) -> Value {
    match definition {
        FieldDefinition::Plain => value,
        FieldDefinition::Enum { choices } => {
            let choice = choices
                .iter()
                .find(|c| value.as_str() == Some(c.value.as_str()))
                .cloned()
                .unwrap_or_else(|| {
                    // empty string is the conformance sentinel, not drift
                    if !value.is_null() && value.as_str() != Some("") {
                        debug!("enum value {value} matches no declared choice");
                    }
                    EnumChoice::empty()
                });
            json!({"value": choice.value, "label": choice.label})
        }
        FieldDefinition::Cvss => {
            let score = cvss::calculate_score(value.as_str().unwrap_or(""));
            json!({
                "vector": value,
                "score": format!("{score:.2}"),
                "level": cvss::level_from_score(score).label(),
                "level_number": cvss::level_number_from_score(score),
            })
        }
        FieldDefinition::User => resolve_user(value, ctx),
        FieldDefinition::List { items } => match value {
            Value::Array(elements) => Value::Array(
                elements
                    .into_iter()
                    .map(|e| format_field(e, items, ctx))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        },
        FieldDefinition::Object { properties } => {
            Value::Object(format_object(value, properties, ctx, false))
        }
    }
}

/// Format an object value: re-guarantee completeness against `properties`,
/// then format every declared property in place. Undeclared keys pass
/// through untouched. With `require_id`, objects that still lack an `id`
/// get a fresh random one (top-level report and finding trees need stable
/// anchors even for data that never hit the store).
pub fn format_object(
    value: Value,
    properties: &FieldSet,
    ctx: &FormatContext,
    require_id: bool,
) -> Map<String, Value> {
    let raw = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut out = conform(&raw, properties, HandleUndefined::FillDefault);
    for (name, field) in properties {
        let v = out.get(name).cloned().unwrap_or(Value::Null);
        out.insert(name.clone(), format_field(v, field, ctx));
    }
    if require_id && !out.contains_key("id") {
        out.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    out
}

/// Resolve a user reference to the canonical member projection.
///
/// Resolution order: a value that already is a projection-shaped object (or
/// null) formats directly; otherwise the reference is matched by stringified
/// id against the imported members side list; only then is the persisted
/// lookup consulted. Imported members are people on the report without a
/// live account and must render exactly like real ones.
pub fn resolve_user(value: Value, ctx: &FormatContext) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Object(map) => Value::Object(member_projection(&map)),
        reference => {
            let wanted = id_string(&reference);
            if let Some(entry) = ctx
                .imported_members
                .iter()
                .find(|m| m.get("id").is_some_and(|id| id_string(id) == wanted))
            {
                return Value::Object(member_projection(entry));
            }
            match ctx.members.member_by_id(&wanted) {
                Some(member) => Value::Object(project_member_projection(member)),
                None => {
                    debug!("user reference {wanted} did not resolve");
                    Value::Null
                }
            }
        }
    }
}

const PROJECTION_KEYS: [&str; 10] = [
    "id",
    "name",
    "title_before",
    "first_name",
    "middle_name",
    "last_name",
    "title_after",
    "email",
    "phone",
    "mobile",
];

/// Project an arbitrary member-shaped map to the canonical output shape:
/// the identity keys that exist, plus deduplicated non-null roles.
pub fn member_projection(source: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for key in PROJECTION_KEYS {
        if let Some(v) = source.get(key) {
            out.insert(key.into(), v.clone());
        }
    }
    let roles = match source.get("roles") {
        Some(Value::Array(roles)) => dedup_roles(roles.iter().cloned()),
        _ => Vec::new(),
    };
    out.insert("roles".into(), Value::Array(roles));
    out
}

/// Same projection for a persisted member: profile fields plus member roles
pub fn project_member_projection(member: &ProjectMember) -> Map<String, Value> {
    let mut out = match serde_json::to_value(&member.user) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let roles = dedup_roles(member.roles.iter().map(|r| Value::String(r.clone())));
    out.insert("roles".into(), Value::Array(roles));
    out
}

fn dedup_roles(roles: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut seen = Vec::new();
    for role in roles {
        if !role.is_null() && !seen.contains(&role) {
            seen.push(role);
        }
    }
    seen
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::{NoMembers, UserProfile};

    fn ctx_empty() -> FormatContext<'static> {
        FormatContext::new(&[], &NoMembers)
    }

    fn enum_def() -> FieldDefinition {
        serde_json::from_value(json!({
            "type": "enum",
            "choices": [
                {"value": "open", "label": "Open"},
                {"value": "closed", "label": "Closed"},
            ]
        }))
        .unwrap()
    }

    fn member(id: &str, name: &str, roles: &[&str]) -> ProjectMember {
        ProjectMember {
            user: UserProfile {
                id: id.into(),
                name: Some(name.into()),
                title_before: None,
                first_name: None,
                middle_name: None,
                last_name: None,
                title_after: None,
                email: None,
                phone: None,
                mobile: None,
            },
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn plain_is_identity() {
        let out = format_field(json!("verbatim"), &FieldDefinition::Plain, &ctx_empty());
        assert_eq!(out, json!("verbatim"));
    }

    #[test]
    fn enum_resolves_to_full_choice_record() {
        let out = format_field(json!("closed"), &enum_def(), &ctx_empty());
        assert_eq!(out, json!({"value": "closed", "label": "Closed"}));
    }

    #[test]
    fn unmatched_enum_yields_empty_choice() {
        for raw in [json!("retired"), Value::Null, json!(7)] {
            let out = format_field(raw, &enum_def(), &ctx_empty());
            assert_eq!(out, json!({"value": "", "label": ""}));
        }
    }

    #[test]
    fn cvss_output_is_consistent_with_scoring_module() {
        let vector = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H";
        let out = format_field(json!(vector), &FieldDefinition::Cvss, &ctx_empty());
        let score = cvss::calculate_score(vector);
        assert_eq!(out["vector"], json!(vector));
        assert_eq!(out["score"], json!("9.80"));
        assert_eq!(out["level"], json!(cvss::level_from_score(score).label()));
        assert_eq!(out["level_number"], json!(cvss::level_number_from_score(score)));
    }

    #[test]
    fn empty_cvss_vector_formats_as_informational() {
        let out = format_field(json!(""), &FieldDefinition::Cvss, &ctx_empty());
        assert_eq!(out["score"], json!("0.00"));
        assert_eq!(out["level"], json!("info"));
        assert_eq!(out["level_number"], json!(1));
    }

    #[test]
    fn list_formats_each_element() {
        let def: FieldDefinition = serde_json::from_value(json!({
            "type": "list",
            "items": {"type": "enum", "choices": [{"value": "a", "label": "A"}]},
        }))
        .unwrap();
        let out = format_field(json!(["a", "b"]), &def, &ctx_empty());
        assert_eq!(
            out,
            json!([{"value": "a", "label": "A"}, {"value": "", "label": ""}])
        );
    }

    #[test]
    fn non_array_list_value_formats_empty() {
        let def: FieldDefinition =
            serde_json::from_value(json!({"type": "list", "items": {"type": "string"}})).unwrap();
        assert_eq!(format_field(Value::Null, &def, &ctx_empty()), json!([]));
    }

    #[test]
    fn object_reconforms_at_every_level() {
        let def: FieldDefinition = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "inner": {"type": "object", "properties": {"note": {"type": "string"}}},
            }
        }))
        .unwrap();
        // inner object present but missing its declared key
        let out = format_field(json!({"inner": {}}), &def, &ctx_empty());
        assert_eq!(out, json!({"inner": {"note": null}}));
    }

    #[test]
    fn require_id_survives_a_second_pass() {
        let props: FieldSet =
            [("title".to_string(), FieldDefinition::Plain)].into_iter().collect();
        let once = format_object(json!({"title": "t"}), &props, &ctx_empty(), true);
        let id = once["id"].clone();
        assert!(id.as_str().is_some_and(|s| !s.is_empty()));
        let twice = format_object(Value::Object(once), &props, &ctx_empty(), true);
        assert_eq!(twice["id"], id);
    }

    #[test]
    fn nested_objects_do_not_get_ids() {
        let def: FieldDefinition = serde_json::from_value(json!({
            "type": "object",
            "properties": {"note": {"type": "string"}},
        }))
        .unwrap();
        let FieldDefinition::Object { properties } = def else { unreachable!() };
        let root_props: FieldSet = [(
            "nested".to_string(),
            FieldDefinition::Object { properties },
        )]
        .into_iter()
        .collect();
        let out = format_object(json!({}), &root_props, &ctx_empty(), true);
        assert!(out.contains_key("id"));
        assert!(!out["nested"].as_object().unwrap().contains_key("id"));
    }

    #[test]
    fn imported_member_wins_over_persisted_lookup() {
        let members = vec![member("u-1", "Store Copy", &["lead"])];
        let imported = [json!({"id": "u-1", "name": "Imported Copy", "roles": ["reviewer"]})
            .as_object()
            .unwrap()
            .clone()];
        let ctx = FormatContext::new(&imported, &members);
        let out = resolve_user(json!("u-1"), &ctx);
        assert_eq!(out["name"], json!("Imported Copy"));
        assert_eq!(out["roles"], json!(["reviewer"]));
    }

    #[test]
    fn falls_back_to_persisted_member_then_null() {
        let members = vec![member("u-2", "Alex", &["pentester", "pentester", "lead"])];
        let ctx = FormatContext::new(&[], &members);

        let hit = resolve_user(json!("u-2"), &ctx);
        assert_eq!(hit["name"], json!("Alex"));
        // roles deduplicated, first occurrence order kept
        assert_eq!(hit["roles"], json!(["pentester", "lead"]));

        assert_eq!(resolve_user(json!("ghost"), &ctx), Value::Null);
    }

    #[test]
    fn object_reference_formats_directly() {
        let ctx = ctx_empty();
        let out = resolve_user(
            json!({"id": "x", "name": "Inline", "roles": ["lead", null, "lead"], "extra": true}),
            &ctx,
        );
        assert_eq!(out["name"], json!("Inline"));
        assert_eq!(out["roles"], json!(["lead"]));
        // only projection keys survive
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn null_reference_stays_null() {
        assert_eq!(resolve_user(Value::Null, &ctx_empty()), Value::Null);
    }
}
