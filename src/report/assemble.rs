use serde_json::{Map, Value};
use tracing::debug;

use crate::fields::format::{format_object, project_member_projection, FormatContext};
use crate::report::model::{Project, ProjectType};

/// Pull the raw rows for a project into the root tree shape:
/// `{report, findings, pentesters}`, still unformatted except for the
/// member projection applied to resolved members.
pub fn build_project_tree(project: &Project) -> Map<String, Value> {
    let mut report = Map::new();
    report.insert("id".into(), Value::String(project.id.clone()));
    for (k, v) in &project.report {
        report.insert(k.clone(), v.clone());
    }

    let findings: Vec<Value> = project
        .findings
        .iter()
        .map(|row| {
            let mut f = Map::new();
            f.insert("id".into(), Value::String(row.id.clone()));
            f.insert("created".into(), Value::String(row.created.to_rfc3339()));
            for (k, v) in &row.data {
                f.insert(k.clone(), v.clone());
            }
            Value::Object(f)
        })
        .collect();

    let pentesters: Vec<Value> = project
        .members
        .iter()
        .map(|m| Value::Object(project_member_projection(m)))
        .collect();

    let mut tree = Map::new();
    tree.insert("report".into(), Value::Object(report));
    tree.insert("findings".into(), Value::Array(findings));
    tree.insert("pentesters".into(), Value::Array(pentesters));
    tree
}

/// Normalize a root tree against a design: conform and format the report
/// and every finding (both get a synthesized `id` when missing), sort the
/// findings, and append the imported members to the pentester list.
///
/// Imported members are appended verbatim, not re-formatted: their shape is
/// already the member projection. They still participate in USER field
/// resolution through the format context.
pub fn format_report_data(
    mut data: Map<String, Value>,
    project_type: &ProjectType,
    ctx: &FormatContext,
) -> Map<String, Value> {
    let report = data.remove("report").unwrap_or(Value::Null);
    data.insert(
        "report".into(),
        Value::Object(format_object(report, &project_type.report_fields, ctx, true)),
    );

    let raw_findings = match data.remove("findings") {
        Some(Value::Array(rows)) => rows,
        _ => Vec::new(),
    };
    let mut findings: Vec<Map<String, Value>> = raw_findings
        .into_iter()
        .map(|row| format_object(row, &project_type.finding_fields, ctx, true))
        .collect();
    sort_findings(&mut findings);
    debug!("formatted {} findings", findings.len());
    data.insert(
        "findings".into(),
        Value::Array(findings.into_iter().map(Value::Object).collect()),
    );

    let mut pentesters = match data.remove("pentesters") {
        Some(Value::Array(p)) => p,
        _ => Vec::new(),
    };
    pentesters.extend(ctx.imported_members.iter().cloned().map(Value::Object));
    data.insert("pentesters".into(), Value::Array(pentesters));

    data
}

/// Highest severity first; ties broken by earliest creation, then by id
/// so the order is deterministic.
fn sort_findings(findings: &mut [Map<String, Value>]) {
    findings.sort_by(|a, b| {
        severity_key(b)
            .total_cmp(&severity_key(a))
            .then_with(|| text_key(a, "created").cmp(text_key(b, "created")))
            .then_with(|| text_key(a, "id").cmp(text_key(b, "id")))
    });
}

/// Numeric score of the formatted `cvss` field, 0 when absent or unparsable
fn severity_key(finding: &Map<String, Value>) -> f64 {
    finding
        .get("cvss")
        .and_then(|c| c.get("score"))
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

fn text_key<'a>(finding: &'a Map<String, Value>, key: &str) -> &'a str {
    finding.get(key).and_then(Value::as_str).unwrap_or("")
}
