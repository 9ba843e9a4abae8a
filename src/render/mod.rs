pub mod transport;

use std::collections::BTreeMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ErrorMessage, MessageLevel, MessageLocation, RenderError};
use crate::fields::format::FormatContext;
use crate::report::assemble::{build_project_tree, format_report_data};
use crate::report::model::{NoMembers, Project, ProjectType};

use self::transport::RenderTransport;

/// The payload submitted to the rendering worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub template: String,
    pub styles: String,
    pub data: Value,
    pub language: String,
    pub password: Option<String>,
    /// Resource path (`/assets/name/...`, `/images/name/...`) to base64 content
    pub resources: BTreeMap<String, String>,
}

/// What the worker hands back: a base64 document on success, diagnostics
/// otherwise. Absence of the document is the failure discriminant, not
/// presence of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub messages: Vec<WorkerMessage>,
}

/// One raw diagnostic as emitted by the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerMessage {
    #[serde(default)]
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Tunables of the dispatch loop
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Fixed readiness poll interval. No backoff, no built-in timeout; a
    /// caller wanting bounded wait must wrap the render call.
    pub poll_interval: Duration,
    /// Raise a distinct `NoOutput` error when the worker returns neither
    /// a document nor diagnostics
    pub strict_empty_result: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            poll_interval: Duration::from_millis(200),
            strict_empty_result: false,
        }
    }
}

/// Explicit template/styles overrides; unset fields fall back to the design
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOverrides<'a> {
    pub template: Option<&'a str>,
    pub styles: Option<&'a str>,
}

/// The full render pipeline: normalize project data against its design,
/// then dispatch a job to the worker and interpret the result.
pub struct RenderPipeline<'a> {
    transport: &'a dyn RenderTransport,
    options: RenderOptions,
}

impl<'a> RenderPipeline<'a> {
    pub fn new(transport: &'a dyn RenderTransport, options: RenderOptions) -> Self {
        RenderPipeline { transport, options }
    }

    /// Render a stored project to PDF bytes
    pub async fn render_project(
        &self,
        project: &Project,
        project_type: &ProjectType,
        overrides: RenderOverrides<'_>,
        password: Option<&str>,
    ) -> Result<Vec<u8>, RenderError> {
        let template = overrides.template.unwrap_or(&project_type.report_template);
        let styles = overrides.styles.unwrap_or(&project_type.report_styles);

        let ctx = FormatContext::new(&project.imported_members, project);
        let data = format_report_data(build_project_tree(project), project_type, &ctx);

        self.dispatch(
            project_type,
            template,
            styles,
            Value::Object(data),
            &project.language,
            password,
            gather_resources(project_type, Some(project)),
        )
        .await
    }

    /// Render caller-supplied, report-shaped preview data: no project
    /// context, no imported members, no password. Lets a design be tried
    /// out before any findings or users exist.
    pub async fn render_preview(
        &self,
        project_type: &ProjectType,
        overrides: RenderOverrides<'_>,
        preview_data: serde_json::Map<String, Value>,
    ) -> Result<Vec<u8>, RenderError> {
        let template = overrides.template.unwrap_or(&project_type.report_template);
        let styles = overrides.styles.unwrap_or(&project_type.report_styles);

        let ctx = FormatContext::new(&[], &NoMembers);
        let data = format_report_data(preview_data, project_type, &ctx);

        self.dispatch(
            project_type,
            template,
            styles,
            Value::Object(data),
            &project_type.language,
            None,
            gather_resources(project_type, None),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        project_type: &ProjectType,
        template: &str,
        styles: &str,
        data: Value,
        language: &str,
        password: Option<&str>,
        resources: BTreeMap<String, String>,
    ) -> Result<Vec<u8>, RenderError> {
        let job = RenderJob {
            template: template.to_string(),
            styles: styles.to_string(),
            data,
            language: language.to_string(),
            password: password.map(str::to_string),
            resources,
        };

        let handle = self.transport.submit(job).await?;
        debug!("submitted render job {handle}");

        // deliberate busy-poll: suspend only between readiness checks
        while !self.transport.is_ready(&handle).await? {
            tokio::time::sleep(self.options.poll_interval).await;
        }
        let result = self.transport.fetch_result(&handle).await?;

        match result.pdf.filter(|pdf| !pdf.is_empty()) {
            Some(encoded) => {
                let bytes = STANDARD.decode(encoded)?;
                info!("render job {handle} produced {} bytes", bytes.len());
                Ok(bytes)
            }
            None => {
                if result.messages.is_empty() && self.options.strict_empty_result {
                    return Err(RenderError::NoOutput {
                        location: MessageLocation::design(project_type),
                    });
                }
                let messages = result
                    .messages
                    .into_iter()
                    .map(|m| ErrorMessage {
                        level: MessageLevel::from_tag(&m.level),
                        location: MessageLocation::design(project_type),
                        message: m.message,
                        details: m.details,
                    })
                    .collect();
                Err(RenderError::Rendering { messages })
            }
        }
    }
}

/// Collect the resource map for a job: design assets first, project images
/// second. The merge is right-biased, so images win should the flat key
/// spaces ever collide.
fn gather_resources(
    project_type: &ProjectType,
    project: Option<&Project>,
) -> BTreeMap<String, String> {
    let mut resources = BTreeMap::new();
    for asset in &project_type.assets {
        resources.insert(
            format!("/assets/name/{}", asset.name),
            STANDARD.encode(&asset.content),
        );
    }
    if let Some(project) = project {
        for image in &project.images {
            resources.insert(
                format!("/images/name/{}", image.name),
                STANDARD.encode(&image.content),
            );
        }
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::NamedBlob;
    use serde_json::json;

    fn design_with_asset() -> ProjectType {
        ProjectType {
            id: "pt-1".into(),
            name: "Design".into(),
            language: "en-US".into(),
            report_template: "<template/>".into(),
            report_styles: String::new(),
            report_fields: Default::default(),
            finding_fields: Default::default(),
            assets: vec![NamedBlob {
                name: "logo.png".into(),
                content: b"logo".to_vec(),
            }],
        }
    }

    #[test]
    fn resources_are_keyed_by_path_convention() {
        let design = design_with_asset();
        let project: Project = serde_json::from_value(json!({
            "id": "p-1",
            "language": "en-US",
            "images": [{"name": "shot.png", "content": STANDARD.encode(b"shot")}],
        }))
        .unwrap();

        let resources = gather_resources(&design, Some(&project));
        assert_eq!(resources["/assets/name/logo.png"], STANDARD.encode(b"logo"));
        assert_eq!(resources["/images/name/shot.png"], STANDARD.encode(b"shot"));
    }

    #[test]
    fn preview_gathers_no_project_images() {
        let resources = gather_resources(&design_with_asset(), None);
        assert_eq!(resources.len(), 1);
        assert!(resources.contains_key("/assets/name/logo.png"));
    }

    #[test]
    fn job_result_tolerates_missing_fields() {
        let result: JobResult = serde_json::from_value(json!({})).unwrap();
        assert!(result.pdf.is_none());
        assert!(result.messages.is_empty());

        let result: JobResult = serde_json::from_value(json!({
            "messages": [{"message": "boom"}]
        }))
        .unwrap();
        assert_eq!(result.messages[0].message, "boom");
        assert_eq!(result.messages[0].level, "");
    }
}
