//! Pentest report pipeline: normalizes schema-driven report data into a
//! rendering-ready tree and dispatches PDF rendering to an asynchronous
//! worker.
//!
//! The pipeline, leaf first: a closed field-type model ([`fields`]), a
//! schema conformance step that fills defaults without dropping drifted
//! keys, a recursive formatter that replaces leaves with their rendered
//! representation, report assembly that orders findings by severity, and
//! the job dispatch/poll/result protocol ([`render`]).

pub mod cvss;
pub mod error;
pub mod fields;
pub mod render;
pub mod report;

pub use error::{ErrorMessage, MessageLevel, MessageLocation, RenderError, TransportError};
pub use render::transport::{JobHandle, RenderTransport, SpoolTransport};
pub use render::{JobResult, RenderJob, RenderOptions, RenderOverrides, RenderPipeline, WorkerMessage};
pub use report::model::{Project, ProjectType};
