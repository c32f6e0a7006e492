//! Offline helpers for the invocation and postprocessing steps: render the
//! request a dataset row would produce, and pull the output field out of a
//! response.

pub mod field_path;
pub mod request;

pub use field_path::{FieldPath, FieldPathError, PathSegment};
pub use request::{RenderError, RenderedBody, RenderedRequest, interpolate, render_request};
