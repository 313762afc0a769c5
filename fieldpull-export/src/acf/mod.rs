//! The ACF export surface: one pipeline per run plus its pure helpers.
//!
//! Submodules split along the seams of the session pipeline: version
//! detection, the version-to-behavior capability table, markup querying,
//! request-body encoding, and artifact post-processing. The pipeline in
//! [`pipeline`] is the only stateful piece.

pub mod body;
pub mod capability;
pub mod error;
pub mod markup;
pub mod pipeline;
pub mod postprocess;
pub mod version;

pub use capability::CapabilityFacts;
pub use error::ExportError;
pub use pipeline::{Artifact, Credentials, ExportPipeline, ExportRequest};
pub use postprocess::AddonFlags;
pub use version::Version;
