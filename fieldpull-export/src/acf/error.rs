//! Closed error taxonomy for one export run.
//!
//! Every variant is fatal: the pipeline never retries, and a failed run is
//! restarted from scratch. Variants carry the offending text or selector so
//! a mismatch against an unmodelled target version can be diagnosed from the
//! error alone.

use fieldpull_http::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// A stage ran before its predecessor completed. Programming error.
    #[error("pipeline stage out of order: {needed} must complete first")]
    Sequence { needed: &'static str },

    /// The login form came back after submitting credentials.
    #[error("login rejected (status {status}): credentials were not accepted")]
    Authentication { status: u16 },

    /// The login form reappeared mid-run; the session likely timed out.
    #[error("unexpected login form mid-run; session expired?")]
    SessionExpired,

    /// Neither plugin slot on the listing page carried version text.
    #[error("ACF plugin not found on the plugin listing page")]
    NotInstalled,

    /// Version text was present but no dotted numeral could be parsed.
    #[error("could not parse an ACF version from {text:?}")]
    VersionParse { text: String },

    /// The nonce selector matched nothing on the export form.
    #[error("no anti-forgery token matched selector {selector:?}")]
    MissingToken { selector: String },

    /// The group selector matched nothing: nothing to export.
    #[error("no exportable field groups matched selector {selector:?}")]
    NoExportTargets { selector: String },

    /// The submit response carried no recognisable artifact.
    #[error("no export artifact found in the submit response")]
    NoArtifactFound,

    /// A capability-table selector failed to compile. Programming error.
    #[error("selector {selector:?} failed to compile")]
    Selector { selector: String },

    /// Transport-level failure; opaque and fatal.
    #[error(transparent)]
    Session(#[from] SessionError),
}
