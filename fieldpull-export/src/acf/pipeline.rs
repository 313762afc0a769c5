//! The session pipeline: one authenticated run from login to artifact.
//!
//! Stages run in strict sequence, each gated on the previous one having
//! succeeded; there is no branching back and no retry. A failure at any
//! stage aborts the whole run, and a fresh run restarts from `Init` with a
//! new session. Stage transitions are plain methods so they can be exercised
//! one at a time against a fake server.

use serde::Serialize;

use fieldpull_http::HttpSession;

use crate::acf::body;
use crate::acf::capability::{self, CapabilityFacts};
use crate::acf::error::ExportError;
use crate::acf::markup::{self, Markup};
use crate::acf::postprocess::{self, AddonFlags};
use crate::acf::version::Version;

/// Admin login for the target installation.
#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

/// What the caller wants out of the run.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Export the raw field-group data as JSON instead of PHP source.
    pub structured: bool,
    pub addons: AddonFlags,
    /// Extra boolean expression AND-ed into the registration guard.
    pub extra_condition: Option<String>,
}

/// The final exported text plus its line count.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub text: String,
    pub line_count: usize,
}

/// Pipeline stages, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    LoggedIn,
    VersionKnown,
    FormDiscovered,
    RequestBuilt,
    Submitted,
    ArtifactExtracted,
    Done,
}

/// Fixed admin paths, with the install's route prefix applied.
struct Routes {
    prefix: String,
}

impl Routes {
    fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| {
                if p.starts_with('/') {
                    p.to_string()
                } else {
                    format!("/{p}")
                }
            })
            .unwrap_or_default();
        Self { prefix }
    }

    fn login(&self) -> String {
        format!("{}/wp-login.php", self.prefix)
    }

    fn plugins(&self) -> String {
        format!("{}/wp-admin/plugins.php", self.prefix)
    }

    fn form(&self, facts: &CapabilityFacts) -> String {
        format!("{}{}", self.prefix, facts.form_path)
    }
}

/// Everything scraped off the export form page.
#[derive(Debug)]
struct FormTokens {
    nonce: String,
    groups: Vec<String>,
    submit_label: Option<String>,
}

/// One export run. Owns its session exclusively; never shared across runs.
pub struct ExportPipeline {
    session: HttpSession,
    routes: Routes,
    credentials: Credentials,
    request: ExportRequest,
    stage: Stage,
    version: Option<Version>,
    facts: Option<CapabilityFacts>,
    tokens: Option<FormTokens>,
    pending_body: Option<String>,
    response_text: Option<String>,
}

impl ExportPipeline {
    pub fn new(session: HttpSession, credentials: Credentials, request: ExportRequest) -> Self {
        Self {
            session,
            routes: Routes::new(None),
            credentials,
            request,
            stage: Stage::Init,
            version: None,
            facts: None,
            tokens: None,
            pending_body: None,
            response_text: None,
        }
    }

    /// Apply a path prefix for sub-directory installs.
    pub fn with_route_prefix(mut self, prefix: Option<&str>) -> Self {
        self.routes = Routes::new(prefix);
        self
    }

    /// Pin the session's `Referer` to this install's login page, which is
    /// what the admin UI expects for all follow-up navigation.
    pub fn with_login_referer(mut self) -> Result<Self, ExportError> {
        self.session = self.session.clone().with_referer(&self.routes.login())?;
        Ok(self)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The resolved target version, once version resolution has run.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Run every stage in order and hand back the artifact.
    pub async fn run(mut self) -> Result<Artifact, ExportError> {
        self.login().await?;
        self.resolve_version().await?;
        self.discover_form().await?;
        self.build_request()?;
        self.submit().await?;
        let artifact = self.extract()?;
        self.stage = Stage::Done;
        Ok(artifact)
    }

    /// `Init -> LoggedIn`. Idempotent: a second call short-circuits.
    pub async fn login(&mut self) -> Result<(), ExportError> {
        if self.stage >= Stage::LoggedIn {
            return Ok(());
        }

        let page = self
            .session
            .post_form(
                &self.routes.login(),
                &[
                    ("log", self.credentials.identifier.as_str()),
                    ("pwd", self.credentials.secret.as_str()),
                ],
            )
            .await?;

        if Markup::parse(&page.text).has_login_form() {
            return Err(ExportError::Authentication {
                status: page.status.as_u16(),
            });
        }

        tracing::info!("export.login.ok");
        self.stage = Stage::LoggedIn;
        Ok(())
    }

    /// `LoggedIn -> VersionKnown`. Resolves the capability facts for the run.
    pub async fn resolve_version(&mut self) -> Result<(), ExportError> {
        self.require(Stage::LoggedIn, "login")?;

        let page = self.session.get(&self.routes.plugins()).await?;
        let version = Version::from_listing(&Markup::parse(&page.text))?;

        tracing::info!(version = %version, "export.version.resolved");
        self.facts = Some(capability::resolve(version, self.request.structured));
        self.version = Some(version);
        self.stage = Stage::VersionKnown;
        Ok(())
    }

    /// `VersionKnown -> FormDiscovered`. Scrapes the nonce and group ids.
    pub async fn discover_form(&mut self) -> Result<(), ExportError> {
        self.require(Stage::VersionKnown, "version resolution")?;
        let facts = self.facts.as_ref().ok_or(ExportError::Sequence {
            needed: "version resolution",
        })?;

        let page = self.session.get(&self.routes.form(facts)).await?;
        let tokens = scrape_form(&page.text, facts)?;

        tracing::info!(groups = tokens.groups.len(), "export.form.discovered");
        self.tokens = Some(tokens);
        self.stage = Stage::FormDiscovered;
        Ok(())
    }

    /// `FormDiscovered -> RequestBuilt`. Pure; no network.
    pub fn build_request(&mut self) -> Result<(), ExportError> {
        self.require(Stage::FormDiscovered, "form discovery")?;
        let (facts, tokens) = match (self.facts.as_ref(), self.tokens.as_ref()) {
            (Some(f), Some(t)) => (f, t),
            _ => {
                return Err(ExportError::Sequence {
                    needed: "form discovery",
                });
            }
        };

        let body = body::build(
            &tokens.nonce,
            &tokens.groups,
            tokens.submit_label.as_deref(),
            facts,
            self.request.structured,
        );

        tracing::debug!(body_len = body.len(), "export.request.built");
        self.pending_body = Some(body);
        self.stage = Stage::RequestBuilt;
        Ok(())
    }

    /// `RequestBuilt -> Submitted`. The body is consumed exactly once.
    pub async fn submit(&mut self) -> Result<(), ExportError> {
        self.require(Stage::RequestBuilt, "request building")?;
        let facts = self.facts.as_ref().ok_or(ExportError::Sequence {
            needed: "request building",
        })?;
        let pending = self.pending_body.take().ok_or(ExportError::Sequence {
            needed: "request building",
        })?;

        let form = self.routes.form(facts);
        let page = if facts.query_string_payload {
            // Newer targets read the payload off the query string and ignore
            // the POST body entirely.
            self.session
                .post_encoded(&format!("{form}&{pending}"), String::new())
                .await?
        } else {
            self.session.post_encoded(&form, pending).await?
        };

        self.response_text = Some(page.text);
        self.stage = Stage::Submitted;
        Ok(())
    }

    /// `Submitted -> ArtifactExtracted`. Pure; no network.
    pub fn extract(&mut self) -> Result<Artifact, ExportError> {
        self.require(Stage::Submitted, "submission")?;
        let text = self.response_text.take().ok_or(ExportError::Sequence {
            needed: "submission",
        })?;

        let artifact_text = if self.request.structured {
            pretty_structured(&text)?
        } else {
            let source = extract_source(&text)?;
            postprocess::apply(
                source,
                &self.request.addons,
                self.request.extra_condition.as_deref(),
            )
        };

        let line_count = artifact_text.lines().count();
        if line_count == 0 {
            tracing::warn!("export.artifact.empty");
        } else {
            tracing::info!(lines = line_count, "export.artifact.ready");
        }

        self.stage = Stage::ArtifactExtracted;
        Ok(Artifact {
            text: artifact_text,
            line_count,
        })
    }

    fn require(&self, at_least: Stage, needed: &'static str) -> Result<(), ExportError> {
        if self.stage < at_least {
            return Err(ExportError::Sequence { needed });
        }
        Ok(())
    }
}

/// Pull the nonce, group identifiers, and optional submit label off the
/// export form page.
fn scrape_form(html: &str, facts: &CapabilityFacts) -> Result<FormTokens, ExportError> {
    let doc = Markup::parse(html);

    if doc.has_login_form() {
        return Err(ExportError::SessionExpired);
    }

    let nonce = doc
        .first_attr(facts.nonce_selector, "value")?
        .ok_or_else(|| ExportError::MissingToken {
            selector: facts.nonce_selector.to_string(),
        })?;

    let groups = doc.all_attrs(facts.group_selector, "value")?;
    if groups.is_empty() {
        return Err(ExportError::NoExportTargets {
            selector: facts.group_selector.to_string(),
        });
    }

    let submit_label = match facts.submit_label_selector {
        Some(selector) => doc.first_attr(selector, "value")?.filter(|v| !v.is_empty()),
        None => None,
    };

    Ok(FormTokens {
        nonce,
        groups,
        submit_label,
    })
}

/// Source-code export: the artifact lives in the result text area and gets
/// the fixed header marker prefixed.
fn extract_source(html: &str) -> Result<String, ExportError> {
    let doc = Markup::parse(html);
    let text = doc
        .first_text(markup::RESULT_TEXTAREA_SELECTOR)?
        .ok_or(ExportError::NoArtifactFound)?;
    Ok(format!("<?php \n{text}"))
}

/// Structured export: re-serialize the raw response with stable tab
/// indentation.
fn pretty_structured(text: &str) -> Result<String, ExportError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| ExportError::NoArtifactFound)?;
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|_| ExportError::NoArtifactFound)?;
    String::from_utf8(buf).map_err(|_| ExportError::NoArtifactFound)
}
