//! Plugin version parsing and the listing-page lookup.
//!
//! Versions are 2- or 3-component dotted numerals pulled out of free text
//! like `Version 5.6.10 | By Elliot Condon`. A missing patch component
//! compares as 0, so `5.6` and `5.6.0` are the same version everywhere.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::acf::error::ExportError;
use crate::acf::markup::Markup;

/// Listing-page slot for the current / pro plugin row. Checked first.
pub const CURRENT_PLUGIN_SELECTOR: &str = "#advanced-custom-fields-pro .plugin-version-author-uri, [data-slug=\"advanced-custom-fields\"] .plugin-version-author-uri";

/// Listing-page slot for the legacy plugin row.
pub const LEGACY_PLUGIN_SELECTOR: &str = "#advanced-custom-fields .plugin-version-author-uri, [data-slug=\"advanced-custom-fields-pro\"] .plugin-version-author-uri";

static VERSION_RE: OnceLock<Regex> = OnceLock::new();

/// An installed plugin version. Immutable once parsed.
#[derive(Debug, Clone, Copy)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch: Some(patch),
        }
    }

    /// Comparison key: a missing patch component counts as 0.
    fn key(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch.unwrap_or(0))
    }

    /// Find the first dotted numeral in free text and parse it.
    pub fn parse_from_text(text: &str) -> Result<Self, ExportError> {
        let re = VERSION_RE
            .get_or_init(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern"));
        let caps = re.captures(text).ok_or_else(|| ExportError::VersionParse {
            text: text.to_string(),
        })?;
        let parse = |idx: usize| -> Result<u32, ExportError> {
            caps.get(idx)
                .map(|m| m.as_str())
                .unwrap_or("0")
                .parse()
                .map_err(|_| ExportError::VersionParse {
                    text: text.to_string(),
                })
        };
        Ok(Self {
            major: parse(1)?,
            minor: parse(2)?,
            patch: caps.get(3).map(|m| m.as_str().parse()).transpose().map_err(
                |_| ExportError::VersionParse {
                    text: text.to_string(),
                },
            )?,
        })
    }

    /// Read the installed version from the plugin listing page markup.
    ///
    /// The current/pro slot wins when both slots carry text; an installation
    /// with neither slot populated is reported as not installed.
    pub fn from_listing(doc: &Markup) -> Result<Self, ExportError> {
        let current = doc.first_text(CURRENT_PLUGIN_SELECTOR)?;
        let legacy = doc.first_text(LEGACY_PLUGIN_SELECTOR)?;
        let text = match (current, legacy) {
            (Some(t), _) if !t.trim().is_empty() => t,
            (_, Some(t)) if !t.trim().is_empty() => t,
            _ => return Err(ExportError::NotInstalled),
        };
        Self::parse_from_text(&text)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}
