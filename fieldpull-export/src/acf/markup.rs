//! Thin glue over the `scraper` crate.
//!
//! The pipeline consumes markup as a capability: parse a body, select nodes
//! by a CSS-like pattern, read attribute or text values. Selector strings
//! come from the capability table, so a compile failure is a programming
//! error surfaced as [`ExportError::Selector`] rather than a panic.

use scraper::{Html, Selector};

use crate::acf::error::ExportError;

/// Marker node present on the target's login page and nowhere else.
pub const LOGIN_FORM_SELECTOR: &str = "#loginform";

/// Where the generated source listing lands after a successful submit.
pub const RESULT_TEXTAREA_SELECTOR: &str = "#wpbody-content textarea";

/// One parsed response body.
pub struct Markup {
    doc: Html,
}

impl Markup {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    fn selector(pattern: &str) -> Result<Selector, ExportError> {
        Selector::parse(pattern).map_err(|_| ExportError::Selector {
            selector: pattern.to_string(),
        })
    }

    /// `attr` of the first node matching `pattern`, if any matches.
    pub fn first_attr(&self, pattern: &str, attr: &str) -> Result<Option<String>, ExportError> {
        let sel = Self::selector(pattern)?;
        Ok(self
            .doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(str::to_string))
    }

    /// `attr` of every matching node, in document order.
    pub fn all_attrs(&self, pattern: &str, attr: &str) -> Result<Vec<String>, ExportError> {
        let sel = Self::selector(pattern)?;
        Ok(self
            .doc
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect())
    }

    /// Concatenated text content of the first matching node.
    pub fn first_text(&self, pattern: &str) -> Result<Option<String>, ExportError> {
        let sel = Self::selector(pattern)?;
        Ok(self
            .doc
            .select(&sel)
            .next()
            .map(|el| el.text().collect::<String>()))
    }

    /// Whether any node matches `pattern`.
    pub fn has(&self, pattern: &str) -> Result<bool, ExportError> {
        let sel = Self::selector(pattern)?;
        Ok(self.doc.select(&sel).next().is_some())
    }

    /// The login form is the one marker we check on every page.
    pub fn has_login_form(&self) -> bool {
        self.has(LOGIN_FORM_SELECTOR).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_attrs_in_document_order() {
        let doc = Markup::parse(
            r#"<div class="acf-fields">
                 <input name="keys[]" value="12">
                 <input name="keys[]" value="45">
               </div>"#,
        );
        let values = doc
            .all_attrs(r#".acf-fields input[name="keys[]"]"#, "value")
            .unwrap();
        assert_eq!(values, vec!["12", "45"]);
    }

    #[test]
    fn detects_login_form() {
        let doc = Markup::parse(r#"<form id="loginform"><input name="log"></form>"#);
        assert!(doc.has_login_form());
        let doc = Markup::parse("<html><body>Dashboard</body></html>");
        assert!(!doc.has_login_form());
    }

    #[test]
    fn bad_selector_is_an_error_not_a_panic() {
        let doc = Markup::parse("<p></p>");
        assert!(matches!(
            doc.first_attr("p[", "value"),
            Err(ExportError::Selector { .. })
        ));
    }

    #[test]
    fn first_text_concatenates_children() {
        let doc = Markup::parse(r#"<textarea id="x">line one
line two</textarea>"#);
        let text = doc.first_text("#x").unwrap().unwrap();
        assert!(text.contains("line one"));
        assert!(text.contains("line two"));
    }
}
