//! The version-to-behavior capability table.
//!
//! One pure function maps `(version, structured)` to every routing, selector,
//! field-name, and encoding fact the rest of the pipeline needs. The target's
//! admin markup changed shape four times over its history, giving the
//! non-overlapping ranges `<5.0`, `5.0–5.2`, `5.3–5.6.4`, and `>=5.6.5`;
//! ranges are resolved by proper tuple comparison, so `5.10`, `5.11`, and
//! `6.0` land where numeric ordering puts them. Nothing outside this module
//! may branch on a version except the pipeline's single legacy/current split
//! on the major component.

use crate::acf::version::Version;

/// Immutable facts resolved once per run.
///
/// `export_fragment` is the URI fragment spliced between the nonce and the
/// group keys; it is the only field that may differ between the structured
/// and source flavours of the same version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityFacts {
    /// Export form path, relative to the install root.
    pub form_path: &'static str,
    /// Wire name of the anti-forgery token field.
    pub nonce_field: &'static str,
    /// Selector locating the nonce input on the form page.
    pub nonce_selector: &'static str,
    /// Selector locating the selectable group identifiers.
    pub group_selector: &'static str,
    /// Selector for the submit control whose `value` is a human label, if
    /// this version exposes one. `None` means use the default label.
    pub submit_label_selector: Option<&'static str>,
    /// Wire name under which group identifiers are encoded.
    pub groups_wire_name: &'static str,
    /// Fragment between the nonce and the keys, verbatim.
    pub export_fragment: &'static str,
    /// Field name carrying the "generate source" trigger.
    pub source_trigger_field: &'static str,
    /// Full trailing parameter for structured-data export, verbatim.
    pub structured_trigger: &'static str,
    /// Fallback submit label when the UI supplies none.
    pub default_label: &'static str,
    /// Encode groups as one space-joined `keys=a+b` parameter instead of
    /// repeated array-style pairs.
    pub space_joined_keys: bool,
    /// Append the body to the form URL's query string instead of posting it.
    pub query_string_payload: bool,
}

/// Resolve the facts for one `(version, structured)` pair.
///
/// Deterministic, no I/O. The newer range wins at every boundary: `5.6.5`
/// itself already gets the `>=5.6.5` facts, `5.6.4` still gets the older
/// ones.
pub fn resolve(version: Version, structured: bool) -> CapabilityFacts {
    if version >= Version::new(5, 6, 5) {
        CapabilityFacts {
            form_path: "/wp-admin/edit.php?post_type=acf-field-group&page=acf-tools",
            nonce_field: "_acf_nonce",
            nonce_selector: r#"input[name="_acf_nonce"]"#,
            group_selector: r#".acf-fields input[name="keys[]"]"#,
            // The modern submit button's value is the action token, not a
            // label, so the default label is always used.
            submit_label_selector: None,
            groups_wire_name: "keys",
            export_fragment: if structured {
                "&action=download&"
            } else {
                "&tool=export&"
            },
            source_trigger_field: "generate",
            structured_trigger: "&action=download",
            default_label: "Erstelle+Export+Code",
            space_joined_keys: true,
            query_string_payload: true,
        }
    } else if version >= Version::new(5, 3, 0) {
        // 5.3 – 5.6.4; the nonce field was renamed at 5.6.0 without any
        // other observable change.
        let (nonce_field, nonce_selector) = if version >= Version::new(5, 6, 0) {
            ("_acf_nonce", r#"input[name="_acf_nonce"]"#)
        } else {
            ("_acfnonce", r#"input[name="_acfnonce"]"#)
        };
        mid_range_facts(
            "/wp-admin/edit.php?post_type=acf-field-group&page=acf-settings-tools",
            nonce_field,
            nonce_selector,
        )
    } else if version >= Version::new(5, 0, 0) {
        // 5.0 – 5.2
        mid_range_facts(
            "/wp-admin/edit.php?post_type=acf-field-group&page=acf-settings-export",
            "_acfnonce",
            r#"input[name="_acfnonce"]"#,
        )
    } else {
        // < 5.0
        CapabilityFacts {
            form_path: "/wp-admin/edit.php?post_type=acf&page=acf-export",
            nonce_field: "nonce",
            nonce_selector: r#"#wpbody-content .wrap form input[name="nonce"]"#,
            group_selector: "form table select option",
            submit_label_selector: None,
            groups_wire_name: "acf_posts[]",
            export_fragment: "&acf_posts=&",
            source_trigger_field: "export_to_php",
            structured_trigger: "&download=JSON-Datei exportieren",
            default_label: "Export+als+PHP",
            space_joined_keys: false,
            query_string_payload: false,
        }
    }
}

/// Facts shared by the two mid ranges (5.0–5.2 and 5.3–5.6.4); only the form
/// path and nonce naming differ between them.
fn mid_range_facts(
    form_path: &'static str,
    nonce_field: &'static str,
    nonce_selector: &'static str,
) -> CapabilityFacts {
    CapabilityFacts {
        form_path,
        nonce_field,
        nonce_selector,
        group_selector: r#"#acf-export-field-groups input[name="acf_export_keys[]"]"#,
        submit_label_selector: Some(r#"input[name="generate"]"#),
        groups_wire_name: "acf_export_keys[]",
        export_fragment: "&acf_export_keys=&",
        source_trigger_field: "generate",
        structured_trigger: "&download=JSON-Datei exportieren",
        default_label: "Erstelle+Export+Code",
        space_joined_keys: false,
        query_string_payload: false,
    }
}
