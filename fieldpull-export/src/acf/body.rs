//! Export request-body encoding.
//!
//! The target parses these bodies positionally in places, so the wire bytes
//! are built by hand instead of through a generic form serializer. Two
//! encodings exist for the group identifiers: repeated percent-encoded
//! array-style pairs (`acf_export_keys%5B%5D=12&...`) for older targets, and
//! a single space-joined parameter (`keys=12+45`) for modern ones. The
//! trigger parameter always comes last; some target revisions stop parsing
//! at it.

use url::form_urlencoded;

use crate::acf::capability::CapabilityFacts;

/// Build the body for one submission. Pure; consumed exactly once upstream.
pub fn build(
    nonce: &str,
    groups: &[String],
    submit_label: Option<&str>,
    facts: &CapabilityFacts,
    structured: bool,
) -> String {
    let mut body = format!("{}={}{}", facts.nonce_field, nonce, facts.export_fragment);

    if facts.space_joined_keys {
        body.push_str(facts.groups_wire_name);
        body.push('=');
        body.push_str(&groups.join("+"));
    } else {
        let encoded_name: String =
            form_urlencoded::byte_serialize(facts.groups_wire_name.as_bytes()).collect();
        for id in groups {
            tracing::debug!(group = %id, "export.body.group");
            body.push_str(&encoded_name);
            body.push('=');
            body.push_str(id);
            body.push('&');
        }
        if !groups.is_empty() {
            body.pop(); // the trigger below supplies the next separator
        }
    }

    if structured {
        body.push_str(facts.structured_trigger);
    } else {
        body.push('&');
        body.push_str(facts.source_trigger_field);
        body.push('=');
        body.push_str(submit_label.unwrap_or(facts.default_label));
    }

    body
}
