//! Text substitutions applied to source-code artifacts.
//!
//! Two independent rewrites, both first-occurrence-only and both no-ops when
//! their pattern is absent (not every target revision emits both guard
//! styles, so a miss is success, not failure):
//!
//! 1. activate optional add-on includes by swapping the commented-out
//!    directive the export carries for an active `ABSPATH`-rooted one
//! 2. splice an extra boolean condition into the registration guard with a
//!    logical AND, matching whichever of the two known guard styles is
//!    present

/// Which add-on includes to activate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddonFlags {
    pub repeater: bool,
    pub gallery: bool,
    pub flexible_content: bool,
    pub options_page: bool,
}

impl AddonFlags {
    pub fn any(&self) -> bool {
        self.repeater || self.gallery || self.flexible_content || self.options_page
    }
}

// (commented directive as exported, active replacement); order matches the
// flag order in `AddonFlags`.
const ADDON_INCLUDES: [(&str, &str); 4] = [
    (
        "// include_once('add-ons/acf-repeater/acf-repeater.php');",
        "include_once( ABSPATH . '/wp-content/plugins/acf-repeater/acf-repeater.php');",
    ),
    (
        "// include_once('add-ons/acf-gallery/acf-gallery.php');",
        "include_once( ABSPATH . '/wp-content/plugins/acf-gallery/acf-gallery.php');",
    ),
    (
        "// include_once('add-ons/acf-flexible-content/acf-flexible-content.php');",
        "include_once( ABSPATH . '/wp-content/plugins/acf-flexible-content/acf-flexible-content.php');",
    ),
    (
        "// include_once( 'add-ons/acf-options-page/acf-options-page.php' );",
        "include_once( ABSPATH . '/wp-content/plugins/acf-options-page/acf-options-page.php');",
    ),
];

const LEGACY_GUARD: &str = r#"if(function_exists("register_field_group"))"#;
const CURRENT_GUARD: &str = "if( function_exists('register_field_group') ):";

/// Apply the enabled rewrites to a source-code artifact.
///
/// With no add-ons enabled and no extra condition this returns its input
/// unchanged, and applying it twice yields the same result as applying it
/// once: an already-activated include no longer carries the commented
/// pattern, and an already-guarded expression no longer matches either guard
/// literal.
pub fn apply(artifact: String, addons: &AddonFlags, extra_condition: Option<&str>) -> String {
    let mut out = artifact;

    let enabled = [
        addons.repeater,
        addons.gallery,
        addons.flexible_content,
        addons.options_page,
    ];
    if addons.any() {
        tracing::debug!("export.postprocess.addons");
        for (on, (from, to)) in enabled.iter().zip(ADDON_INCLUDES) {
            if *on {
                out = out.replacen(from, to, 1);
            }
        }
    }

    if let Some(condition) = extra_condition {
        tracing::debug!("export.postprocess.condition");
        out = out.replacen(
            LEGACY_GUARD,
            &format!(r#"if(function_exists("register_field_group") && {condition} )"#),
            1,
        );
        out = out.replacen(
            CURRENT_GUARD,
            &format!("if( function_exists('register_field_group') && {condition} ):"),
            1,
        );
    }

    out
}
