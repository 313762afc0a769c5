//! Version-adaptive export client for the ACF admin interface.
//!
//! The target exposes no programmatic API, so everything here works against
//! the admin UI's HTML: log in, detect the installed plugin version, fetch
//! the version-appropriate export form, submit it, and pull the generated
//! artifact out of the response. All version-specific knowledge (URLs,
//! selectors, field names) lives in one capability table.

pub mod acf;
