use std::sync::OnceLock;

use fieldpull_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "fieldpull-tests",
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug",
            ..LogConfig::default()
        };

        fieldpull_common::observability::init_logging(config).unwrap_or_default()
    });
}
