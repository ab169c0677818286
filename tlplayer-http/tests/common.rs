use std::sync::OnceLock;

use tlplayer_common::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "tlplayer-tests".into(),
            log_dir: Some(std::env::temp_dir().join("tlplayer-tests")),
            emit_stderr: false,
            format: if std::env::var("TLPLAYER_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".into(),
        };

        tlplayer_common::init_logging(config).unwrap_or_default()
    });
}
