use crate::logging::LogFormat;
use std::env::var;

/// Settings read from the environment
///
/// Command line flags take precedence; see `main`.
pub struct Config {
    pub db_path: String,
    pub owner_secret: Option<String>,
    pub admin_id: Option<String>,
    pub admin_password: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path: String = match var("BALLOTBOX_DB_PATH") {
            Ok(val) => val,
            Err(_e) => "./ballotbox.db".to_owned(),
        };

        let log_format = match var("BALLOTBOX_LOG_FORMAT") {
            Ok(val) if val.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };

        Config {
            db_path,
            owner_secret: var("BALLOTBOX_OWNER_SECRET").ok(),
            admin_id: var("BALLOTBOX_ADMIN_ID").ok(),
            admin_password: var("BALLOTBOX_ADMIN_PASSWORD").ok(),
            log_format,
        }
    }
}
