//! Identity the application registers under.

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_APP_ID: &str = "raddar";
pub const DEFAULT_APP_NAME: &str = "Raddar";
pub const DEFAULT_DEVICE_NAME: &str = "Raddar CLI";

/// Application identity sent to `login/authorize/`.
///
/// Fixed at startup. The router shows `app_name` and `device_name` on its
/// display when asking the user to approve the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub device_name: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}
