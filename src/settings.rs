//! Session context the resolver builds columns from.

use serde::{Deserialize, Serialize};

/// Client-side knobs that change how columns are built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Interpret `DateTime` columns without an explicit timezone in the
    /// client's local zone instead of the server's.
    pub use_client_time_zone: bool,
    /// Decode `String`/`FixedString` columns to raw bytes.
    pub strings_as_bytes: bool,
    /// Reject items of the wrong kind and normalize out-of-range values
    /// before packing.
    pub types_check: bool,
}

impl ClientSettings {
    pub fn with_use_client_time_zone(mut self, value: bool) -> Self {
        self.use_client_time_zone = value;
        self
    }

    pub fn with_strings_as_bytes(mut self, value: bool) -> Self {
        self.strings_as_bytes = value;
        self
    }

    pub fn with_types_check(mut self, value: bool) -> Self {
        self.types_check = value;
        self
    }
}

/// What the server told us about itself during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    pub timezone: Option<String>,
}

impl ServerInfo {
    pub fn with_timezone<S: Into<String>>(mut self, timezone: S) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub settings: ClientSettings,
    pub server_info: ServerInfo,
}

impl Context {
    pub fn new(settings: ClientSettings, server_info: ServerInfo) -> Self {
        Context {
            settings,
            server_info,
        }
    }

    pub fn with_settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_server_info(mut self, server_info: ServerInfo) -> Self {
        self.server_info = server_info;
        self
    }
}
