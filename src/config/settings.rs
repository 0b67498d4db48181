use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Covers the WebSocket relay, the REST login API and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

/// Bind address of the WebSocket relay.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Relay behaviour.
///
/// `admin_token` is the shared secret that grants the admin role when a
/// client presents it as its `clientName`. It is also the value the login API
/// hands out.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaySettings {
    pub admin_token: String,
    /// Seconds without any inbound frame (pongs to keepalive pings included)
    /// before a connection is closed. `0` disables both.
    pub idle_timeout_secs: u64,
    /// Queued outbound frames at which the backpressure hook fires.
    pub backpressure_threshold: usize,
    /// Largest inbound message or frame accepted, in bytes.
    pub max_payload_bytes: usize,
}

/// Bind address and credential store of the REST login API.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub users: Vec<UserCredentials>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Default, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub api: Option<PartialApiSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub admin_token: Option<String>,
    pub idle_timeout_secs: Option<u64>,
    pub backpressure_threshold: Option<usize>,
    pub max_payload_bytes: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialApiSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub users: Option<Vec<UserCredentials>>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Settings {
    /// Fill the gaps of `partial` with default values.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();

        let server = match partial.server {
            Some(s) => ServerSettings {
                host: s.host.unwrap_or(default.server.host),
                port: s.port.unwrap_or(default.server.port),
            },
            None => default.server,
        };

        let relay = match partial.relay {
            Some(r) => RelaySettings {
                admin_token: r.admin_token.unwrap_or(default.relay.admin_token),
                idle_timeout_secs: r
                    .idle_timeout_secs
                    .unwrap_or(default.relay.idle_timeout_secs),
                backpressure_threshold: r
                    .backpressure_threshold
                    .unwrap_or(default.relay.backpressure_threshold),
                max_payload_bytes: r
                    .max_payload_bytes
                    .unwrap_or(default.relay.max_payload_bytes),
            },
            None => default.relay,
        };

        let api = match partial.api {
            Some(a) => ApiSettings {
                host: a.host.unwrap_or(default.api.host),
                port: a.port.unwrap_or(default.api.port),
                users: a.users.unwrap_or(default.api.users),
            },
            None => default.api,
        };

        let logging = match partial.logging {
            Some(l) => LoggingSettings {
                level: l.level.unwrap_or(default.logging.level),
            },
            None => default.logging,
        };

        Self {
            server,
            relay,
            api,
            logging,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 9001,
            },
            relay: RelaySettings {
                admin_token: "random-generated-token-12345".to_string(),
                idle_timeout_secs: 60,
                backpressure_threshold: 1024,
                max_payload_bytes: 16 * 1024 * 1024,
            },
            api: ApiSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
                users: vec![
                    UserCredentials {
                        username: "admin".to_string(),
                        password: "admin123".to_string(),
                    },
                    UserCredentials {
                        username: "user".to_string(),
                        password: "user123".to_string(),
                    },
                ],
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}
