use std::env;

pub const DEFAULT_ZMQ_ENDPOINT: &str = "tcp://127.0.0.1:28332";

pub const DEFAULT_TOPICS: [&str; 10] = [
    "hashtx",
    "hashblock",
    "hashgovernanceobject",
    "hashgovernancevote",
    "rawgovernanceobject",
    "rawgovernancevote",
    "hashtxlock",
    "rawtx",
    "rawtxlock",
    "rawblock",
];

#[derive(Debug, Clone, PartialEq)]
pub enum BackendType {
    Csv,
    Sqlite,
}

/// Credentials for the InitialState events API
#[derive(Debug, Clone, PartialEq)]
pub struct InitialStateCredentials {
    pub access_key: String,
    pub bucket_key: String,
    pub bucket_name: String,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub zmq_endpoint: String,
    pub zmq_topics: Vec<String>,
    pub audit_backend: BackendType,
    pub audit_log_path: String,
    /// `None` reports to the log instead of InitialState
    pub initialstate: Option<InitialStateCredentials>,
    pub rust_log: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RuntimeConfig {
    /// Problems with the topic list that do not prevent startup. Returned
    /// rather than logged so the caller can emit them once the logger is up.
    pub fn topic_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.zmq_topics.iter().any(|t| t == "hashtx") {
            warnings.push(
                "ZMQ_TOPICS does not include 'hashtx'; aggregation windows will stay at zero".to_string(),
            );
        }
        warnings
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let zmq_endpoint = lookup("ZMQ_ENDPOINT").unwrap_or_else(|| DEFAULT_ZMQ_ENDPOINT.to_string());

        if !["tcp://", "ipc://", "inproc://"]
            .iter()
            .any(|scheme| zmq_endpoint.starts_with(scheme))
        {
            return Err(ConfigError::InvalidValue(
                "ZMQ_ENDPOINT must start with tcp://, ipc:// or inproc://".to_string(),
            ));
        }

        let zmq_topics: Vec<String> = match lookup("ZMQ_TOPICS") {
            Some(raw) => raw
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        };

        if zmq_topics.is_empty() {
            return Err(ConfigError::InvalidValue("ZMQ_TOPICS cannot be empty".to_string()));
        }

        let backend_str = lookup("AUDIT_BACKEND").unwrap_or_else(|| "csv".to_string());
        let audit_backend = match backend_str.to_lowercase().as_str() {
            "csv" => BackendType::Csv,
            "sqlite" => BackendType::Sqlite,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "AUDIT_BACKEND must be csv or sqlite, got '{}'",
                    other
                )))
            }
        };

        let audit_log_path = lookup("AUDIT_LOG_PATH").unwrap_or_else(|| match audit_backend {
            BackendType::Csv => "messages.csv".to_string(),
            BackendType::Sqlite => "messages.db".to_string(),
        });

        let initialstate = match (
            lookup("INITIALSTATE_ACCESS_KEY"),
            lookup("INITIALSTATE_BUCKET_KEY"),
        ) {
            (Some(access_key), Some(bucket_key)) => Some(InitialStateCredentials {
                access_key,
                bucket_key,
                bucket_name: lookup("INITIALSTATE_BUCKET_NAME")
                    .unwrap_or_else(|| "Transaction Count".to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::MissingVariable("INITIALSTATE_BUCKET_KEY".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingVariable("INITIALSTATE_ACCESS_KEY".to_string()))
            }
            (None, None) => None,
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            zmq_endpoint,
            zmq_topics,
            audit_backend,
            audit_log_path,
            initialstate,
            rust_log,
        })
    }
}
