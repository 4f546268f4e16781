use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Definition error: {0}")]
    Definition(#[from] serde_json::Error),
    #[error("Value of filter {filter} is missing its identifier")]
    MissingIdentifier { filter: String },
    #[error("Filter {filter} declares value {value} more than once")]
    DuplicateValue { filter: String, value: String },
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
    #[error("Unknown value {value} in filter {filter}")]
    UnknownValue { filter: String, value: String },
    #[error("Filter {filter} has invalid weight {weight}")]
    InvalidWeight { filter: String, weight: f64 },
    #[error("Type mismatch in filter {filter}: expected {expected}, found {found}")]
    TypeMismatch {
        filter: String,
        expected: &'static str,
        found: String,
    },
    #[error("Invalid interval [{min}, {max}]")]
    InvalidInterval { min: f64, max: f64 },
    #[error("Value index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Listener failed on {event}: {source}")]
    Listener {
        event: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, KeyError>;

// Helper conversions
impl From<config::ConfigError> for KeyError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
