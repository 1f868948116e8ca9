use std::time::Duration;

/// Why a single strategy attempt did not produce records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("malformed envelope: {0}")]
    Envelope(String),
    #[error("malformed payload: {0}")]
    Payload(String),
    #[error("no rows in table")]
    EmptyTable,
    #[error("no valid rows ({skipped} skipped)")]
    NoValidRows { skipped: usize },
}

/// Coarse failure class, used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transport,
    Parse,
    Validation,
}

impl StrategyError {
    pub fn class(&self) -> FailureClass {
        match self {
            StrategyError::Transport(_) | StrategyError::Timeout(_) | StrategyError::Status(_) => {
                FailureClass::Transport
            }
            StrategyError::Envelope(_) | StrategyError::Payload(_) => FailureClass::Parse,
            StrategyError::EmptyTable | StrategyError::NoValidRows { .. } => FailureClass::Validation,
        }
    }
}

impl FailureClass {
    pub fn label(&self) -> &'static str {
        match self {
            FailureClass::Transport => "transport",
            FailureClass::Parse => "parse",
            FailureClass::Validation => "validation",
        }
    }
}

/// Why one source row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowRejection {
    #[error("expected at least 4 columns, found {0}")]
    TooFewColumns(usize),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid room id {0:?}")]
    BadRoomId(String),
    #[error("invalid {field} {value:?}")]
    BadDate { field: &'static str, value: String },
}
