use rmcp::model::{ErrorCode, ErrorData};
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::robots::RobotError;
use crate::scripts::ScriptError;

/// Failure of a single tool call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DofSimError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Robot(#[from] RobotError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The command ran but the simulator reported that it failed.
    #[error("{0}")]
    Operation(String),
}

impl DofSimError {
    /// Whether the caller supplied bad arguments, as opposed to the simulator failing.
    pub fn is_invalid_params(&self) -> bool {
        matches!(
            self,
            DofSimError::InvalidParameters(_) | DofSimError::Robot(_) | DofSimError::Script(_)
        )
    }

    pub fn to_error_data(&self) -> ErrorData {
        let code = if self.is_invalid_params() {
            ErrorCode::INVALID_PARAMS
        } else {
            ErrorCode::INTERNAL_ERROR
        };
        ErrorData::new(code, self.to_string(), None)
    }
}

pub type DofSimResult<T> = std::result::Result<T, DofSimError>;
