use thiserror::Error;

/// Custom error types for the buzzer server
#[derive(Debug, Error)]
pub enum BuzzerError {
    /// Room and participant lookup errors
    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Participant {0} not found")]
    ParticipantNotFound(String),

    /// State-mismatch errors: caller asked for something the current
    /// room state does not allow
    #[error("Room {0} already exists")]
    RoomAlreadyExists(String),

    #[error("Room already has a host")]
    HostAlreadyPresent,

    #[error("Cannot join as host - participants already in room")]
    ParticipantsAlreadyPresent,

    #[error("Room has no host")]
    NoHost,

    #[error("Room is full")]
    RoomFull,

    #[error("Participant already in room")]
    ParticipantAlreadyJoined,

    /// Request-shape and role errors
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Only {0} can perform this action")]
    RoleRequired(&'static str),

    #[error("Not in a room")]
    NotInRoom,

    #[error("Participant {0} has no team")]
    NoTeam(String),

    /// Generic errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Failed to serialize message: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Convenience type alias for Results using BuzzerError
pub type Result<T> = std::result::Result<T, BuzzerError>;

impl BuzzerError {
    /// Wire-level error code sent back in failure acknowledgements
    pub fn code(&self) -> &'static str {
        match self {
            BuzzerError::RoomNotFound(_) | BuzzerError::ParticipantNotFound(_) => "NOT_FOUND",
            BuzzerError::RoomAlreadyExists(_)
            | BuzzerError::HostAlreadyPresent
            | BuzzerError::ParticipantsAlreadyPresent
            | BuzzerError::NoHost
            | BuzzerError::RoomFull
            | BuzzerError::ParticipantAlreadyJoined => "CONFLICT",
            BuzzerError::InvalidMessage(_)
            | BuzzerError::InvalidName(_)
            | BuzzerError::RoleRequired(_)
            | BuzzerError::NotInRoom
            | BuzzerError::NoTeam(_) => "VALIDATION_ERROR",
            BuzzerError::Internal(_) | BuzzerError::SerializationFailed(_) => "INTERNAL_ERROR",
        }
    }

    /// Helper to create Internal errors with context
    pub fn internal(msg: impl Into<String>) -> Self {
        BuzzerError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuzzerError::RoomNotFound("test-room".to_string());
        assert_eq!(err.to_string(), "Room test-room not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BuzzerError::RoomNotFound("r".into()).code(), "NOT_FOUND");
        assert_eq!(BuzzerError::RoomFull.code(), "CONFLICT");
        assert_eq!(BuzzerError::InvalidMessage("missing field".into()).code(), "VALIDATION_ERROR");
        assert_eq!(BuzzerError::internal("boom").code(), "INTERNAL_ERROR");
    }
}
