/// Client errors: rejected with no state mutation, returned to the issuer only
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartyError {
    #[error("Party not found")]
    PartyNotFound,
    #[error("Party is full")]
    PartyFull,
    #[error("Only the host can control playback")]
    NotHost,
    #[error("Not a member of this party")]
    PartyNotMember,
    #[error("Invalid party code: {0}")]
    InvalidCode(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl PartyError {
    /// Stable wire code
    pub fn code(&self) -> &'static str {
        match self {
            PartyError::PartyNotFound => "PartyNotFound",
            PartyError::PartyFull => "PartyFull",
            PartyError::NotHost => "NotHost",
            PartyError::PartyNotMember => "PartyNotMember",
            PartyError::InvalidCode(_) => "InvalidCode",
            PartyError::InvalidCommand(_) => "InvalidCommand",
        }
    }
}
