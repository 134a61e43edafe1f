use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::domain::errors::PartyError;

/// Unambiguous alphabet: no I, O, 0 or 1
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Number of symbols in a party code
pub const CODE_LENGTH: usize = 6;

/// Six-symbol party code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyCode(String);

impl PartyCode {
    /// Parse user input, normalising to upper case
    pub fn parse(raw: &str) -> Result<Self, PartyError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() != CODE_LENGTH
            || !normalized.bytes().all(|b| CODE_ALPHABET.contains(&b))
        {
            return Err(PartyError::InvalidCode(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Draw a code uniformly from the alphabet
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_ALPHABET.len());
                CODE_ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PartyCode {
    type Error = PartyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PartyCode> for String {
    fn from(code: PartyCode) -> Self {
        code.0
    }
}
