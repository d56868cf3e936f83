//! Status codes returned inline in responses.
//!
//! Mirrors the OPC-UA convention that every response carries a `serviceResult`
//! rather than propagating an exception: every fallible step in this crate
//! produces a [`StatusCode`], never a panic.

/// Subset of the OPC-UA status code table this subsystem can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCode {
    #[default]
    Good,
    BadServerNameMissing,
    BadDiscoveryUrlMissing,
    /// Spelling reproduced as-is for wire compatibility with the real
    /// OPC-UA status code table.
    BadSempahoreFileMissing,
    BadNotFound,
    BadNotSupported,
    BadInvalidArgument,
    BadInternalError,
}

impl StatusCode {
    pub fn is_good(self) -> bool {
        matches!(self, StatusCode::Good)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Good => "Good",
            Self::BadServerNameMissing => "BadServerNameMissing",
            Self::BadDiscoveryUrlMissing => "BadDiscoveryUrlMissing",
            Self::BadSempahoreFileMissing => "BadSempahoreFileMissing",
            Self::BadNotFound => "BadNotFound",
            Self::BadNotSupported => "BadNotSupported",
            Self::BadInvalidArgument => "BadInvalidArgument",
            Self::BadInternalError => "BadInternalError",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for StatusCode {}
