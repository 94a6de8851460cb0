/// Why a frame source could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file, device or stream could not be opened at all.
    #[error("cannot open {location}: {reason}")]
    Unavailable { location: String, reason: String },

    /// The source opened but holds no decodable image or video data.
    #[error("{location} holds no decodable image or video data: {reason}")]
    Unrecognized { location: String, reason: String },
}

impl SourceError {
    pub fn unavailable(location: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unrecognized(location: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Unrecognized {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}
