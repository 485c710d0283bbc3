#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("unexpected header id (want {want:?}, got {got:?})")]
    UnexpectedHeaderId { want: [u8; 8], got: [u8; 8] },
    #[error("unsupported demo version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("demo truncated at offset {offset} (needed {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },
    #[error("unknown cmd {cmd} at offset {offset}")]
    UnknownCmd { offset: usize, cmd: u8 },
    #[error("invalid event payload at offset {offset}: {source}")]
    InvalidPayload {
        offset: usize,
        #[source]
        source: bitcode::Error,
    },
    #[error("demo does not contain a header")]
    MissingHeader,
}

impl DecodeError {
    /// Whether the input is a demo this decoder does not understand, as opposed to a
    /// broken one.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedVersion { .. })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("timeline build was cancelled")]
    Cancelled,
}
