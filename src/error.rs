use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the SRTP/SRTCP engine.
///
/// `Ok(())` stands in for the C reference implementation's `err_status_ok`;
/// every other `err_status_t` value below has a matching variant here.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("bad parameter")]
    BadParam,

    #[error("no context/stream found for ssrc {0}")]
    NoCtx(u32),

    #[error("no template stream installed for session")]
    NoTemplate,

    #[error("stream with ssrc {0} already exists")]
    StreamExists(u32),

    #[error("session already has a template stream")]
    TemplateExists,

    #[error("ssrc selector is undefined")]
    UndefinedSsrcSelector,

    #[error("cipher operation failed")]
    CipherFail,

    #[error("failed to verify auth tag")]
    AuthFail,

    #[error("packet index is a replay (already seen)")]
    ReplayFail,

    #[error("packet index is older than the replay window")]
    ReplayOld,

    #[error("key usage hard limit reached, key has expired")]
    KeyExpired,

    #[error("SRTCP sender index exhausted (2^31 packets)")]
    IndexLimitReached,

    #[error("SRTP master key must be {0} bytes, got {1}")]
    MasterKeyLength(usize, usize),

    #[error("SRTP master salt must be {0} bytes, got {1}")]
    MasterSaltLength(usize, usize),

    #[error("no such protection profile {0:#x}")]
    NoSuchProfile(u16),

    #[error("packet buffer too small: have {0} trailing bytes, need {1}")]
    BufferTooSmall(usize, usize),

    #[error("too short RTP packet: {0} bytes, expected at least {1}")]
    TooShortRtp(usize, usize),

    #[error("too short RTCP packet: {0} bytes, expected at least {1}")]
    TooShortRtcp(usize, usize),

    #[error("index_over_kdr > 0 is not supported")]
    UnsupportedIndexOverKdr,

    #[error("{0}")]
    Rtp(#[from] rtp::Error),

    #[error("{0}")]
    Rtcp(#[from] rtcp::Error),

    #[error("{0}")]
    Util(#[from] util::Error),

    #[error("{0}")]
    Other(String),
}
