//! A pure Rust implementation of the SRTP/SRTCP engine core defined by
//! RFC 3711.
//!
//! The crate owns cryptographic state, per-SSRC key derivation, replay
//! protection, and the protect/unprotect data paths for both RTP and
//! RTCP. It does not send, receive, or fully parse RTP/RTCP packets
//! above what is needed to locate the protected regions, and it does not
//! implement a keying protocol (DTLS-SRTP or otherwise) — callers supply
//! a master key and salt directly via [`Policy`].
//!
//! ```no_run
//! use srtp_engine::{Policy, Session, SsrcSelector};
//!
//! # fn main() -> srtp_engine::Result<()> {
//! let master_key = [0u8; 16];
//! let master_salt = [0u8; 14];
//! let policy = Policy::aes128_cm_sha1_80(
//!     SsrcSelector::Specific(0xcafebabe),
//!     &master_key,
//!     &master_salt,
//! )?;
//! let mut session = Session::create(vec![policy])?;
//!
//! let mut rtp_packet: Vec<u8> = Vec::with_capacity(128);
//! session.protect(&mut rtp_packet)?;
//! # Ok(())
//! # }
//! ```

mod crypto;
mod key_derivation;
mod key_limit;
mod replay;
mod stream;

pub mod error;
pub mod event;
pub mod policy;
pub mod protection_profile;
pub mod session;

pub use error::{Error, Result};
pub use event::Event;
pub use policy::{Policy, Services, SsrcSelector};
pub use protection_profile::ProtectionProfile;
pub use session::Session;

/// Process-wide crypto-kernel lifecycle, kept for API-shape parity with
/// the original `asrtpa_init`/`asrtpa_deinit`/`asrtpa_install_event_handler`.
/// Nothing in the per-[`Session`] data path depends on this module —
/// every session carries its own event handler (SPEC_FULL.md §9) — so
/// embedding applications that only ever use one session at a time can
/// ignore it entirely.
pub mod kernel {
    pub use crate::event::{
        deinit, init, install_process_event_handler, is_initialized,
    };
}
