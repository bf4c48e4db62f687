//! Per-SSRC stream state (SPEC_FULL.md §3, §4.9).
//!
//! Grounded on `srtp.c`'s `asrtpa_stream_ctx_t`/`asrtpa_stream_alloc`/
//! `asrtpa_stream_init`/`asrtpa_stream_clone`, and on the teacher's
//! `stream.rs` for naming and doc-comment register (the teacher's own
//! `Stream` is a tokio mpsc-backed demultiplexing handle over a live
//! transport, which this spec's synchronous, no-I/O engine has no use
//! for — see SPEC_FULL.md §9).

use std::cell::RefCell;
use std::rc::Rc;

use crate::crypto::{new_authenticator, new_cipher, CryptoSuite};
use crate::error::Result;
use crate::key_derivation::{self, DerivedKeys};
use crate::key_limit::KeyLimit;
use crate::policy::{Policy, Services, SsrcSelector};
use crate::replay::{rdb::Rdb, rdbx::Rdbx};

/// Which direction of traffic a stream has been observed carrying.
/// SPEC_FULL.md §3: once bound, any opposite-direction use raises an
/// `ssrc_collision` event rather than flipping silently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Unknown,
    Sender,
    Receiver,
}

/// Per-SSRC protect/unprotect state. A stream materialized from a
/// wildcard template shares its RTP/RTCP crypto suites and key limiter
/// with that template (`Rc`, not owned); its replay databases and SSRC
/// are always its own.
pub(crate) struct Stream {
    pub ssrc: u32,
    pub direction: Direction,
    pub rtp: Rc<CryptoSuite>,
    pub rtcp: Rc<CryptoSuite>,
    pub rtp_rdbx: Rdbx,
    pub rtcp_rdb: Rdb,
    pub limit: Rc<RefCell<KeyLimit>>,
    pub rtp_services: Services,
    pub rtcp_services: Services,
    pub rtp_tag_len: usize,
    pub rtcp_tag_len: usize,
}

impl Stream {
    /// Build a fresh stream (concrete or template) from a policy,
    /// deriving session keys from the policy's master key/salt
    /// (`asrtpa_stream_alloc` + `asrtpa_stream_init` combined).
    pub fn from_policy(policy: &Policy, initial_ssrc: u32) -> Result<Self> {
        let rtp_keys = derive_for(
            policy,
            key_derivation::LABEL_RTP_ENCRYPTION,
            key_derivation::LABEL_RTP_SALT,
            key_derivation::LABEL_RTP_AUTHENTICATION,
            policy.rtp_profile,
        )?;
        let rtcp_keys = derive_for(
            policy,
            key_derivation::LABEL_RTCP_ENCRYPTION,
            key_derivation::LABEL_RTCP_SALT,
            key_derivation::LABEL_RTCP_AUTHENTICATION,
            policy.rtcp_profile,
        )?;

        let rtp_cipher = new_cipher(policy.rtp_profile, &rtp_keys.cipher_key_and_salt)?;
        let rtp_auth = new_authenticator(
            policy.rtp_profile,
            &rtp_keys.auth_key,
            policy.rtp_profile.rtp_auth_tag_len(),
        )?;
        let rtcp_cipher = new_cipher(policy.rtcp_profile, &rtcp_keys.cipher_key_and_salt)?;
        let rtcp_auth = new_authenticator(
            policy.rtcp_profile,
            &rtcp_keys.auth_key,
            policy.rtcp_profile.rtcp_auth_tag_len(),
        )?;

        let direction = match policy.ssrc {
            SsrcSelector::AnyOutbound => Direction::Sender,
            SsrcSelector::AnyInbound => Direction::Receiver,
            SsrcSelector::Specific(_) => Direction::Unknown,
        };

        Ok(Stream {
            ssrc: initial_ssrc,
            direction,
            rtp: Rc::new(CryptoSuite::new(rtp_cipher, rtp_auth)),
            rtcp: Rc::new(CryptoSuite::new(rtcp_cipher, rtcp_auth)),
            rtp_rdbx: Rdbx::new(),
            rtcp_rdb: Rdb::new(),
            limit: Rc::new(RefCell::new(KeyLimit::new())),
            rtp_services: policy.rtp_profile.into(),
            rtcp_services: policy.rtcp_profile.into(),
            rtp_tag_len: policy.rtp_profile.rtp_auth_tag_len(),
            rtcp_tag_len: policy.rtcp_profile.rtcp_auth_tag_len(),
        })
    }

    /// Materialize a concrete stream for `ssrc` from a template,
    /// sharing crypto suites and key limiter (`asrtpa_stream_clone`).
    /// The new stream's replay databases start empty and its direction
    /// and services are copied from the template.
    pub fn clone_from_template(template: &Stream, ssrc: u32) -> Stream {
        Stream {
            ssrc,
            direction: template.direction,
            rtp: Rc::clone(&template.rtp),
            rtcp: Rc::clone(&template.rtcp),
            rtp_rdbx: Rdbx::new(),
            rtcp_rdb: Rdb::new(),
            limit: Rc::clone(&template.limit),
            rtp_services: template.rtp_services,
            rtcp_services: template.rtcp_services,
            rtp_tag_len: template.rtp_tag_len,
            rtcp_tag_len: template.rtcp_tag_len,
        }
    }

    /// `true` if this stream shares its crypto suites with `template`
    /// (a cheap pointer-identity check; SPEC_FULL.md §3 notes this
    /// replaces the original's raw-pointer-equality discriminator and is
    /// diagnostic only — dropping a clone never needs to special-case
    /// shared resources, since `Rc` already handles that).
    pub fn is_from_template(&self, template: &Stream) -> bool {
        Rc::ptr_eq(&self.rtp, &template.rtp)
    }
}

fn derive_for(
    policy: &Policy,
    enc_label: u8,
    salt_label: u8,
    auth_label: u8,
    profile: crate::protection_profile::ProtectionProfile,
) -> Result<DerivedKeys> {
    key_derivation::derive_session_keys(
        &policy.master_key,
        &policy.master_salt,
        enc_label,
        salt_label,
        auth_label,
        profile.cipher_key_len(),
        profile.cipher_salt_len(),
        profile.auth_key_len(),
    )
}
