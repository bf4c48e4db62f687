//! Stream policy descriptors (SPEC_FULL.md §3, §6).
//!
//! Grounded on `srtp.c`'s `asrtpa_policy_t`/`asrtpa_ssrc_type_t` and the
//! `crypto_policy_set_*` convenience-constructor family; the teacher has
//! no equivalent (its `Config` names one profile for an entire
//! bidirectional session, with no template/wildcard concept at all).

use zeroize::Zeroizing;

use crate::error::Result;
use crate::protection_profile::{check_master_lengths, ProtectionProfile};

/// Which SSRC(s) a policy applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SsrcSelector {
    /// Matches any SSRC not yet seen on outbound (protect) traffic; installs
    /// a sender template.
    AnyOutbound,
    /// Matches any SSRC not yet seen on inbound (unprotect) traffic;
    /// installs a receiver template.
    AnyInbound,
    /// Matches exactly one SSRC.
    Specific(u32),
}

/// Confidentiality/authentication services a crypto policy provides,
/// derived from the profile rather than stored independently (a
/// `ProtectionProfile` already implies both per SPEC_FULL.md §6's table).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Services {
    pub confidentiality: bool,
    pub authentication: bool,
}

impl From<ProtectionProfile> for Services {
    fn from(profile: ProtectionProfile) -> Self {
        Services {
            confidentiality: profile.confidentiality(),
            authentication: profile.authentication(),
        }
    }
}

/// One stream (or template) descriptor: which SSRC(s), which profile for
/// RTP and RTCP, and the master key material they're keyed from.
pub struct Policy {
    pub ssrc: SsrcSelector,
    pub rtp_profile: ProtectionProfile,
    pub rtcp_profile: ProtectionProfile,
    pub master_key: Zeroizing<Vec<u8>>,
    pub master_salt: Zeroizing<Vec<u8>>,
}

impl Policy {
    pub fn new(
        ssrc: SsrcSelector,
        rtp_profile: ProtectionProfile,
        rtcp_profile: ProtectionProfile,
        master_key: &[u8],
        master_salt: &[u8],
    ) -> Result<Self> {
        check_master_lengths(master_key, master_salt)?;
        Ok(Policy {
            ssrc,
            rtp_profile,
            rtcp_profile,
            master_key: Zeroizing::new(master_key.to_vec()),
            master_salt: Zeroizing::new(master_salt.to_vec()),
        })
    }

    /// The RFC 3711 mandatory-to-implement default: AES-128-ICM + HMAC-SHA1-80
    /// on both RTP and RTCP (`crypto_policy_set_rtp_default` /
    /// `crypto_policy_set_rtcp_default`).
    pub fn aes128_cm_sha1_80(ssrc: SsrcSelector, master_key: &[u8], master_salt: &[u8]) -> Result<Self> {
        Self::new(
            ssrc,
            ProtectionProfile::Aes128CmHmacSha1_80,
            ProtectionProfile::Aes128CmHmacSha1_80,
            master_key,
            master_salt,
        )
    }

    /// AES-128-ICM + HMAC-SHA1-32 on RTP; RTCP still uses the 80-bit tag
    /// (`crypto_policy_set_from_profile_for_rtcp`'s special case for this
    /// profile, see `ProtectionProfile::rtcp_auth_tag_len`).
    pub fn aes128_cm_sha1_32(ssrc: SsrcSelector, master_key: &[u8], master_salt: &[u8]) -> Result<Self> {
        Self::new(
            ssrc,
            ProtectionProfile::Aes128CmHmacSha1_32,
            ProtectionProfile::Aes128CmHmacSha1_80,
            master_key,
            master_salt,
        )
    }

    /// No confidentiality, HMAC-SHA1-80 integrity only, on both RTP and
    /// RTCP.
    pub fn null_sha1_80(ssrc: SsrcSelector, master_key: &[u8], master_salt: &[u8]) -> Result<Self> {
        Self::new(
            ssrc,
            ProtectionProfile::NullHmacSha1_80,
            ProtectionProfile::NullHmacSha1_80,
            master_key,
            master_salt,
        )
    }

    /// AES-128-ICM confidentiality with no authentication. Not part of the
    /// RFC 3711 mandatory table; callers must name it explicitly
    /// (SPEC_FULL.md §6).
    pub fn aes128_cm_null_auth(ssrc: SsrcSelector, master_key: &[u8], master_salt: &[u8]) -> Result<Self> {
        Self::new(
            ssrc,
            ProtectionProfile::Aes128CmNullAuth,
            ProtectionProfile::Aes128CmNullAuth,
            master_key,
            master_salt,
        )
    }
}
