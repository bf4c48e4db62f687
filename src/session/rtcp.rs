//! SRTCP protect/unprotect data paths (SPEC_FULL.md §4.10, §4.11).
//!
//! Grounded on the teacher's `context/srtcp.rs` (`decrypt_rtcp`/
//! `encrypt_rtcp`: header parsed only to validate the packet, SSRC read
//! directly from the fixed byte offset that follows it) and on
//! `srtp.c`'s `asrtpa_protect_rtcp`/`asrtpa_unprotect_rtcp`.
//!
//! Authentication is mandatory for SRTCP regardless of a profile's
//! services mask (SPEC_FULL.md §4.10 step 10) — even the confidentiality-
//! only `aes128_cm_null_auth` profile still runs the RTCP auth pass here
//! (its `NullAuthenticator` just contributes a zero-length tag).
//!
//! Unlike the SRTP paths, §4.10/§4.11's step lists never invoke the key
//! limiter — key-usage accounting is scoped to the RTP data path only,
//! matching the original source's `srtp_protect`/`srtp_unprotect` (which
//! call `key_limit_update`) versus `srtp_protect_rtcp`/
//! `srtp_unprotect_rtcp` (which don't).

use util::marshal::Unmarshal;

use super::Session;
use crate::crypto::{form_rtcp_iv, tags_equal, Authenticator, Cipher};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::replay::rdb::INDEX_MASK;
use crate::stream::Stream;

const RTCP_HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 4;
const ENCRYPTED_FLAG: u32 = 0x8000_0000;

impl Session {
    /// Encrypt and/or authenticate an RTCP packet in place, appending the
    /// `E || index` trailer and the authentication tag.
    pub fn protect_rtcp(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        if buf.len() < RTCP_HEADER_LEN {
            return Err(Error::TooShortRtcp(buf.len(), RTCP_HEADER_LEN));
        }

        let mut cursor = &buf[..];
        rtcp::header::Header::unmarshal(&mut cursor)?;
        let ssrc = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);

        self.resolve_for_protect(ssrc)?;
        self.check_sender_direction(ssrc);

        let tag_len = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            stream.rtcp_tag_len
        };
        let trailing = buf.capacity() - buf.len();
        if trailing < tag_len + TRAILER_LEN {
            return Err(Error::BufferTooSmall(trailing, tag_len + TRAILER_LEN));
        }

        // The sender index must advance before anything else touches the
        // packet: an overflow fails the whole call without modifying the
        // buffer (SPEC_FULL.md §4.10 step 5).
        let increment_result = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            stream.rtcp_rdb.increment()
        };
        if let Err(e) = increment_result {
            log::warn!("srtcp: sender index exhausted for ssrc {ssrc:08x}");
            self.fire_event(ssrc, Event::PacketIndexLimit);
            return Err(e);
        }
        let index = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            stream.rtcp_rdb.get_value()
        };

        let stream = self.streams.get_mut(&ssrc).expect("resolved above");
        let confidentiality_on = stream.rtcp_services.confidentiality;

        let is_aes_icm = stream.rtcp.cipher.borrow().is_aes_icm();
        let iv = form_rtcp_iv(is_aes_icm, ssrc, index);
        stream.rtcp.cipher.borrow_mut().set_iv(&iv);

        let prefix_len = stream.rtcp.auth.borrow().prefix_length();
        if prefix_len > 0 {
            let mut prefix = vec![0u8; prefix_len];
            stream.rtcp.cipher.borrow_mut().output(&mut prefix);
        }

        if confidentiality_on {
            stream
                .rtcp
                .cipher
                .borrow_mut()
                .encrypt_in_place(&mut buf[RTCP_HEADER_LEN..]);
        }

        let mut trailer = index & INDEX_MASK;
        if confidentiality_on {
            trailer |= ENCRYPTED_FLAG;
        }
        buf.extend_from_slice(&trailer.to_be_bytes());

        let mut auth = stream.rtcp.auth.borrow_mut();
        auth.start();
        auth.update(buf.as_slice());
        let tag = auth.compute(&[]);
        drop(auth);

        buf.extend_from_slice(&tag[..tag_len]);

        Ok(())
    }

    /// Verify and decrypt an SRTCP packet in place, stripping the
    /// trailer and authentication tag on success.
    pub fn unprotect_rtcp(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        if buf.len() < RTCP_HEADER_LEN {
            return Err(Error::TooShortRtcp(buf.len(), RTCP_HEADER_LEN));
        }

        let mut cursor = &buf[..];
        rtcp::header::Header::unmarshal(&mut cursor)?;
        let ssrc = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);

        let existed = self.streams.contains_key(&ssrc);
        let mut provisional = if existed {
            None
        } else {
            let template = self.template.as_ref().ok_or(Error::NoCtx(ssrc))?;
            Some(Stream::clone_from_template(template, ssrc))
        };

        // Work against whichever stream is in play — the concrete one if
        // it already exists, or the not-yet-committed provisional clone
        // (SPEC_FULL.md §4.11 step 1). `provisional` never aliases
        // `self.streams`, so there's no borrow-checker conflict between
        // holding it and later calling back into `self`.
        macro_rules! with_stream {
            (|$s:ident| $body:expr) => {
                if let Some($s) = provisional.as_mut() {
                    $body
                } else {
                    let $s = self.streams.get_mut(&ssrc).expect("existed checked above");
                    $body
                }
            };
        }

        let tag_len = with_stream!(|s| s.rtcp_tag_len);
        if buf.len() < RTCP_HEADER_LEN + TRAILER_LEN + tag_len {
            return Err(Error::TooShortRtcp(
                buf.len(),
                RTCP_HEADER_LEN + TRAILER_LEN + tag_len,
            ));
        }

        let trailer_start = buf.len() - tag_len - TRAILER_LEN;
        let trailer_end = trailer_start + TRAILER_LEN;
        let trailer_word = u32::from_be_bytes([
            buf[trailer_start],
            buf[trailer_start + 1],
            buf[trailer_start + 2],
            buf[trailer_start + 3],
        ]);
        let index = trailer_word & INDEX_MASK;
        let encrypted = trailer_word & ENCRYPTED_FLAG != 0;

        with_stream!(|s| s.rtcp_rdb.check(index))?;

        let is_aes_icm = with_stream!(|s| s.rtcp.cipher.borrow().is_aes_icm());
        let iv = form_rtcp_iv(is_aes_icm, ssrc, index);
        with_stream!(|s| s.rtcp.cipher.borrow_mut().set_iv(&iv));

        let computed = with_stream!(|s| {
            let mut auth = s.rtcp.auth.borrow_mut();
            auth.start();
            auth.update(&buf[..trailer_end]);
            auth.compute(&[])
        });
        if !tags_equal(&computed, &buf[trailer_end..trailer_end + tag_len]) {
            return Err(Error::AuthFail);
        }

        if encrypted {
            let prefix_len = with_stream!(|s| s.rtcp.auth.borrow().prefix_length());
            if prefix_len > 0 {
                let mut prefix = vec![0u8; prefix_len];
                with_stream!(|s| s.rtcp.cipher.borrow_mut().output(&mut prefix));
            }
            with_stream!(|s| s
                .rtcp
                .cipher
                .borrow_mut()
                .encrypt_in_place(&mut buf[RTCP_HEADER_LEN..trailer_start]));
        }

        if let Some(stream) = provisional.take() {
            log::debug!("srtcp: materialized stream for ssrc {ssrc:08x} from inbound template");
            self.streams.insert(ssrc, stream);
        }
        self.check_receiver_direction(ssrc);

        {
            let stream = self.streams.get_mut(&ssrc).expect("committed above");
            stream.rtcp_rdb.add_index(index);
        }

        buf.truncate(trailer_start);
        Ok(())
    }
}
