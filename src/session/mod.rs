//! Session and stream-template manager (SPEC_FULL.md §4.6, §9).
//!
//! Grounded on the teacher's `context/mod.rs` `Context` (one `Cipher` +
//! two `HashMap<u32, _SsrcState>` maps) and on `srtp.c`'s
//! `asrtpa_create`/`asrtpa_add_stream`/`asrtpa_remove_stream`/
//! `asrtpa_dealloc`. Unlike the teacher, a single `Session` here carries
//! *both* directions' policies and an optional wildcard template, because
//! this spec's `Policy` (unlike the teacher's one-profile-per-`Context`
//! model) has a template/wildcard concept (`srtp.c`'s `asrtpa_policy_t`).
//!
//! The stream list is a `HashMap<u32, Stream>` rather than the source's
//! singly linked list, per SPEC_FULL.md §9's explicit redesign note.

pub mod rtcp;
pub mod srtp;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::event::{Event, EventHandler};
use crate::policy::{Policy, SsrcSelector};
use crate::stream::{Direction, Stream};

/// A live SRTP/SRTCP engine instance: a set of concrete per-SSRC streams
/// plus at most one wildcard template. Not re-entrant and not `Sync`
/// (SPEC_FULL.md §5): a session's protect/unprotect calls must be
/// serialized by the caller, but independent sessions share no state.
pub struct Session {
    streams: HashMap<u32, Stream>,
    template: Option<Stream>,
    event_handler: Option<EventHandler>,
}

impl Session {
    /// Build an empty session with no streams or template.
    pub fn new() -> Self {
        Session {
            streams: HashMap::new(),
            template: None,
            event_handler: None,
        }
    }

    /// Build a session from a policy list, in order (`asrtpa_create`). If
    /// any `add_stream` fails partway through, the partially built session
    /// is dropped and the error is returned — ordinary Rust ownership
    /// accomplishes the source's explicit `asrtpa_dealloc`-on-failure
    /// teardown for free.
    pub fn create(policies: Vec<Policy>) -> Result<Self> {
        let mut session = Session::new();
        for policy in policies {
            session.add_stream(policy)?;
        }
        Ok(session)
    }

    /// Install (or replace) this session's event handler. Invoked
    /// synchronously from the data path with the offending stream's SSRC
    /// and event kind; the handler must not call back into this session
    /// (SPEC_FULL.md §5).
    pub fn install_event_handler(&mut self, handler: impl FnMut(u32, Event) + 'static) {
        self.event_handler = Some(Box::new(handler));
    }

    /// Remove this session's event handler, if any.
    pub fn clear_event_handler(&mut self) {
        self.event_handler = None;
    }

    /// Add one stream (concrete or template) from a policy
    /// (`asrtpa_add_stream`).
    pub fn add_stream(&mut self, policy: Policy) -> Result<()> {
        match policy.ssrc {
            SsrcSelector::Specific(ssrc) => {
                if self.streams.contains_key(&ssrc) {
                    return Err(Error::StreamExists(ssrc));
                }
                let stream = Stream::from_policy(&policy, ssrc)?;
                log::debug!("srtp: added concrete stream for ssrc {ssrc:08x}");
                self.streams.insert(ssrc, stream);
                Ok(())
            }
            SsrcSelector::AnyOutbound | SsrcSelector::AnyInbound => {
                if self.template.is_some() {
                    return Err(Error::TemplateExists);
                }
                let stream = Stream::from_policy(&policy, 0)?;
                log::debug!(
                    "srtp: installed {} template",
                    if matches!(policy.ssrc, SsrcSelector::AnyOutbound) {
                        "outbound"
                    } else {
                        "inbound"
                    }
                );
                self.template = Some(stream);
                Ok(())
            }
        }
    }

    /// Remove the concrete stream for `ssrc` (`asrtpa_remove_stream`).
    /// Fails with [`Error::NoCtx`] if no such stream exists; does not
    /// touch the template.
    pub fn remove_stream(&mut self, ssrc: u32) -> Result<()> {
        self.streams.remove(&ssrc).map(|_| ()).ok_or(Error::NoCtx(ssrc))
    }

    /// Look up the concrete stream for `ssrc`, if materialized.
    pub fn get_stream(&self, ssrc: u32) -> Option<&Stream> {
        self.streams.get(&ssrc)
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Install an explicit key-usage hard limit on the stream for `ssrc`
    /// (`key_limit_set` in the original source, which otherwise always
    /// initializes a stream's limiter to its maximum value). The soft
    /// limit is fixed at half the hard limit, matching the original's
    /// convention. Because the limiter is shared via `Rc` with every
    /// stream cloned from the same template (SPEC_FULL.md §4.9), setting
    /// it on one clone changes the ceiling for all of them.
    pub fn set_key_limit(&mut self, ssrc: u32, hard_limit: u64) -> Result<()> {
        let stream = self.streams.get_mut(&ssrc).ok_or(Error::NoCtx(ssrc))?;
        stream.limit.borrow_mut().set(hard_limit);
        Ok(())
    }

    fn fire_event(&mut self, ssrc: u32, event: Event) {
        if let Some(handler) = &mut self.event_handler {
            handler(ssrc, event);
        }
    }

    /// Resolve the concrete stream for `ssrc`, materializing it from the
    /// template if this is the first sighting (`protect` side: direction
    /// is committed immediately, there is no "provisional" step because
    /// the caller itself is the sender — SPEC_FULL.md §4.7 step 2).
    fn resolve_for_protect(&mut self, ssrc: u32) -> Result<()> {
        if self.streams.contains_key(&ssrc) {
            return Ok(());
        }
        let template = self.template.as_ref().ok_or(Error::NoCtx(ssrc))?;
        let stream = Stream::clone_from_template(template, ssrc);
        log::debug!("srtp: materialized stream for ssrc {ssrc:08x} from outbound template");
        self.streams.insert(ssrc, stream);
        Ok(())
    }

    /// Direction check on the protect (sending) path: the stream must not
    /// already be bound as a receiver. Unknown direction is bound to
    /// `Sender` immediately (SPEC_FULL.md §4.7 step 3).
    fn check_sender_direction(&mut self, ssrc: u32) {
        let collided = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            match stream.direction {
                Direction::Receiver => true,
                Direction::Unknown => {
                    stream.direction = Direction::Sender;
                    false
                }
                Direction::Sender => false,
            }
        };
        if collided {
            log::warn!("srtp: ssrc {ssrc:08x} collision: protect on a receiver-bound stream");
            self.fire_event(ssrc, Event::SsrcCollision);
        }
    }

    /// Direction check on the unprotect (receiving) path, run only after
    /// authentication has passed so a spoofed packet cannot mark a
    /// stream's direction (SPEC_FULL.md §4.8 step 10).
    fn check_receiver_direction(&mut self, ssrc: u32) {
        let collided = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            match stream.direction {
                Direction::Sender => true,
                Direction::Unknown => {
                    stream.direction = Direction::Receiver;
                    false
                }
                Direction::Receiver => false,
            }
        };
        if collided {
            log::warn!("srtp: ssrc {ssrc:08x} collision: unprotect on a sender-bound stream");
            self.fire_event(ssrc, Event::SsrcCollision);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
