//! XKB bell source.
//!
//! Connects to the X server, takes over the keyboard bell and turns
//! `XkbBellNotify` events into [`BellEvent`]s:
//! - selects BellNotify on the core keyboard
//! - disables the server's AudibleBell control
//! - asks the server to re-enable it when this client goes away

use thiserror::Error;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::xkb::{self, ConnectionExt as _};
use x11rb::protocol::xproto;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::bell::{BellDevice, BellEvent, BellSource};
use crate::tone::BellRequest;

// XKB protocol version we speak
const XKB_MAJOR: u16 = 1;
const XKB_MINOR: u16 = 0;

/// Fatal errors while taking over the bell.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Cannot open display: {0}")]
    Connect(#[from] ConnectError),
    #[error("X server has no XKB extension")]
    NoXkb,
    #[error(
        "X server XKB version {major}.{minor} doesn't match expected {want_major}.{want_minor}",
        want_major = XKB_MAJOR,
        want_minor = XKB_MINOR
    )]
    Version { major: u16, minor: u16 },
    #[error("Cannot select XkbBellNotify events: {0}")]
    SelectEvents(#[source] ReplyError),
    #[error("Cannot disable audible bell: {0}")]
    DisableBell(#[source] ReplyError),
    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),
}

/// Bell notifications from the X server's keyboard extension.
pub struct XkbBellSource {
    conn: RustConnection,
}

impl XkbBellSource {
    /// Connect to `display` (or `$DISPLAY`) and take over the bell.
    pub fn connect(display: Option<&str>) -> Result<Self, SetupError> {
        let (conn, _screen) = x11rb::connect(display)?;

        if conn.extension_information(xkb::X11_EXTENSION_NAME)?.is_none() {
            return Err(SetupError::NoXkb);
        }
        let version = conn.xkb_use_extension(XKB_MAJOR, XKB_MINOR)?.reply()?;
        if !version.supported {
            return Err(SetupError::Version {
                major: version.server_major,
                minor: version.server_minor,
            });
        }
        log::debug!(
            "XKB {}.{} on server",
            version.server_major,
            version.server_minor
        );

        let source = Self { conn };
        source.select_bell_events().map_err(SetupError::SelectEvents)?;
        source.disable_audible_bell().map_err(SetupError::DisableBell)?;
        if let Err(e) = source.auto_reset_audible_bell() {
            log::warn!("Cannot auto-reset audible bell: {}", e);
        }
        Ok(source)
    }

    fn select_bell_events(&self) -> Result<(), ReplyError> {
        self.conn
            .xkb_select_events(
                xkb::ID::USE_CORE_KBD.into(),
                xkb::EventType::from(0u16),
                xkb::EventType::BELL_NOTIFY,
                xkb::MapPart::from(0u16),
                xkb::MapPart::from(0u16),
                &xkb::SelectEventsAux::new(),
            )?
            .check()
    }

    /// Only the enabled-controls part of the request is applied.
    fn disable_audible_bell(&self) -> Result<(), ReplyError> {
        self.conn
            .xkb_set_controls(
                xkb::ID::USE_CORE_KBD.into(),
                xproto::ModMask::from(0u16),
                xproto::ModMask::from(0u16),
                xproto::ModMask::from(0u16),
                xproto::ModMask::from(0u16),
                xkb::VMod::from(0u16),
                xkb::VMod::from(0u16),
                xkb::VMod::from(0u16),
                xkb::VMod::from(0u16),
                0,
                0,
                xkb::AXOption::from(0u16),
                xkb::BoolCtrl::AUDIBLE_BELL_MASK,
                xkb::BoolCtrl::from(0u32),
                xkb::Control::CONTROLS_ENABLED,
                0,
                0,
                0,
                0,
                0,
                0,
                0,
                0,
                0,
                0,
                xkb::BoolCtrl::from(0u32),
                xkb::BoolCtrl::from(0u32),
                xkb::AXOption::from(0u16),
                xkb::AXOption::from(0u16),
                &[0; 32],
            )?
            .check()
    }

    fn auto_reset_audible_bell(&self) -> Result<(), ReplyError> {
        self.conn
            .xkb_per_client_flags(
                xkb::ID::USE_CORE_KBD.into(),
                xkb::PerClientFlag::AUTO_RESET_CONTROLS,
                xkb::PerClientFlag::AUTO_RESET_CONTROLS,
                xkb::BoolCtrl::AUDIBLE_BELL_MASK,
                xkb::BoolCtrl::AUDIBLE_BELL_MASK,
                xkb::BoolCtrl::AUDIBLE_BELL_MASK,
            )?
            .reply()?;
        Ok(())
    }
}

impl BellSource for XkbBellSource {
    type Error = ConnectionError;

    fn next_bell(&mut self) -> Result<BellEvent, ConnectionError> {
        loop {
            match self.conn.wait_for_event()? {
                Event::XkbBellNotify(ev) => return Ok(bell_event(&ev)),
                other => log::trace!("Ignoring event {:?}", other),
            }
        }
    }

    fn force_bell(&mut self, event: &BellEvent) -> Result<(), ConnectionError> {
        self.conn.xkb_bell(
            event.device.device,
            event.device.class,
            event.device.id,
            fallback_percent(event.request.percent),
            true,
            false,
            0,
            0,
            x11rb::NONE,
            x11rb::NONE,
        )?;
        self.conn.flush()
    }
}

fn bell_event(ev: &xkb::BellNotifyEvent) -> BellEvent {
    BellEvent {
        request: BellRequest {
            percent: i32::from(ev.percent),
            pitch: i32::from(ev.pitch),
            duration: i32::from(ev.duration),
        },
        device: BellDevice {
            device: u16::from(ev.device_id),
            class: u16::from(u8::from(ev.bell_class)),
            id: u16::from(ev.bell_id),
        },
    }
}

/// Bell requests carry the volume as a signed byte, -100..=100.
fn fallback_percent(percent: i32) -> i8 {
    i8::try_from(percent.clamp(-100, 100)).unwrap_or(0)
}
