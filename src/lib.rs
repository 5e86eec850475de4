//! MPD backend driver for a media player's devices panel.
//!
//! Adapts a remote Music Player Daemon's library, queue, and transport
//! controls to the host application's track and device abstractions. On
//! connect the driver loads the daemon's full library and mirrors the
//! daemon's queue into a playlist page, adopting whatever was already
//! playing. A 1-second poll on the GUI loop then notices when the daemon
//! runs out of track so the host can advance to the next one.
//!
//! Everything runs on the host's single GUI-loop thread; daemon calls are
//! blocking round-trips, shared through `Rc<RefCell<...>>` handles.

use std::cell::RefCell;
use std::rc::Rc;

mod driver;
mod host;
mod mpd_client;
#[cfg(test)]
mod testutil;
mod track;

pub use driver::MPDDriver;
pub use host::{
    search_collection, DeviceDriver, DeviceTrack, DriverRef, HostApp, HostRef, NextAction,
    PlayState, TrackData, TrackRef,
};
pub use mpd_client::{
    format_time, LibraryEntry, MPDClient, MpdCommands, MpdRef, MpdStatus, QueueEntry,
};
pub use track::{MPDTrack, DEVICE_PREFIX};

pub const PLUGIN_NAME: &str = "MPD Driver";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PLUGIN_DESCRIPTION: &str = "An MPD driver for the devices panel";

/// Build a driver against the environment-configured daemon address and
/// register it with the host's device panel. The daemon is not contacted
/// until the panel asks the driver to connect.
pub fn initialize(host: &HostRef) -> DriverRef {
    let driver: DriverRef = Rc::new(RefCell::new(MPDDriver::new(
        host.clone(),
        MPDClient::default_addr(),
    )));
    host.borrow_mut().add_driver(driver.clone(), PLUGIN_NAME);
    driver
}

/// Unregister the driver and cancel any active poll. Safe on a driver
/// that never connected.
pub fn destroy(host: &HostRef, driver: &DriverRef) {
    host.borrow_mut().remove_driver(PLUGIN_NAME);
    driver.borrow_mut().disconnect();
}
