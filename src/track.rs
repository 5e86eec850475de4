use std::any::Any;

use anyhow::{bail, Result};
use log::debug;

use crate::host::{DeviceTrack, NextAction, PlayState};
use crate::mpd_client::{LibraryEntry, MpdCommands, MpdRef};

/// Marker prefixed onto daemon file paths so the host can tell this
/// device's tracks apart from local ones.
pub const DEVICE_PREFIX: &str = "device://";

/// One daemon library entry adapted to the host's track interface. The
/// playing state lives here, not on the daemon; it tracks what this
/// instance was last told to do.
pub struct MPDTrack {
    mpd: MpdRef,
    location: String,
    length: f64,
    artist: Option<String>,
    album: Option<String>,
    title: Option<String>,
    track_number: Option<u32>,
    state: PlayState,
    next: Option<NextAction>,
    entry: LibraryEntry,
}

impl MPDTrack {
    pub fn new(mpd: MpdRef, entry: LibraryEntry) -> Self {
        Self {
            location: format!("{DEVICE_PREFIX}{}", entry.file),
            length: entry.time.unwrap_or(0.0),
            artist: entry.artist.clone(),
            album: entry.album.clone(),
            title: entry.title.clone(),
            track_number: entry.track,
            state: PlayState::Stopped,
            next: None,
            entry,
            mpd,
        }
    }

    /// The raw daemon record this track was built from.
    pub fn entry(&self) -> &LibraryEntry {
        &self.entry
    }

    /// The location with the device prefix stripped, i.e. the path the
    /// daemon knows the file by.
    pub fn daemon_path(&self) -> &str {
        self.location
            .strip_prefix(DEVICE_PREFIX)
            .unwrap_or(&self.location)
    }

    /// Scan the daemon's current queue for this track. Recomputed on every
    /// call; `None` when the track is not queued.
    pub fn queue_id(&self) -> Result<Option<u32>> {
        let queue = self.mpd.borrow_mut().queue()?;
        Ok(queue
            .iter()
            .find(|entry| entry.file == self.daemon_path())
            .map(|entry| entry.pos))
    }

    /// Remove and return the advance callback, if one is registered. The
    /// caller invokes it; a second call returns `None` until `play`
    /// registers a new one.
    pub fn take_next(&mut self) -> Option<NextAction> {
        self.next.take()
    }
}

impl DeviceTrack for MPDTrack {
    fn location(&self) -> &str {
        &self.location
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    fn track_number(&self) -> Option<u32> {
        self.track_number
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn state(&self) -> PlayState {
        self.state
    }

    fn set_state(&mut self, state: PlayState) {
        self.state = state;
    }

    fn play(&mut self, next: Option<NextAction>) -> Result<()> {
        if let Some(next) = next {
            self.next = Some(next);
        }
        {
            let mut mpd = self.mpd.borrow_mut();
            if !self.state.is_paused() {
                // Replace whatever the daemon has queued with this track.
                mpd.clear()?;
                mpd.add(self.daemon_path())?;
                mpd.play_pos(0)?;
            } else {
                mpd.play()?;
            }
        }
        self.state = PlayState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.state = PlayState::Paused;
        self.mpd.borrow_mut().pause(true)
    }

    fn stop(&mut self) -> Result<()> {
        self.state = PlayState::Stopped;
        self.mpd.borrow_mut().stop()
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        debug!("mpd seeking to {seconds}s in {}", self.location);
        match self.queue_id()? {
            Some(pos) => self.mpd.borrow_mut().seek(pos, seconds),
            None => bail!("{} is not in the daemon queue", self.location),
        }
    }

    fn current_position(&mut self) -> Result<Option<f64>> {
        let status = self.mpd.borrow_mut().status()?;
        Ok(status.time.map(|(elapsed, total)| {
            if total > 0.0 {
                elapsed / total * 100.0
            } else {
                0.0
            }
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
