use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use log::{debug, info, warn};
use mpd::State;

use crate::host::{DeviceDriver, DeviceTrack, HostRef, PlayState, TrackData};
use crate::mpd_client::{MPDClient, MpdCommands, MpdRef};
use crate::track::{MPDTrack, DEVICE_PREFIX};

/// Backend driver owning the daemon connection, the loaded track
/// collection, and the recurring poll that notices track end.
pub struct MPDDriver {
    host: HostRef,
    addr: String,
    mpd: Option<MpdRef>,
    collection: TrackData,
    timer: Option<glib::SourceId>,
}

impl MPDDriver {
    pub fn new(host: HostRef, addr: impl Into<String>) -> Self {
        Self {
            host,
            addr: addr.into(),
            mpd: None,
            collection: TrackData::new(),
            timer: None,
        }
    }

    /// Whether `connect` has run.
    pub fn is_connected(&self) -> bool {
        self.mpd.is_some()
    }

    /// Run the connect sequence over an already-established daemon handle.
    /// Rebuilds the track collection from scratch and starts the 1-second
    /// poll; the previous collection is discarded.
    pub fn connect_with(&mut self, mpd: MpdRef) -> Result<()> {
        let status = mpd.borrow_mut().status()?;
        // The host owns playback-order policy; the daemon's own shuffle
        // and repeat must stay off.
        mpd.borrow_mut().random(false)?;
        mpd.borrow_mut().repeat(false)?;

        self.collection = Self::load_tracks(&mpd)?;
        info!("loaded {} tracks from mpd", self.collection.len());
        self.host
            .borrow_mut()
            .set_device_collection(self.collection.clone());

        if matches!(status.state, State::Play | State::Pause) {
            self.adopt_daemon_state(&mpd, status.state)?;
        }

        let mut songs = TrackData::new();
        for entry in mpd.borrow_mut().queue()? {
            let location = format!("{DEVICE_PREFIX}{}", entry.file);
            match self.collection.for_path(&location) {
                Some(track) => songs.append(track),
                None => debug!("queue entry {} is not in the library", entry.file),
            }
        }
        self.host.borrow_mut().new_page("MPD Playlist", songs);

        // A reconnect replaces any poll still running.
        if let Some(timer) = self.timer.take() {
            timer.remove();
        }
        let timer_mpd = mpd.clone();
        let timer_host = self.host.clone();
        self.timer = Some(glib::timeout_add_seconds_local(1, move || {
            Self::poll(&timer_mpd, &timer_host)
        }));
        self.mpd = Some(mpd);
        Ok(())
    }

    /// The daemon was already playing or paused when we connected: take
    /// over as the host's current track instead of interrupting it.
    fn adopt_daemon_state(&mut self, mpd: &MpdRef, state: State) -> Result<()> {
        let previous = self.host.borrow().current_track();
        if let Some(previous) = previous {
            previous.borrow_mut().stop()?;
        }

        let Some(file) = mpd.borrow_mut().current_song()? else {
            return Ok(());
        };
        let location = format!("{DEVICE_PREFIX}{file}");
        match self.collection.for_path(&location) {
            Some(track) => {
                track.borrow_mut().set_state(if state == State::Play {
                    PlayState::Playing
                } else {
                    PlayState::Paused
                });
                self.host.borrow_mut().set_current_track(Some(track));
                self.host.borrow_mut().update_track_information();
            }
            None => warn!("daemon current song {location} is not in the loaded library"),
        }
        Ok(())
    }

    /// One `MPDTrack` per daemon library file, ordered by artist ignoring
    /// case; equal artists keep the daemon's listing order.
    fn load_tracks(mpd: &MpdRef) -> Result<TrackData> {
        let entries = mpd.borrow_mut().list_all()?;
        let mut songs = TrackData::new();
        for entry in entries {
            songs.append(Rc::new(RefCell::new(MPDTrack::new(mpd.clone(), entry))));
        }
        songs.sort_by(|a, b| {
            let first = a.borrow().artist().unwrap_or("").to_lowercase();
            let second = b.borrow().artist().unwrap_or("").to_lowercase();
            first.cmp(&second)
        });
        Ok(songs)
    }

    /// The 1-second timer callback. Keeps the connection alive, and when
    /// the host's current track is one of ours that still thinks it is
    /// playing while the daemon reports no time, the track has ended;
    /// its continuation moves playback along.
    fn poll(mpd: &MpdRef, host: &HostRef) -> glib::ControlFlow {
        if let Err(err) = mpd.borrow_mut().ping() {
            warn!("mpd keep-alive ping failed: {err}");
        }

        let Some(track) = host.borrow().current_track() else {
            return glib::ControlFlow::Continue;
        };
        let next = {
            let mut track = track.borrow_mut();
            let Some(track) = track.as_any_mut().downcast_mut::<MPDTrack>() else {
                return glib::ControlFlow::Continue;
            };
            if !track.state().is_playing() {
                return glib::ControlFlow::Continue;
            }
            match mpd.borrow_mut().status() {
                Ok(status) if status.time.is_none() => track.take_next(),
                Ok(_) => None,
                Err(err) => {
                    warn!("mpd status poll failed: {err}");
                    None
                }
            }
        };
        // Invoked outside the track borrow; the continuation usually
        // plays another track through the same host handle.
        if let Some(next) = next {
            next();
        }
        glib::ControlFlow::Continue
    }
}

impl DeviceDriver for MPDDriver {
    fn connect(&mut self) -> Result<()> {
        info!("connecting to mpd at {}", self.addr);
        let client = MPDClient::new(&self.addr)?;
        self.connect_with(Rc::new(RefCell::new(client)))
    }

    fn disconnect(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.remove();
        }
    }

    fn search_tracks(&self, keyword: &str) -> TrackData {
        self.host.borrow().search_tracks(&self.collection, keyword)
    }
}

impl Drop for MPDDriver {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.remove();
        }
    }
}
