use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Result};
use mpd::State;

use crate::host::{
    search_collection, DeviceTrack, DriverRef, HostApp, NextAction, PlayState, TrackData, TrackRef,
};
use crate::mpd_client::{LibraryEntry, MpdCommands, MpdStatus, QueueEntry};

/// Registering a timer source briefly acquires glib's default main
/// context for the calling thread; tests that do so hold this lock so
/// two test threads never race for it.
pub fn timer_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|err| err.into_inner())
}

/// Scripted daemon: canned status/queue/library data plus a log of every
/// command issued, in order.
pub struct FakeMpd {
    pub status: MpdStatus,
    pub queue: Vec<QueueEntry>,
    pub library: Vec<LibraryEntry>,
    pub current: Option<String>,
    pub commands: Vec<String>,
    pub fail_ping: bool,
}

impl FakeMpd {
    pub fn shared() -> Rc<RefCell<FakeMpd>> {
        Rc::new(RefCell::new(FakeMpd {
            status: MpdStatus {
                state: State::Stop,
                time: None,
            },
            queue: Vec::new(),
            library: Vec::new(),
            current: None,
            commands: Vec::new(),
            fail_ping: false,
        }))
    }
}

impl MpdCommands for FakeMpd {
    fn ping(&mut self) -> Result<()> {
        self.commands.push("ping".to_string());
        if self.fail_ping {
            bail!("connection reset");
        }
        Ok(())
    }

    fn status(&mut self) -> Result<MpdStatus> {
        self.commands.push("status".to_string());
        Ok(self.status)
    }

    fn current_song(&mut self) -> Result<Option<String>> {
        self.commands.push("current_song".to_string());
        Ok(self.current.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.commands.push("clear".to_string());
        Ok(())
    }

    fn add(&mut self, path: &str) -> Result<()> {
        self.commands.push(format!("add {path}"));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.commands.push("play".to_string());
        Ok(())
    }

    fn play_pos(&mut self, pos: u32) -> Result<()> {
        self.commands.push(format!("play_pos {pos}"));
        Ok(())
    }

    fn pause(&mut self, pause: bool) -> Result<()> {
        self.commands.push(format!("pause {pause}"));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.commands.push("stop".to_string());
        Ok(())
    }

    fn seek(&mut self, pos: u32, seconds: f64) -> Result<()> {
        self.commands.push(format!("seek {pos} {seconds}"));
        Ok(())
    }

    fn random(&mut self, random: bool) -> Result<()> {
        self.commands.push(format!("random {random}"));
        Ok(())
    }

    fn repeat(&mut self, repeat: bool) -> Result<()> {
        self.commands.push(format!("repeat {repeat}"));
        Ok(())
    }

    fn queue(&mut self) -> Result<Vec<QueueEntry>> {
        self.commands.push("queue".to_string());
        Ok(self.queue.clone())
    }

    fn list_all(&mut self) -> Result<Vec<LibraryEntry>> {
        self.commands.push("list_all".to_string());
        Ok(self.library.clone())
    }
}

/// A track from some other backend, for exercising the paths where the
/// host's current track is not one of ours.
pub struct LocalTrack {
    pub location: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub state: PlayState,
}

impl DeviceTrack for LocalTrack {
    fn location(&self) -> &str {
        &self.location
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    fn state(&self) -> PlayState {
        self.state
    }

    fn set_state(&mut self, state: PlayState) {
        self.state = state;
    }

    fn play(&mut self, _next: Option<NextAction>) -> Result<()> {
        self.state = PlayState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.state = PlayState::Paused;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.state = PlayState::Stopped;
        Ok(())
    }

    fn seek(&mut self, _seconds: f64) -> Result<()> {
        Ok(())
    }

    fn current_position(&mut self) -> Result<Option<f64>> {
        Ok(None)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Records everything the driver asks the host to do.
#[derive(Default)]
pub struct StubHost {
    pub drivers: Vec<String>,
    pub collection: Option<TrackData>,
    pub current: Option<TrackRef>,
    pub pages: Vec<(String, TrackData)>,
    pub refreshes: usize,
}

impl HostApp for StubHost {
    fn add_driver(&mut self, _driver: DriverRef, name: &str) {
        self.drivers.push(name.to_string());
    }

    fn remove_driver(&mut self, name: &str) {
        self.drivers.retain(|driver| driver != name);
    }

    fn set_device_collection(&mut self, tracks: TrackData) {
        self.collection = Some(tracks);
    }

    fn current_track(&self) -> Option<TrackRef> {
        self.current.clone()
    }

    fn set_current_track(&mut self, track: Option<TrackRef>) {
        self.current = track;
    }

    fn update_track_information(&mut self) {
        self.refreshes += 1;
    }

    fn new_page(&mut self, title: &str, tracks: TrackData) {
        self.pages.push((title.to_string(), tracks));
    }

    fn search_tracks(&self, tracks: &TrackData, keyword: &str) -> TrackData {
        search_collection(tracks, keyword)
    }
}
