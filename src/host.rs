use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use anyhow::Result;

/// Playback state a device track reports to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlayState {
    pub fn is_playing(self) -> bool {
        self == PlayState::Playing
    }

    pub fn is_paused(self) -> bool {
        self == PlayState::Paused
    }
}

/// Zero-argument callback a track fires when it has finished playing,
/// so the host can move on to the next one. Fires at most once.
pub type NextAction = Box<dyn FnOnce()>;

/// The host application's generic track interface. Backends adapt their
/// own entries to this; the host only ever sees trait objects, so a
/// backend that needs its concrete type back goes through `as_any`.
pub trait DeviceTrack: Any {
    /// Location string identifying the entry, including the device prefix.
    fn location(&self) -> &str;

    fn title(&self) -> Option<&str> {
        None
    }

    fn artist(&self) -> Option<&str> {
        None
    }

    fn album(&self) -> Option<&str> {
        None
    }

    fn track_number(&self) -> Option<u32> {
        None
    }

    /// Duration in seconds; 0 when the backend does not know it.
    fn length(&self) -> f64 {
        0.0
    }

    fn state(&self) -> PlayState;

    fn set_state(&mut self, state: PlayState);

    /// Start or resume playback. `next` registers the advance callback to
    /// fire when this track finishes; `None` keeps any callback already
    /// registered.
    fn play(&mut self, next: Option<NextAction>) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Seek to an absolute offset in seconds.
    fn seek(&mut self, seconds: f64) -> Result<()>;

    /// Playback progress as a percentage in [0, 100], or `None` when the
    /// backend is not currently playing this track.
    fn current_position(&mut self) -> Result<Option<f64>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type TrackRef = Rc<RefCell<dyn DeviceTrack>>;

/// Ordered track collection, as the host hands around between the device
/// panel, pages, and search. Clones share the underlying tracks.
#[derive(Clone, Default)]
pub struct TrackData {
    tracks: Vec<TrackRef>,
}

impl TrackData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, track: TrackRef) {
        self.tracks.push(track);
    }

    /// First track whose location matches exactly.
    pub fn for_path(&self, location: &str) -> Option<TrackRef> {
        self.tracks
            .iter()
            .find(|track| track.borrow().location() == location)
            .cloned()
    }

    /// Stable sort with a caller-supplied comparator.
    pub fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&TrackRef, &TrackRef) -> Ordering,
    {
        self.tracks.sort_by(|a, b| cmp(a, b));
    }

    pub fn get(&self, index: usize) -> Option<&TrackRef> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackRef> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// A playback backend as seen from the host's device panel.
pub trait DeviceDriver {
    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self);

    fn search_tracks(&self, keyword: &str) -> TrackData;
}

pub type DriverRef = Rc<RefCell<dyn DeviceDriver>>;

/// The slice of the host application a driver talks back to: the device
/// panel, the current-track pointer, and page/track-info updates.
pub trait HostApp {
    fn add_driver(&mut self, driver: DriverRef, name: &str);

    fn remove_driver(&mut self, name: &str);

    /// Replace the device panel's track collection.
    fn set_device_collection(&mut self, tracks: TrackData);

    fn current_track(&self) -> Option<TrackRef>;

    fn set_current_track(&mut self, track: Option<TrackRef>);

    /// Refresh whatever the host displays about the current track.
    fn update_track_information(&mut self);

    /// Open a new named tab/page listing the given tracks.
    fn new_page(&mut self, title: &str, tracks: TrackData);

    /// The host's generic keyword search over a track collection.
    fn search_tracks(&self, tracks: &TrackData, keyword: &str) -> TrackData;
}

pub type HostRef = Rc<RefCell<dyn HostApp>>;

/// Case-insensitive substring search over title, artist, album, and
/// location. Hosts can use this as their generic search.
pub fn search_collection(tracks: &TrackData, keyword: &str) -> TrackData {
    let needle = keyword.to_lowercase();
    let mut found = TrackData::new();
    for track in tracks.iter() {
        let hit = {
            let track = track.borrow();
            [track.title(), track.artist(), track.album()]
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
                || track.location().to_lowercase().contains(&needle)
        };
        if hit {
            found.append(track.clone());
        }
    }
    found
}
