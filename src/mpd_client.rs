use std::cell::RefCell;
use std::env;
use std::net::TcpStream;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use mpd::{Client, Song, State};

/// Daemon transport state plus the `elapsed:total` time pair, which is
/// only reported while the daemon is playing or paused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MpdStatus {
    pub state: State,
    /// `(elapsed, total)` in seconds.
    pub time: Option<(f64, f64)>,
}

/// One row of the daemon's current queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub file: String,
    pub pos: u32,
}

/// One file entry from the daemon's full library listing. Tags the daemon
/// does not report stay `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LibraryEntry {
    pub file: String,
    /// Duration in seconds.
    pub time: Option<f64>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track: Option<u32>,
}

/// The daemon commands the driver uses. `MPDClient` implements this over a
/// real connection; tests script it.
pub trait MpdCommands {
    fn ping(&mut self) -> Result<()>;

    fn status(&mut self) -> Result<MpdStatus>;

    /// File path of the song the daemon currently has loaded, if any.
    fn current_song(&mut self) -> Result<Option<String>>;

    fn clear(&mut self) -> Result<()>;

    /// Append a daemon-relative path to the queue.
    fn add(&mut self, path: &str) -> Result<()>;

    /// Resume a paused playback.
    fn play(&mut self) -> Result<()>;

    /// Start playback at the given queue position.
    fn play_pos(&mut self, pos: u32) -> Result<()>;

    fn pause(&mut self, pause: bool) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn seek(&mut self, pos: u32, seconds: f64) -> Result<()>;

    fn random(&mut self, random: bool) -> Result<()>;

    fn repeat(&mut self, repeat: bool) -> Result<()>;

    fn queue(&mut self) -> Result<Vec<QueueEntry>>;

    /// Every file entry in the daemon's library, with whatever tags it has.
    fn list_all(&mut self) -> Result<Vec<LibraryEntry>>;
}

/// Shared handle to a daemon connection. All access happens on the GUI
/// loop thread.
pub type MpdRef = Rc<RefCell<dyn MpdCommands>>;

pub struct MPDClient {
    client: Client<TcpStream>,
}

impl MPDClient {
    pub fn new(addr: &str) -> Result<Self> {
        let client = Client::connect(addr)?;
        Ok(Self { client })
    }

    /// `MPD_HOST`/`MPD_PORT` from the environment, falling back to the
    /// daemon's stock address.
    pub fn default_addr() -> String {
        let host = env::var("MPD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("MPD_PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(6600);
        format!("{host}:{port}")
    }
}

impl MpdCommands for MPDClient {
    fn ping(&mut self) -> Result<()> {
        Ok(self.client.ping()?)
    }

    fn status(&mut self) -> Result<MpdStatus> {
        let status = self.client.status()?;
        Ok(MpdStatus {
            state: status.state,
            time: status
                .time
                .map(|(elapsed, total)| (elapsed.as_secs_f64(), total.as_secs_f64())),
        })
    }

    fn current_song(&mut self) -> Result<Option<String>> {
        Ok(self.client.currentsong()?.map(|song| song.file))
    }

    fn clear(&mut self) -> Result<()> {
        Ok(self.client.clear()?)
    }

    fn add(&mut self, path: &str) -> Result<()> {
        let song = Song {
            file: path.to_string(),
            ..Default::default()
        };
        self.client.push(&song)?;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Ok(self.client.play()?)
    }

    fn play_pos(&mut self, pos: u32) -> Result<()> {
        Ok(self.client.switch(pos)?)
    }

    fn pause(&mut self, pause: bool) -> Result<()> {
        Ok(self.client.pause(pause)?)
    }

    fn stop(&mut self) -> Result<()> {
        Ok(self.client.stop()?)
    }

    fn seek(&mut self, pos: u32, seconds: f64) -> Result<()> {
        Ok(self
            .client
            .seek(pos, Duration::from_secs_f64(seconds.max(0.0)))?)
    }

    fn random(&mut self, random: bool) -> Result<()> {
        Ok(self.client.random(random)?)
    }

    fn repeat(&mut self, repeat: bool) -> Result<()> {
        Ok(self.client.repeat(repeat)?)
    }

    fn queue(&mut self) -> Result<Vec<QueueEntry>> {
        Ok(self
            .client
            .queue()?
            .into_iter()
            .enumerate()
            .map(|(index, song)| QueueEntry {
                pos: song.place.map(|place| place.pos).unwrap_or(index as u32),
                file: song.file,
            })
            .collect())
    }

    fn list_all(&mut self) -> Result<Vec<LibraryEntry>> {
        Ok(self
            .client
            .listall()?
            .into_iter()
            .filter(|song| !song.file.is_empty())
            .map(library_entry)
            .collect())
    }
}

fn library_entry(song: Song) -> LibraryEntry {
    // The MPD Track tag may be "N" or "N/M".
    let track = tag(&song, "Track")
        .and_then(|value| value.split('/').next())
        .and_then(|value| value.trim().parse().ok());
    let album = tag(&song, "Album").map(str::to_string);
    LibraryEntry {
        time: song.duration.map(|duration| duration.as_secs_f64()),
        artist: song.artist,
        album,
        title: song.title,
        track,
        file: song.file,
    }
}

fn tag<'a>(song: &'a Song, name: &str) -> Option<&'a str> {
    song.tags
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

pub fn format_time(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{}:{:02}", mins, secs)
}
