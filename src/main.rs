use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use anyhow::Result;
use log::info;

use mpddriver::{
    format_time, search_collection, DeviceDriver, DeviceTrack, DriverRef, HostApp, HostRef,
    TrackData, TrackRef,
};

/// Just enough of a host application to run the driver from a terminal
/// and watch what it does.
#[derive(Default)]
struct ConsoleHost {
    current: Option<TrackRef>,
}

impl HostApp for ConsoleHost {
    fn add_driver(&mut self, _driver: DriverRef, name: &str) {
        info!("device panel registered {name}");
    }

    fn remove_driver(&mut self, name: &str) {
        info!("device panel removed {name}");
    }

    fn set_device_collection(&mut self, tracks: TrackData) {
        println!("collection: {} tracks", tracks.len());
    }

    fn current_track(&self) -> Option<TrackRef> {
        self.current.clone()
    }

    fn set_current_track(&mut self, track: Option<TrackRef>) {
        self.current = track;
    }

    fn update_track_information(&mut self) {
        if let Some(track) = &self.current {
            let track = track.borrow();
            println!(
                "now playing: {} - {} [{}]",
                track.artist().unwrap_or("Unknown Artist"),
                track.title().unwrap_or(track.location()),
                format_time(track.length()),
            );
        }
    }

    fn new_page(&mut self, title: &str, tracks: TrackData) {
        println!("page \"{title}\": {} tracks", tracks.len());
    }

    fn search_tracks(&self, tracks: &TrackData, keyword: &str) -> TrackData {
        search_collection(tracks, keyword)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let host: HostRef = Rc::new(RefCell::new(ConsoleHost::default()));
    let driver = mpddriver::initialize(&host);
    driver.borrow_mut().connect()?;

    if let Some(keyword) = env::args().nth(1) {
        let found = driver.borrow().search_tracks(&keyword);
        println!("search \"{keyword}\": {} tracks", found.len());
        for track in found.iter().take(20) {
            let track = track.borrow();
            println!(
                "  {} - {}",
                track.artist().unwrap_or("Unknown Artist"),
                track.title().unwrap_or(track.location()),
            );
        }
    }

    // Keep the GUI loop alive so the 1-second poll can run.
    let main_loop = glib::MainLoop::new(None, false);
    main_loop.run();
    Ok(())
}
