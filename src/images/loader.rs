//! Main-thread side of image loading. Keeps at most one decode in flight so that navigating the
//! timeline immediately re-prioritizes what gets decoded next.

use std::collections::HashMap;
use std::sync::mpsc;

use crate::gallery::Gallery;
use crate::images::worker::{Loaded, Request, Worker};

pub use crate::images::worker::LoadResult;

/// How many images, most urgent first, are kept decoded at any one time.
const PRELOAD_WINDOW: usize = 5;

pub struct Loader {
    tx: mpsc::Sender<Request>,
    rx: mpsc::Receiver<Loaded>,
    /// Finished decodes, successful or not, keyed by memory id
    cache: HashMap<String, LoadResult>,
    /// The memory id currently being decoded by the worker, if any
    in_flight: Option<String>,
}

impl Loader {
    pub fn spawn() -> Self {
        let (tx, rx, worker) = Worker::new();
        std::thread::spawn(move || worker.work());
        Self {
            tx,
            rx,
            cache: HashMap::new(),
            in_flight: None,
        }
    }

    /// Collects finished decodes, drops images that fell out of the preload window, and hands
    /// the worker the most urgent image that isn't decoded yet.
    pub fn pump(&mut self, gallery: &Gallery) {
        while let Ok(Loaded { id, result }) = self.rx.try_recv() {
            if self.in_flight.as_deref() == Some(id.as_str()) {
                self.in_flight = None;
            }
            if let Err(err) = &result {
                let title = gallery.get(&id).map_or("", |memory| memory.title.as_str());
                log::error!("memory {id} \"{title}\": {err}");
            }
            self.cache.insert(id, result);
        }

        let wanted: Vec<_> = gallery
            .preload_order()
            .into_iter()
            .take(PRELOAD_WINDOW)
            .collect();
        self.cache
            .retain(|id, _| wanted.iter().any(|memory| &memory.id == id));

        if self.in_flight.is_some() {
            return;
        }
        let next = wanted
            .into_iter()
            .find(|memory| !self.cache.contains_key(&memory.id));
        if let Some(memory) = next {
            let request = Request {
                id: memory.id.clone(),
                path: memory.image.clone(),
            };
            match self.tx.send(request) {
                Ok(()) => self.in_flight = Some(memory.id.clone()),
                Err(_) => log::error!("image worker stopped unexpectedly"),
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&LoadResult> {
        self.cache.get(id)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.in_flight.as_deref() == Some(id)
    }
}
