use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use crate::error::Error;
use crate::images::SourceImage;

pub type LoadResult = Result<Arc<SourceImage>, Arc<Error>>;

pub struct Request {
    pub id: String,
    pub path: PathBuf,
}

pub struct Loaded {
    pub id: String,
    pub result: LoadResult,
}

pub struct Worker {
    /// Images to decode, in the order they should be decoded
    rx: mpsc::Receiver<Request>,
    /// Where decoded images (or the reason they couldn't be) are sent back
    tx: mpsc::Sender<Loaded>,
}

impl Worker {
    pub fn new() -> (mpsc::Sender<Request>, mpsc::Receiver<Loaded>, Self) {
        let (request_tx, request_rx) = mpsc::channel();
        let (loaded_tx, loaded_rx) = mpsc::channel();
        (
            request_tx,
            loaded_rx,
            Self {
                rx: request_rx,
                tx: loaded_tx,
            },
        )
    }

    /// Main loop of the worker. Should be run in its own thread; returns once the loader on the
    /// other end has been dropped.
    pub fn work(self) {
        while let Ok(Request { id, path }) = self.rx.recv() {
            log::debug!("decoding {id} from {}", path.display());
            let result = SourceImage::open(&path).map(Arc::new).map_err(Arc::new);
            if self.tx.send(Loaded { id, result }).is_err() {
                break;
            }
        }
    }
}
