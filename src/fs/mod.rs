//! Reads the list of memories to browse. The format is a JSON array of memory records, as
//! exported by the gallery's persistence layer:
//!
//! ```json
//! [
//!   {
//!     "id": "7f3c",
//!     "image_url": "photos/lake.jpg",
//!     "title": "Lake",
//!     "description": "First swim of the year",
//!     "date": "2024-06-02"
//!   }
//! ]
//! ```
//!
//! Relative `image_url`s are resolved against the directory holding the gallery file.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::gallery::Memory;

/// One memory as it appears on disk.
#[derive(Debug, Clone, facet::Facet)]
pub struct MemoryRecord {
    pub id: String,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub date: String,
}

impl MemoryRecord {
    fn into_memory(self, base: &Path) -> Memory {
        let image = PathBuf::from(&self.image_url);
        let image = if image.is_absolute() {
            image
        } else {
            base.join(image)
        };
        Memory {
            id: self.id,
            image,
            title: self.title,
            description: self.description,
            date: self.date,
        }
    }
}

fn parse_records(buf: &[u8]) -> std::result::Result<Vec<MemoryRecord>, String> {
    facet_json::from_slice(buf).map_err(|err| format!("{err}"))
}

/// Reads every memory listed in the gallery file at `path`.
pub fn read_gallery(path: &Path) -> Result<Vec<Memory>> {
    let buf = std::fs::read(path).map_err(|err| Error::GalleryRead(path.into(), err))?;
    let records = parse_records(&buf).map_err(|err| Error::GalleryParse(path.into(), err))?;

    let base = path.parent().unwrap_or(Path::new("."));
    Ok(records
        .into_iter()
        .map(|record| record.into_memory(base))
        .collect())
}

/// Turns loose image paths from the command line into memories. The path doubles as the id and
/// the file stem as the title.
pub fn memories_from_paths(paths: &[PathBuf]) -> Vec<Memory> {
    paths
        .iter()
        .map(|path| Memory {
            id: path.display().to_string(),
            image: path.clone(),
            title: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            description: String::new(),
            date: String::new(),
        })
        .collect()
}
