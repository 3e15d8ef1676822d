use std::fmt::{self, Display};
use std::path::PathBuf;

/// Everything that can go wrong outside the GPU. Each variant says where.
#[derive(Debug)]
pub enum Error {
    /// The gallery file could not be read.
    GalleryRead(PathBuf, std::io::Error),
    /// The gallery file was read but is not a valid list of memories.
    GalleryParse(PathBuf, String),
    /// Two memories in the gallery share an id.
    DuplicateMemory(String),
    /// There is nothing to display.
    EmptyGallery,
    /// An image could not be opened or decoded.
    Image(PathBuf, image::ImageError),
    /// A `name=value` parameter override could not be understood.
    BadOverride(String),
    /// The particle grid would be empty or too large for one vertex buffer.
    Resolution { requested: u32, max: u32 },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::GalleryRead(path, err) => {
                write!(f, "could not read gallery {}: {err}", path.display())
            }
            Error::GalleryParse(path, err) => {
                write!(f, "could not parse gallery {}: {err}", path.display())
            }
            Error::DuplicateMemory(id) => write!(f, "memory id {id:?} appears more than once"),
            Error::EmptyGallery => write!(f, "no memories to display"),
            Error::Image(path, err) => write!(f, "could not load image {}: {err}", path.display()),
            Error::BadOverride(text) => {
                write!(f, "expected <parameter>=<number>, got {text:?}")
            }
            Error::Resolution { requested, max } => {
                write!(f, "grid resolution {requested} is outside 1..={max}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::GalleryRead(_, err) => Some(err),
            Error::Image(_, err) => Some(err),
            Error::GalleryParse(..)
            | Error::DuplicateMemory(_)
            | Error::EmptyGallery
            | Error::BadOverride(_)
            | Error::Resolution { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
