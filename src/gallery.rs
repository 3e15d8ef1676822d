//! The ordered timeline of memories and which one is currently on screen.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Memory {
    /// Stable identifier. The renderer rebuilds its session iff this changes.
    pub id: String,
    pub image: PathBuf,
    pub title: String,
    pub description: String,
    pub date: String,
}

pub struct Gallery {
    memories: Vec<Memory>,
    /// MUST be in the range 0..memories.len()
    active: usize,
}

impl Gallery {
    pub fn new(memories: Vec<Memory>) -> Result<Self> {
        if memories.is_empty() {
            return Err(Error::EmptyGallery);
        }
        let mut seen = HashSet::new();
        for memory in &memories {
            if !seen.insert(memory.id.as_str()) {
                return Err(Error::DuplicateMemory(memory.id.clone()));
            }
        }
        Ok(Self {
            memories,
            active: 0,
        })
    }

    pub fn active(&self) -> &Memory {
        &self.memories[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn get(&self, id: &str) -> Option<&Memory> {
        self.memories.iter().find(|memory| memory.id == id)
    }

    /// Steps forward in the timeline. Returns whether the active memory changed.
    pub fn next(&mut self) -> bool {
        if self.active + 1 < self.memories.len() {
            self.active += 1;
            true
        } else {
            false
        }
    }

    /// Steps backward in the timeline. Returns whether the active memory changed.
    pub fn previous(&mut self) -> bool {
        if self.active > 0 {
            self.active -= 1;
            true
        } else {
            false
        }
    }

    /// The order images should be decoded in: the active one, its neighbours, the ones two
    /// steps away, then everything else front to back.
    pub fn preload_order(&self) -> Vec<&Memory> {
        let len = self.memories.len();
        let active = self.active;
        let mut order = vec![active];
        for distance in 1..=2 {
            if active >= distance {
                order.push(active - distance);
            }
            if active + distance < len {
                order.push(active + distance);
            }
        }
        order.extend((0..len).filter(|i| i.abs_diff(active) > 2));
        order.into_iter().map(|i| &self.memories[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(id: &str) -> Memory {
        Memory {
            id: id.into(),
            image: PathBuf::from(format!("{id}.jpg")),
            title: id.to_uppercase(),
            description: String::new(),
            date: String::new(),
        }
    }

    fn gallery(ids: &[&str]) -> Gallery {
        Gallery::new(ids.iter().map(|id| memory(id)).collect()).unwrap()
    }

    fn ids<'a>(memories: &[&'a Memory]) -> Vec<&'a str> {
        memories.iter().map(|memory| memory.id.as_str()).collect()
    }

    #[test]
    fn empty_gallery_is_rejected() {
        assert!(matches!(Gallery::new(vec![]), Err(Error::EmptyGallery)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = Gallery::new(vec![memory("a"), memory("b"), memory("a")]);
        assert!(matches!(result, Err(Error::DuplicateMemory(id)) if id == "a"));
    }

    #[test]
    fn navigation_does_not_wrap() {
        let mut gallery = gallery(&["a", "b", "c"]);
        assert_eq!(gallery.active().id, "a");
        assert!(!gallery.previous());
        assert!(gallery.next());
        assert!(gallery.next());
        assert_eq!(gallery.active().id, "c");
        assert!(!gallery.next());
        assert_eq!(gallery.active_index(), 2);
        assert!(gallery.previous());
        assert_eq!(gallery.active().id, "b");
    }

    #[test]
    fn preload_prioritizes_neighbours() {
        let mut gallery = gallery(&["a", "b", "c", "d", "e", "f", "g"]);
        gallery.next();
        gallery.next();
        gallery.next();
        assert_eq!(
            ids(&gallery.preload_order()),
            ["d", "c", "e", "b", "f", "a", "g"]
        );
    }

    #[test]
    fn preload_at_start_of_timeline() {
        let gallery = gallery(&["a", "b", "c", "d", "e"]);
        assert_eq!(ids(&gallery.preload_order()), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn lookup_by_id() {
        let gallery = gallery(&["a", "b"]);
        assert_eq!(gallery.get("b").map(|m| m.title.as_str()), Some("B"));
        assert!(gallery.get("z").is_none());
    }
}
