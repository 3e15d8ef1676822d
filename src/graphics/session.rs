/// Holds the render session of at most one memory, keyed by memory id.
///
/// A session only exists while its memory is active and its image is decoded. Switching to a
/// different memory drops the old session before the new one is built, so two sessions never
/// coexist.
pub struct SessionSlot<S> {
    bound: Option<(String, S)>,
}

impl<S> SessionSlot<S> {
    pub fn new() -> Self {
        Self { bound: None }
    }

    pub fn memory_id(&self) -> Option<&str> {
        self.bound.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn session(&self) -> Option<&S> {
        self.bound.as_ref().map(|(_, session)| session)
    }

    pub fn session_mut(&mut self) -> Option<&mut S> {
        self.bound.as_mut().map(|(_, session)| session)
    }

    /// Brings the slot in line with the active memory. `image` is `None` while the image is
    /// loading or after it failed, which leaves nothing bound. `build` runs only when
    /// `memory_id` isn't already bound; if it returns `None` the slot stays empty.
    ///
    /// Returns whether a new session was built.
    pub fn follow<T: ?Sized>(
        &mut self,
        memory_id: &str,
        image: Option<&T>,
        build: impl FnOnce(&T) -> Option<S>,
    ) -> bool {
        let Some(image) = image else {
            self.bound = None;
            return false;
        };
        if self.memory_id() == Some(memory_id) {
            return false;
        }
        self.bound = None;
        self.bound = build(image).map(|session| (memory_id.to_owned(), session));
        self.bound.is_some()
    }
}
