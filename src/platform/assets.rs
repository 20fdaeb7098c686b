//! Texture cache
//!
//! Loads are fire-and-forget: the cache hands out a shared handle right away
//! and the loader flips it to ready (or failed) whenever the asset arrives.
//! The game never waits on a texture.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum TextureStatus {
    Pending,
    Ready { width: u32, height: u32 },
    Failed(String),
}

/// Shared view of a texture that may still be loading
#[derive(Debug, Clone)]
pub struct TextureHandle {
    name: Rc<str>,
    status: Rc<RefCell<TextureStatus>>,
}

impl TextureHandle {
    pub fn pending(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            status: Rc::new(RefCell::new(TextureStatus::Pending)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TextureStatus {
        self.status.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.status.borrow(), TextureStatus::Ready { .. })
    }

    pub fn fulfil(&self, width: u32, height: u32) {
        *self.status.borrow_mut() = TextureStatus::Ready { width, height };
    }

    pub fn fail(&self, reason: &str) {
        log::warn!("Texture {} failed to load: {}", self.name, reason);
        *self.status.borrow_mut() = TextureStatus::Failed(reason.to_string());
    }

    /// Whether two handles share the same underlying texture
    pub fn same_texture(&self, other: &TextureHandle) -> bool {
        Rc::ptr_eq(&self.status, &other.status)
    }
}

/// Starts loading a texture; completion is reported through the handle
pub trait TextureLoader {
    fn request(&mut self, handle: TextureHandle);
}

/// Memoizes texture loads by name
pub struct TextureCache {
    loader: Box<dyn TextureLoader>,
    textures: HashMap<String, TextureHandle>,
}

impl TextureCache {
    pub fn new(loader: Box<dyn TextureLoader>) -> Self {
        Self {
            loader,
            textures: HashMap::new(),
        }
    }

    /// Handle for `name`, requesting it from the loader on first use
    pub fn load_texture(&mut self, name: &str) -> TextureHandle {
        if let Some(handle) = self.textures.get(name) {
            return handle.clone();
        }
        let handle = TextureHandle::pending(name);
        self.loader.request(handle.clone());
        self.textures.insert(name.to_string(), handle.clone());
        handle
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Number of textures still loading
    pub fn pending(&self) -> usize {
        self.textures
            .values()
            .filter(|h| h.status() == TextureStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct QueueLoader {
        queue: Rc<RefCell<Vec<TextureHandle>>>,
    }

    impl TextureLoader for QueueLoader {
        fn request(&mut self, handle: TextureHandle) {
            self.queue.borrow_mut().push(handle);
        }
    }

    #[test]
    fn test_load_texture_is_memoized() {
        let loader = QueueLoader::default();
        let mut cache = TextureCache::new(Box::new(loader.clone()));

        let a = cache.load_texture("cloud.png");
        let b = cache.load_texture("cloud.png");
        let c = cache.load_texture("voucher.png");

        assert!(a.same_texture(&b));
        assert!(!a.same_texture(&c));
        assert_eq!(loader.queue.borrow().len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_handles_resolve_later() {
        let loader = QueueLoader::default();
        let mut cache = TextureCache::new(Box::new(loader.clone()));
        let handle = cache.load_texture("balloon.png");
        assert!(!handle.is_ready());
        assert_eq!(cache.pending(), 1);

        for queued in loader.queue.borrow().iter() {
            queued.fulfil(256, 128);
        }
        assert!(handle.is_ready());
        assert_eq!(handle.status(), TextureStatus::Ready { width: 256, height: 128 });
        assert_eq!(cache.pending(), 0);

        cache.load_texture("missing.png").fail("404");
        assert_eq!(cache.pending(), 0);
    }
}
