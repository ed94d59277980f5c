use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

pub const CSV_MIME: &str = "text/csv;charset=utf-8";
pub const PNG_MIME: &str = "image/png";
pub const SCENE_MIME: &str = "application/vnd.climate-scene+json";

// ---------------------------------------------------------------------------
// Staged blobs
// ---------------------------------------------------------------------------

/// Tracks the export payloads that are alive right now.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct BlobRegistry {
    live: Rc<RefCell<BTreeSet<u64>>>,
    next_id: Rc<Cell<u64>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload; it is revoked when the returned handle drops.
    pub fn stage(&self, mime: &'static str, bytes: Vec<u8>) -> StagedBlob {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.live.borrow_mut().insert(id);
        log::trace!("staged blob #{id} ({mime}, {} bytes)", bytes.len());
        StagedBlob {
            id,
            mime,
            bytes,
            registry: self.clone(),
        }
    }

    /// Number of staged payloads not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    fn revoke(&self, id: u64) {
        if self.live.borrow_mut().remove(&id) {
            log::trace!("revoked blob #{id}");
        }
    }
}

impl fmt::Debug for BlobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// A single-use export payload, revoked on drop.
pub struct StagedBlob {
    id: u64,
    mime: &'static str,
    bytes: Vec<u8>,
    registry: BlobRegistry,
}

impl StagedBlob {
    /// Stable handle name, like an object URL.
    pub fn url(&self) -> String {
        format!("blob:climate-explorer/{}", self.id)
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for StagedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedBlob")
            .field("url", &self.url())
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_revokes() {
        let registry = BlobRegistry::new();
        let a = registry.stage(CSV_MIME, b"a".to_vec());
        let b = registry.stage(PNG_MIME, Vec::new());
        assert_eq!(registry.live_count(), 2);
        assert_ne!(a.url(), b.url());
        drop(a);
        assert_eq!(registry.live_count(), 1);
        drop(b);
        assert_eq!(registry.live_count(), 0);
    }
}
