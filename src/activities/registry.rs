//! In-memory registry of open activity views.
//!
//! Locks are never held across an `.await`: callers take the lock, mutate a
//! view through [`ViewRegistry::with_view`], and release it before any I/O.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::view::ActivityView;

struct Entry {
    view: ActivityView,
    last_access: Instant,
}

#[derive(Clone)]
pub struct ViewRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    max_views: usize,
}

impl ViewRegistry {
    pub fn new(max_views: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_views: max_views.max(1),
        }
    }

    /// Register a view, evicting the least recently used one when full.
    pub fn insert(&self, view: ActivityView) -> Uuid {
        let id = view.id();
        let mut views = self.inner.write();

        if views.len() >= self.max_views {
            let oldest = views
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                views.remove(&oldest);
                tracing::debug!(view_id = %oldest, "Evicted least recently used view");
            }
        }

        views.insert(
            id,
            Entry {
                view,
                last_access: Instant::now(),
            },
        );
        id
    }

    /// Run `f` against a view. `None` if the view does not exist.
    pub fn with_view<R>(&self, id: Uuid, f: impl FnOnce(&mut ActivityView) -> R) -> Option<R> {
        let mut views = self.inner.write();
        let entry = views.get_mut(&id)?;
        entry.last_access = Instant::now();
        Some(f(&mut entry.view))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.inner.write().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }
}
