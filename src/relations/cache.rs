use std::sync::{Arc, RwLock};

use super::Graph;
use crate::error::Result;
use crate::store::Store;

/// Holds the last built graph, tagged with the store version it came from.
#[derive(Default)]
pub struct GraphCache {
    slot: RwLock<Option<(u64, Arc<Graph>)>>,
}

impl GraphCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the graph for the store's current version, rebuilding on mismatch.
    pub fn get(&self, store: &dyn Store) -> Result<Arc<Graph>> {
        let version = store.version();
        {
            let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
            if let Some((cached, graph)) = slot.as_ref() {
                if *cached == version {
                    return Ok(Arc::clone(graph));
                }
            }
        }

        let snapshot = store.snapshot()?;
        let graph = Arc::new(Graph::build(&snapshot.tables)?);
        tracing::debug!("Rebuilt relation graph at store version {}", snapshot.version);

        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        let newer = slot
            .as_ref()
            .is_some_and(|(cached, _)| *cached > snapshot.version);
        if !newer {
            *slot = Some((snapshot.version, Arc::clone(&graph)));
        }

        Ok(graph)
    }
}
