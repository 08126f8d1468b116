use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::error::FormError;
use super::reference::{ReferenceEntity, ReferenceKind};
use crate::transport::Transport;

pub type CascadeKey = i64;

/// Reference collections of one open screen, keyed by `(kind, scope)`.
/// `None` scope is the whole catalog of that kind.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: BTreeMap<(ReferenceKind, Option<CascadeKey>), Vec<ReferenceEntity>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached scope, fetching it first if absent. A failed fetch
    /// leaves the scope absent so the next call retries.
    pub fn load(
        &mut self,
        transport: &mut dyn Transport,
        kind: ReferenceKind,
        scope: Option<CascadeKey>,
    ) -> Result<&[ReferenceEntity], FormError> {
        let key = (kind, scope);
        if !self.entries.contains_key(&key) {
            let mut query = kind.base_query();
            if let (Some(param), Some(k)) = (kind.scope_param(), scope) {
                query.push((param.to_string(), k.to_string()));
            }
            let body = transport.get(kind.path(), &query).map_err(|e| {
                warn!(kind = kind.as_str(), ?scope, error = %e, "reference load failed");
                e
            })?;
            let rows = kind.collection_from_json(&body, scope)?;
            debug!(kind = kind.as_str(), ?scope, count = rows.len(), "reference loaded");
            self.entries.insert(key, rows);
        }
        Ok(self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn get(&self, kind: ReferenceKind, scope: Option<CascadeKey>) -> Option<&[ReferenceEntity]> {
        self.entries.get(&(kind, scope)).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn contains(&self, kind: ReferenceKind, scope: Option<CascadeKey>) -> bool {
        self.entries.contains_key(&(kind, scope))
    }

    /// Drops one scope, or every scope of `kind` when `scope` is `None`.
    pub fn invalidate(&mut self, kind: ReferenceKind, scope: Option<CascadeKey>) {
        match scope {
            Some(k) => {
                self.entries.remove(&(kind, Some(k)));
            }
            None => self.entries.retain(|(k, _), _| *k != kind),
        }
    }
}
