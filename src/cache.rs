//! Read-through dataset cache, owned by the shell.
//!
//! The input files never change during a run, so the cache needs no
//! invalidation: each path is parsed at most once and every later request
//! gets the same shared table back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::data::{load_table, DataError, IndexTable};
use crate::logging::{self, obj, v_num, v_str, Domain};

#[derive(Default)]
pub struct DatasetCache {
    inner: RwLock<HashMap<PathBuf, Arc<IndexTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the table for `path`, loading it on first access.
    ///
    /// Double-checked: the read lock serves the steady state, and the write
    /// lock re-checks before parsing so two sessions racing on first access
    /// populate the entry exactly once.
    pub fn load(&self, path: &Path) -> Result<Arc<IndexTable>, DataError> {
        // A poisoned lock only means another session panicked mid-access;
        // the map itself is still consistent.
        if let Some(table) = self
            .inner
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(path)
        {
            logging::debug(
                Domain::Cache,
                "hit",
                obj(&[("path", v_str(&path.display().to_string()))]),
            );
            return Ok(Arc::clone(table));
        }

        let mut map = self.inner.write().unwrap_or_else(|p| p.into_inner());
        if let Some(table) = map.get(path) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_table(path)?);
        map.insert(path.to_path_buf(), Arc::clone(&table));
        logging::info(
            Domain::Cache,
            "populated",
            obj(&[
                ("path", v_str(&path.display().to_string())),
                ("rows", v_num(table.len() as f64)),
            ]),
        );
        Ok(table)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
