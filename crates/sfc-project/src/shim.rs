//! Component-aware view over the raw file system.
//!
//! The engine asks about the synthetic `name.sfc.ts` paths it invents for
//! component files. This wrapper rewrites those queries to the real
//! component paths and, going the other way, lists component files under
//! their virtual names so the engine's own directory scans discover them.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use sfc_virtual::{ensure_real_path, is_component_path, to_virtual_path};

use crate::fs::FileSystemShim;

pub struct ComponentFileSystem {
    inner: Arc<dyn FileSystemShim>,
    exists_cache: Mutex<FxHashMap<Utf8PathBuf, bool>>,
}

impl ComponentFileSystem {
    pub fn new(inner: Arc<dyn FileSystemShim>) -> Self {
        Self {
            inner,
            exists_cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Existence check with virtual-path rewriting. Results are cached
    /// per asked path until invalidated.
    pub fn file_exists(&self, path: &Utf8Path) -> bool {
        if let Some(&known) = self.cache().get(path) {
            return known;
        }
        let exists = self.inner.file_exists(&ensure_real_path(path));
        self.cache().insert(path.to_owned(), exists);
        exists
    }

    pub fn read_file(&self, path: &Utf8Path) -> io::Result<String> {
        self.inner.read_file(&ensure_real_path(path))
    }

    /// Directory listing with component files reported under their
    /// engine-facing virtual names.
    pub fn read_directory(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        self.inner
            .read_directory(path)
            .into_iter()
            .map(|entry| {
                if is_component_path(&entry) {
                    to_virtual_path(&entry)
                } else {
                    entry
                }
            })
            .collect()
    }

    pub fn file_size(&self, path: &Utf8Path) -> u64 {
        self.inner.file_size(&ensure_real_path(path))
    }

    /// Drops cached existence answers for both forms of `path`.
    pub fn invalidate(&self, path: &Utf8Path) {
        let mut cache = self.cache();
        let real = ensure_real_path(path);
        cache.remove(&real);
        cache.remove(&to_virtual_path(&real));
        cache.remove(path);
    }

    pub fn invalidate_all(&self) {
        self.cache().clear();
    }

    pub fn inner(&self) -> &Arc<dyn FileSystemShim> {
        &self.inner
    }

    fn cache(&self) -> MutexGuard<'_, FxHashMap<Utf8PathBuf, bool>> {
        match self.exists_cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn shim_with(files: &[(&str, &str)]) -> ComponentFileSystem {
        let fs = MemoryFileSystem::new();
        for (path, text) in files {
            fs.insert(*path, *text);
        }
        ComponentFileSystem::new(Arc::new(fs))
    }

    #[test]
    fn virtual_paths_exist_when_the_real_component_does() {
        let shim = shim_with(&[("/app/widget.sfc", "<script></script>")]);
        assert!(shim.file_exists("/app/widget.sfc.ts".into()));
        assert!(shim.file_exists("/app/widget.sfc".into()));
        assert!(!shim.file_exists("/app/other.sfc.ts".into()));
    }

    #[test]
    fn stale_cache_entries_are_dropped_on_invalidate() {
        let fs = Arc::new(MemoryFileSystem::new());
        let shim = ComponentFileSystem::new(Arc::<MemoryFileSystem>::clone(&fs));

        assert!(!shim.file_exists("/app/widget.sfc.ts".into()));
        fs.insert("/app/widget.sfc", "");
        // Still the cached answer until someone invalidates.
        assert!(!shim.file_exists("/app/widget.sfc.ts".into()));

        shim.invalidate("/app/widget.sfc".into());
        assert!(shim.file_exists("/app/widget.sfc.ts".into()));
    }

    #[test]
    fn listings_use_virtual_names() {
        let shim = shim_with(&[("/app/widget.sfc", ""), ("/app/util.ts", "")]);
        let listing = shim.read_directory("/app".into());
        assert!(listing.contains(&Utf8PathBuf::from("/app/widget.sfc.ts")));
        assert!(listing.contains(&Utf8PathBuf::from("/app/util.ts")));
        assert!(!listing.contains(&Utf8PathBuf::from("/app/widget.sfc")));
    }

    #[test]
    fn reads_go_to_the_real_path() {
        let shim = shim_with(&[("/app/widget.sfc", "<p>hi</p>")]);
        assert_eq!(shim.read_file("/app/widget.sfc.ts".into()).unwrap(), "<p>hi</p>");
    }
}
