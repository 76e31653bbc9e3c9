//! Per-run font cache. Font files are immutable inputs, so every path is
//! parsed at most once and shared across worker threads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::FontError;
use crate::font::VectorFont;
use crate::raster::FontdueRasterizer;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub path: PathBuf,
    pub collection_index: u32,
}

impl FontKey {
    pub fn new(path: impl Into<PathBuf>, collection_index: u32) -> Self {
        Self { path: path.into(), collection_index }
    }
}

#[derive(Default)]
pub struct FontLibrary {
    vector: Mutex<HashMap<FontKey, Arc<VectorFont>>>,
    raster: Mutex<HashMap<FontKey, Arc<FontdueRasterizer>>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vector(&self, path: &Path, collection_index: u32) -> Result<Arc<VectorFont>, FontError> {
        let key = FontKey::new(path, collection_index);
        let mut cache = self.vector.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(font) = cache.get(&key) {
            return Ok(Arc::clone(font));
        }
        let font = Arc::new(VectorFont::load(path, collection_index)?);
        log::info!("loaded outline font {}", path.display());
        cache.insert(key, Arc::clone(&font));
        Ok(font)
    }

    pub fn rasterizer(&self, path: &Path, collection_index: u32) -> Result<Arc<FontdueRasterizer>, FontError> {
        let key = FontKey::new(path, collection_index);
        let mut cache = self.raster.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(r) = cache.get(&key) {
            return Ok(Arc::clone(r));
        }
        let r = Arc::new(FontdueRasterizer::load(path, collection_index)?);
        log::info!("loaded rasterizer font {}", path.display());
        cache.insert(key, Arc::clone(&r));
        Ok(r)
    }

    /// Number of distinct fonts parsed so far (both kinds).
    pub fn len(&self) -> usize {
        self.vector.lock().unwrap_or_else(PoisonError::into_inner).len()
            + self.raster.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SynthFont;

    #[test]
    fn loads_each_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synth.ttf");
        std::fs::write(&path, SynthFont::new(1000, 800, -200).rect('A', 600, 0, 0, 500, 700).build()).unwrap();

        let library = FontLibrary::new();
        let a = library.vector(&path, 0).unwrap();
        let b = library.vector(&path, 0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let _ = library.rasterizer(&path, 0).unwrap();
        assert_eq!(library.len(), 2);

        assert!(library.vector(&dir.path().join("missing.ttf"), 0).is_err());
        assert_eq!(library.len(), 2);
    }
}
