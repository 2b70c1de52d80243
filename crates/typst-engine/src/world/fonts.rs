//! Font loading and caching
//!
//! A `FontCache` always carries the fonts embedded through `typst-assets`.
//! Callers add the fonts their documents actually need (for example a CJK
//! face) from disk before compiling.

use std::path::Path;

use typst::foundations::Bytes;
use typst::text::{Font, FontBook, FontInfo};

use crate::compiler::errors::EngineError;

/// A cache of fonts available for compilation
#[derive(Debug, Clone)]
pub struct FontCache {
    /// The font book containing metadata about available fonts
    book: FontBook,
    /// The actual font data, indexed in the same order as `book`
    fonts: Vec<Font>,
}

impl FontCache {
    /// Create a font cache holding only the embedded fonts
    pub fn new() -> Self {
        let mut cache = Self {
            book: FontBook::new(),
            fonts: Vec::new(),
        };

        for data in typst_assets::fonts() {
            cache.push_buffer(Bytes::from_static(data));
        }

        tracing::debug!("Font cache initialized with {} embedded fonts", cache.len());
        cache
    }

    /// Create a font cache with the embedded fonts plus one font file.
    ///
    /// Returns the cache and the family name of the file's first face.
    pub fn with_font_file(path: &Path) -> Result<(Self, String), EngineError> {
        let mut cache = Self::new();
        let family = cache.load_font_file(path)?;
        Ok((cache, family))
    }

    /// Load every face of a font file (ttf, otf, ttc, otc) into the cache.
    ///
    /// Returns the family name of the first face found.
    pub fn load_font_file(&mut self, path: &Path) -> Result<String, EngineError> {
        let data = std::fs::read(path).map_err(|e| EngineError::FontLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let loaded = self.push_buffer(Bytes::from(data));
        let family = loaded.into_iter().next().ok_or_else(|| EngineError::FontLoad {
            path: path.display().to_string(),
            reason: "file contains no usable font faces".to_string(),
        })?;

        tracing::debug!(font = %path.display(), family = %family, "Loaded font file");
        Ok(family)
    }

    /// Register all faces in a buffer, returning their family names in order
    fn push_buffer(&mut self, buffer: Bytes) -> Vec<String> {
        let mut families = Vec::new();
        for font in Font::iter(buffer) {
            families.push(font.info().family.clone());
            self.book.push(font.info().clone());
            self.fonts.push(font);
        }
        families
    }

    /// Get the font book
    pub fn book(&self) -> &FontBook {
        &self.book
    }

    /// Get a font by index
    pub fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    /// Get the number of fonts
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Whether any face of the given family is available
    pub fn has_family(&self, family: &str) -> bool {
        !self.find_by_family(family).is_empty()
    }

    /// List all font families
    pub fn list_font_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .book
            .families()
            .map(|(name, _)| name.to_string())
            .collect();

        families.sort();
        families.dedup();
        families
    }

    /// Search for fonts by family name
    pub fn find_by_family(&self, family: &str) -> Vec<FontInfo> {
        self.fonts
            .iter()
            .filter(|font| font.info().family.eq_ignore_ascii_case(family))
            .map(|font| font.info().clone())
            .collect()
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_font_cache_creation() {
        let cache = FontCache::new();
        // Should have at least some fonts from typst-assets
        assert!(!cache.is_empty(), "Font cache should not be empty");
    }

    #[test]
    fn test_list_families() {
        let cache = FontCache::new();
        let families = cache.list_font_families();

        assert!(!families.is_empty(), "Should have font families");
        for family in &families {
            assert!(cache.has_family(family));
        }
    }

    #[test]
    fn test_missing_font_file() {
        let result = FontCache::with_font_file(Path::new("definitely/not/here.ttf"));
        assert!(matches!(result, Err(EngineError::FontLoad { .. })));
    }

    #[test]
    fn test_garbage_font_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a font").unwrap();

        let result = FontCache::with_font_file(file.path());
        match result {
            Err(EngineError::FontLoad { reason, .. }) => {
                assert!(reason.contains("no usable font faces"))
            }
            other => panic!("expected FontLoad error, got {:?}", other.map(|(_, f)| f)),
        }
    }

    #[test]
    fn test_load_font_file_reports_family() {
        let data = typst_assets::fonts().next().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();

        let embedded = FontCache::new().len();
        let (cache, family) = FontCache::with_font_file(file.path()).unwrap();

        assert!(cache.len() > embedded);
        assert!(cache.has_family(&family));
    }
}
