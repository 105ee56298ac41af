use std::path::{Path, PathBuf};
use std::sync::Arc;

use glyphon::cosmic_text::fontdb;
use glyphon::Family;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("failed to read font {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} does not contain any usable font faces", .0.display())]
    NoFaces(PathBuf),
}

/// Font family used for the holographic labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelFont {
    Loaded { family: String },
    Fallback,
}

impl LabelFont {
    pub fn family(&self) -> Family<'_> {
        match self {
            LabelFont::Loaded { family } => Family::Name(family),
            LabelFont::Fallback => Family::SansSerif,
        }
    }
}

/// Loads a font file into `db` and returns the family name of its first face.
pub fn load_font_file(db: &mut fontdb::Database, path: &Path) -> Result<String, FontLoadError> {
    let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ids = db.load_font_source(fontdb::Source::Binary(Arc::new(data)));

    ids.iter()
        .filter_map(|&id| db.face(id))
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .ok_or_else(|| FontLoadError::NoFaces(path.to_path_buf()))
}

/// Like [`load_font_file`], but never fails. Errors are logged and the
/// labels use the system sans-serif family instead.
pub fn resolve_label_font(db: &mut fontdb::Database, path: &Path) -> LabelFont {
    match load_font_file(db, path) {
        Ok(family) => {
            log::info!("Loaded label font '{}' from {}", family, path.display());
            LabelFont::Loaded { family }
        }
        Err(err) => {
            log::warn!("{err}. Falling back to the system sans-serif font");
            LabelFont::Fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_falls_back() {
        let mut db = fontdb::Database::new();
        let font = resolve_label_font(&mut db, Path::new("assets/fonts/does-not-exist.ttf"));
        assert_eq!(font, LabelFont::Fallback);
        assert_eq!(font.family(), Family::SansSerif);
    }

    #[test]
    fn garbage_font_is_rejected() {
        let path = std::env::temp_dir().join("holoscene-not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();

        let mut db = fontdb::Database::new();
        let result = load_font_file(&mut db, &path);
        assert!(matches!(result, Err(FontLoadError::NoFaces(_))));
        assert_eq!(resolve_label_font(&mut db, &path), LabelFont::Fallback);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loaded_font_uses_its_family_name() {
        let font = LabelFont::Loaded {
            family: "Roboto".to_owned(),
        };
        assert_eq!(font.family(), Family::Name("Roboto"));
    }
}
