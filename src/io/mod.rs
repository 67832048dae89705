//! Mesh file I/O.
//!
//! Meshes are read and written as OFF (Object File Format), the plain-text
//! polygon format used throughout the classic geometry-processing toolkits.
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | OFF | `.off` | ✓ | ✓ | Polygons; colour/normal extensions ignored |
//!
//! # Usage
//!
//! ```no_run
//! use edgefold::io::{load, save};
//! use edgefold::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("model.off").unwrap();
//! save(&mesh, "copy.off").unwrap();
//! ```
//!
//! The reader/writer pair in [`off`] works on any `BufRead`/`Write`, which is
//! handy for tests and pipes.

pub mod off;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Object File Format.
    Off,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "off" => Some(Format::Off),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect<P: AsRef<Path>>(path: P) -> Result<Format> {
    let path = path.as_ref();
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file with automatic format detection.
///
/// # Errors
/// [`MeshError::UnsupportedFormat`] for unknown extensions, [`MeshError::Io`]
/// if the file cannot be read, and the format errors of [`off::read_off`].
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    match detect(&path)? {
        Format::Off => off::load(path),
    }
}

/// Save a mesh to a file with automatic format detection.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    match detect(&path)? {
        Format::Off => off::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/mesh.OFF"), Some(Format::Off));
        assert_eq!(Format::from_path("mesh.obj"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let result: Result<HalfEdgeMesh> = load("model.stl");
        assert!(matches!(
            result,
            Err(MeshError::UnsupportedFormat { extension }) if extension == "stl"
        ));
    }
}
