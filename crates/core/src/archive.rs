//! Upload archive validation.
//!
//! Pure inspection of an uploaded ZIP byte buffer: size bound, ZIP
//! integrity, and per-entry image checks (extension, readability,
//! minimum dimensions). Produces a manifest aggregating every entry's
//! outcome; validation never mutates storage.

use std::io::{Cursor, Read};

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum accepted archive size: 500 MiB.
pub const MAX_ARCHIVE_BYTES: u64 = 500 * 1024 * 1024;

/// Minimum width and height for an ingested image.
pub const MIN_DIMENSION: u32 = 256;

/// Image file extensions accepted for ingestion.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Per-entry rejection reason: extension not in [`ALLOWED_EXTENSIONS`].
pub const REASON_UNSUPPORTED_FORMAT: &str = "Unsupported file format";

/// Per-entry rejection reason: image smaller than the minimum in either axis.
pub const REASON_UNDERSIZED: &str = "Image dimensions below 256x256";

/// Per-entry rejection reason: entry could not be read or decoded.
pub const REASON_UNREADABLE: &str = "Unreadable image file";

// ---------------------------------------------------------------------------
// Manifest types
// ---------------------------------------------------------------------------

/// An archive entry that passed every validation check.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedEntry {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// An archive entry rejected with a reason; siblings are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedEntry {
    pub filename: String,
    pub reason: String,
}

/// Aggregated per-entry validation outcomes for one archive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveManifest {
    pub accepted: Vec<AcceptedEntry>,
    pub rejected: Vec<RejectedEntry>,
}

impl ArchiveManifest {
    /// Total file entries examined (directories are not counted).
    pub fn total_entries(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Returns `true` if the filename carries an accepted image extension
/// (case-insensitive).
pub fn is_allowed_extension(filename: &str) -> bool {
    match filename.rsplit('.').next() {
        Some(ext) if ext.len() < filename.len() => {
            ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        }
        _ => false,
    }
}

/// Read image dimensions from an in-memory byte buffer.
///
/// Decodes only the header, never the full pixel data. Returns `None`
/// when the format cannot be guessed or the header is malformed.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Validate an uploaded archive against the size bound and per-entry rules.
///
/// Archive-level failures (too large, not a readable ZIP) abort the whole
/// run with a [`CoreError::Validation`]. Entry-level failures are recorded
/// in the manifest and never abort validation of the remaining entries.
/// Entries whose name denotes a directory are skipped silently.
pub fn validate_archive(bytes: &[u8], max_bytes: u64) -> Result<ArchiveManifest, CoreError> {
    if bytes.len() as u64 > max_bytes {
        return Err(CoreError::Validation(format!(
            "Archive exceeds the {max_bytes} byte limit"
        )));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CoreError::Validation(format!("Invalid ZIP archive: {e}")))?;

    let mut manifest = ArchiveManifest::default();

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(_) => {
                manifest.rejected.push(RejectedEntry {
                    filename: format!("entry #{index}"),
                    reason: REASON_UNREADABLE.to_string(),
                });
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let filename = entry.name().to_string();

        if !is_allowed_extension(&filename) {
            manifest.rejected.push(RejectedEntry {
                filename,
                reason: REASON_UNSUPPORTED_FORMAT.to_string(),
            });
            continue;
        }

        // Reading the entry also verifies its CRC.
        let mut buf = Vec::with_capacity(entry.size() as usize);
        if entry.read_to_end(&mut buf).is_err() {
            manifest.rejected.push(RejectedEntry {
                filename,
                reason: REASON_UNREADABLE.to_string(),
            });
            continue;
        }

        match probe_dimensions(&buf) {
            Some((width, height)) if width >= MIN_DIMENSION && height >= MIN_DIMENSION => {
                manifest.accepted.push(AcceptedEntry {
                    filename,
                    width,
                    height,
                });
            }
            Some(_) => {
                manifest.rejected.push(RejectedEntry {
                    filename,
                    reason: REASON_UNDERSIZED.to_string(),
                });
            }
            None => {
                manifest.rejected.push(RejectedEntry {
                    filename,
                    reason: REASON_UNREADABLE.to_string(),
                });
            }
        }
    }

    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// Encode a plain RGB image of the given size as PNG bytes.
    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("PNG encoding should succeed");
        out.into_inner()
    }

    /// Build an in-memory ZIP from (name, bytes) pairs. Names ending in
    /// '/' become directory entries.
    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in entries {
            if name.ends_with('/') {
                writer.add_directory(name.trim_end_matches('/'), options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn accepts_valid_image() {
        let png = png_bytes(300, 300);
        let zip = build_zip(&[("photo.png", &png)]);
        let manifest = validate_archive(&zip, MAX_ARCHIVE_BYTES).unwrap();

        assert_eq!(manifest.accepted.len(), 1);
        assert!(manifest.rejected.is_empty());
        assert_eq!(manifest.accepted[0].filename, "photo.png");
        assert_eq!(manifest.accepted[0].width, 300);
        assert_eq!(manifest.accepted[0].height, 300);
    }

    #[test]
    fn rejects_undersized_image() {
        let png = png_bytes(100, 300);
        let zip = build_zip(&[("tiny.png", &png)]);
        let manifest = validate_archive(&zip, MAX_ARCHIVE_BYTES).unwrap();

        assert!(manifest.accepted.is_empty());
        assert_eq!(manifest.rejected.len(), 1);
        assert_eq!(manifest.rejected[0].reason, REASON_UNDERSIZED);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let zip = build_zip(&[("notes.txt", b"hello")]);
        let manifest = validate_archive(&zip, MAX_ARCHIVE_BYTES).unwrap();

        assert_eq!(manifest.rejected.len(), 1);
        assert_eq!(manifest.rejected[0].reason, REASON_UNSUPPORTED_FORMAT);
    }

    #[test]
    fn rejects_garbage_image_bytes() {
        let zip = build_zip(&[("broken.png", b"this is not a png")]);
        let manifest = validate_archive(&zip, MAX_ARCHIVE_BYTES).unwrap();

        assert_eq!(manifest.rejected.len(), 1);
        assert_eq!(manifest.rejected[0].reason, REASON_UNREADABLE);
    }

    #[test]
    fn skips_directory_entries() {
        let png = png_bytes(256, 256);
        let zip = build_zip(&[("album/", b""), ("album/photo.png", &png)]);
        let manifest = validate_archive(&zip, MAX_ARCHIVE_BYTES).unwrap();

        assert_eq!(manifest.total_entries(), 1);
        assert_eq!(manifest.accepted[0].filename, "album/photo.png");
    }

    #[test]
    fn entry_failure_does_not_abort_siblings() {
        let good = png_bytes(400, 400);
        let zip = build_zip(&[
            ("bad.png", b"garbage"),
            ("good.png", &good),
            ("skip.gif", b"gif"),
        ]);
        let manifest = validate_archive(&zip, MAX_ARCHIVE_BYTES).unwrap();

        assert_eq!(manifest.accepted.len(), 1);
        assert_eq!(manifest.rejected.len(), 2);
        assert_eq!(manifest.total_entries(), 3);
    }

    #[test]
    fn archive_over_size_bound_rejected() {
        let zip = build_zip(&[("a.png", &png_bytes(256, 256))]);
        let result = validate_archive(&zip, 16);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("byte limit"));
    }

    #[test]
    fn corrupt_archive_rejected() {
        let result = validate_archive(b"definitely not a zip", MAX_ARCHIVE_BYTES);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid ZIP"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_extension("photo.PNG"));
        assert!(is_allowed_extension("photo.Jpg"));
        assert!(is_allowed_extension("a.b.jpeg"));
        assert!(!is_allowed_extension("photo.webp"));
        assert!(!is_allowed_extension("noext"));
        assert!(!is_allowed_extension("png"));
    }
}
