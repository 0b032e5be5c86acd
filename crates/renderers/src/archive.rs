use std::io::{Cursor, Read, Write};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{RenderError, Result};

const LOCAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const ANIMATIONS_DIR: &str = "animations/";
const MANIFEST_NAME: &str = "manifest.json";

/// Animation document extracted from a dotLottie (ZIP) archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

fn is_animation_name(name: &str) -> bool {
    name.starts_with(ANIMATIONS_DIR) && name.ends_with(".json")
}

/// Returns true when `bytes` start with a ZIP local file header.
///
/// # Example
/// ```
/// use renderers::is_archive;
///
/// assert!(is_archive(b"PK\x03\x04rest"));
/// assert!(!is_archive(b"{\"v\":\"5.7.4\"}"));
/// ```
pub fn is_archive(bytes: &[u8]) -> bool {
    bytes.starts_with(&LOCAL_HEADER_SIGNATURE)
}

/// Finds and inflates the first `animations/*.json` entry of an archive.
///
/// Entries are visited in central directory order, so stored, deflated and
/// streamed entries are all readable.
pub fn find_animation_entry(bytes: &[u8]) -> Result<ArchiveEntry> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if !file.is_file() || !is_animation_name(file.name()) {
            continue;
        }
        let name = file.name().to_owned();
        let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut data).map_err(ZipError::from)?;
        return Ok(ArchiveEntry { name, data });
    }

    Err(RenderError::MissingAnimation)
}

/// Packs one Lottie JSON document into a deflated dotLottie archive with a
/// minimal manifest.
///
/// # Example
/// ```
/// use renderers::{find_animation_entry, pack_dotlottie};
///
/// let archive = pack_dotlottie("intro", br#"{"fr":30,"ip":0,"op":60}"#)
///     .expect("archive should pack");
/// let entry = find_animation_entry(&archive).expect("animation entry");
/// assert_eq!(entry.name, "animations/intro.json");
/// ```
pub fn pack_dotlottie(id: &str, animation: &[u8]) -> Result<Vec<u8>> {
    let manifest = serde_json::json!({
        "version": "1",
        "generator": "renderers",
        "animations": [{ "id": id }],
    });
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer.start_file(MANIFEST_NAME, options)?;
    writer
        .write_all(manifest.to_string().as_bytes())
        .map_err(ZipError::from)?;
    writer.start_file(format!("{ANIMATIONS_DIR}{id}.json"), options)?;
    writer.write_all(animation).map_err(ZipError::from)?;

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::{find_animation_entry, is_archive, pack_dotlottie};
    use crate::error::RenderError;

    fn stored_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(data).expect("write entry");
        }
        writer.finish().expect("finish archive").into_inner()
    }

    #[test]
    fn deflated_animation_is_inflated() {
        let doc = br#"{"fr":30,"ip":0,"op":90,"layers":[]}"#;
        let archive = pack_dotlottie("intro", doc).expect("archive should pack");

        let entry = find_animation_entry(&archive).expect("animation entry");

        assert!(is_archive(&archive));
        assert_eq!(entry.name, "animations/intro.json");
        assert_eq!(entry.data, doc);
    }

    #[test]
    fn stored_entries_are_read_past_manifest() {
        let archive = stored_zip(&[
            ("manifest.json", b"{\"version\":\"1\"}"),
            ("animations/", b""),
            ("animations/loader.json", b"{\"fr\":60}"),
        ]);

        let entry = find_animation_entry(&archive).expect("animation entry");

        assert_eq!(entry.name, "animations/loader.json");
        assert_eq!(entry.data, b"{\"fr\":60}");
    }

    #[test]
    fn archive_without_animation_reports_missing() {
        let archive = stored_zip(&[("manifest.json", b"{}"), ("images/a.png", b"\x89PNG")]);

        assert_eq!(
            find_animation_entry(&archive),
            Err(RenderError::MissingAnimation)
        );
    }

    #[test]
    fn truncated_archive_is_rejected() {
        let mut archive = pack_dotlottie("intro", br#"{"fr":30}"#).expect("archive should pack");
        archive.truncate(archive.len() / 2);

        assert!(matches!(
            find_animation_entry(&archive),
            Err(RenderError::InvalidArchive { .. })
        ));
    }
}
