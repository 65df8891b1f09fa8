//! Transparent decompression for input tables.
//!
//! A table may arrive compressed (`names.csv.gz`, `names.csv.zst`). Detection
//! checks the file extension first and falls back to the magic bytes at the
//! start of the stream, so a misnamed gzip file still reads correctly.
//!
//! Each codec sits behind its own cargo feature (`compression-gzip`,
//! `compression-zstd`). With a feature disabled, files of that format are
//! passed through untouched and will fail later as malformed text.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A decompression codec known to the table reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    #[cfg(feature = "compression-gzip")]
    Gzip,
    #[cfg(feature = "compression-zstd")]
    Zstd,
}

impl Codec {
    /// Codecs compiled into this build, in detection order.
    pub const ENABLED: &'static [Codec] = &[
        #[cfg(feature = "compression-gzip")]
        Codec::Gzip,
        #[cfg(feature = "compression-zstd")]
        Codec::Zstd,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => "gzip",
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => "zstd",
        }
    }

    /// Lowercase extensions, leading dot included.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => &[".gz", ".gzip"],
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => &[".zst", ".zstd"],
        }
    }

    #[must_use]
    pub fn magic_bytes(self) -> &'static [u8] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => &[0x1f, 0x8b],
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
        }
    }

    fn wrap(self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        match self {
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => {
                zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
            }
        }
    }

    /// Codec whose extension matches `path`, case-insensitively.
    #[must_use]
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        let lower = path.as_ref().to_string_lossy().to_lowercase();
        Self::ENABLED
            .iter()
            .copied()
            .find(|codec| codec.extensions().iter().any(|ext| lower.ends_with(ext)))
    }

    fn from_magic<R: BufRead>(reader: &mut R) -> Option<Self> {
        let buf = reader.fill_buf().ok()?;
        Self::ENABLED
            .iter()
            .copied()
            .find(|codec| buf.starts_with(codec.magic_bytes()))
    }
}

/// Wrap `reader` with a decompressor when `path_hint` or the stream's first
/// bytes identify a known codec; otherwise return it buffered and unchanged.
///
/// # Errors
///
/// Returns an error if the codec fails to initialize (for example a truncated
/// zstd frame header).
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = Codec::from_extension(&path_hint) {
        return codec
            .wrap(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buffered = BufReader::new(reader);
    if let Some(codec) = Codec::from_magic(&mut buffered) {
        return codec
            .wrap(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    Ok(Box::new(buffered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn plain_text_passes_through() {
        let mut out = String::new();
        auto_detect_reader(Cursor::new(b"id,name\n1,aspirin\n".to_vec()), "names.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "id,name\n1,aspirin\n");
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_detected_by_magic_without_extension() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all("id,name\n1,阿司匹林\n".as_bytes()).unwrap();
        let bytes = enc.finish().unwrap();

        let mut out = String::new();
        auto_detect_reader(Cursor::new(bytes), "names.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "id,name\n1,阿司匹林\n");
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_detected_by_extension() {
        let bytes = zstd::encode_all(Cursor::new(b"id,name\n1,ibuprofen\n".to_vec()), 3).unwrap();
        assert_eq!(Codec::from_extension("NAMES.CSV.ZST"), Some(Codec::Zstd));

        let mut out = String::new();
        auto_detect_reader(Cursor::new(bytes), "names.csv.zst")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "id,name\n1,ibuprofen\n");
    }
}
