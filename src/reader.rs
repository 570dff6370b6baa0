//! Generic Buffered Reader
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(feature = "flate2")]
use flate2::read::MultiGzDecoder;

use crate::error::{Error, ParsingError};

/// [BufferedReader] provides seekable line access
/// to plain and compressed RINEX files.
#[derive(Debug)]
pub enum BufferedReader {
    /// Readable `RINEX`
    PlainFile(BufReader<File>),
    /// Decompressed content, held in memory
    Decompressed(Cursor<Vec<u8>>),
}

impl BufferedReader {
    /// Opens given file. Compressed content is expanded in memory,
    /// unsupported compression schemes are reported as [Error::DecompressError].
    pub fn open(path: &Path) -> Result<Self, Error> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".gz") {
            let f = File::open(path)?;
            Self::gunzip(f, &name)
        } else if name.ends_with(".z") || name.ends_with(".bz2") || name.ends_with(".zip") {
            Err(Error::DecompressError(format!(
                "{}: compression scheme not supported",
                name
            )))
        } else if is_hatanaka(&name) {
            Err(Error::DecompressError(format!(
                "{}: compact RINEX is not supported",
                name
            )))
        } else {
            // Assumes uncompressed file
            let f = File::open(path)?;
            Ok(Self::PlainFile(BufReader::new(f)))
        }
    }

    #[cfg(feature = "flate2")]
    fn gunzip(f: File, name: &str) -> Result<Self, Error> {
        let mut content = Vec::new();
        MultiGzDecoder::new(f)
            .read_to_end(&mut content)
            .map_err(|e| Error::DecompressError(format!("{}: {}", name, e)))?;
        Ok(Self::Decompressed(Cursor::new(content)))
    }

    #[cfg(not(feature = "flate2"))]
    fn gunzip(_: File, name: &str) -> Result<Self, Error> {
        Err(Error::DecompressError(format!(
            "{}: gzip compressed data requires the flate2 feature",
            name
        )))
    }
}

/// Compact RINEX file names: .crx and legacy .YYd
fn is_hatanaka(name: &str) -> bool {
    let bare = name.trim_end_matches(".gz").trim_end_matches(".z");
    if bare.ends_with(".crx") {
        return true;
    }
    let bytes = bare.as_bytes();
    let len = bytes.len();
    len > 4
        && bytes[len - 4] == b'.'
        && bytes[len - 3].is_ascii_digit()
        && bytes[len - 2].is_ascii_digit()
        && bytes[len - 1] == b'd'
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        match self {
            Self::PlainFile(h) => h.read(buf),
            Self::Decompressed(h) => h.read(buf),
        }
    }
}

impl BufRead for BufferedReader {
    fn fill_buf(&mut self) -> Result<&[u8], std::io::Error> {
        match self {
            Self::PlainFile(h) => h.fill_buf(),
            Self::Decompressed(h) => h.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::PlainFile(h) => h.consume(s),
            Self::Decompressed(h) => h.consume(s),
        }
    }
}

impl Seek for BufferedReader {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, std::io::Error> {
        match self {
            Self::PlainFile(h) => h.seek(pos),
            Self::Decompressed(h) => h.seek(pos),
        }
    }
}

/// Reads the next line, without its termination.
/// Returns None at end of stream.
pub(crate) fn next_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, Error> {
    let mut line = String::new();
    let size = reader.read_line(&mut line).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::FormatError(ParsingError::InvalidField("line", e.to_string()))
        } else {
            Error::IoError(e)
        }
    })?;
    if size == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Reads the next line, end of stream is an error.
pub(crate) fn expect_line<R: BufRead>(reader: &mut R) -> Result<String, Error> {
    next_line(reader)?.ok_or(Error::FormatError(ParsingError::UnexpectedEof))
}
