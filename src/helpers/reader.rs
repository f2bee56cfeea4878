use crate::error::SheetPagerError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;
use url::Url;

/// Leading bytes of an OLE compound file (legacy `.xls` or an encrypted OOXML package)
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub(crate) enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),
}

/// A unified reader over local files, remote URLs and in-memory buffers
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Remote or in-memory content
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a spreadsheet source from either a local path or a remote URL.
    /// Remote content is fetched through DuckDB's `read_blob`, which handles credentials.
    pub(crate) fn new(locator: &str) -> Result<UnifiedReader, SheetPagerError> {
        if Self::is_remote_url(locator) {
            Self::read_blob_with_duckdb(locator)
        } else {
            let path = Self::local_path(locator);
            let file = File::open(path)?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// Wraps bytes that are already in memory.
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Memory(Cursor::new(bytes))
    }

    /// Checks if a locator names a remote resource
    pub(crate) fn is_remote_url(locator: &str) -> bool {
        match Url::parse(locator) {
            // Single letter schemes are windows drive letters
            Ok(url) => url.scheme() != "file" && url.scheme().len() > 1,
            Err(_) => false,
        }
    }

    /// Strips a `file://` scheme, leaving plain paths untouched
    fn local_path(locator: &str) -> String {
        Url::parse(locator)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_else(|| locator.to_owned())
    }

    /// Reads a remote file using DuckDB's read_blob functionality
    fn read_blob_with_duckdb(locator: &str) -> Result<UnifiedReader, SheetPagerError> {
        let connection = duckdb::Connection::open_in_memory()?;
        let result: Result<Vec<u8>, _> = connection.query_row("SELECT content FROM read_blob(?)", [locator], |row| row.get(0));
        connection.close().map_err(|(_, e)| e)?;

        let bytes = result?;
        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(locator.to_owned()))?;
        }
        Ok(UnifiedReader::from_bytes(bytes))
    }

    /// Returns true if the content starts with the compound file signature.
    /// The read position is restored to the start afterwards.
    pub(crate) fn is_compound_file(&mut self) -> Result<bool, SheetPagerError> {
        let mut signature = [0u8; 8];
        let mut filled = 0usize;
        while filled < signature.len() {
            match self.read(&mut signature[filled..])? {
                0 => break,
                count => filled += count,
            }
        }
        self.seek(SeekFrom::Start(0))?;
        Ok(filled == signature.len() && signature == CFB_SIGNATURE)
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}
