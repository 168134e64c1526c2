use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use bytes::Bytes;

/// Where a bundle's compiled output lives
#[derive(Debug, Clone)]
pub enum BundleContent {
    /// Held in memory; cheap to clone and never re-read from disk
    Memory(Bytes),
    /// Materialized to a file in the cache directory
    File(PathBuf),
}

impl BundleContent {
    /// Open a reader over the content.
    ///
    /// For file-backed content this only opens the handle; bytes are read
    ///  by whoever consumes the returned stream.
    pub fn open(&self) -> io::Result<BundleStream> {
        match self {
            BundleContent::Memory(bytes) => Ok(BundleStream::Memory(Cursor::new(bytes.clone()))),
            BundleContent::File(path) => Ok(BundleStream::File(File::open(path)?)),
        }
    }

    /// Length of the content in bytes
    pub fn len(&self) -> io::Result<u64> {
        match self {
            BundleContent::Memory(bytes) => Ok(bytes.len() as u64),
            BundleContent::File(path) => Ok(std::fs::metadata(path)?.len()),
        }
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// An open reader over a bundle's content
#[derive(Debug)]
pub enum BundleStream {
    Memory(Cursor<Bytes>),
    File(File),
}

impl Read for BundleStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BundleStream::Memory(cursor) => cursor.read(buf),
            BundleStream::File(file) => file.read(buf),
        }
    }
}
