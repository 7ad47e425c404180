use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("incorrect block size: expected {expected} bytes, got {actual}")]
    IncorrectBlockSize { expected: usize, actual: usize },
    #[error("short read at block {block}: got {read} bytes")]
    ShortRead { block: u32, read: usize },
}

/// Number of block reads and writes issued since the disk was opened.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub writes: u64,
}

/// A single file addressed as an array of `BLOCKSIZE` byte blocks.
///
/// Nothing is cached: every read goes to the file, and every write is flushed
/// (and synced when `sync_writes` is set) before it returns.
#[derive(Debug)]
pub struct Disk<const BLOCKSIZE: usize> {
    path: PathBuf,
    file: File,
    sync_writes: bool,
    stats: IoStats,
}

impl<const BLOCKSIZE: usize> Disk<BLOCKSIZE> {
    /// Opens `path`, creating an empty file if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DiskError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .write(true)
            .read(true)
            .create(true)
            .open(&path)?;
        debug!(
            "Opened disk {} ({} bytes)",
            path.display(),
            file.metadata()?.len()
        );
        Ok(Self {
            path,
            file,
            sync_writes: false,
            stats: IoStats::default(),
        })
    }

    /// Creates `path`, truncating whatever was there.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DiskError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .truncate(true)
            .write(true)
            .read(true)
            .create(true)
            .open(&path)?;
        debug!("Created disk {}", path.display());
        Ok(Self {
            path,
            file,
            sync_writes: false,
            stats: IoStats::default(),
        })
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> Result<u64, DiskError> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, DiskError> {
        Ok(self.len()? == 0)
    }

    /// Number of complete blocks currently in the file.
    pub fn block_count(&self) -> Result<u64, DiskError> {
        Ok(self.len()? / BLOCKSIZE as u64)
    }

    pub fn stats(&self) -> IoStats {
        self.stats
    }

    fn offset(block_number: u32) -> u64 {
        block_number as u64 * BLOCKSIZE as u64
    }

    pub fn read_block(&mut self, block_number: u32) -> Result<Box<[u8; BLOCKSIZE]>, DiskError> {
        trace!("Start reading block[{}]", block_number);
        self.file.seek(SeekFrom::Start(Self::offset(block_number)))?;
        let mut buf = Box::new([0; BLOCKSIZE]);
        let mut read = 0;
        while read < BLOCKSIZE {
            match self.file.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.stats.reads += 1;
        if read != BLOCKSIZE {
            return Err(DiskError::ShortRead {
                block: block_number,
                read,
            });
        }
        trace!("Done reading block[{}]", block_number);
        Ok(buf)
    }

    pub fn write_block(&mut self, block_number: u32, block: &[u8]) -> Result<(), DiskError> {
        trace!("Start writing block[{}]", block_number);
        if block.len() != BLOCKSIZE {
            return Err(DiskError::IncorrectBlockSize {
                expected: BLOCKSIZE,
                actual: block.len(),
            });
        }
        self.file.seek(SeekFrom::Start(Self::offset(block_number)))?;
        self.file.write_all(block)?;
        self.file.flush()?;
        if self.sync_writes {
            self.file.sync_data()?;
        }
        self.stats.writes += 1;
        trace!("Done writing block[{}]", block_number);
        Ok(())
    }
}
