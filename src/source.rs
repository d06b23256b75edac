use std::fs::File;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only, positioned access to the log being scanned.
///
/// Implementations must tolerate concurrent `read_at` calls from several
/// workers; nothing ever writes through this trait.
pub trait LogSource: Send + Sync {
    fn len(&self) -> u64;
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, SourceError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct RawFileSource {
    file: File,
    len: u64,
    #[cfg(not(unix))]
    lock: std::sync::Mutex<()>,
}

impl RawFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            #[cfg(not(unix))]
            lock: std::sync::Mutex::new(()),
        })
    }
}

impl LogSource for RawFileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }
        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let _guard = self
                .lock
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut f = &self.file;
            f.seek(SeekFrom::Start(offset))?;
            Ok(f.read(buf)?)
        }
    }
}

/// Fill `buf` from `offset`, stopping early only at end of source.
pub fn read_full_at(
    source: &dyn LogSource,
    offset: u64,
    buf: &mut [u8],
) -> Result<usize, SourceError> {
    let mut read = 0usize;
    while read < buf.len() {
        let n = source.read_at(offset + read as u64, &mut buf[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_file_source_reads_at_offsets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"0123456789").expect("write");

        let src = RawFileSource::open(&path).expect("open");
        assert_eq!(src.len(), 10);
        assert!(!src.is_empty());

        let mut buf = [0u8; 4];
        let n = read_full_at(&src, 3, &mut buf).expect("read");
        assert_eq!(n, 4);
        assert_eq!(&buf, b"3456");

        let n = read_full_at(&src, 8, &mut buf).expect("read tail");
        assert_eq!(n, 2);
        assert_eq!(&buf[..n], b"89");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = RawFileSource::open(&dir.path().join("nope.log")).err();
        assert!(matches!(err, Some(SourceError::Io(_))));
    }
}
