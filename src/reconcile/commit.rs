//! Atomic installation of a freshly downloaded body.

use std::fs::{self, File, Permissions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use crate::cache::validators::tmp_sibling;
use crate::error::{CacheError, Result};
use crate::fetch::FetchResponse;

/// Stream `response` into `<data_path>.tmp`, then rename it over `data_path`.
///
/// The data path is never opened for writing, so it may be the running
/// executable. The mode of a previous file is carried over and `mtime`, when
/// given, is stamped on the result; both are applied to the temp file so the
/// new file appears with its final metadata. Returns the number of bytes
/// written.
pub fn commit_body(
    url: &str,
    response: &mut FetchResponse,
    data_path: &Path,
    mtime: Option<SystemTime>,
) -> Result<u64> {
    let temp_path = tmp_sibling(data_path);
    let previous = fs::metadata(data_path).ok().map(|m| m.permissions());

    let written = match write_temp(url, response, &temp_path, previous, mtime) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    // Replaces any existing file in one step
    if let Err(e) = fs::rename(&temp_path, data_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(CacheError::fs(data_path, e));
    }

    Ok(written)
}

fn write_temp(
    url: &str,
    response: &mut FetchResponse,
    temp_path: &Path,
    permissions: Option<Permissions>,
    mtime: Option<SystemTime>,
) -> Result<u64> {
    let file = File::create(temp_path).map_err(|e| CacheError::fs(temp_path, e))?;
    let mut writer = RecordWriteErrors::new(BufWriter::new(file));

    let written = match response.copy_to(&mut writer) {
        Ok(n) => n,
        Err(e) => {
            // reqwest reports both sides of the copy as a body error
            return Err(match writer.error.take() {
                Some(io_err) => CacheError::fs(temp_path, io_err),
                None => CacheError::Network {
                    url: url.to_string(),
                    source: e,
                },
            });
        }
    };

    let file = writer
        .inner
        .into_inner()
        .map_err(|e| CacheError::fs(temp_path, e.into_error()))?;
    file.sync_all().map_err(|e| CacheError::fs(temp_path, e))?;
    if let Some(expected) = response.content_length().filter(|&n| n != written) {
        tracing::warn!("Expected {} bytes from {}, got {}", expected, url, written);
    }
    tracing::debug!("Wrote {} bytes to {}", written, temp_path.display());

    if let Some(permissions) = permissions {
        file.set_permissions(permissions)
            .map_err(|e| CacheError::fs(temp_path, e))?;
    }

    if let Some(mtime) = mtime {
        file.set_modified(mtime)
            .map_err(|e| CacheError::fs(temp_path, e))?;
    }

    Ok(written)
}

/// Keeps the first write-side error so it isn't mistaken for a read failure.
struct RecordWriteErrors<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W> RecordWriteErrors<W> {
    fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    fn record(&mut self, e: io::Error) -> io::Error {
        let kind = e.kind();
        self.error.get_or_insert(e);
        io::Error::from(kind)
    }
}

impl<W: Write> Write for RecordWriteErrors<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.record(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.record(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_recorded() {
        let mut writer = RecordWriteErrors::new(FullDisk);

        let err = writer.write_all(b"body").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
        let recorded = writer.error.take().unwrap();
        assert_eq!(recorded.to_string(), "no space left");
    }

    #[test]
    fn successful_writes_record_nothing() {
        let mut writer = RecordWriteErrors::new(Vec::new());

        writer.write_all(b"body").unwrap();
        writer.flush().unwrap();

        assert!(writer.error.is_none());
        assert_eq!(writer.inner, b"body");
    }
}
