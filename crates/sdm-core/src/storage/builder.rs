//! Builder for creating and pre-sizing the destination file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use super::writer::DestinationFile;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Builder for a fresh destination file. Call `presize` then `build` to get
/// a `DestinationFile` that supports concurrent `write_at` from many tasks.
pub struct DestinationFileBuilder {
    file: File,
    path: PathBuf,
}

impl DestinationFileBuilder {
    /// Create the destination at `path`, truncating it if it already exists.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(DestinationFileBuilder {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Pre-size the file to `size` bytes. On Unix tries `posix_fallocate` for
    /// real block allocation; falls back to `set_len` (sparse) on failure or non-Unix.
    pub fn presize(&mut self, size: u64) -> io::Result<()> {
        if size == 0 {
            return Ok(());
        }
        #[cfg(unix)]
        {
            if let Ok(len) = libc::off_t::try_from(size) {
                let fd = self.file.as_raw_fd();
                // SAFETY: `fd` is a valid open descriptor owned by `self.file`.
                let r = unsafe { libc::posix_fallocate(fd, 0, len) };
                if r == 0 {
                    return Ok(());
                }
                tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
            }
        }
        self.file.set_len(size)
    }

    /// Finish building and return a handle that can be shared for concurrent writes.
    pub fn build(self) -> DestinationFile {
        DestinationFile::from_file_and_path(self.file, self.path)
    }
}
