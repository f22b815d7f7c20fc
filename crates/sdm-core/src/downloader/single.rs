//! Single-stream HTTP GET (non-Range fallback).
//!
//! Writes the response body sequentially from offset 0. The destination is
//! created only once a 2xx status has arrived, so a refused request leaves any
//! existing file untouched. There is no retry around this path: any error
//! ends the transfer.

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::probe::ResponseHead;
use crate::retry::ErrorKind;
use crate::storage::{DestinationFile, DestinationFileBuilder};
use crate::transfer::Progress;

use super::CurlOptions;

#[derive(Debug, Error)]
pub enum SingleStreamError {
    #[error("GET failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("GET returned HTTP {0}")]
    Status(u32),
    #[error("{op} {}: {source}", .path.display())]
    Storage {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("partial transfer: wrote {received} of {expected} bytes")]
    LengthMismatch { expected: u64, received: u64 },
}

impl SingleStreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SingleStreamError::Transport(_) | SingleStreamError::LengthMismatch { .. } => {
                ErrorKind::Transport
            }
            SingleStreamError::Status(_) => ErrorKind::ProtocolMismatch,
            SingleStreamError::Storage { .. } => ErrorKind::Io,
        }
    }

    fn storage(op: &'static str, path: &Path, source: io::Error) -> Self {
        SingleStreamError::Storage {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Downloads `url` with one unranged GET into a fresh file at `path`,
/// pre-sized to `expected_len` when known. The byte count must then match.
/// The file is synced before returning the number of bytes written.
pub fn download_single(
    url: &str,
    path: &Path,
    expected_len: Option<u64>,
    progress: &Progress,
    curl: &CurlOptions,
) -> Result<u64, SingleStreamError> {
    let head = RefCell::new(ResponseHead::default());
    let dest: RefCell<Option<DestinationFile>> = RefCell::new(None);
    let offset = Cell::new(0u64);
    let failure: RefCell<Option<SingleStreamError>> = RefCell::new(None);

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    curl.configure(&mut easy)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            head.borrow_mut().push_line(data);
            true
        })?;
        transfer.write_function(|data| {
            let status = head.borrow().status;
            if !(200..300).contains(&status) {
                *failure.borrow_mut() = Some(SingleStreamError::Status(status));
                return Ok(0);
            }
            let off = offset.get();
            let n = data.len() as u64;
            if let Some(expected) = expected_len {
                if off + n > expected {
                    *failure.borrow_mut() = Some(SingleStreamError::LengthMismatch {
                        expected,
                        received: off + n,
                    });
                    return Ok(0);
                }
            }
            let mut slot = dest.borrow_mut();
            if slot.is_none() {
                match open_destination(path, expected_len) {
                    Ok(file) => *slot = Some(file),
                    Err(e) => {
                        *failure.borrow_mut() = Some(e);
                        return Ok(0);
                    }
                }
            }
            let Some(file) = slot.as_ref() else {
                return Ok(0);
            };
            if let Err(e) = file.write_at(off, data) {
                tracing::warn!("single-stream write failed: {}", e);
                *failure.borrow_mut() = Some(SingleStreamError::storage("write", path, e));
                return Ok(0);
            }
            offset.set(off + n);
            progress.add(n);
            Ok(data.len())
        })?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if let Some(f) = failure.borrow_mut().take() {
            return Err(f);
        }
        return Err(SingleStreamError::Transport(e));
    }

    let mut status = head.borrow().status;
    if status == 0 {
        status = easy.response_code()?;
    }
    if !(200..300).contains(&status) {
        return Err(SingleStreamError::Status(status));
    }

    // A 2xx with an empty body still produces the (empty) file.
    let file = match dest.into_inner() {
        Some(file) => file,
        None => open_destination(path, expected_len)?,
    };

    let written = offset.get();
    if let Some(expected) = expected_len {
        if written != expected {
            return Err(SingleStreamError::LengthMismatch {
                expected,
                received: written,
            });
        }
    }
    file.sync()
        .map_err(|e| SingleStreamError::storage("sync", path, e))?;
    Ok(written)
}

fn open_destination(path: &Path, size: Option<u64>) -> Result<DestinationFile, SingleStreamError> {
    let mut builder = DestinationFileBuilder::create(path)
        .map_err(|e| SingleStreamError::storage("create", path, e))?;
    if let Some(n) = size {
        builder
            .presize(n)
            .map_err(|e| SingleStreamError::storage("pre-size", path, e))?;
    }
    Ok(builder.build())
}
