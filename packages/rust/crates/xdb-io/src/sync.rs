//! Synchronous file I/O operations.

use std::fs as std_fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::detect::{decode_buffer, decode_buffer_lossy};
use crate::error::IoError;
use crate::text::TextFile;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn read_checked(path: &Path, max_bytes: u64, lossy: bool) -> Result<(bool, String), IoError> {
    let metadata = std_fs::metadata(path)
        .map_err(|_| IoError::NotFound(path.to_string_lossy().to_string()))?;

    if metadata.len() > max_bytes {
        return Err(IoError::TooLarge(metadata.len(), max_bytes));
    }

    let mut file = std_fs::File::open(path)?;
    let mut buffer = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or(0));
    file.read_to_end(&mut buffer)?;

    if lossy {
        decode_buffer_lossy(buffer)
    } else {
        decode_buffer(buffer)
    }
}

/// Read text from a file with size and binary checks.
///
/// A leading UTF-8 BOM is dropped and invalid UTF-8 is replaced. Meant for
/// inputs that are never written back.
///
/// # Errors
/// `NotFound`, `TooLarge`, `BinaryFile` or the underlying I/O error.
pub fn read_text_safe<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<String, IoError> {
    read_checked(path.as_ref(), max_bytes, true).map(|(_, text)| text)
}

/// Read a file into the line model.
///
/// The file must be valid UTF-8; nothing is replaced.
///
/// # Errors
/// Same as [`read_text_safe`], plus `Encoding` for invalid UTF-8.
pub fn read_text_file<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<TextFile, IoError> {
    let (has_bom, text) = read_checked(path.as_ref(), max_bytes, false)?;
    Ok(TextFile::parse(&text, has_bom))
}

/// Write the line model back, restoring the BOM if the file had one.
///
/// # Errors
/// The underlying I/O error.
pub fn write_text_file<P: AsRef<Path>>(path: P, file: &TextFile) -> Result<(), IoError> {
    let path = path.as_ref();
    let body = file.render();
    let mut bytes = Vec::with_capacity(body.len() + UTF8_BOM.len());
    if file.has_bom() {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(body.as_bytes());
    std_fs::write(path, bytes)?;
    debug!(path = %path.display(), lines = file.line_count(), "rewrote file");
    Ok(())
}

/// Create a new file with the given contents; never overwrite.
///
/// # Errors
/// `AlreadyExists` if the path exists, otherwise the underlying I/O error.
pub fn write_new<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), IoError> {
    let path = path.as_ref();
    let mut file = std_fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => IoError::AlreadyExists(path.to_path_buf()),
            _ => IoError::System(e),
        })?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}
