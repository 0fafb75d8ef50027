use std::fs::File;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;

use memmap2::{Mmap, MmapOptions};

use crate::error::{Error, Result};
use crate::file_id::FileId;

/// Queries the platform's page size via `sysconf(_SC_PAGESIZE)`.
pub fn page_size() -> usize {
    // SAFETY: _SC_PAGESIZE is always a valid sysconf name; the call has no side effects.
    let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if n <= 0 { 4096 } else { n as usize }
}

/// Reports whether this process targets a 64-bit address space.
pub fn is_64_bit() -> bool {
    cfg!(target_pointer_width = "64")
}

/// Returns the current size in bytes of the file behind `id`.
pub fn file_size(id: &FileId) -> Result<u64> {
    let meta = match id {
        FileId::Path(p) => std::fs::metadata(p)?,
        #[cfg(unix)]
        FileId::Fd(fd) => {
            // SAFETY: the descriptor is borrowed for the duration of this call only; we
            // forget the File below so it is never closed on our behalf.
            let file = unsafe { File::from_raw_fd(*fd) };
            let meta = file.metadata();
            std::mem::forget(file);
            meta?
        }
    };
    Ok(meta.len())
}

/// Creates a read-only memory map of `[offset, offset+len)` of the file behind `id`.
///
/// A descriptor-backed `id` is not required to remain valid after this call returns; the
/// `File` used to perform the mapping is leaked rather than closed.
pub fn map(id: &FileId, offset: u64, len: u64) -> Result<Mmap> {
    let file = match id {
        FileId::Path(p) => std::fs::File::open(p)?,
        // SAFETY: the caller guarantees `fd` names an open, readable file for the
        // duration of this call.
        #[cfg(unix)]
        FileId::Fd(fd) => unsafe { File::from_raw_fd(*fd) },
    };

    // SAFETY: memory-mapping is inherently unsafe because the backing file can be
    // mutated or truncated concurrently by other processes; this crate treats that as
    // undefined behavior by contract (see the Non-goals in its design notes).
    let result = unsafe {
        MmapOptions::new()
            .offset(offset)
            .len(len as usize)
            .map(&file)
    };

    #[cfg(unix)]
    if matches!(id, FileId::Fd(_)) {
        std::mem::forget(file);
    }

    result.map_err(|source| Error::ResourceExhausted {
        file: id.to_string(),
        offset,
        len,
        source,
    })
}
