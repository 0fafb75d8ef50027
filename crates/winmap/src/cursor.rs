use std::rc::Rc;

use crate::error::{Error, Result};
use crate::file_id::FileId;
use crate::manager::core::ManagerHandle;
use crate::region::Region;
use crate::region_list::RegionListHandle;

/// Client-facing handle. Pins at most one [`Region`] at a time and exposes the
/// client-visible view `[ofs_begin, ofs_end)` of it.
pub struct Cursor {
    manager: Rc<dyn ManagerHandle>,
    list: Option<RegionListHandle>,
    region: Option<Region>,
    /// Offset from the pinned region's `begin` to the client-visible start.
    ofs: u64,
    /// Client-visible length, `<=` the pinned region's remaining length from `ofs`.
    size: u64,
}

impl Cursor {
    pub(crate) fn new(manager: Rc<dyn ManagerHandle>, list: RegionListHandle) -> Self {
        Self {
            manager,
            list: Some(list),
            region: None,
            ofs: 0,
            size: 0,
        }
    }

    pub(crate) fn unattached(manager: Rc<dyn ManagerHandle>) -> Self {
        Self {
            manager,
            list: None,
            region: None,
            ofs: 0,
            size: 0,
        }
    }

    /// Requests the absolute byte range `[offset, offset+size)` of this cursor's file.
    /// `size == 0` requests "as much as the window/manager will give". Returns the
    /// cursor with no pin held (not an error) when `offset` is at or past end of file.
    pub fn use_region(&mut self, offset: u64, size: u64) -> Result<&mut Self> {
        let Some(list) = self.list.clone() else {
            return Err(Error::InvalidState);
        };

        let file_size = list.borrow().file_size();
        let window = self.manager.window_size();
        let requested = if size == 0 { file_size } else { size };
        let effective = if window == 0 {
            requested.min(file_size)
        } else {
            requested.min(window)
        };

        if let Some(region) = &self.region
            && region.includes_ofs(offset)
        {
            region.touch(self.manager.next_clock());
            self.ofs = offset - region.begin();
            self.size = effective.min(region.end() - offset);
            return Ok(self);
        }

        self.region = None;

        if offset >= file_size {
            return Ok(self);
        }

        let region = self.manager.obtain_region(&list, offset, effective)?;
        region.touch(self.manager.next_clock());
        self.ofs = offset - region.begin();
        self.size = effective.min(region.end() - offset);
        self.region = Some(region);
        Ok(self)
    }

    pub fn unuse_region(&mut self) {
        self.region = None;
    }

    pub fn is_valid(&self) -> bool {
        self.region.is_some()
    }

    pub fn is_associated(&self) -> bool {
        self.list.is_some()
    }

    pub fn ofs_begin(&self) -> Result<u64> {
        let region = self.region.as_ref().ok_or(Error::InvalidState)?;
        Ok(region.begin() + self.ofs)
    }

    pub fn ofs_end(&self) -> Result<u64> {
        Ok(self.ofs_begin()? + self.size)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn includes_ofs(&self, offset: u64) -> bool {
        match (self.ofs_begin(), self.ofs_end()) {
            (Ok(begin), Ok(end)) => offset >= begin && offset < end,
            _ => false,
        }
    }

    /// A read-only view of exactly the client-visible range this cursor was last
    /// positioned over.
    pub fn buffer(&self) -> Result<&[u8]> {
        let region = self.region.as_ref().ok_or(Error::InvalidState)?;
        let start = self.ofs as usize;
        let end = start + self.size as usize;
        Ok(&region.buffer()[start..end])
    }

    /// The whole pinned region's map, useful when the caller knows the region spans
    /// the entire file.
    pub fn map(&self) -> Result<&[u8]> {
        let region = self.region.as_ref().ok_or(Error::InvalidState)?;
        Ok(region.buffer())
    }

    pub fn file_size(&self) -> Result<u64> {
        let list = self.list.as_ref().ok_or(Error::InvalidState)?;
        Ok(list.borrow().file_size())
    }

    pub fn file_id(&self) -> Result<FileId> {
        let list = self.list.as_ref().ok_or(Error::InvalidState)?;
        Ok(list.borrow().file_id().clone())
    }

    pub fn path(&self) -> Result<std::path::PathBuf> {
        Ok(self.file_id()?.path()?.to_path_buf())
    }

    #[cfg(unix)]
    pub fn fd(&self) -> Result<std::os::unix::io::RawFd> {
        self.file_id()?.fd()
    }

    /// Releases the current pin and takes `source`'s, matching `source`'s position.
    pub fn assign(&mut self, source: &Cursor) {
        self.list = source.list.clone();
        self.region = source.region.clone();
        self.ofs = source.ofs;
        self.size = source.size;
    }
}

impl Clone for Cursor {
    fn clone(&self) -> Self {
        Self {
            manager: Rc::clone(&self.manager),
            list: self.list.clone(),
            region: self.region.clone(),
            ofs: self.ofs,
            size: self.size,
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.region = None;
        if let Some(list) = self.list.take() {
            let file_id = list.borrow().file_id().clone();
            drop(list);
            self.manager.maybe_remove_list(&file_id);
        }
    }
}
