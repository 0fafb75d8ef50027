use std::rc::Rc;

use log::{debug, trace};

use crate::config::ManagerConfig;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::file_id::FileId;
use crate::manager::core::{ManagerCore, ManagerHandle};
use crate::region::Region;
use crate::region_list::RegionListHandle;

/// Maps each file once, in full: every `RegionList` holds at most one region spanning
/// `[0, file_size)`.
pub struct StaticWindowMapManager {
    core: ManagerCore,
}

impl StaticWindowMapManager {
    pub fn new(config: ManagerConfig) -> Rc<Self> {
        Rc::new(Self {
            core: ManagerCore::new(&config, true),
        })
    }

    pub fn make_cursor(self: &Rc<Self>, file_id: impl Into<FileId>) -> Result<Cursor> {
        let file_id = file_id.into();
        let list = self.core.get_or_create_list(&file_id)?;
        Ok(Cursor::new(Rc::clone(self) as Rc<dyn ManagerHandle>, list))
    }

    pub fn collect(&self) -> usize {
        self.core.collect_lru(0)
    }

    pub fn window_size(&self) -> u64 {
        self.core.window_size()
    }

    pub fn mapped_memory_size(&self) -> u64 {
        self.core.mapped_memory_size()
    }

    pub fn num_file_handles(&self) -> usize {
        self.core.num_file_handles()
    }

    pub fn num_open_files(&self) -> usize {
        self.core.num_open_files()
    }

    pub fn max_file_handles(&self) -> usize {
        self.core.max_handles()
    }

    pub fn max_mapped_memory_size(&self) -> u64 {
        self.core.max_memory()
    }

    /// Closes every map whose file is path-backed and whose path starts with `prefix`.
    /// Unlike the reference implementation this predates, this is not restricted to
    /// Windows — see `DESIGN.md`.
    pub fn force_map_handle_removal(&self, prefix: &std::path::Path) -> usize {
        self.core.force_map_handle_removal(prefix)
    }

    fn try_map_whole_file(&self, list: &RegionListHandle, file_id: &FileId) -> Result<Region> {
        let file_size = list.borrow().file_size();
        Region::new(file_id, 0, file_size, self.core.next_clock())
    }
}

impl ManagerHandle for StaticWindowMapManager {
    fn obtain_region(
        &self,
        list: &RegionListHandle,
        _offset: u64,
        _requested_size: u64,
    ) -> Result<Region> {
        if let Some(existing) = list.borrow().iter().next() {
            return Ok(existing.clone());
        }

        let file_id = list.borrow().file_id().clone();
        let file_size = list.borrow().file_size();

        if self.core.mapped_memory_size() + file_size > self.core.max_memory() {
            self.core.collect_lru(file_size);
        }

        let region = match self.try_map_whole_file(list, &file_id) {
            Ok(region) => region,
            Err(err) => {
                debug!("static map of {file_id} failed ({err}), evicting and retrying once");
                trace!("retry attempt: full eviction pass before remapping {file_id}");
                self.core.collect_lru(0);
                self.try_map_whole_file(list, &file_id)?
            }
        };

        self.core.note_new_region(region.size());
        list.borrow_mut().insert(0, region.clone());
        Ok(region)
    }

    fn window_size(&self) -> u64 {
        self.core.window_size()
    }

    fn next_clock(&self) -> u64 {
        self.core.next_clock()
    }

    fn maybe_remove_list(&self, file_id: &FileId) {
        self.core.maybe_remove_list(file_id);
    }
}
