use std::rc::Rc;

use log::{debug, trace};

use crate::config::ManagerConfig;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::file_id::FileId;
use crate::manager::core::{ManagerCore, ManagerHandle};
use crate::region::Region;
use crate::region_list::RegionListHandle;
use crate::window::Window;

/// Maintains many bounded, non-overlapping regions per file, each grown to fill the
/// gap between its neighbors and page-aligned.
pub struct SlidingWindowMapManager {
    core: ManagerCore,
}

impl SlidingWindowMapManager {
    pub fn new(config: ManagerConfig) -> Rc<Self> {
        Rc::new(Self {
            core: ManagerCore::new(&config, false),
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

    /// Plans the window that should be mapped to cover `offset` with at least
    /// `requested_size` bytes, given the list's current neighbor layout. Pure planning;
    /// performs no I/O and mutates nothing.
    fn plan_window(&self, list: &RegionListHandle, offset: u64, requested_size: u64) -> (usize, Window) {
        let list = list.borrow();
        let window_cap = self.core.window_size();
        let ins = list.insertion_index(offset);

        let left = list.left_of(ins).map_or(Window::new(0, 0), |r| Window::new(r.begin(), r.size()));
        let right = list
            .right_of(ins)
            .map_or(Window::new(list.file_size(), 0), |r| Window::new(r.begin(), r.size()));

        let mut mid = Window::new(offset, requested_size);
        mid.extend_left_to(left, window_cap);
        mid.extend_right_to(right, window_cap);
        mid.align();
        if mid.ofs_end() > right.ofs {
            mid.size = right.ofs - mid.ofs;
        }
        (ins, mid)
    }

    fn try_obtain(
        &self,
        list: &RegionListHandle,
        file_id: &FileId,
        offset: u64,
        requested_size: u64,
    ) -> Result<Region> {
        if let Some(existing) = list.borrow().find_covering(offset) {
            return Ok(existing);
        }

        let (_, window) = self.plan_window(list, offset, requested_size);
        let over_memory = self.core.mapped_memory_size() + window.size > self.core.max_memory();
        let over_handles = self.core.num_file_handles() >= self.core.max_handles();
        if over_handles {
            self.core.collect_lru_for_handle_slot(window.size);
        } else if over_memory {
            self.core.collect_lru(window.size);
        }

        // Eviction may have removed regions from `list`, so the insertion point and
        // the window plan (which depends on neighbor positions) are re-derived from
        // the list's current state rather than reused from before eviction ran.
        let (ins, window) = self.plan_window(list, offset, requested_size);

        let region = Region::new(file_id, window.ofs, window.size, self.core.next_clock())?;
        self.core.note_new_region(region.size());
        list.borrow_mut().insert(ins, region.clone());
        Ok(region)
    }
}

impl ManagerHandle for SlidingWindowMapManager {
    fn obtain_region(
        &self,
        list: &RegionListHandle,
        offset: u64,
        requested_size: u64,
    ) -> Result<Region> {
        let file_id = list.borrow().file_id().clone();
        match self.try_obtain(list, &file_id, offset, requested_size) {
            Ok(region) => Ok(region),
            Err(err) => {
                debug!(
                    "sliding map of {file_id} at offset {offset} failed ({err}), evicting and retrying once"
                );
                trace!("retry attempt: full eviction pass before replanning window at offset {offset} of {file_id}");
                self.core.collect_lru(0);
                self.try_obtain(list, &file_id, offset, requested_size)
            }
        }
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
