use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::file_id::FileId;
use crate::platform;
use crate::region::Region;
use crate::region_list::{RegionList, RegionListHandle};

/// Operations a [`Cursor`](crate::cursor::Cursor) needs from whichever manager flavor it
/// is attached to. Kept object-safe so a cursor can hold a `Rc<dyn ManagerHandle>`
/// without being generic over the manager type.
pub(crate) trait ManagerHandle {
    /// Finds or creates a region of `list` covering `offset`, of at least
    /// `requested_size` bytes, running this manager flavor's placement policy.
    fn obtain_region(
        &self,
        list: &RegionListHandle,
        offset: u64,
        requested_size: u64,
    ) -> Result<Region>;

    fn window_size(&self) -> u64;

    fn next_clock(&self) -> u64;

    /// Called by a cursor's `Drop` when it observes that it was the last external
    /// holder of an empty list.
    fn maybe_remove_list(&self, file_id: &FileId);
}

/// State and accounting shared by both manager flavors: the file table, budgets, and
/// LRU eviction. Placement policy (the only thing that differs between static and
/// sliding managers) lives in their own modules and calls back into this core.
pub(crate) struct ManagerCore {
    files: std::cell::RefCell<HashMap<FileId, RegionListHandle>>,
    window_size: u64,
    max_memory: u64,
    max_handles: usize,
    memory_in_use: Cell<u64>,
    handles_in_use: Cell<usize>,
    clock: Cell<u64>,
}

impl ManagerCore {
    pub(crate) fn new(config: &ManagerConfig, static_manager: bool) -> Self {
        Self {
            files: std::cell::RefCell::new(HashMap::new()),
            window_size: config.window_size.resolve(static_manager),
            max_memory: config.resolve_max_memory(),
            max_handles: config.resolve_max_handles(),
            memory_in_use: Cell::new(0),
            handles_in_use: Cell::new(0),
            clock: Cell::new(0),
        }
    }

    pub(crate) fn window_size(&self) -> u64 {
        self.window_size
    }

    pub(crate) fn max_memory(&self) -> u64 {
        self.max_memory
    }

    pub(crate) fn max_handles(&self) -> usize {
        self.max_handles
    }

    pub(crate) fn mapped_memory_size(&self) -> u64 {
        self.memory_in_use.get()
    }

    pub(crate) fn num_file_handles(&self) -> usize {
        self.handles_in_use.get()
    }

    pub(crate) fn num_open_files(&self) -> usize {
        self.files
            .borrow()
            .values()
            .filter(|l| !l.borrow().is_empty())
            .count()
    }

    pub(crate) fn next_clock(&self) -> u64 {
        let c = self.clock.get() + 1;
        self.clock.set(c);
        c
    }

    pub(crate) fn get_or_create_list(&self, file_id: &FileId) -> Result<RegionListHandle> {
        if let Some(existing) = self.files.borrow().get(file_id) {
            return Ok(Rc::clone(existing));
        }
        let file_size = platform::file_size(file_id)?;
        let list = RegionList::new(file_id.clone(), file_size);
        self.files.borrow_mut().insert(file_id.clone(), Rc::clone(&list));
        Ok(list)
    }

    pub(crate) fn maybe_remove_list(&self, file_id: &FileId) {
        let mut files = self.files.borrow_mut();
        if let Some(handle) = files.get(file_id)
            && Rc::strong_count(handle) == 1
            && handle.borrow().is_empty()
        {
            files.remove(file_id);
        }
    }

    pub(crate) fn note_new_region(&self, size: u64) {
        self.memory_in_use.set(self.memory_in_use.get() + size);
        self.handles_in_use.set(self.handles_in_use.get() + 1);
    }

    /// Closes every map whose file is path-backed and whose path starts with `prefix`,
    /// regardless of whether it is still pinned by a live cursor. Callers must ensure
    /// no cursor will touch those maps afterward.
    pub(crate) fn force_map_handle_removal(&self, prefix: &std::path::Path) -> usize {
        let mut removed = 0usize;
        for list in self.files.borrow().values() {
            let matches = matches!(list.borrow().file_id(), FileId::Path(p) if p.starts_with(prefix));
            if !matches {
                continue;
            }
            let mut l = list.borrow_mut();
            let freed: Vec<Region> = l.iter().cloned().collect();
            for region in &freed {
                self.note_evicted(region.size());
            }
            removed += freed.len();
            l.clear();
        }
        removed
    }

    /// Registers eviction of a region of `size` bytes.
    fn note_evicted(&self, size: u64) {
        self.memory_in_use.set(self.memory_in_use.get() - size);
        self.handles_in_use.set(self.handles_in_use.get() - 1);
    }

    /// Repeatedly evicts the idle region with the smallest `last_used` across all
    /// files until `required_bytes` worth of headroom exists (or `required_bytes == 0`,
    /// meaning "evict everything evictable"). Returns the number of regions freed.
    pub(crate) fn collect_lru(&self, required_bytes: u64) -> usize {
        self.collect_lru_impl(required_bytes, false)
    }

    /// Like [`Self::collect_lru`], but additionally guarantees at least one region is
    /// freed (if any evictable region exists) even when `required_bytes` is already
    /// satisfied by current memory use — used when the handle-count budget, not the
    /// memory budget, is what forced eviction.
    pub(crate) fn collect_lru_for_handle_slot(&self, required_bytes: u64) -> usize {
        self.collect_lru_impl(required_bytes, true)
    }

    fn collect_lru_impl(&self, required_bytes: u64, need_handle_slot: bool) -> usize {
        let mut freed = 0usize;
        loop {
            // required_bytes == 0 means "evict everything evictable": never stop early.
            if required_bytes > 0 {
                let memory_satisfied = self.memory_in_use.get() + required_bytes <= self.max_memory;
                let handle_satisfied = !need_handle_slot || freed > 0;
                if memory_satisfied && handle_satisfied {
                    break;
                }
            }

            let victim = self.files.borrow().values().fold(
                None::<(RegionListHandle, Region)>,
                |best, list| {
                    let candidate = list
                        .borrow()
                        .iter()
                        .filter(|r| r.is_idle())
                        .min_by_key(|r| r.last_used())
                        .cloned();
                    match (&best, candidate) {
                        (None, Some(c)) => Some((Rc::clone(list), c)),
                        (Some((_, best_region)), Some(c)) if c.last_used() < best_region.last_used() => {
                            Some((Rc::clone(list), c))
                        }
                        _ => best,
                    }
                },
            );

            let Some((list, region)) = victim else {
                break;
            };

            list.borrow_mut().remove_matching(&region);
            self.note_evicted(region.size());
            freed += 1;
            debug!(
                "evicted region begin={} size={} last_used={}",
                region.begin(),
                region.size(),
                region.last_used()
            );
        }
        freed
    }
}
