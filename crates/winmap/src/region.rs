use std::cell::Cell;
use std::rc::Rc;

use memmap2::Mmap;

use crate::error::Result;
use crate::file_id::FileId;
use crate::platform;

/// One live memory map of a contiguous `[begin, begin+size)` byte range of a file.
///
/// Cloning a `Region` takes a new pin on it: `Rc::strong_count` doubles as the usage
/// count described in the data model (one structural reference held by the owning
/// [`RegionList`](crate::region_list::RegionList), plus one per live cursor).
#[derive(Clone, Debug)]
#[must_use]
pub struct Region(Rc<RegionInner>);

#[derive(Debug)]
struct RegionInner {
    begin: u64,
    map: Mmap,
    last_used: Cell<u64>,
}

impl Region {
    /// Maps `[begin, min(begin+requested, file_size))` of `id`.
    pub fn new(id: &FileId, begin: u64, requested: u64, clock: u64) -> Result<Self> {
        let map = platform::map(id, begin, requested)?;
        Ok(Self(Rc::new(RegionInner {
            begin,
            map,
            last_used: Cell::new(clock),
        })))
    }

    pub fn begin(&self) -> u64 {
        self.0.begin
    }

    /// The actual mapped length, which may be less than requested when the mapping was
    /// clamped to end-of-file.
    pub fn size(&self) -> u64 {
        self.0.map.len() as u64
    }

    pub fn end(&self) -> u64 {
        self.begin() + self.size()
    }

    pub fn includes_ofs(&self, ofs: u64) -> bool {
        ofs >= self.begin() && ofs < self.end()
    }

    pub fn last_used(&self) -> u64 {
        self.0.last_used.get()
    }

    /// Stamps this region as touched at `clock`. Called on every successful pin,
    /// whether it reuses an existing pin or creates a new one.
    pub fn touch(&self, clock: u64) {
        self.0.last_used.set(clock);
    }

    /// Total reference count: the owning list's structural reference plus one per live
    /// cursor pinning this region.
    pub fn usage_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// A region is idle, and therefore evictable, when nothing but its owning list
    /// still references it.
    pub fn is_idle(&self) -> bool {
        self.usage_count() == 1
    }

    pub fn buffer(&self) -> &[u8] {
        &self.0.map[..]
    }

    pub fn ptr_eq(&self, other: &Region) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
