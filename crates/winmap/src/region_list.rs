use std::cell::RefCell;
use std::rc::Rc;

use crate::file_id::FileId;
use crate::region::Region;

/// Per-file container of regions, kept sorted by `begin` and non-overlapping.
///
/// Shared between the manager's file table and any cursor currently attached to it; a
/// plain `Rc<RefCell<_>>` handle rather than an interior-mutable single owner, since
/// both the manager and its cursors need independent handles to the same list.
pub type RegionListHandle = Rc<RefCell<RegionList>>;

#[derive(Debug)]
pub struct RegionList {
    file_id: FileId,
    file_size: u64,
    regions: Vec<Region>,
}

impl RegionList {
    pub fn new(file_id: FileId, file_size: u64) -> RegionListHandle {
        Rc::new(RefCell::new(Self {
            file_id,
            file_size,
            regions: Vec::new(),
        }))
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Returns the region covering `ofs`, if any, via binary search.
    pub fn find_covering(&self, ofs: u64) -> Option<Region> {
        let idx = self.insertion_index(ofs);
        if idx > 0 {
            let candidate = &self.regions[idx - 1];
            if candidate.includes_ofs(ofs) {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// The least index `i` such that `regions[i].begin() > ofs`, i.e. where a region
    /// starting at or covering `ofs` would be inserted to keep the list sorted.
    pub fn insertion_index(&self, ofs: u64) -> usize {
        self.regions.partition_point(|r| r.begin() <= ofs)
    }

    /// The neighbor immediately before `idx`, if any.
    pub fn left_of(&self, idx: usize) -> Option<&Region> {
        idx.checked_sub(1).map(|i| &self.regions[i])
    }

    /// The neighbor at or after `idx`, if any.
    pub fn right_of(&self, idx: usize) -> Option<&Region> {
        self.regions.get(idx)
    }

    /// Inserts `region` at `idx`, preserving sort order. Callers are responsible for
    /// choosing an `idx` that keeps the list non-overlapping.
    pub fn insert(&mut self, idx: usize, region: Region) {
        self.regions.insert(idx, region);
    }

    /// Removes the region identical (by pointer) to `target`, if still present.
    pub fn remove_matching(&mut self, target: &Region) -> Option<Region> {
        let idx = self.regions.iter().position(|r| r.ptr_eq(target))?;
        Some(self.regions.remove(idx))
    }

    /// Drops every region from this list unconditionally.
    pub fn clear(&mut self) {
        self.regions.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    /// Builds a list with two regions, `[0, 100)` and `[200, 300)`, over a fresh
    /// 300-byte scratch file, leaving a gap `[100, 200)` covered by neither.
    fn two_region_list() -> (NamedTempFile, RegionList) {
        let mut f = NamedTempFile::new().expect("create temp file");
        f.write_all(&vec![0u8; 300]).expect("write temp file");
        f.flush().expect("flush temp file");
        let file_id = FileId::from(f.path());

        let mut list = RegionList {
            file_id: file_id.clone(),
            file_size: 300,
            regions: Vec::new(),
        };
        list.insert(0, Region::new(&file_id, 0, 100, 1).expect("map first region"));
        list.insert(1, Region::new(&file_id, 200, 100, 2).expect("map second region"));
        (f, list)
    }

    #[test]
    fn insertion_index_on_empty_list_is_zero() {
        let list = RegionList {
            file_id: FileId::from(std::path::Path::new("/does/not/matter")),
            file_size: 0,
            regions: Vec::new(),
        };
        assert_eq!(list.insertion_index(0), 0);
        assert_eq!(list.insertion_index(1_000), 0);
        assert!(list.find_covering(0).is_none());
    }

    #[test]
    fn insertion_index_exactly_on_a_region_boundary() {
        let (_f, list) = two_region_list();
        // begin() of the second region: boundary belongs to that region, not a gap.
        assert_eq!(list.insertion_index(200), 2);
        assert!(list.find_covering(200).is_some());
        // one byte before the boundary is still the gap between the two regions.
        assert_eq!(list.insertion_index(199), 1);
        assert!(list.find_covering(199).is_none());
    }

    #[test]
    fn insertion_index_in_the_gap_between_regions() {
        let (_f, list) = two_region_list();
        assert_eq!(list.insertion_index(150), 1);
        assert!(list.find_covering(150).is_none());
    }

    #[test]
    fn insertion_index_past_every_region() {
        let (_f, list) = two_region_list();
        assert_eq!(list.insertion_index(299), 2);
        assert_eq!(list.insertion_index(1_000_000), 2);
        assert!(list.find_covering(299).is_some());
        assert!(list.find_covering(1_000_000).is_none());
    }

    #[test]
    fn find_covering_at_the_very_first_offset() {
        let (_f, list) = two_region_list();
        assert_eq!(list.insertion_index(0), 1);
        assert!(list.find_covering(0).is_some());
    }
}
