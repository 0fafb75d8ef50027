use crate::platform;

/// A pure `(offset, size)` value used to plan region placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub ofs: u64,
    pub size: u64,
}

impl Window {
    pub fn new(ofs: u64, size: u64) -> Self {
        Self { ofs, size }
    }

    pub fn ofs_end(&self) -> u64 {
        self.ofs + self.size
    }

    /// Grows this window to the left, toward but not overlapping `left`, bounded so the
    /// total size never exceeds `max_size`.
    pub fn extend_left_to(&mut self, left: Window, max_size: u64) {
        let room = self.ofs.saturating_sub(left.ofs_end());
        let grow = room.min(max_size.saturating_sub(self.size));
        self.ofs -= grow;
        self.size += grow;
    }

    /// Grows this window to the right, toward but not overlapping `right`, bounded so the
    /// total size never exceeds `max_size`.
    pub fn extend_right_to(&mut self, right: Window, max_size: u64) {
        let room = right.ofs.saturating_sub(self.ofs_end());
        let grow = room.min(max_size.saturating_sub(self.size));
        self.size += grow;
    }

    /// Rounds `ofs` down and `ofs_end` up to page-size multiples.
    pub fn align(&mut self) {
        let page = platform::page_size() as u64;
        let aligned_ofs = self.ofs - (self.ofs % page);
        let end = self.ofs_end();
        let aligned_end = end.div_ceil(page) * page;
        self.ofs = aligned_ofs;
        self.size = aligned_end - aligned_ofs;
    }
}
