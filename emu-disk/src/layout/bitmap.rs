/// 位图，记录其指示区域的分配情况
///
/// Backed by groups of 64 bits; allocation scans for the first group
/// with a free bit and marks its lowest zero bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    words: Vec<u64>,
    /// Bits past `capacity` are never handed out.
    capacity: usize,
}

impl Bitmap {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 分配新位，返回其编号；空间用尽则返回空。
    pub fn alloc(&mut self) -> Option<usize> {
        let (group_index, ingroup_index) = self
            .words
            .iter()
            .enumerate()
            .find_map(|(group_index, &bits)| {
                (bits != u64::MAX).then_some((group_index, bits.trailing_ones() as usize))
            })?;

        let index = group_index * 64 + ingroup_index;
        if index >= self.capacity {
            return None;
        }

        self.words[group_index] |= 1 << ingroup_index;
        Some(index)
    }

    pub fn dealloc(&mut self, index: usize) {
        assert!(index < self.capacity);
        let (group_index, ingroup_index) = (index / 64, index % 64);

        // 编号一定得有对应的位
        assert_ne!(self.words[group_index] & (1 << ingroup_index), 0);

        self.words[group_index] -= 1 << ingroup_index;
    }

    /// Marks a bit as occupied without going through allocation.
    /// Used when formatting to pin the reserved slots.
    pub fn mark(&mut self, index: usize) {
        assert!(index < self.capacity);
        self.words[index / 64] |= 1 << (index % 64);
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        index < self.capacity && self.words[index / 64] & (1 << (index % 64)) != 0
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::Bitmap;

    #[test]
    fn alloc_is_first_fit() {
        let mut bitmap = Bitmap::new(130);
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        bitmap.dealloc(0);
        assert_eq!(bitmap.alloc(), Some(0));
    }

    #[test]
    fn alloc_crosses_groups() {
        let mut bitmap = Bitmap::new(130);
        for i in 0..130 {
            assert_eq!(bitmap.alloc(), Some(i));
        }
        assert_eq!(bitmap.alloc(), None);
    }

    #[test]
    fn capacity_is_respected_inside_last_group() {
        let mut bitmap = Bitmap::new(3);
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(2));
        assert_eq!(bitmap.alloc(), None);
    }

    #[test]
    fn mark_pins_reserved_slots() {
        let mut bitmap = Bitmap::new(16);
        bitmap.mark(0);
        bitmap.mark(1);
        bitmap.mark(2);
        assert_eq!(bitmap.alloc(), Some(3));
    }

    #[test]
    #[should_panic]
    fn dealloc_of_free_bit_panics() {
        let mut bitmap = Bitmap::new(16);
        bitmap.dealloc(5);
    }
}
