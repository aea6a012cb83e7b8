/// Used/free flags for a fixed number of slots, allocated first-fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(8)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_used(&self, index: usize) -> bool {
        index < self.len && self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    /// Returns false if the slot was already free or out of range.
    pub fn mark_free(&mut self, index: usize) -> bool {
        if !self.is_used(index) {
            return false;
        }
        self.bits[index / 8] &= !(1 << (index % 8));
        true
    }

    /// Lowest free index, marked used before returning.
    pub fn allocate(&mut self) -> Option<usize> {
        for byte_index in 0..self.bits.len() {
            let byte = self.bits[byte_index];
            if byte == u8::MAX {
                continue;
            }
            for bit in 0..8 {
                let index = byte_index * 8 + bit;
                if index >= self.len {
                    return None;
                }
                if byte & (1 << bit) == 0 {
                    self.bits[byte_index] |= 1 << bit;
                    return Some(index);
                }
            }
        }
        None
    }

    pub fn count_free(&self) -> usize {
        (0..self.len).filter(|&i| !self.is_used(i)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::Bitmap;

    #[test]
    fn allocates_lowest_free_slot() {
        let mut map = Bitmap::new(10);
        assert_eq!(map.allocate(), Some(0));
        assert_eq!(map.allocate(), Some(1));
        assert_eq!(map.allocate(), Some(2));
        assert!(map.mark_free(1));
        assert_eq!(map.allocate(), Some(1));
        assert_eq!(map.allocate(), Some(3));
    }

    #[test]
    fn respects_length_not_byte_capacity() {
        let mut map = Bitmap::new(3);
        assert_eq!(map.allocate(), Some(0));
        assert_eq!(map.allocate(), Some(1));
        assert_eq!(map.allocate(), Some(2));
        assert_eq!(map.allocate(), None);
        assert_eq!(map.count_free(), 0);
    }

    #[test]
    fn double_free_is_reported() {
        let mut map = Bitmap::new(16);
        assert_eq!(map.allocate(), Some(0));
        assert!(!map.mark_free(9));
        assert!(map.mark_free(0));
        assert!(!map.mark_free(0));
        assert!(!map.mark_free(100));
        assert_eq!(map.count_free(), 16);
    }
}
