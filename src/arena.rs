/*!
A bump allocator for per-query scratch buffers. One [`Arena`] is
created per incoming query and discarded once the answer is sent; it
never frees individual allocations, only the whole arena at once.
*/

pub struct Arena {
    chunks: Vec<Vec<u8>>,
    chunk_size: usize,
}

impl Arena {
    pub fn new(chunk_size: usize) -> Self {
        Arena { chunks: vec![Vec::with_capacity(chunk_size)], chunk_size }
    }

    /// Reserve `len` zeroed bytes and hand back a scratch buffer sized
    /// exactly to `len`; callers write into it directly.
    pub fn alloc(&mut self, len: usize) -> &mut [u8] {
        let chunk = self.chunks.last_mut().expect("arena always has a chunk");
        if chunk.capacity() - chunk.len() < len {
            let size = len.max(self.chunk_size);
            self.chunks.push(Vec::with_capacity(size));
        }
        let chunk = self.chunks.last_mut().unwrap();
        let start = chunk.len();
        chunk.resize(start + len, 0);
        &mut chunk[start..start + len]
    }

    /// Drop every allocation made so far, keeping the first chunk's
    /// backing capacity for reuse.
    pub fn reset(&mut self) {
        self.chunks.truncate(1);
        self.chunks[0].clear();
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_grows_into_new_chunk() {
        let mut a = Arena::new(8);
        let buf1 = a.alloc(8);
        buf1[0] = 1;
        let buf2 = a.alloc(8);
        buf2[0] = 2;
        assert_eq!(a.chunks.len(), 2);
    }

    #[test]
    fn reset_clears_allocations() {
        let mut a = Arena::new(64);
        a.alloc(10);
        a.reset();
        assert_eq!(a.chunks.len(), 1);
        assert_eq!(a.chunks[0].len(), 0);
    }
}
