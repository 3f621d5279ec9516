use crossbeam::queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

use crate::constants::{BUFFER_INITIAL_CAPACITY, BUFFER_MAX_POOLED_CAPACITY, BUFFER_POOL_SLOTS};

/// A bounded pool of reusable byte buffers.
///
/// Encode output and decoder scratch space come from here. A buffer is
/// cleared before it goes back, and data handed to callers is always copied
/// out first, so pooled storage is never visible after release.
pub struct BufferPool {
    buffers: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    pub fn new(slots: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(slots.max(1)),
        }
    }

    /// The pool shared by every encode and decode call in the process.
    pub fn global() -> &'static BufferPool {
        static GLOBAL: OnceLock<BufferPool> = OnceLock::new();
        GLOBAL.get_or_init(|| BufferPool::new(BUFFER_POOL_SLOTS))
    }

    pub fn acquire(&self) -> Vec<u8> {
        self.buffers
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(BUFFER_INITIAL_CAPACITY))
    }

    pub fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > BUFFER_MAX_POOLED_CAPACITY {
            return;
        }
        buf.clear();
        let _ = self.buffers.push(buf);
    }

    pub fn available(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn lease(&'static self) -> PooledBuffer {
        PooledBuffer {
            buf: self.acquire(),
            pool: self,
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(BUFFER_POOL_SLOTS)
    }
}

/// A buffer that returns itself to its pool when dropped.
pub(crate) struct PooledBuffer {
    buf: Vec<u8>,
    pool: &'static BufferPool,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
