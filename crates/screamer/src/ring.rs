//! Fixed-capacity byte ring shared between a producer and a consumer.

/// Byte ring with independent read/write cursors.
///
/// `write == read` is ambiguous between empty and full, so fullness is tracked
/// with a separate flag. Unlike a streaming sink this ring never drops old data:
/// `push` only accepts what fits and reports the count, leaving the overrun
/// decision to the caller.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Vec<u8>,
    read: usize,
    write: usize,
    full: bool,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            read: 0,
            write: 0,
            full: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Occupied bytes, always within `0..=capacity`.
    pub fn len(&self) -> usize {
        if self.full {
            return self.buf.len();
        }
        let cap = self.buf.len();
        (self.write + cap - self.read) % cap
    }

    pub fn free(&self) -> usize {
        self.buf.len() - self.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.read == self.write
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn read_pos(&self) -> usize {
        self.read
    }

    pub fn write_pos(&self) -> usize {
        self.write
    }

    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
        self.full = false;
    }

    /// Push as many bytes as fit, returning the number accepted.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let take = data.len().min(self.free());
        if take == 0 {
            return 0;
        }

        let cap = self.buf.len();
        let first = (cap - self.write).min(take);
        self.buf[self.write..self.write + first].copy_from_slice(&data[..first]);
        let remaining = take - first;
        if remaining != 0 {
            self.buf[..remaining].copy_from_slice(&data[first..take]);
        }

        self.write = (self.write + take) % cap;
        self.full = self.write == self.read;
        take
    }

    /// Pop up to `out.len()` bytes into `out`, returning the number written.
    pub fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let take = out.len().min(self.len());
        if take == 0 {
            return 0;
        }

        let cap = self.buf.len();
        let first = (cap - self.read).min(take);
        out[..first].copy_from_slice(&self.buf[self.read..self.read + first]);
        let remaining = take - first;
        if remaining != 0 {
            out[first..take].copy_from_slice(&self.buf[..remaining]);
        }

        self.read = (self.read + take) % cap;
        self.full = false;
        take
    }

    /// Pop up to `max_len` bytes. A result shorter than `max_len` means the ring ran dry.
    pub fn pop(&mut self, max_len: usize) -> Vec<u8> {
        let mut out = vec![0; max_len.min(self.len())];
        let n = self.pop_into(&mut out);
        out.truncate(n);
        out
    }
}
