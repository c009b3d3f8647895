//! Append-friendly byte buffer with an amortized growth policy.

/// A growable byte array. Writers call [`DynamicBuffer::ensure_length`]
/// before indexing, so no write ever lands past the end. When the buffer
/// must grow it reallocates to `max(requested, 2 * current)`, keeping the
/// amortized cost of incremental appends linear.
#[derive(Debug, Clone, Default)]
pub struct DynamicBuffer {
    array: Vec<u8>,
}

impl DynamicBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(length: usize) -> Self {
        DynamicBuffer {
            array: vec![0; length],
        }
    }

    /// Current allocated length. Callers track their own used length; the
    /// bytes past it are zero but meaningless.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Grow so that at least `length` bytes are addressable.
    pub fn ensure_length(&mut self, length: usize) {
        if self.array.len() >= length {
            return;
        }

        let new_length = length.max(self.array.len() * 2);
        self.array.resize(new_length, 0);
    }

    /// Copy `value` into the buffer at `offset`, growing as needed.
    pub fn set(&mut self, offset: usize, value: &[u8]) {
        self.ensure_length(offset + value.len());
        self.array[offset..offset + value.len()].copy_from_slice(value);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.array
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.array
    }

    /// Hand the backing storage over, truncated to `length` used bytes.
    pub fn into_vec(mut self, length: usize) -> Vec<u8> {
        self.array.truncate(length);
        self.array
    }
}
