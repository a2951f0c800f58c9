// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer sizes handed over by the capacity plan.

use std::fmt;

use crate::buffer::{AnnotatedBuffer, Buffer, SceneBuffer};
use crate::record::Layout;
use crate::{Annotated, Element};

/// Typed buffer size.
///
/// The length is a count of `T` objects; for tagged unions that is a count of
/// slots, each `T::SIZE` words long.
pub struct BufferSize<T> {
    len: u32,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T: Layout> BufferSize<T> {
    /// Creates a new buffer size from number of elements.
    pub const fn new(len: u32) -> Self {
        Self {
            len,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Creates a new buffer size from size in words, rounding down to whole
    /// elements.
    pub const fn from_size_in_words(size: u32) -> Self {
        Self::new(size / T::SIZE)
    }

    /// Returns the number of elements.
    pub const fn len(self) -> u32 {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns the size in words.
    pub const fn size_in_words(self) -> u32 {
        T::SIZE * self.len
    }

    /// Returns the size in bytes.
    pub const fn size_in_bytes(self) -> u32 {
        T::SIZE_IN_BYTES * self.len
    }

    /// Returns the byte range of the `start..end` elements, for use as a
    /// [`Buffer::partition`] range.
    pub fn byte_range(self, start: u32, end: u32) -> std::ops::Range<u32> {
        debug_assert!(start <= end && end <= self.len);
        start * T::SIZE_IN_BYTES..end * T::SIZE_IN_BYTES
    }
}

// Manual impls so that `T` does not need to implement these traits.

impl<T> Clone for BufferSize<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BufferSize<T> {}

impl<T> PartialEq for BufferSize<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
    }
}

impl<T> Eq for BufferSize<T> {}

impl<T> fmt::Debug for BufferSize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BufferSize").field(&self.len).finish()
    }
}

/// Sizes of the scene and annotated buffers for one pipeline pass.
///
/// The counts come from the capacity planning stage; this type only turns
/// them into allocation sizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferSizes {
    pub scene: BufferSize<Element>,
    pub annotated: BufferSize<Annotated>,
}

impl BufferSizes {
    pub fn new(n_elements: u32, n_annotated: u32) -> Self {
        let sizes = Self {
            scene: BufferSize::new(n_elements),
            annotated: BufferSize::new(n_annotated),
        };
        log::debug!("buffer sizes: {sizes}");
        sizes
    }

    /// Total size of both buffers in bytes.
    pub fn total_bytes(&self) -> u32 {
        self.scene.size_in_bytes() + self.annotated.size_in_bytes()
    }

    /// Allocates a zeroed scene buffer.
    pub fn alloc_scene(&self) -> SceneBuffer {
        Buffer::zeroed(self.scene.size_in_words())
    }

    /// Allocates a zeroed annotated buffer.
    pub fn alloc_annotated(&self) -> AnnotatedBuffer {
        Buffer::zeroed(self.annotated.size_in_words())
    }
}

impl fmt::Display for BufferSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {} bytes; scene {} slots ({} bytes); annotated {} slots ({} bytes)",
            self.total_bytes(),
            self.scene.len(),
            self.scene.size_in_bytes(),
            self.annotated.len(),
            self.annotated.size_in_bytes(),
        )
    }
}
