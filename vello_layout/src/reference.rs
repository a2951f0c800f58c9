// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed offset handles into word buffers.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::record::Layout;

/// Identifies one of the flat word buffers shared between pipeline stages.
///
/// This is only used at the type level, so that a reference into the scene
/// buffer cannot be used to address the annotated buffer.
pub trait BufferKind: 'static {
    /// Human readable name, used in logs and error messages.
    const NAME: &'static str;
}

/// The scene buffer, holding [`Element`](crate::Element) slots written by the host encoder.
#[derive(Clone, Copy, Debug)]
pub enum SceneKind {}

/// The annotated buffer, holding [`Annotated`](crate::Annotated) slots.
#[derive(Clone, Copy, Debug)]
pub enum AnnotatedKind {}

impl BufferKind for SceneKind {
    const NAME: &'static str = "scene";
}

impl BufferKind for AnnotatedKind {
    const NAME: &'static str = "annotated";
}

/// A reference to an encoded object within a buffer.
///
/// The offset is in bytes and always a multiple of 4. A `Ref` does not own
/// anything and is not bounds checked; it is only meaningful for a buffer
/// that the capacity plan made large enough to hold the addressed object.
pub struct Ref<T> {
    offset: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    /// Creates a reference from a byte offset.
    #[inline]
    pub const fn new(offset: u32) -> Self {
        debug_assert!(offset % 4 == 0, "misaligned reference");
        Self {
            offset,
            _phantom: PhantomData,
        }
    }

    /// Creates a reference from an index into the word array.
    #[inline]
    pub const fn from_word(ix: u32) -> Self {
        Self::new(ix * 4)
    }

    /// Byte offset of the referenced object.
    #[inline]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Index of the first word of the referenced object.
    #[inline]
    pub const fn word_ix(self) -> usize {
        (self.offset >> 2) as usize
    }

    /// Reference `n` words past this one.
    #[inline]
    pub const fn add_words(self, n: u32) -> Self {
        Self::new(self.offset + n * 4)
    }

    /// Reinterprets the reference as pointing at another type.
    ///
    /// Both types must live in the same buffer.
    #[inline]
    pub fn cast<U>(self) -> Ref<U>
    where
        T: Layout,
        U: Layout<Buffer = T::Buffer>,
    {
        Ref::new(self.offset)
    }
}

impl<T: Layout> Ref<T> {
    /// Reference to the `n`-th element of an array of `T` starting here.
    #[inline]
    pub const fn index(self, n: u32) -> Self {
        Self::new(self.offset + n * T::SIZE * 4)
    }

    /// Reference to the payload of a tagged union slot, right after the header word.
    #[inline]
    pub fn payload<P>(self) -> Ref<P>
    where
        P: Layout<Buffer = T::Buffer>,
    {
        Ref::new(self.offset + 4)
    }
}

// Manual impls so that `T` does not need to implement these traits.

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
    }
}

impl<T> Default for Ref<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref<{}>({})", std::any::type_name::<T>(), self.offset)
    }
}
