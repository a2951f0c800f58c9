// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size records.
//!
//! A record is a view over `SIZE` consecutive words; field `k` lives at word
//! `k`. Scalars are stored unchanged and floats are stored as their IEEE-754
//! bit pattern, so decoding is a pure reinterpretation and never fails.

use bytemuck::Pod;

use crate::reference::BufferKind;

/// Placement of a type in one of the word buffers.
pub trait Layout: Copy {
    /// The buffer this type is encoded into.
    type Buffer: BufferKind;

    /// Size in 32-bit words. For tagged unions this is the slot stride.
    const SIZE: u32;

    /// Size in bytes.
    const SIZE_IN_BYTES: u32 = Self::SIZE * 4;
}

/// A fixed-size record with a bit-exact word encoding.
pub trait Record: Layout {
    /// Decodes the record from the start of `words`.
    ///
    /// Panics if `words` is shorter than `SIZE`.
    fn read(words: &[u32]) -> Self;

    /// Encodes the record to the start of `words`.
    ///
    /// Panics if `words` is shorter than `SIZE`.
    fn write(&self, words: &mut [u32]);
}

/// Reads a record whose in-memory representation is exactly its word encoding.
#[inline]
pub(crate) fn read_pod<T: Pod + Layout>(words: &[u32]) -> T {
    bytemuck::pod_read_unaligned(bytemuck::cast_slice(&words[..T::SIZE as usize]))
}

/// Writes a record whose in-memory representation is exactly its word encoding.
#[inline]
pub(crate) fn write_pod<T: Pod + Layout>(value: &T, words: &mut [u32]) {
    let src: &[u32] = bytemuck::cast_slice(std::slice::from_ref(value));
    words[..T::SIZE as usize].copy_from_slice(src);
}

/// Implements [`Layout`] and [`Record`] for `#[repr(C)]` `Pod` structs made of
/// whole 32-bit fields, and checks the struct size against the word count.
macro_rules! pod_records {
    ($buffer:ty { $($name:ident = $size:expr),* $(,)? }) => {
        $(
            impl $crate::record::Layout for $name {
                type Buffer = $buffer;
                const SIZE: u32 = $size;
            }

            impl $crate::record::Record for $name {
                #[inline]
                fn read(words: &[u32]) -> Self {
                    $crate::record::read_pod(words)
                }

                #[inline]
                fn write(&self, words: &mut [u32]) {
                    $crate::record::write_pod(self, words);
                }
            }

            static_assertions::const_assert_eq!(
                ::std::mem::size_of::<$name>(),
                $size * 4
            );
        )*
    };
}

pub(crate) use pod_records;
