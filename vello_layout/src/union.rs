// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tagged unions over flat word buffers.
//!
//! A union slot starts with a header word holding the variant tag in the low
//! 16 bits and opaque flags in the high 16 bits. The payload of the active
//! variant follows at byte offset 4, laid out as its own [`Record`]. All slots
//! of a union have the same stride, one word more than the largest payload,
//! so arrays of slots can be indexed in constant time.
//!
//! Tag 0 is reserved for the no-op variant, whose payload must not be read.
//!
//! [`Record`]: crate::Record

use std::fmt::Debug;

use crate::record::Layout;

/// Decoded union header word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TagFlags<T> {
    /// Variant tag, the low 16 bits of the header.
    pub tag: T,
    /// Flags, the high 16 bits of the header. These are passed through
    /// unchanged; their meaning belongs to the consuming stage.
    pub flags: u16,
}

impl<T: From<u16>> TagFlags<T> {
    /// Splits a header word.
    #[inline]
    pub fn from_word(word: u32) -> Self {
        Self {
            tag: T::from((word & 0xffff) as u16),
            flags: (word >> 16) as u16,
        }
    }
}

impl<T: Into<u16>> TagFlags<T> {
    /// Joins the tag and flags into a header word.
    #[inline]
    pub fn to_word(self) -> u32 {
        ((self.flags as u32) << 16) | Into::<u16>::into(self.tag) as u32
    }
}

/// A multi-variant record with a tag and flags header.
pub trait TaggedUnion: Layout {
    /// Tag type; 0 is the no-op tag.
    type Tag: Copy + Eq + Debug + From<u16> + Into<u16>;

    /// The tag of the no-op variant.
    const NOP: Self::Tag;

    /// Tag of this value.
    fn tag(&self) -> Self::Tag;

    /// Decodes a value from its tag and payload words.
    ///
    /// Returns `None` if the tag is not one of the union's tags. A no-op tag
    /// decodes without touching `payload`.
    fn decode(tag: Self::Tag, payload: &[u32]) -> Option<Self>;

    /// Encodes the payload of the active variant. Does nothing for no-op.
    fn encode_payload(&self, payload: &mut [u32]);
}

/// Slot stride in words for a union with the given payload sizes.
pub(crate) const fn union_size(payload_sizes: &[u32]) -> u32 {
    let mut max = 0;
    let mut i = 0;
    while i < payload_sizes.len() {
        if payload_sizes[i] > max {
            max = payload_sizes[i];
        }
        i += 1;
    }
    1 + max
}

/// Defines a tagged union: the Rust enum, its tag type and constants, the
/// [`Layout`] and [`TaggedUnion`] impls, and named unchecked accessors for
/// each variant on the matching [`Buffer`](crate::Buffer).
macro_rules! tagged_union {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $tag:ident in $buffer:ty {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($payload:ty) = $tag_const:ident($tag_value:literal)
                    => $read:ident, $write:ident;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq)]
        $vis enum $name {
            /// No operation; the payload is unspecified.
            Nop,
            $(
                $(#[$vmeta])*
                $variant($payload),
            )*
        }

        #[doc = concat!("Tag of a [`", stringify!($name), "`] slot.")]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        $vis struct $tag(pub u16);

        impl $tag {
            /// No operation.
            pub const NOP: Self = Self(0);
            $(
                $(#[$vmeta])*
                pub const $tag_const: Self = Self($tag_value);
            )*
        }

        impl From<u16> for $tag {
            #[inline]
            fn from(tag: u16) -> Self {
                Self(tag)
            }
        }

        impl From<$tag> for u16 {
            #[inline]
            fn from(tag: $tag) -> Self {
                tag.0
            }
        }

        impl $crate::record::Layout for $name {
            type Buffer = $buffer;
            const SIZE: u32 = $crate::union::union_size(&[
                $(<$payload as $crate::record::Layout>::SIZE),*
            ]);
        }

        impl $crate::union::TaggedUnion for $name {
            type Tag = $tag;

            const NOP: $tag = $tag::NOP;

            fn tag(&self) -> $tag {
                match self {
                    Self::Nop => $tag::NOP,
                    $(Self::$variant(_) => $tag::$tag_const,)*
                }
            }

            fn decode(tag: $tag, payload: &[u32]) -> Option<Self> {
                match tag.0 {
                    0 => Some(Self::Nop),
                    $(
                        $tag_value => Some(Self::$variant(
                            <$payload as $crate::record::Record>::read(payload),
                        )),
                    )*
                    _ => None,
                }
            }

            fn encode_payload(&self, payload: &mut [u32]) {
                match self {
                    Self::Nop => {}
                    $(Self::$variant(p) => $crate::record::Record::write(p, payload),)*
                }
            }
        }

        impl<W: AsRef<[u32]>> $crate::buffer::Buffer<$buffer, W> {
            $(
                #[doc = concat!(
                    "Reads the payload of a `", stringify!($variant),
                    "` slot.\n\nThe slot's tag is not checked; branch on ",
                    "[`tag_of`](Self::tag_of) first."
                )]
                #[inline]
                pub fn $read(&self, r: $crate::Ref<$name>) -> $payload {
                    self.read_variant(r)
                }
            )*
        }

        impl<W: AsRef<[u32]> + AsMut<[u32]>> $crate::buffer::Buffer<$buffer, W> {
            $(
                #[doc = concat!(
                    "Writes a `", stringify!($variant),
                    "` slot: the tag, then the payload. Header flags are left as they were."
                )]
                #[inline]
                pub fn $write(&mut self, r: $crate::Ref<$name>, payload: &$payload) {
                    self.write_variant(r, $tag::$tag_const, payload);
                }
            )*
        }
    };
}

pub(crate) use tagged_union;
