// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Word buffers and the codecs bound to them.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use crate::record::Record;
use crate::reference::{AnnotatedKind, BufferKind, Ref, SceneKind};
use crate::union::{TagFlags, TaggedUnion};
use crate::{Error, Result};

/// A flat array of 32-bit words holding records of one buffer kind.
///
/// The storage `W` is owned by the caller: a `Vec<u32>` for a buffer being
/// built on the host, or a borrowed slice of a mapped GPU buffer. Nothing is
/// bounds checked beyond what slice indexing does; references are trusted to
/// come from a valid capacity plan.
///
/// A buffer may be a window onto a larger one (see [`Buffer::partition`]),
/// in which case `base` is the word index of its first word and references
/// stay absolute.
pub struct Buffer<B, W> {
    words: W,
    base: u32,
    _kind: PhantomData<B>,
}

/// Buffer of [`Element`](crate::Element) slots.
pub type SceneBuffer<W = Vec<u32>> = Buffer<SceneKind, W>;

/// Buffer of [`Annotated`](crate::Annotated) slots.
pub type AnnotatedBuffer<W = Vec<u32>> = Buffer<AnnotatedKind, W>;

impl<B: BufferKind, W> Buffer<B, W> {
    /// Wraps word storage starting at word 0.
    pub fn new(words: W) -> Self {
        Self::with_base(words, 0)
    }

    /// Wraps word storage whose first word is at word index `base` of the
    /// whole buffer.
    pub fn with_base(words: W, base: u32) -> Self {
        Self {
            words,
            base,
            _kind: PhantomData,
        }
    }

    /// Word index of the first word of this buffer.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Returns the underlying storage.
    pub fn into_inner(self) -> W {
        self.words
    }
}

impl<B: BufferKind> Buffer<B, Vec<u32>> {
    /// Allocates a zeroed buffer of `len` words.
    pub fn zeroed(len: u32) -> Self {
        Self::new(vec![0; len as usize])
    }
}

impl<B: BufferKind, W: AsRef<[u32]>> Buffer<B, W> {
    /// The words of this buffer.
    pub fn words(&self) -> &[u32] {
        self.words.as_ref()
    }

    /// The words of this buffer as bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.words())
    }

    /// Number of words in this buffer.
    pub fn len(&self) -> usize {
        self.words().len()
    }

    /// Whether this buffer has no words.
    pub fn is_empty(&self) -> bool {
        self.words().is_empty()
    }

    /// Returns a read-only view of this buffer.
    pub fn view(&self) -> Buffer<B, &[u32]> {
        Buffer::with_base(self.words(), self.base)
    }

    #[inline]
    fn local_ix(&self, word_ix: usize) -> usize {
        debug_assert!(
            word_ix >= self.base as usize,
            "reference below the start of this {} buffer window",
            B::NAME
        );
        word_ix - self.base as usize
    }

    /// Decodes the record at `r`.
    #[inline]
    pub fn read<T: Record<Buffer = B>>(&self, r: Ref<T>) -> T {
        let ix = self.local_ix(r.word_ix());
        T::read(&self.words()[ix..])
    }

    /// Reads the header of the union slot at `r`.
    #[inline]
    pub fn tag_of<U: TaggedUnion<Buffer = B>>(&self, r: Ref<U>) -> TagFlags<U::Tag> {
        let ix = self.local_ix(r.word_ix());
        TagFlags::from_word(self.words()[ix])
    }

    /// Reads the slot at `r` as the variant with payload `P`.
    ///
    /// The tag is not checked: reading a variant other than the one stored
    /// yields whatever the payload words decode to.
    #[inline]
    pub fn read_variant<U, P>(&self, r: Ref<U>) -> P
    where
        U: TaggedUnion<Buffer = B>,
        P: Record<Buffer = B>,
    {
        self.read(r.payload::<P>())
    }

    /// Decodes the union slot at `r` after dispatching on its tag.
    ///
    /// Returns `None` for a tag the union does not define.
    pub fn decode<U: TaggedUnion<Buffer = B>>(&self, r: Ref<U>) -> Option<U> {
        let TagFlags { tag, .. } = self.tag_of(r);
        let ix = self.local_ix(r.word_ix());
        let value = U::decode(tag, &self.words()[ix + 1..]);
        if value.is_none() {
            log::warn!(
                "unknown tag {tag:?} in {} buffer at offset {}",
                B::NAME,
                r.offset()
            );
        }
        value
    }

    /// Iterates over `count` consecutive union slots starting at `first`,
    /// yielding each slot's reference and header.
    pub fn slots<U: TaggedUnion<Buffer = B> + 'static>(
        &self,
        first: Ref<U>,
        count: u32,
    ) -> impl Iterator<Item = (Ref<U>, TagFlags<U::Tag>)> + '_ {
        (0..count).map(move |i| {
            let r = first.index(i);
            (r, self.tag_of(r))
        })
    }
}

impl<B: BufferKind, W: AsRef<[u32]> + AsMut<[u32]>> Buffer<B, W> {
    /// The words of this buffer, mutably.
    pub fn words_mut(&mut self) -> &mut [u32] {
        self.words.as_mut()
    }

    /// Encodes `value` at `r`.
    #[inline]
    pub fn write<T: Record<Buffer = B>>(&mut self, r: Ref<T>, value: &T) {
        let ix = self.local_ix(r.word_ix());
        value.write(&mut self.words_mut()[ix..]);
    }

    #[inline]
    fn write_tag<U: TaggedUnion<Buffer = B>>(&mut self, r: Ref<U>, tag: U::Tag) {
        let ix = self.local_ix(r.word_ix());
        let header = &mut self.words_mut()[ix];
        *header = (*header & 0xffff_0000) | Into::<u16>::into(tag) as u32;
    }

    /// Writes the slot at `r` as a variant: `tag` in the header, then
    /// `payload` right after it. The header's flag bits are left untouched.
    ///
    /// The caller is responsible for `tag` naming a variant whose payload
    /// type is `P`.
    #[inline]
    pub fn write_variant<U, P>(&mut self, r: Ref<U>, tag: U::Tag, payload: &P)
    where
        U: TaggedUnion<Buffer = B>,
        P: Record<Buffer = B>,
    {
        self.write_tag(r, tag);
        self.write(r.payload::<P>(), payload);
    }

    /// Marks the slot at `r` as no-op. Payload words keep their old contents.
    #[inline]
    pub fn write_nop<U: TaggedUnion<Buffer = B>>(&mut self, r: Ref<U>) {
        self.write_tag(r, U::NOP);
    }

    /// Sets the high 16 bits of the header of the slot at `r`, keeping the tag.
    #[inline]
    pub fn set_flags<U: TaggedUnion<Buffer = B>>(&mut self, r: Ref<U>, flags: u16) {
        let ix = self.local_ix(r.word_ix());
        let header = &mut self.words_mut()[ix];
        *header = (*header & 0xffff) | (flags as u32) << 16;
    }

    /// Encodes a whole union value at `r`, like the matching `write_*`
    /// accessor (or [`write_nop`](Self::write_nop)) would.
    pub fn encode<U: TaggedUnion<Buffer = B>>(&mut self, r: Ref<U>, value: &U) {
        self.write_tag(r, value.tag());
        let ix = self.local_ix(r.word_ix());
        value.encode_payload(&mut self.words_mut()[ix + 1..]);
    }

    /// Encodes a whole union value at `r` with explicit header flags.
    pub fn encode_with_flags<U: TaggedUnion<Buffer = B>>(
        &mut self,
        r: Ref<U>,
        value: &U,
        flags: u16,
    ) {
        self.encode(r, value);
        self.set_flags(r, flags);
    }

    /// Splits this buffer into disjoint mutable windows, one per byte range
    /// of the capacity plan, so that each can be handed to its own task.
    ///
    /// Ranges must be word aligned, sorted, non-overlapping, and inside this
    /// buffer. Windows keep absolute addressing: a `Ref` computed against the
    /// whole buffer can be used directly on the window containing it.
    pub fn partition(&mut self, ranges: &[Range<u32>]) -> Result<Vec<Buffer<B, &mut [u32]>>> {
        let base = self.base;
        let len = self.len() as u32;
        let end_of_buffer = (base + len) * 4;
        let mut last_end = base * 4;
        for range in ranges {
            for offset in [range.start, range.end] {
                if offset % 4 != 0 {
                    return Err(Error::Misaligned {
                        buffer: B::NAME,
                        offset,
                    });
                }
            }
            if range.start < last_end || range.end < range.start {
                return Err(Error::Overlap {
                    buffer: B::NAME,
                    offset: range.start,
                });
            }
            if range.end > end_of_buffer {
                return Err(Error::OutOfBounds {
                    buffer: B::NAME,
                    end: range.end,
                    len: end_of_buffer,
                });
            }
            last_end = range.end;
        }

        let mut windows = Vec::with_capacity(ranges.len());
        let mut rest = self.words_mut();
        let mut rest_base = base;
        for range in ranges {
            let (start, end) = (range.start / 4, range.end / 4);
            let (_, tail) = std::mem::take(&mut rest).split_at_mut((start - rest_base) as usize);
            let (window, tail) = tail.split_at_mut((end - start) as usize);
            log::trace!("{} buffer window: words {start}..{end}", B::NAME);
            windows.push(Buffer::with_base(window, start));
            rest = tail;
            rest_base = end;
        }
        Ok(windows)
    }
}

impl<B: BufferKind, W: AsRef<[u32]>> fmt::Debug for Buffer<B, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("kind", &B::NAME)
            .field("base", &self.base)
            .field("len", &self.len())
            .finish()
    }
}

impl<B: BufferKind, W: Clone> Clone for Buffer<B, W> {
    fn clone(&self) -> Self {
        Self::with_base(self.words.clone(), self.base)
    }
}
