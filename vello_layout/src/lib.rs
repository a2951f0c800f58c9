// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Record layout and tagged-union codec for the scene and annotated buffers.
//!
//! The host encoder and the compute stages of the pipeline exchange data
//! through flat buffers of 32-bit words. This crate fixes how typed records
//! and tagged unions are laid out in those buffers, and provides the read and
//! write operations both sides use:
//!
//! - [`Ref`] is a typed byte offset into a buffer. Its type parameter ties it
//!   to the buffer kind, so scene and annotated offsets cannot be mixed up.
//! - [`Record`] types (`LineSeg`, `Transform`, `AnnoFill`, ...) occupy a
//!   constant number of words and encode floats as their raw bits.
//! - [`TaggedUnion`] types ([`Element`], [`Annotated`]) are a header word
//!   (tag in the low half, flags in the high half) followed by the payload of
//!   the active variant, with a fixed stride per union.
//! - [`Buffer`] binds these codecs to word storage.
//!
//! None of the codec operations are checked: references are trusted to be in
//! bounds and union accessors trust the caller to have dispatched on the tag.
//! The only fallible operation is splitting a buffer according to a capacity
//! plan ([`Buffer::partition`]).
//!
//! ```
//! use vello_layout::{Element, ElementTag, Fill, Layout, Ref, SceneBuffer};
//!
//! let mut scene = SceneBuffer::zeroed(Element::SIZE);
//! let slot = Ref::<Element>::new(0);
//! scene.write_fill(slot, &Fill { rgba_color: 0xff00ff00 });
//! assert_eq!(scene.tag_of(slot).tag, ElementTag::FILL);
//! assert_eq!(scene.read_fill(slot).rgba_color, 0xff00ff00);
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod annotated;
mod buffer;
mod config;
mod encoder;
mod record;
mod reference;
mod scene;
mod union;

use thiserror::Error;

pub use annotated::{AnnoFill, AnnoFillMask, AnnoStroke, Annotated, AnnotatedTag};
pub use buffer::{AnnotatedBuffer, Buffer, SceneBuffer};
pub use config::{BufferSize, BufferSizes};
pub use encoder::{SceneEncoder, Style};
pub use record::{Layout, Record};
pub use reference::{AnnotatedKind, BufferKind, Ref, SceneKind};
pub use scene::{
    Clip, CubicSeg, Element, ElementTag, Fill, FillImage, LineSeg, QuadSeg, SetLineWidth, Stroke,
    Transform,
};
pub use union::{TagFlags, TaggedUnion};

/// Errors from validating a capacity plan against a buffer.
///
/// The codec itself never fails; these only come from
/// [`Buffer::partition`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A planned offset is not a multiple of 4 bytes.
    #[error("misaligned offset {offset} in {buffer} buffer")]
    Misaligned { buffer: &'static str, offset: u32 },

    /// A planned range starts before the previous one ends.
    #[error("range at offset {offset} overlaps an earlier range in {buffer} buffer")]
    Overlap { buffer: &'static str, offset: u32 },

    /// A planned range ends past the end of the buffer.
    #[error("range ends at byte {end} but {buffer} buffer is {len} bytes")]
    OutOfBounds {
        buffer: &'static str,
        end: u32,
        len: u32,
    },
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
