// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records of the annotated buffer.
//!
//! Each slot holds the resolved attributes of one drawing primitive, written
//! by the element processing stage and read by binning and coarse rasterization.

use bytemuck::{Pod, Zeroable};
use peniko::kurbo;

use crate::record::{pod_records, Layout};
use crate::reference::AnnotatedKind;
use crate::union::tagged_union;

/// Resolved solid fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct AnnoFill {
    pub rgba_color: u32,
    pub bbox: [f32; 4],
}

/// Resolved mask fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct AnnoFillMask {
    /// Mask weight.
    pub mask: f32,
    pub bbox: [f32; 4],
}

/// Resolved stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct AnnoStroke {
    pub rgba_color: u32,
    pub bbox: [f32; 4],
    // For the nonuniform scale case, this needs to be a 2x2 matrix.
    pub linewidth: f32,
}

pod_records!(AnnotatedKind {
    AnnoFill = 5,
    AnnoFillMask = 5,
    AnnoStroke = 6,
});

tagged_union! {
    /// An annotated drawing primitive.
    pub enum Annotated: AnnotatedTag in AnnotatedKind {
        /// Stroke with a solid color.
        Stroke(AnnoStroke) = STROKE(1) => read_stroke, write_stroke;
        /// Fill with a solid color.
        Fill(AnnoFill) = FILL(2) => read_fill, write_fill;
        /// Multiply the mask by the coverage of the path.
        FillMask(AnnoFillMask) = FILL_MASK(3) => read_fill_mask, write_fill_mask;
        /// Multiply the mask by the inverse coverage of the path.
        FillMaskInv(AnnoFillMask) = FILL_MASK_INV(4) => read_fill_mask_inv, write_fill_mask_inv;
    }
}

static_assertions::const_assert_eq!(Annotated::SIZE, 7);

impl Annotated {
    /// Bounding box of the primitive, if it has one.
    pub fn bbox(&self) -> Option<[f32; 4]> {
        match self {
            Self::Nop => None,
            Self::Stroke(stroke) => Some(stroke.bbox),
            Self::Fill(fill) => Some(fill.bbox),
            Self::FillMask(mask) | Self::FillMaskInv(mask) => Some(mask.bbox),
        }
    }
}

impl AnnoFill {
    pub fn new(rgba_color: u32, bbox: kurbo::Rect) -> Self {
        Self {
            rgba_color,
            bbox: rect_to_bbox(bbox),
        }
    }
}

impl AnnoFillMask {
    pub fn new(mask: f32, bbox: kurbo::Rect) -> Self {
        Self {
            mask,
            bbox: rect_to_bbox(bbox),
        }
    }
}

impl AnnoStroke {
    pub fn new(rgba_color: u32, bbox: kurbo::Rect, linewidth: f32) -> Self {
        Self {
            rgba_color,
            bbox: rect_to_bbox(bbox),
            linewidth,
        }
    }
}

fn rect_to_bbox(rect: kurbo::Rect) -> [f32; 4] {
    [rect.x0, rect.y0, rect.x1, rect.y1].map(|x| x as f32)
}
