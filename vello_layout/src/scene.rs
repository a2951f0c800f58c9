// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records of the scene buffer.

use bytemuck::{Pod, Zeroable};
use peniko::kurbo;

use crate::record::{pod_records, Layout, Record};
use crate::reference::SceneKind;
use crate::union::tagged_union;

/// Line segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct LineSeg {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
}

/// Quadratic Bézier segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct QuadSeg {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub p2: [f32; 2],
}

/// Cubic Bézier segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct CubicSeg {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub p2: [f32; 2],
    pub p3: [f32; 2],
}

/// Fill the preceding path with a solid color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct Fill {
    /// Packed RGBA color.
    pub rgba_color: u32,
}

/// Stroke the preceding path with a solid color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct Stroke {
    /// Packed RGBA color.
    pub rgba_color: u32,
}

/// Line width for subsequent strokes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct SetLineWidth {
    pub width: f32,
}

/// Affine transformation matrix.
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct Transform {
    /// 2x2 matrix, column major.
    pub mat: [f32; 4],
    /// Translation.
    pub translate: [f32; 2],
}

/// Begin or end of a clip region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct Clip {
    /// Bounding box as `[x0, y0, x1, y1]`.
    pub bbox: [f32; 4],
}

/// Fill the preceding path with an image.
///
/// The offset is stored packed in a single word, x in the low half and y in
/// the high half, each as a signed 16-bit value. Components outside the
/// `i16` range wrap when encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillImage {
    /// Index of the image.
    pub index: u32,
    /// Offset of the image origin in pixels.
    pub offset: [i32; 2],
}

pod_records!(SceneKind {
    LineSeg = 4,
    QuadSeg = 6,
    CubicSeg = 8,
    Fill = 1,
    Stroke = 1,
    SetLineWidth = 1,
    Transform = 6,
    Clip = 4,
});

impl Layout for FillImage {
    type Buffer = SceneKind;
    const SIZE: u32 = 2;
}

impl Record for FillImage {
    #[inline]
    fn read(words: &[u32]) -> Self {
        let packed = words[1];
        Self {
            index: words[0],
            offset: [((packed << 16) as i32) >> 16, (packed as i32) >> 16],
        }
    }

    #[inline]
    fn write(&self, words: &mut [u32]) {
        words[0] = self.index;
        words[1] = (self.offset[0] as u32 & 0xffff) | (self.offset[1] as u32) << 16;
    }
}

tagged_union! {
    /// An element of the scene stream.
    pub enum Element: ElementTag in SceneKind {
        /// Stroke a line segment.
        StrokeLine(LineSeg) = STROKE_LINE(1) => read_stroke_line, write_stroke_line;
        /// Line segment of a filled path.
        FillLine(LineSeg) = FILL_LINE(2) => read_fill_line, write_fill_line;
        /// Stroke a quadratic segment.
        StrokeQuad(QuadSeg) = STROKE_QUAD(3) => read_stroke_quad, write_stroke_quad;
        /// Quadratic segment of a filled path.
        FillQuad(QuadSeg) = FILL_QUAD(4) => read_fill_quad, write_fill_quad;
        /// Stroke a cubic segment.
        StrokeCubic(CubicSeg) = STROKE_CUBIC(5) => read_stroke_cubic, write_stroke_cubic;
        /// Cubic segment of a filled path.
        FillCubic(CubicSeg) = FILL_CUBIC(6) => read_fill_cubic, write_fill_cubic;
        /// Stroke the preceding segments.
        Stroke(Stroke) = STROKE(7) => read_stroke, write_stroke;
        /// Fill the preceding segments.
        Fill(Fill) = FILL(8) => read_fill, write_fill;
        /// Set the line width.
        SetLineWidth(SetLineWidth) = SET_LINE_WIDTH(9) => read_set_line_width, write_set_line_width;
        /// Set the current transform.
        Transform(Transform) = TRANSFORM(10) => read_transform, write_transform;
        /// Push a clip.
        BeginClip(Clip) = BEGIN_CLIP(11) => read_begin_clip, write_begin_clip;
        /// Pop a clip.
        EndClip(Clip) = END_CLIP(12) => read_end_clip, write_end_clip;
        /// Fill the preceding segments with an image.
        FillImage(FillImage) = FILL_IMAGE(13) => read_fill_image, write_fill_image;
    }
}

static_assertions::const_assert_eq!(Element::SIZE, 9);

impl Element {
    /// Whether this element is a path segment.
    pub fn is_segment(&self) -> bool {
        matches!(
            self,
            Self::StrokeLine(_)
                | Self::FillLine(_)
                | Self::StrokeQuad(_)
                | Self::FillQuad(_)
                | Self::StrokeCubic(_)
                | Self::FillCubic(_)
        )
    }
}

impl LineSeg {
    pub fn new(p0: kurbo::Point, p1: kurbo::Point) -> Self {
        Self {
            p0: to_f32_2(p0),
            p1: to_f32_2(p1),
        }
    }
}

impl QuadSeg {
    pub fn new(p0: kurbo::Point, p1: kurbo::Point, p2: kurbo::Point) -> Self {
        Self {
            p0: to_f32_2(p0),
            p1: to_f32_2(p1),
            p2: to_f32_2(p2),
        }
    }
}

impl CubicSeg {
    pub fn new(p0: kurbo::Point, p1: kurbo::Point, p2: kurbo::Point, p3: kurbo::Point) -> Self {
        Self {
            p0: to_f32_2(p0),
            p1: to_f32_2(p1),
            p2: to_f32_2(p2),
            p3: to_f32_2(p3),
        }
    }
}

impl From<kurbo::Line> for LineSeg {
    fn from(line: kurbo::Line) -> Self {
        Self::new(line.p0, line.p1)
    }
}

impl From<kurbo::QuadBez> for QuadSeg {
    fn from(quad: kurbo::QuadBez) -> Self {
        Self::new(quad.p0, quad.p1, quad.p2)
    }
}

impl From<kurbo::CubicBez> for CubicSeg {
    fn from(cubic: kurbo::CubicBez) -> Self {
        Self::new(cubic.p0, cubic.p1, cubic.p2, cubic.p3)
    }
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        mat: [1.0, 0.0, 0.0, 1.0],
        translate: [0.0; 2],
    };

    /// Creates a transform from a kurbo affine matrix.
    pub fn from_kurbo(transform: &kurbo::Affine) -> Self {
        let c = transform.as_coeffs().map(|x| x as f32);
        Self {
            mat: [c[0], c[1], c[2], c[3]],
            translate: [c[4], c[5]],
        }
    }

    /// Converts the transform to a kurbo affine matrix.
    pub fn to_kurbo(&self) -> kurbo::Affine {
        kurbo::Affine::new(
            [
                self.mat[0],
                self.mat[1],
                self.mat[2],
                self.mat[3],
                self.translate[0],
                self.translate[1],
            ]
            .map(|x| x as f64),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Clip {
    pub fn from_rect(rect: kurbo::Rect) -> Self {
        Self {
            bbox: [rect.x0, rect.y0, rect.x1, rect.y1].map(|x| x as f32),
        }
    }
}

fn to_f32_2(point: kurbo::Point) -> [f32; 2] {
    [point.x as f32, point.y as f32]
}

#[cfg(test)]
mod tests {
    use peniko::kurbo::{Affine, Point, Rect};

    use super::*;
    use crate::{Ref, SceneBuffer};

    fn round_trip<T: Record<Buffer = SceneKind> + PartialEq + std::fmt::Debug>(value: T) {
        let mut buf = SceneBuffer::zeroed(2 * T::SIZE + 1);
        let r = Ref::<T>::from_word(1).index(1);
        buf.write(r, &value);
        assert_eq!(buf.read(r), value);
        // Nothing outside the record's own words was touched.
        let start = r.word_ix();
        let end = start + T::SIZE as usize;
        assert!(buf.words()[..start].iter().all(|w| *w == 0));
        assert!(buf.words()[end..].iter().all(|w| *w == 0));
    }

    #[test]
    fn records_round_trip() {
        round_trip(LineSeg {
            p0: [1.5, -2.0],
            p1: [f32::MAX, f32::MIN_POSITIVE],
        });
        round_trip(QuadSeg {
            p0: [0.0, 1.0],
            p1: [2.0, 3.0],
            p2: [-4.0, 5.25],
        });
        round_trip(CubicSeg {
            p0: [0.0, 1.0],
            p1: [2.0, 3.0],
            p2: [4.0, 5.0],
            p3: [6.0, -7.0],
        });
        round_trip(Fill {
            rgba_color: 0xff00_ff00,
        });
        round_trip(Stroke {
            rgba_color: u32::MAX,
        });
        round_trip(SetLineWidth { width: 0.5 });
        round_trip(Clip {
            bbox: [0.0, 0.0, 100.0, 50.0],
        });
        round_trip(FillImage {
            index: 3,
            offset: [-12, 400],
        });
    }

    #[test]
    fn transform_exact() {
        let mut buf = SceneBuffer::zeroed(16);
        let r = Ref::<Transform>::new(20);
        let t = Transform {
            mat: [1.0, 0.0, 0.0, 1.0],
            translate: [10.5, -3.25],
        };
        buf.write(r, &t);
        let back = buf.read(r);
        assert_eq!(back.mat, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(back.translate, [10.5, -3.25]);
    }

    #[test]
    fn floats_are_bit_exact() {
        let mut buf = SceneBuffer::zeroed(1);
        let r = Ref::<SetLineWidth>::new(0);
        for bits in [0x7fc0_0001, 0xffc0_1234, 0x8000_0000, 0x0000_0001] {
            buf.write(
                r,
                &SetLineWidth {
                    width: f32::from_bits(bits),
                },
            );
            assert_eq!(buf.words()[0], bits);
            assert_eq!(buf.read(r).width.to_bits(), bits);
        }
    }

    #[test]
    fn fill_image_offset_boundaries() {
        let mut buf = SceneBuffer::zeroed(2);
        let r = Ref::<FillImage>::new(0);
        let cases = [
            ([32767, -32768], [32767, -32768]),
            ([-32767, 32767], [-32767, 32767]),
            ([-1, 0], [-1, 0]),
            ([0, -1], [0, -1]),
            ([32768, -32769], [-32768, 32767]),
            ([65536, 65535], [0, -1]),
        ];
        for (offset, expected) in cases {
            buf.write(r, &FillImage { index: 9, offset });
            let back = buf.read(r);
            assert_eq!(back.index, 9);
            assert_eq!(back.offset, expected, "offset {offset:?}");
        }
    }

    #[test]
    fn fill_image_packing() {
        let mut buf = SceneBuffer::zeroed(2);
        buf.write(
            Ref::new(0),
            &FillImage {
                index: 1,
                offset: [-2, 3],
            },
        );
        assert_eq!(buf.words()[1], 0x0003_fffe);
    }

    #[test]
    fn sizes() {
        assert_eq!(LineSeg::SIZE, 4);
        assert_eq!(QuadSeg::SIZE, 6);
        assert_eq!(CubicSeg::SIZE, 8);
        assert_eq!(Fill::SIZE, 1);
        assert_eq!(FillImage::SIZE, 2);
        assert_eq!(Stroke::SIZE, 1);
        assert_eq!(SetLineWidth::SIZE, 1);
        assert_eq!(Transform::SIZE, 6);
        assert_eq!(Clip::SIZE, 4);
        assert_eq!(Element::SIZE, 9);
        assert_eq!(Element::SIZE_IN_BYTES, 36);
    }

    #[test]
    fn tag_values() {
        let tags = [
            ElementTag::NOP,
            ElementTag::STROKE_LINE,
            ElementTag::FILL_LINE,
            ElementTag::STROKE_QUAD,
            ElementTag::FILL_QUAD,
            ElementTag::STROKE_CUBIC,
            ElementTag::FILL_CUBIC,
            ElementTag::STROKE,
            ElementTag::FILL,
            ElementTag::SET_LINE_WIDTH,
            ElementTag::TRANSFORM,
            ElementTag::BEGIN_CLIP,
            ElementTag::END_CLIP,
            ElementTag::FILL_IMAGE,
        ];
        for (i, tag) in tags.into_iter().enumerate() {
            assert_eq!(tag.0 as usize, i);
        }
    }

    #[test]
    fn kurbo_conversions() {
        let affine = Affine::new([2.0, 0.5, -0.5, 2.0, 10.0, 20.0]);
        let t = Transform::from_kurbo(&affine);
        assert_eq!(t.mat, [2.0, 0.5, -0.5, 2.0]);
        assert_eq!(t.translate, [10.0, 20.0]);
        assert_eq!(t.to_kurbo(), affine);

        let clip = Clip::from_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(clip.bbox, [1.0, 2.0, 3.0, 4.0]);

        let seg = LineSeg::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        assert_eq!(seg.p1, [3.0, 4.0]);
    }
}
