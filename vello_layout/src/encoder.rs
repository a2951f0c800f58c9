// Copyright 2022 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host side producer of the scene buffer.

use peniko::kurbo::{self, PathEl};

use crate::buffer::SceneBuffer;
use crate::config::BufferSize;
use crate::record::Layout;
use crate::reference::Ref;
use crate::scene::{
    Clip, CubicSeg, Element, Fill, FillImage, LineSeg, QuadSeg, SetLineWidth, Stroke, Transform,
};

/// Whether path segments belong to a filled or a stroked path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Fill,
    Stroke,
}

/// Appends [`Element`] slots to a growing scene buffer.
///
/// Slots are laid out contiguously at the union stride, so the `n`-th
/// element encoded is at `Ref::new(0).index(n)`.
#[derive(Clone, Debug, Default)]
pub struct SceneEncoder {
    words: Vec<u32>,
    n_elements: u32,
    line_width: Option<f32>,
}

impl SceneEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements encoded so far.
    pub fn len(&self) -> u32 {
        self.n_elements
    }

    pub fn is_empty(&self) -> bool {
        self.n_elements == 0
    }

    /// Size of the scene buffer needed for what has been encoded.
    pub fn buffer_size(&self) -> BufferSize<Element> {
        BufferSize::new(self.n_elements)
    }

    /// Clears the encoder for reuse, keeping its allocation.
    pub fn reset(&mut self) {
        self.words.clear();
        self.n_elements = 0;
        self.line_width = None;
    }

    /// Allocates a slot and encodes `element` into it.
    pub fn encode(&mut self, element: &Element) -> Ref<Element> {
        let r = Ref::<Element>::new(0).index(self.n_elements);
        self.words.resize(self.words.len() + Element::SIZE as usize, 0);
        SceneBuffer::<&mut [u32]>::new(self.words.as_mut_slice()).encode(r, element);
        self.n_elements += 1;
        r
    }

    /// Encodes the segments of a path.
    ///
    /// Closing a subpath whose current point differs from its start emits a
    /// closing line segment. Returns the number of segments encoded.
    pub fn encode_path(&mut self, path: impl IntoIterator<Item = PathEl>, style: Style) -> u32 {
        let mut n_segments = 0;
        let mut start_pt = None;
        let mut last_pt = None;
        for el in path {
            let element = match el {
                PathEl::MoveTo(p) => {
                    start_pt = Some(p);
                    last_pt = Some(p);
                    continue;
                }
                PathEl::LineTo(p1) => {
                    let Some(p0) = last_pt.replace(p1) else {
                        log::warn!("line segment without a current point");
                        continue;
                    };
                    line(LineSeg::new(p0, p1), style)
                }
                PathEl::QuadTo(p1, p2) => {
                    let Some(p0) = last_pt.replace(p2) else {
                        log::warn!("quad segment without a current point");
                        continue;
                    };
                    quad(QuadSeg::new(p0, p1, p2), style)
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    let Some(p0) = last_pt.replace(p3) else {
                        log::warn!("cubic segment without a current point");
                        continue;
                    };
                    cubic(CubicSeg::new(p0, p1, p2, p3), style)
                }
                PathEl::ClosePath => match (start_pt, last_pt) {
                    (Some(start), Some(last)) if start != last => {
                        last_pt = Some(start);
                        line(LineSeg::new(last, start), style)
                    }
                    _ => continue,
                },
            };
            self.encode(&element);
            n_segments += 1;
        }
        n_segments
    }

    /// Fills the preceding segments with a solid color.
    pub fn fill(&mut self, rgba_color: u32) -> Ref<Element> {
        self.encode(&Element::Fill(Fill { rgba_color }))
    }

    /// Strokes the preceding segments, setting the line width first if it
    /// changed since the last stroke.
    pub fn stroke(&mut self, rgba_color: u32, width: f32) -> Ref<Element> {
        if self.line_width != Some(width) {
            self.encode(&Element::SetLineWidth(SetLineWidth { width }));
            self.line_width = Some(width);
        }
        self.encode(&Element::Stroke(Stroke { rgba_color }))
    }

    /// Sets the transform for subsequent elements.
    pub fn transform(&mut self, transform: &kurbo::Affine) -> Ref<Element> {
        self.encode(&Element::Transform(Transform::from_kurbo(transform)))
    }

    /// Begins a clip with the given bounding box.
    pub fn begin_clip(&mut self, bbox: kurbo::Rect) -> Ref<Element> {
        self.encode(&Element::BeginClip(Clip::from_rect(bbox)))
    }

    /// Ends the clip begun with the given bounding box.
    pub fn end_clip(&mut self, bbox: kurbo::Rect) -> Ref<Element> {
        self.encode(&Element::EndClip(Clip::from_rect(bbox)))
    }

    /// Fills the preceding segments with an image.
    pub fn fill_image(&mut self, index: u32, offset: [i32; 2]) -> Ref<Element> {
        self.encode(&Element::FillImage(FillImage { index, offset }))
    }

    /// Returns the encoded scene buffer.
    pub fn finish(self) -> SceneBuffer {
        log::debug!(
            "encoded {} scene elements ({} bytes)",
            self.n_elements,
            self.buffer_size().size_in_bytes()
        );
        SceneBuffer::new(self.words)
    }
}

fn line(seg: LineSeg, style: Style) -> Element {
    match style {
        Style::Fill => Element::FillLine(seg),
        Style::Stroke => Element::StrokeLine(seg),
    }
}

fn quad(seg: QuadSeg, style: Style) -> Element {
    match style {
        Style::Fill => Element::FillQuad(seg),
        Style::Stroke => Element::StrokeQuad(seg),
    }
}

fn cubic(seg: CubicSeg, style: Style) -> Element {
    match style {
        Style::Fill => Element::FillCubic(seg),
        Style::Stroke => Element::StrokeCubic(seg),
    }
}

#[cfg(test)]
mod tests {
    use peniko::kurbo::{Affine, BezPath, Rect};

    use super::{SceneEncoder, Style};
    use crate::{Element, ElementTag, LineSeg, Ref, Transform};

    fn tags(encoder: SceneEncoder) -> Vec<ElementTag> {
        let n = encoder.len();
        let scene = encoder.finish();
        let tags = scene
            .slots(Ref::<Element>::new(0), n)
            .map(|(_, header)| header.tag)
            .collect();
        tags
    }

    #[test]
    fn triangle_closes() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        path.close_path();
        let mut encoder = SceneEncoder::new();
        assert_eq!(encoder.encode_path(path.iter(), Style::Fill), 3);
        encoder.fill(0xff00_00ff);
        let n = encoder.len();
        let scene = encoder.finish();
        assert_eq!(scene.len(), n as usize * 9);
        let closing = Ref::<Element>::new(0).index(2);
        assert_eq!(scene.tag_of(closing).tag, ElementTag::FILL_LINE);
        assert_eq!(
            scene.read_fill_line(closing),
            LineSeg {
                p0: [10.0, 10.0],
                p1: [0.0, 0.0],
            }
        );
        assert_eq!(scene.read_fill(Ref::<Element>::new(0).index(3)).rgba_color, 0xff00_00ff);
    }

    #[test]
    fn curves_keep_style() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.quad_to((1.0, 1.0), (2.0, 0.0));
        path.curve_to((3.0, 1.0), (4.0, 1.0), (5.0, 0.0));
        let mut encoder = SceneEncoder::new();
        encoder.encode_path(path.iter(), Style::Stroke);
        encoder.stroke(1, 2.0);
        assert_eq!(
            tags(encoder),
            [
                ElementTag::STROKE_QUAD,
                ElementTag::STROKE_CUBIC,
                ElementTag::SET_LINE_WIDTH,
                ElementTag::STROKE,
            ]
        );
    }

    #[test]
    fn line_width_is_deduplicated() {
        let mut encoder = SceneEncoder::new();
        encoder.stroke(1, 2.0);
        encoder.stroke(2, 2.0);
        encoder.stroke(3, 4.0);
        assert_eq!(
            tags(encoder),
            [
                ElementTag::SET_LINE_WIDTH,
                ElementTag::STROKE,
                ElementTag::STROKE,
                ElementTag::SET_LINE_WIDTH,
                ElementTag::STROKE,
            ]
        );
    }

    #[test]
    fn decodes_what_was_encoded() {
        let elements = [
            Element::Transform(Transform::from_kurbo(&Affine::translate((3.0, 4.0)))),
            Element::BeginClip(crate::Clip::from_rect(Rect::new(0.0, 0.0, 4.0, 4.0))),
            Element::FillImage(crate::FillImage {
                index: 2,
                offset: [-5, 6],
            }),
            Element::Nop,
            Element::EndClip(crate::Clip::from_rect(Rect::new(0.0, 0.0, 4.0, 4.0))),
        ];
        let mut encoder = SceneEncoder::new();
        let refs = elements
            .iter()
            .map(|el| encoder.encode(el))
            .collect::<Vec<_>>();
        let scene = encoder.finish();
        for (r, el) in refs.into_iter().zip(elements) {
            assert_eq!(scene.decode(r), Some(el));
        }
    }

    #[test]
    fn reset_clears() {
        let mut encoder = SceneEncoder::new();
        encoder.stroke(1, 1.0);
        encoder.reset();
        assert!(encoder.is_empty());
        encoder.stroke(1, 1.0);
        assert_eq!(encoder.len(), 2);
        assert_eq!(encoder.buffer_size().size_in_words(), 18);
    }
}
