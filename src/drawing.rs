// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::{Serialize, Serializer};

use crate::palette::PaletteColor;

/// Version of the emitted drawing document.
pub const DRAWING_VERSION: u32 = 3;

/// Half-extent of the square drawing canvas, in drawing units.
///
/// Both axes span `[-DRAWING_SCALE, DRAWING_SCALE]`.
pub const DRAWING_SCALE: f64 = 10.0;

/// Grid step of the downstream editor.
pub const GRID_SIZE: f64 = 0.71428571428571;

/// Resolution of the baked fill layer, in pixels per drawing unit.
pub const FILL_PIXELS_PER_UNIT: f64 = 25.6;

/// A path segment style tag.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SegmentStyle {
    /// A straight line, or a quadratic curve when a bend point is present.
    Line,
    /// A clockwise arc. Reserved: the converter never emits it.
    ArcClockwise,
    /// A counter-clockwise arc. Reserved: the converter never emits it.
    ArcCounterClockwise,
}

impl SegmentStyle {
    /// Returns the numeric tag used by the document schema.
    pub fn tag(self) -> u8 {
        match self {
            SegmentStyle::Line => 1,
            SegmentStyle::ArcClockwise => 2,
            SegmentStyle::ArcCounterClockwise => 3,
        }
    }
}

impl Serialize for SegmentStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

/// A quadratic control point stored alongside a segment.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct BendPoint {
    pub x: f64,
    pub y: f64,
}

/// A single path segment of the target drawing.
#[derive(Clone, Debug, Serialize)]
pub struct Segment {
    /// Segment endpoints as `[x1, y1, x2, y2]`, in drawing units.
    pub p: [f64; 4],

    /// Style tag.
    pub s: SegmentStyle,

    /// Fill flag. `true` means fill-only, no outline.
    pub f: bool,

    /// Quadratic control point. Its absence means a straight line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp: Option<BendPoint>,

    /// Segment color as `[r, g, b, a]` floats in [0, 1].
    ///
    /// An absent color renders as black.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<[f64; 4]>,

    /// Transparency flag.
    #[serde(rename = "isTransparent", skip_serializing_if = "Option::is_none")]
    pub is_transparent: Option<bool>,
}

/// Bounds of the baked fill image, in drawing units.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// A single animation frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Whether the frame is linked to the previous one.
    pub is_linked: bool,

    /// Segments in draw order.
    pub path_data_list: Vec<Segment>,

    /// Bounds of the baked fill image.
    pub fill_image_bounds: Bounds,

    /// Base64-encoded PNG body of the fill layer, without a data-URI prefix.
    ///
    /// Empty when the fill layer could not be rendered.
    pub fill_png: String,
}

/// A drawing layer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Human-readable layer title.
    pub title: String,

    /// A unique layer id, freshly generated per conversion.
    pub id: String,

    /// Layer visibility.
    pub is_visible: bool,

    /// Whether the layer holds raster data. Always `false` here.
    pub is_bitmap: bool,

    /// Layer frames. The converter emits exactly one.
    pub frames: Vec<Frame>,
}

impl Layer {
    /// Creates the single imported layer around one frame.
    pub fn imported(frame: Frame) -> Self {
        Layer {
            title: "Imported".to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            is_visible: true,
            is_bitmap: false,
            frames: vec![frame],
        }
    }
}

/// The target drawing document.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    /// Document format version.
    pub version: u32,

    /// Canvas half-extent in drawing units.
    pub scale: f64,

    /// Editor grid step.
    pub grid_size: f64,

    /// Fill layer resolution.
    pub fill_pixels_per_unit: f64,

    /// The palette.
    pub colors: Vec<PaletteColor>,

    /// Drawing layers. The converter emits exactly one.
    pub layers: Vec<Layer>,
}

impl Drawing {
    /// Creates a drawing document with the fixed schema constants.
    pub fn new(colors: Vec<PaletteColor>, layer: Layer) -> Self {
        Drawing {
            version: DRAWING_VERSION,
            scale: DRAWING_SCALE,
            grid_size: GRID_SIZE,
            fill_pixels_per_unit: FILL_PIXELS_PER_UNIT,
            colors,
            layers: vec![layer],
        }
    }
}
