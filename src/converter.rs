// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::drawing::{self, Bounds, Drawing, Frame, Layer, Segment};
use crate::error::Error;
use crate::flatten::FlatDocument;
use crate::geom::FuzzyEq;
use crate::palette::{ColorMapping, Palette};
use crate::path;
use crate::rasterize::{PixmapRasterizer, Rasterize};

/// CIE94 distance above which a palette snap is an obvious color shift.
const HIGH_DISTANCE: f64 = 15.0;

/// Padding added around the fill image bounds, in drawing units.
const BOUNDS_PADDING: f64 = 0.1;

/// Conversion options.
#[allow(missing_debug_implementations)]
pub struct Options {
    /// The target palette.
    ///
    /// Default: AAP-64.
    pub palette: Palette,

    /// Maximum midpoint error of the cubic degree reduction,
    /// in drawing units.
    ///
    /// Default: 0.05
    pub tolerance: f64,

    /// The backend used to bake the fill layer.
    ///
    /// When `None`, the fill image stays empty.
    ///
    /// Default: the built-in [`PixmapRasterizer`].
    pub rasterizer: Option<Box<dyn Rasterize>>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            palette: Palette::aap64(),
            tolerance: 0.05,
            rasterizer: Some(Box::new(PixmapRasterizer)),
        }
    }
}

/// The result of a conversion.
#[derive(Debug)]
pub struct Conversion {
    /// The drawing document.
    pub drawing: Drawing,

    /// How every distinct input color was snapped to the palette,
    /// keyed by the normalized input hex value.
    pub mappings: HashMap<String, ColorMapping>,

    /// Human-readable warnings about degraded input features.
    ///
    /// Warnings never affect the emitted geometry or palette.
    pub warnings: Vec<String>,
}

impl Conversion {
    /// Converts an SVG string into a drawing document.
    ///
    /// # Errors
    ///
    /// Only a missing root `svg` element or unparsable XML fail the
    /// conversion. Everything else degrades locally and is reported
    /// through [`Conversion::warnings`].
    pub fn from_str(text: &str, opt: &Options) -> Result<Conversion, Error> {
        let flat = FlatDocument::from_str(text)?;
        Ok(convert(text, &flat, opt))
    }
}

fn convert(svg_text: &str, flat: &FlatDocument, opt: &Options) -> Conversion {
    let mut warnings = flat.warnings.clone();

    let mut mappings = HashMap::new();
    for hex in &flat.colors {
        if let Some(mapping) = opt.palette.nearest(hex) {
            if mapping.distance > HIGH_DISTANCE {
                warnings.push(format!(
                    "Color '{}' maps to palette '{}' with a noticeable difference (delta E {:.1}).",
                    hex, mapping.palette_hex, mapping.distance
                ));
            }
            mappings.insert(hex.clone(), mapping);
        }
    }

    let remap = flat.view_box.fit_to_drawing(drawing::DRAWING_SCALE);
    let mut segments = Vec::new();
    for elem in &flat.elements {
        segments.extend(path::convert(elem, remap, &mappings, opt.tolerance));
    }

    if has_varying_stroke_widths(flat) {
        warnings.push(
            "Input uses multiple stroke widths; stroke width is not preserved.".to_string(),
        );
    }

    let bounds = segment_bounds(&segments);

    // Nothing to bake for an empty document.
    let fill_png = if segments.is_empty() {
        String::new()
    } else {
        render_fill(svg_text, &bounds, flat, &mappings, opt, &mut warnings)
    };

    let frame = Frame {
        is_linked: false,
        path_data_list: segments,
        fill_image_bounds: bounds,
        fill_png,
    };

    Conversion {
        drawing: Drawing::new(opt.palette.colors().to_vec(), Layer::imported(frame)),
        mappings,
        warnings,
    }
}

fn has_varying_stroke_widths(flat: &FlatDocument) -> bool {
    let mut widths: Vec<f64> = Vec::new();
    for elem in &flat.elements {
        if elem.fill.is_none() && elem.stroke.is_none() {
            continue;
        }
        if !widths.iter().any(|w| w.fuzzy_eq(&elem.stroke_width)) {
            widths.push(elem.stroke_width);
        }
    }

    widths.len() > 1
}

fn segment_bounds(segments: &[Segment]) -> Bounds {
    if segments.is_empty() {
        return Bounds {
            min_x: -drawing::DRAWING_SCALE,
            max_x: drawing::DRAWING_SCALE,
            min_y: -drawing::DRAWING_SCALE,
            max_y: drawing::DRAWING_SCALE,
        };
    }

    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;

    for segment in segments {
        for &(x, y) in &[(segment.p[0], segment.p[1]), (segment.p[2], segment.p[3])] {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    Bounds {
        min_x: min_x - BOUNDS_PADDING,
        max_x: max_x + BOUNDS_PADDING,
        min_y: min_y - BOUNDS_PADDING,
        max_y: max_y + BOUNDS_PADDING,
    }
}

fn render_fill(
    svg_text: &str,
    bounds: &Bounds,
    flat: &FlatDocument,
    mappings: &HashMap<String, ColorMapping>,
    opt: &Options,
    warnings: &mut Vec<String>,
) -> String {
    let width = ((bounds.max_x - bounds.min_x) * drawing::FILL_PIXELS_PER_UNIT).ceil();
    let height = ((bounds.max_y - bounds.min_y) * drawing::FILL_PIXELS_PER_UNIT).ceil();
    if width <= 0.0 || height <= 0.0 {
        return String::new();
    }

    let rasterizer = match &opt.rasterizer {
        Some(r) => r,
        None => return String::new(),
    };

    let recolored = recolor(svg_text, flat, mappings);
    match rasterizer.rasterize(&recolored, width as u32, height as u32) {
        Some(png) => base64::encode(png),
        None => {
            warnings.push("Failed to render the fill image.".to_string());
            String::new()
        }
    }
}

/// Replaces every mapped input hex with its palette hex,
/// case-insensitively, in input color order.
fn recolor(svg_text: &str, flat: &FlatDocument, mappings: &HashMap<String, ColorMapping>) -> String {
    let mut result = svg_text.to_string();
    for hex in &flat.colors {
        if let Some(mapping) = mappings.get(hex) {
            result = replace_ignore_ascii_case(&result, hex, &mapping.palette_hex);
        }
    }
    result
}

fn replace_ignore_ascii_case(text: &str, from: &str, to: &str) -> String {
    debug_assert!(from.is_ascii());

    let lower = text.to_ascii_lowercase();
    let needle = from.to_ascii_lowercase();

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    let mut search = 0;
    while let Some(pos) = lower[search..].find(&needle) {
        let found = search + pos;
        result.push_str(&text[last..found]);
        result.push_str(to);
        last = found + needle.len();
        search = last;
    }
    result.push_str(&text[last..]);

    result
}
