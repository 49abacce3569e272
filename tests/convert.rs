// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use svg2drawing::{Conversion, Options, Palette, PixmapRasterizer, Rasterize, Segment};

fn convert(text: &str) -> Conversion {
    // Keep the default tests deterministic: no fill baking.
    let opt = Options {
        rasterizer: None,
        ..Options::default()
    };
    Conversion::from_str(text, &opt).unwrap()
}

fn segments(conversion: &Conversion) -> &[Segment] {
    &conversion.drawing.layers[0].frames[0].path_data_list
}

fn assert_schema_invariants(conversion: &Conversion) {
    assert_eq!(conversion.drawing.layers.len(), 1);
    assert_eq!(conversion.drawing.layers[0].frames.len(), 1);

    let bounds = conversion.drawing.layers[0].frames[0].fill_image_bounds;
    for segment in segments(conversion) {
        assert_eq!(segment.p.len(), 4);
        for &(x, y) in &[(segment.p[0], segment.p[1]), (segment.p[2], segment.p[3])] {
            assert!(x >= bounds.min_x - 1e-9 && x <= bounds.max_x + 1e-9);
            assert!(y >= bounds.min_y - 1e-9 && y <= bounds.max_y + 1e-9);
        }

        if let Some(bp) = &segment.bp {
            assert!(bp.x.is_finite() && bp.y.is_finite());
        }
        if let Some(c) = &segment.c {
            for channel in c {
                assert!((0.0..=1.0).contains(channel));
            }
        }
    }

    for mapping in conversion.mappings.values() {
        assert!(mapping.distance >= 0.0);
    }
}

#[test]
fn filled_rect() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><rect x=\"0\" y=\"0\" width=\"10\" height=\"10\" fill=\"#ff0000\"/></svg>",
    );
    assert_schema_invariants(&conversion);

    let segments = segments(&conversion);
    assert_eq!(segments.len(), 4);
    for segment in segments {
        assert!(segment.bp.is_none());
        assert!(segment.f);
    }

    let mapping = &conversion.mappings["#ff0000"];
    assert!(
        mapping.palette_hex == "#df3e23" || mapping.palette_hex == "#b4202a",
        "unexpected mapping: {}",
        mapping.palette_hex
    );
    assert!(mapping.distance < 15.0);
    for segment in segments {
        assert_eq!(segment.c, Some(mapping.palette_color.to_array()));
    }

    // A square viewBox fills the whole canvas, padded by 0.1.
    let bounds = conversion.drawing.layers[0].frames[0].fill_image_bounds;
    assert!((bounds.min_x + 10.1).abs() < 1e-9);
    assert!((bounds.max_x - 10.1).abs() < 1e-9);
    assert!((bounds.min_y + 10.1).abs() < 1e-9);
    assert!((bounds.max_y - 10.1).abs() < 1e-9);
}

#[test]
fn stroked_circle() {
    let conversion = convert(
        "<svg viewBox=\"-5 -5 10 10\"><circle cx=\"0\" cy=\"0\" r=\"5\" fill=\"none\" stroke=\"#000000\"/></svg>",
    );
    assert_schema_invariants(&conversion);

    let segments = segments(&conversion);
    assert!(segments.len() >= 4);

    let mapping = &conversion.mappings["#000000"];
    assert!(
        mapping.palette_hex == "#060608" || mapping.palette_hex == "#141013",
        "unexpected mapping: {}",
        mapping.palette_hex
    );

    for segment in segments {
        assert!(segment.bp.is_some());
        assert!(!segment.f);
        assert_eq!(segment.c, Some(mapping.palette_color.to_array()));
    }
}

#[test]
fn closed_path_square() {
    let conversion = convert(
        "<svg viewBox=\"0 0 100 100\"><path d=\"M10,10 L90,10 L90,90 L10,90 Z\" fill=\"#ffffff\"/></svg>",
    );
    assert_schema_invariants(&conversion);

    let segments = segments(&conversion);
    assert_eq!(segments.len(), 4);
    for segment in segments {
        assert!(segment.bp.is_none());
    }

    let mapping = &conversion.mappings["#ffffff"];
    assert_eq!(mapping.palette_hex, "#ffffff");
    assert!(mapping.distance < 1e-6);

    // The Z segment returns to the subpath start.
    let last = &segments[3];
    assert!((last.p[2] - segments[0].p[0]).abs() < 1e-9);
    assert!((last.p[3] - segments[0].p[1]).abs() < 1e-9);
}

#[test]
fn transformed_group_is_centered() {
    let conversion = convert(
        "<svg viewBox=\"0 0 100 100\"><g transform=\"translate(50,50)\"><rect x=\"-10\" y=\"-10\" width=\"20\" height=\"20\" fill=\"#00ff00\"/></g></svg>",
    );
    assert_schema_invariants(&conversion);

    let segments = segments(&conversion);
    assert_eq!(segments.len(), 4);
    for segment in segments {
        for coord in &segment.p {
            assert!(coord.abs() <= 2.0 + 1e-9, "coordinate too far out: {}", coord);
        }
    }
}

#[test]
fn gradient_fill_warns_and_maps_first_stop() {
    let conversion = convert(
        "<svg viewBox=\"0 0 100 100\"><defs><linearGradient id=\"g\"><stop stop-color=\"#ff0000\"/><stop stop-color=\"#0000ff\"/></linearGradient></defs><rect x=\"0\" y=\"0\" width=\"100\" height=\"100\" fill=\"url(#g)\"/></svg>",
    );
    assert_schema_invariants(&conversion);

    assert!(conversion.warnings.iter().any(|w| w.contains("Gradient")));
    assert!(conversion.mappings.contains_key("#ff0000"));
    assert!(!segments(&conversion).is_empty());
}

#[test]
fn cubic_approximation_stays_within_tolerance() {
    let conversion = convert(
        "<svg viewBox=\"0 0 100 100\"><path d=\"M10,50 C10,10 90,10 90,50\" stroke=\"#000000\" fill=\"none\"/></svg>",
    );
    assert_schema_invariants(&conversion);

    let segments = segments(&conversion);
    assert!(!segments.is_empty());
    for segment in segments {
        assert!(segment.bp.is_some());
        assert!(!segment.f);
    }

    // The chain starts and ends at the mapped cubic endpoints.
    let first = &segments[0];
    let last = &segments[segments.len() - 1];
    assert!((first.p[0] + 8.0).abs() < 1e-9);
    assert!((first.p[1] - 0.0).abs() < 1e-9);
    assert!((last.p[2] - 8.0).abs() < 1e-9);
    assert!((last.p[3] - 0.0).abs() < 1e-9);
}

#[test]
fn fill_and_stroke_emit_two_passes() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"#ff0000\" stroke=\"#000000\"/></svg>",
    );

    let segments = segments(&conversion);
    assert_eq!(segments.len(), 8);
    // The fill pass always precedes the stroke pass.
    for segment in &segments[..4] {
        assert!(segment.f);
    }
    for segment in &segments[4..] {
        assert!(!segment.f);
    }
}

#[test]
fn unpaintable_leaf_still_outlines() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"none\"/></svg>",
    );

    let segments = segments(&conversion);
    assert_eq!(segments.len(), 4);
    for segment in segments {
        assert!(!segment.f);
        assert!(segment.c.is_none());
    }
}

#[test]
fn empty_svg_body() {
    let conversion = convert("<svg viewBox=\"0 0 10 10\"></svg>");
    assert_schema_invariants(&conversion);

    assert!(segments(&conversion).is_empty());
    let frame = &conversion.drawing.layers[0].frames[0];
    assert_eq!(frame.fill_png, "");

    let bounds = frame.fill_image_bounds;
    assert_eq!(bounds.min_x, -10.0);
    assert_eq!(bounds.max_x, 10.0);
    assert_eq!(bounds.min_y, -10.0);
    assert_eq!(bounds.max_y, 10.0);
}

#[test]
fn defs_only_svg_is_empty() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><defs><rect width=\"10\" height=\"10\"/></defs></svg>",
    );
    assert!(segments(&conversion).is_empty());
    assert_eq!(conversion.drawing.layers[0].frames[0].fill_png, "");
}

#[test]
fn unparsable_path_data_emits_nothing() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><path d=\"M 1 1 L !!\" fill=\"#ff0000\"/></svg>",
    );
    assert!(segments(&conversion).is_empty());
}

#[test]
fn varying_stroke_widths_warn_once() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\">\
            <rect width=\"5\" height=\"5\" stroke=\"#000000\" stroke-width=\"1\"/>\
            <rect width=\"5\" height=\"5\" stroke=\"#000000\" stroke-width=\"3\"/>\
         </svg>",
    );

    let hits: Vec<_> = conversion
        .warnings
        .iter()
        .filter(|w| w.contains("stroke width"))
        .collect();
    assert_eq!(hits.len(), 1);
}

#[test]
fn uniform_stroke_widths_do_not_warn() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\">\
            <rect width=\"5\" height=\"5\" stroke=\"#000000\"/>\
            <rect width=\"5\" height=\"5\" stroke=\"#000000\"/>\
         </svg>",
    );

    assert!(!conversion.warnings.iter().any(|w| w.contains("stroke width")));
}

#[test]
fn high_distance_snaps_warn() {
    let opt = Options {
        palette: Palette::from_hex(vec!["#000000".to_string(), "#ffffff".to_string()]).unwrap(),
        rasterizer: None,
        ..Options::default()
    };
    let conversion = Conversion::from_str(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"#ff0000\"/></svg>",
        &opt,
    )
    .unwrap();

    assert!(conversion
        .warnings
        .iter()
        .any(|w| w.contains("noticeable difference")));
    assert_eq!(conversion.drawing.colors.len(), 2);
}

#[test]
fn layer_ids_are_unique() {
    let svg = "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\"/></svg>";
    let a = convert(svg);
    let b = convert(svg);

    assert!(!a.drawing.layers[0].id.is_empty());
    assert_ne!(a.drawing.layers[0].id, b.drawing.layers[0].id);
}

#[test]
fn document_json_schema() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"#ff0000\"/></svg>",
    );

    let value = serde_json::to_value(&conversion.drawing).unwrap();
    assert_eq!(value["version"], 3);
    assert_eq!(value["scale"], 10.0);
    assert!((value["gridSize"].as_f64().unwrap() - 0.71428571428571).abs() < 1e-12);
    assert_eq!(value["fillPixelsPerUnit"], 25.6);
    assert_eq!(value["colors"].as_array().unwrap().len(), 64);

    let layer = &value["layers"][0];
    assert_eq!(layer["title"], "Imported");
    assert_eq!(layer["isVisible"], true);
    assert_eq!(layer["isBitmap"], false);

    let frame = &layer["frames"][0];
    assert_eq!(frame["isLinked"], false);
    assert_eq!(frame["fillPng"], "");
    assert!(frame["fillImageBounds"]["minX"].is_number());
    assert!(frame["fillImageBounds"]["maxY"].is_number());

    let segment = &frame["pathDataList"][0];
    assert_eq!(segment["p"].as_array().unwrap().len(), 4);
    assert_eq!(segment["s"], 1);
    assert_eq!(segment["f"], true);
    assert_eq!(segment["c"].as_array().unwrap().len(), 4);
    // Optional fields are skipped when absent.
    assert!(segment.get("bp").is_none());
    assert!(segment.get("isTransparent").is_none());

    let first_color = &value["colors"][0];
    assert!(first_color["r"].is_number());
    assert!(first_color["a"].is_number());
}

struct StubRasterizer;

impl Rasterize for StubRasterizer {
    fn rasterize(&self, _svg: &str, _width: u32, _height: u32) -> Option<Vec<u8>> {
        Some(vec![1, 2, 3])
    }
}

struct FailingRasterizer;

impl Rasterize for FailingRasterizer {
    fn rasterize(&self, _svg: &str, _width: u32, _height: u32) -> Option<Vec<u8>> {
        None
    }
}

#[test]
fn fill_png_is_base64_of_the_rasterizer_output() {
    let opt = Options {
        rasterizer: Some(Box::new(StubRasterizer)),
        ..Options::default()
    };
    let conversion = Conversion::from_str(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"#ff0000\"/></svg>",
        &opt,
    )
    .unwrap();

    assert_eq!(conversion.drawing.layers[0].frames[0].fill_png, "AQID");
    assert!(!conversion.warnings.iter().any(|w| w.contains("fill image")));
}

#[test]
fn rasterizer_failure_degrades_to_a_warning() {
    let opt = Options {
        rasterizer: Some(Box::new(FailingRasterizer)),
        ..Options::default()
    };
    let conversion = Conversion::from_str(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"#ff0000\"/></svg>",
        &opt,
    )
    .unwrap();

    assert_eq!(conversion.drawing.layers[0].frames[0].fill_png, "");
    assert!(conversion.warnings.iter().any(|w| w.contains("fill image")));
}

#[test]
fn builtin_rasterizer_produces_png() {
    let rasterizer = PixmapRasterizer;
    let svg = "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" fill=\"#df3e23\"/></svg>";

    let png = rasterizer.rasterize(svg, 64, 64).unwrap();
    assert_eq!(&png[..8], &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]);

    // Repeated calls are idempotent.
    let png2 = rasterizer.rasterize(svg, 64, 64).unwrap();
    assert_eq!(png, png2);
}

#[test]
fn full_circle_arc_path() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><path d=\"M 10 5 A 5 5 0 1 1 10 5\" stroke=\"#000000\" fill=\"none\"/></svg>",
    );

    let segments = segments(&conversion);
    assert_eq!(segments.len(), 4);
    for segment in segments {
        assert!(segment.bp.is_some());
    }
}

#[test]
fn rounded_rect_mixes_lines_and_arcs() {
    let conversion = convert(
        "<svg viewBox=\"0 0 10 10\"><rect width=\"10\" height=\"10\" rx=\"2\" fill=\"#ff0000\"/></svg>",
    );

    let segments = segments(&conversion);
    assert!(segments.iter().any(|s| s.bp.is_some()));
    assert!(segments.iter().any(|s| s.bp.is_none()));
}
