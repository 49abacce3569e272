// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::color;
use crate::flatten::FlatDocument;
use crate::geom::Transform;
use crate::path::{self, Command};

/// A backend that renders an SVG string into a PNG image.
///
/// The SVG must be rendered with its native viewBox scaled to fit the
/// requested pixel rectangle. A failure is reported as `None` and
/// degrades the conversion to an empty fill image.
pub trait Rasterize {
    /// Renders `svg` into a `width` x `height` PNG.
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Option<Vec<u8>>;
}

/// The built-in rasterizer.
///
/// Flattens the SVG with the same walker the converter uses and fills
/// the leaf paths into a `tiny_skia::Pixmap`. Strokes are not painted:
/// the result is the fill layer preview, not a faithful rendering.
#[derive(Clone, Copy, Default, Debug)]
pub struct PixmapRasterizer;

impl Rasterize for PixmapRasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Option<Vec<u8>> {
        let flat = FlatDocument::from_str(svg).ok()?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)?;

        let view_box = flat.view_box;
        let mut fit = Transform::new_scale(
            width as f64 / view_box.width(),
            height as f64 / view_box.height(),
        );
        fit.translate(-view_box.x(), -view_box.y());

        for elem in &flat.elements {
            let hex = match &elem.fill {
                Some(hex) => hex,
                None => continue,
            };
            let (r, g, b) = match color::hex_to_rgb(hex) {
                Some(rgb) => rgb,
                None => continue,
            };

            let skia_path = match build_path(&elem.d) {
                Some(p) => p,
                None => continue,
            };

            let mut ts = fit;
            ts.append(&elem.transform);

            let mut paint = tiny_skia::Paint::default();
            paint.set_color_rgba8(r, g, b, 255);
            paint.anti_alias = true;

            pixmap.fill_path(
                &skia_path,
                &paint,
                tiny_skia::FillRule::Winding,
                to_skia_transform(ts),
                None,
            );
        }

        pixmap.encode_png().ok()
    }
}

fn to_skia_transform(ts: Transform) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(
        ts.a as f32,
        ts.b as f32,
        ts.c as f32,
        ts.d as f32,
        ts.e as f32,
        ts.f as f32,
    )
}

/// Builds a tiny-skia path in SVG user space.
fn build_path(d: &str) -> Option<tiny_skia::Path> {
    let commands = path::parse_commands(d)?;

    let mut pb = tiny_skia::PathBuilder::new();
    let mut cur = (0.0, 0.0);
    let mut open = false;

    for command in &commands {
        match *command {
            Command::MoveTo { x, y } => {
                pb.move_to(x as f32, y as f32);
                cur = (x, y);
                open = true;
            }
            Command::LineTo { x, y } => {
                if open {
                    pb.line_to(x as f32, y as f32);
                }
                cur = (x, y);
            }
            Command::QuadTo { x1, y1, x, y } => {
                if open {
                    pb.quad_to(x1 as f32, y1 as f32, x as f32, y as f32);
                }
                cur = (x, y);
            }
            Command::CurveTo { x1, y1, x2, y2, x, y } => {
                if open {
                    pb.cubic_to(x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32);
                }
                cur = (x, y);
            }
            Command::ArcTo { rx, ry, x_axis_rotation, large_arc, sweep, x, y } => {
                if open {
                    match path::arc_to_quads(cur, (x, y), rx, ry, x_axis_rotation, large_arc, sweep) {
                        Some(quads) => {
                            for quad in quads {
                                pb.quad_to(
                                    quad.p1.x as f32,
                                    quad.p1.y as f32,
                                    quad.p2.x as f32,
                                    quad.p2.y as f32,
                                );
                            }
                        }
                        None => pb.line_to(x as f32, y as f32),
                    }
                }
                cur = (x, y);
            }
            Command::Close => {
                if open {
                    pb.close();
                }
            }
        }
    }

    pb.finish()
}
