// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use kurbo::{CubicBez, ParamCurve, Point, QuadBez};

use crate::drawing::{BendPoint, Segment, SegmentStyle};
use crate::flatten::FlatElement;
use crate::geom::Transform;
use crate::palette::ColorMapping;

/// Recursion cap of the cubic degree reduction.
const MAX_CUBIC_DEPTH: u8 = 8;

/// Distance in drawing units below which a close command
/// needs no explicit segment.
const CLOSE_EPSILON: f64 = 1e-3;

/// An absolute path command in SVG user space.
///
/// Unlike the SVG path grammar, relative, shorthand and smooth forms
/// are already resolved: `H`/`V` become lines, `S` becomes a cubic whose
/// first control point is the current point and `T` becomes a line.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub(crate) enum Command {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadTo { x1: f64, y1: f64, x: f64, y: f64 },
    CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    ArcTo { rx: f64, ry: f64, x_axis_rotation: f64, large_arc: bool, sweep: bool, x: f64, y: f64 },
    Close,
}

/// Parses a path `d` string into absolute commands.
///
/// Returns `None` when the data is unparsable; the element then
/// produces no segments at all.
pub(crate) fn parse_commands(text: &str) -> Option<Vec<Command>> {
    // Previous MoveTo coordinates.
    let mut prev_mx = 0.0;
    let mut prev_my = 0.0;

    // Previous coordinates.
    let mut prev_x = 0.0;
    let mut prev_y = 0.0;

    let mut commands = Vec::new();

    for segment in svgtypes::PathParser::from(text) {
        let segment = match segment {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Failed to parse path data. The whole path is skipped.");
                return None;
            }
        };

        match segment {
            svgtypes::PathSegment::MoveTo { abs, mut x, mut y } => {
                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::MoveTo { x, y });
                prev_x = x;
                prev_y = y;
                prev_mx = x;
                prev_my = y;
            }
            svgtypes::PathSegment::LineTo { abs, mut x, mut y } => {
                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::LineTo { x, y });
                prev_x = x;
                prev_y = y;
            }
            svgtypes::PathSegment::HorizontalLineTo { abs, mut x } => {
                if !abs {
                    x += prev_x;
                }

                // The new endpoint stays in the path's local space
                // and is transformed exactly like a LineTo.
                commands.push(Command::LineTo { x, y: prev_y });
                prev_x = x;
            }
            svgtypes::PathSegment::VerticalLineTo { abs, mut y } => {
                if !abs {
                    y += prev_y;
                }

                commands.push(Command::LineTo { x: prev_x, y });
                prev_y = y;
            }
            svgtypes::PathSegment::CurveTo { abs, mut x1, mut y1, mut x2, mut y2, mut x, mut y } => {
                if !abs {
                    x1 += prev_x;
                    y1 += prev_y;
                    x2 += prev_x;
                    y2 += prev_y;
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::CurveTo { x1, y1, x2, y2, x, y });
                prev_x = x;
                prev_y = y;
            }
            svgtypes::PathSegment::SmoothCurveTo { abs, mut x2, mut y2, mut x, mut y } => {
                // The reflected control point is not tracked. The first
                // control point collapses onto the current point, which
                // flattens the start of the curve.
                let x1 = prev_x;
                let y1 = prev_y;

                if !abs {
                    x2 += prev_x;
                    y2 += prev_y;
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::CurveTo { x1, y1, x2, y2, x, y });
                prev_x = x;
                prev_y = y;
            }
            svgtypes::PathSegment::Quadratic { abs, mut x1, mut y1, mut x, mut y } => {
                if !abs {
                    x1 += prev_x;
                    y1 += prev_y;
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::QuadTo { x1, y1, x, y });
                prev_x = x;
                prev_y = y;
            }
            svgtypes::PathSegment::SmoothQuadratic { abs, mut x, mut y } => {
                // Degrades to a straight segment.
                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::LineTo { x, y });
                prev_x = x;
                prev_y = y;
            }
            svgtypes::PathSegment::EllipticalArc {
                abs, rx, ry, x_axis_rotation, large_arc, sweep, mut x, mut y,
            } => {
                if !abs {
                    x += prev_x;
                    y += prev_y;
                }

                commands.push(Command::ArcTo { rx, ry, x_axis_rotation, large_arc, sweep, x, y });
                prev_x = x;
                prev_y = y;
            }
            svgtypes::PathSegment::ClosePath { .. } => {
                commands.push(Command::Close);

                // ClosePath moves us to the last MoveTo coordinate.
                prev_x = prev_mx;
                prev_y = prev_my;
            }
        }
    }

    Some(commands)
}

/// One color pass over a path's command stream.
struct ColorPass {
    color: Option<[f64; 4]>,
    fill: bool,
}

/// Converts a flattened leaf into target segments.
///
/// `remap` is the viewBox → drawing-unit transform; the element's own
/// accumulated transform is applied first. A filled and stroked leaf
/// emits its geometry twice: the fill pass first, then the stroke pass.
pub(crate) fn convert(
    elem: &FlatElement,
    remap: Transform,
    mappings: &HashMap<String, ColorMapping>,
    tolerance: f64,
) -> Vec<Segment> {
    let commands = match parse_commands(&elem.d) {
        Some(v) => v,
        None => return Vec::new(),
    };
    if commands.is_empty() {
        return Vec::new();
    }

    let mut ts = remap;
    ts.append(&elem.transform);

    let mut passes = Vec::new();
    if let Some(mapping) = elem.fill.as_ref().and_then(|hex| mappings.get(hex)) {
        passes.push(ColorPass {
            color: Some(mapping.palette_color.to_array()),
            fill: true,
        });
    }
    if let Some(mapping) = elem.stroke.as_ref().and_then(|hex| mappings.get(hex)) {
        passes.push(ColorPass {
            color: Some(mapping.palette_color.to_array()),
            fill: false,
        });
    }
    if passes.is_empty() {
        // No resolvable paint at all: emit the outline once,
        // colored by the editor's default.
        passes.push(ColorPass { color: None, fill: false });
    }

    let mut segments = Vec::new();
    for pass in &passes {
        emit_pass(&commands, ts, pass, tolerance, &mut segments);
    }

    segments
}

fn emit_pass(
    commands: &[Command],
    ts: Transform,
    pass: &ColorPass,
    tolerance: f64,
    out: &mut Vec<Segment>,
) {
    // Current point and subpath start, in SVG user space.
    let mut cur = (0.0, 0.0);
    let mut start = (0.0, 0.0);

    for command in commands {
        match *command {
            Command::MoveTo { x, y } => {
                cur = (x, y);
                start = cur;
            }
            Command::LineTo { x, y } => {
                push_line(out, pass, ts, cur, (x, y));
                cur = (x, y);
            }
            Command::QuadTo { x1, y1, x, y } => {
                push_quad(out, pass, ts, cur, (x1, y1), (x, y));
                cur = (x, y);
            }
            Command::CurveTo { x1, y1, x2, y2, x, y } => {
                // Affine maps commute with the control polygon, so the
                // reduction can run in drawing space where the tolerance
                // is defined.
                let cubic = CubicBez::new(
                    map(ts, cur),
                    map(ts, (x1, y1)),
                    map(ts, (x2, y2)),
                    map(ts, (x, y)),
                );
                cubic_to_quads(cubic, tolerance, 0, pass, out);
                cur = (x, y);
            }
            Command::ArcTo { rx, ry, x_axis_rotation, large_arc, sweep, x, y } => {
                match arc_to_quads(cur, (x, y), rx, ry, x_axis_rotation, large_arc, sweep) {
                    Some(quads) => {
                        for quad in quads {
                            push_quad(
                                out,
                                pass,
                                ts,
                                (quad.p0.x, quad.p0.y),
                                (quad.p1.x, quad.p1.y),
                                (quad.p2.x, quad.p2.y),
                            );
                        }
                    }
                    None => push_line(out, pass, ts, cur, (x, y)),
                }
                cur = (x, y);
            }
            Command::Close => {
                let (cx, cy) = ts.apply(cur.0, cur.1);
                let (sx, sy) = ts.apply(start.0, start.1);
                if (cx - sx).abs() > CLOSE_EPSILON || (cy - sy).abs() > CLOSE_EPSILON {
                    push_segment(out, pass, Point::new(cx, cy), Point::new(sx, sy), None);
                }
                cur = start;
            }
        }
    }
}

fn map(ts: Transform, p: (f64, f64)) -> Point {
    let (x, y) = ts.apply(p.0, p.1);
    Point::new(x, y)
}

fn push_segment(out: &mut Vec<Segment>, pass: &ColorPass, p0: Point, p1: Point, bend: Option<Point>) {
    out.push(Segment {
        p: [p0.x, p0.y, p1.x, p1.y],
        s: SegmentStyle::Line,
        f: pass.fill,
        bp: bend.map(|p| BendPoint { x: p.x, y: p.y }),
        c: pass.color,
        is_transparent: None,
    });
}

fn push_line(out: &mut Vec<Segment>, pass: &ColorPass, ts: Transform, from: (f64, f64), to: (f64, f64)) {
    push_segment(out, pass, map(ts, from), map(ts, to), None);
}

fn push_quad(
    out: &mut Vec<Segment>,
    pass: &ColorPass,
    ts: Transform,
    from: (f64, f64),
    ctrl: (f64, f64),
    to: (f64, f64),
) {
    push_segment(out, pass, map(ts, from), map(ts, to), Some(map(ts, ctrl)));
}

/// Reduces a cubic curve to quadratic segments by adaptive subdivision.
///
/// The candidate control point is the average of the two controls a
/// degree-elevated quadratic would produce. When the midpoint error
/// exceeds the tolerance, the cubic is split at t=0.5 via de Casteljau
/// and both halves are reduced recursively.
fn cubic_to_quads(cubic: CubicBez, tolerance: f64, depth: u8, pass: &ColorPass, out: &mut Vec<Segment>) {
    let ctrl = (((cubic.p1.to_vec2() * 3.0 - cubic.p0.to_vec2())
        + (cubic.p2.to_vec2() * 3.0 - cubic.p3.to_vec2()))
        / 4.0)
        .to_point();

    let cubic_mid = cubic.eval(0.5);
    let quad_mid = (cubic.p0.to_vec2() * 0.25 + ctrl.to_vec2() * 0.5 + cubic.p3.to_vec2() * 0.25)
        .to_point();

    if (cubic_mid - quad_mid).hypot() <= tolerance || depth >= MAX_CUBIC_DEPTH {
        push_segment(out, pass, cubic.p0, cubic.p3, Some(ctrl));
    } else {
        let (left, right) = cubic.subdivide();
        cubic_to_quads(left, tolerance, depth + 1, pass, out);
        cubic_to_quads(right, tolerance, depth + 1, pass, out);
    }
}

/// Approximates an endpoint-parameterized elliptical arc with quadratics.
///
/// Performs the SVG endpoint-to-center conversion with the standard
/// radii correction, splits the sweep into at most 90° slices and places
/// every control point at the intersection of the slice's endpoint
/// tangents. Returns `None` for zero radii (the caller emits a straight
/// segment) and an empty list for a degenerate arc that draws nothing.
pub(crate) fn arc_to_quads(
    from: (f64, f64),
    to: (f64, f64),
    rx: f64,
    ry: f64,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
) -> Option<Vec<QuadBez>> {
    use std::f64::consts::PI;

    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if rx == 0.0 || ry == 0.0 {
        return None;
    }

    let phi = x_axis_rotation.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // Endpoint to center conversion, https://www.w3.org/TR/SVG11/implnote.html#ArcImplementationNotes
    let dx2 = (from.0 - to.0) / 2.0;
    let dy2 = (from.1 - to.1) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // Correct out-of-range radii.
    let lambda = x1p * x1p / (rx * rx) + y1p * y1p / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let (center, theta1, delta) = if x1p == 0.0 && y1p == 0.0 {
        // Coincident endpoints. Without the large-arc flag the arc
        // draws nothing; with it, the whole ellipse is traced starting
        // at angle zero.
        if !large_arc {
            return Some(Vec::new());
        }
        let center = (from.0 - rx * cos_phi, from.1 - rx * sin_phi);
        let delta = if sweep { 2.0 * PI } else { -2.0 * PI };
        (center, 0.0, delta)
    } else {
        let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
        let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
        let mut coef = (num.max(0.0) / den).sqrt();
        if large_arc == sweep {
            coef = -coef;
        }

        let cxp = coef * rx * y1p / ry;
        let cyp = -coef * ry * x1p / rx;
        let cx = cos_phi * cxp - sin_phi * cyp + (from.0 + to.0) / 2.0;
        let cy = sin_phi * cxp + cos_phi * cyp + (from.1 + to.1) / 2.0;

        let theta1 = ((y1p - cyp) / ry).atan2((x1p - cxp) / rx);
        let theta2 = ((-y1p - cyp) / ry).atan2((-x1p - cxp) / rx);
        let mut delta = theta2 - theta1;
        if !sweep && delta > 0.0 {
            delta -= 2.0 * PI;
        }
        if sweep && delta < 0.0 {
            delta += 2.0 * PI;
        }

        ((cx, cy), theta1, delta)
    };

    let count = ((delta.abs() / (PI / 2.0)).ceil() as usize).max(1);

    let ellipse_point = |theta: f64| {
        let (sin_t, cos_t) = theta.sin_cos();
        Point::new(
            center.0 + cos_phi * rx * cos_t - sin_phi * ry * sin_t,
            center.1 + sin_phi * rx * cos_t + cos_phi * ry * sin_t,
        )
    };

    let mut quads = Vec::with_capacity(count);
    for i in 0..count {
        let ta = theta1 + delta * i as f64 / count as f64;
        let tb = theta1 + delta * (i + 1) as f64 / count as f64;
        let tm = (ta + tb) / 2.0;
        let cos_half = ((tb - ta) / 2.0).cos();

        let ex = rx * tm.cos() / cos_half;
        let ey = ry * tm.sin() / cos_half;
        let ctrl = Point::new(
            center.0 + cos_phi * ex - sin_phi * ey,
            center.1 + sin_phi * ex + cos_phi * ey,
        );

        quads.push(QuadBez::new(ellipse_point(ta), ctrl, ellipse_point(tb)));
    }

    Some(quads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_pass() -> ColorPass {
        ColorPass { color: None, fill: false }
    }

    #[test]
    fn absolutizes_relative_commands() {
        let commands = parse_commands("m 10 10 l 5 0 v 5 h -5 z").unwrap();
        assert_eq!(commands.len(), 5);

        match commands[2] {
            Command::LineTo { x, y } => {
                assert_eq!(x, 15.0);
                assert_eq!(y, 15.0);
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
        match commands[3] {
            Command::LineTo { x, y } => {
                assert_eq!(x, 10.0);
                assert_eq!(y, 15.0);
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn smooth_commands_degrade() {
        let commands = parse_commands("M 0 0 S 10 10 20 0 T 40 0").unwrap();

        match commands[1] {
            Command::CurveTo { x1, y1, .. } => {
                // The first control point collapses onto the current point.
                assert_eq!(x1, 0.0);
                assert_eq!(y1, 0.0);
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
        match commands[2] {
            Command::LineTo { x, y } => {
                assert_eq!(x, 40.0);
                assert_eq!(y, 0.0);
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn garbage_data_yields_nothing() {
        assert!(parse_commands("M 10 20 L 30 40 #!@$1 L 50 60").is_none());
        assert_eq!(parse_commands("").unwrap().len(), 0);
    }

    #[test]
    fn collinear_cubic_reduces_to_one_quad() {
        let cubic = CubicBez::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        );

        let mut out = Vec::new();
        cubic_to_quads(cubic, 0.05, 0, &line_pass(), &mut out);

        assert_eq!(out.len(), 1);
        assert!(out[0].bp.is_some());
    }

    #[test]
    fn sharp_cubic_subdivides() {
        let cubic = CubicBez::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, -10.0),
            Point::new(10.0, 0.0),
        );

        let mut out = Vec::new();
        cubic_to_quads(cubic, 0.05, 0, &line_pass(), &mut out);
        assert!(out.len() > 1);

        // Consecutive quads stay connected.
        for pair in out.windows(2) {
            assert!((pair[0].p[2] - pair[1].p[0]).abs() < 1e-9);
            assert!((pair[0].p[3] - pair[1].p[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn quarter_arc_is_one_quad() {
        let quads = arc_to_quads((5.0, 0.0), (0.0, 5.0), 5.0, 5.0, 0.0, false, true).unwrap();
        assert_eq!(quads.len(), 1);
    }

    #[test]
    fn semicircle_splits_in_two() {
        let quads = arc_to_quads((5.0, 0.0), (-5.0, 0.0), 5.0, 5.0, 0.0, true, true).unwrap();
        assert_eq!(quads.len(), 2);
    }

    #[test]
    fn full_circle_splits_in_four() {
        let quads = arc_to_quads((5.0, 0.0), (5.0, 0.0), 5.0, 5.0, 0.0, true, true).unwrap();
        assert_eq!(quads.len(), 4);

        // Every slice spans at most 90 degrees and the chain is closed.
        let first = quads.first().unwrap();
        let last = quads.last().unwrap();
        assert!((first.p0 - last.p2).hypot() < 1e-9);
    }

    #[test]
    fn zero_radius_arc_is_a_line() {
        assert!(arc_to_quads((0.0, 0.0), (10.0, 0.0), 0.0, 5.0, 0.0, false, true).is_none());
    }

    #[test]
    fn degenerate_arc_draws_nothing() {
        let quads = arc_to_quads((5.0, 0.0), (5.0, 0.0), 5.0, 5.0, 0.0, false, true).unwrap();
        assert!(quads.is_empty());
    }

    #[test]
    fn arc_endpoints_are_preserved() {
        let quads = arc_to_quads((0.0, 0.0), (10.0, 10.0), 10.0, 10.0, 0.0, false, true).unwrap();
        let first = quads.first().unwrap();
        let last = quads.last().unwrap();
        assert!((first.p0 - Point::new(0.0, 0.0)).hypot() < 1e-9);
        assert!((last.p2 - Point::new(10.0, 10.0)).hypot() < 1e-9);
    }
}
