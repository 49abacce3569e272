// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use crate::geom::IsValidLength;

/// Converts a shape element into a path `d` string.
///
/// Returns `None` for non-shape elements and for shapes with
/// invalid geometry.
pub(crate) fn convert(node: roxmltree::Node) -> Option<String> {
    match node.tag_name().name() {
        "path" => node.attribute("d").map(|d| d.to_string()),
        "rect" => convert_rect(node),
        "circle" => convert_circle(node),
        "ellipse" => convert_ellipse(node),
        "line" => convert_line(node),
        "polyline" => convert_polyline(node),
        "polygon" => convert_polygon(node),
        _ => None,
    }
}

fn length(node: roxmltree::Node, name: &str) -> Option<f64> {
    let value = node.attribute(name)?;
    // Relative units are not resolved, only the number part is used.
    svgtypes::Length::from_str(value).ok().map(|l| l.number)
}

fn length_or(node: roxmltree::Node, name: &str, default: f64) -> f64 {
    length(node, name).unwrap_or(default)
}

fn convert_rect(node: roxmltree::Node) -> Option<String> {
    // 'width' and 'height' attributes must be positive and non-zero.
    let width = length_or(node, "width", 0.0);
    let height = length_or(node, "height", 0.0);
    if !width.is_valid_length() || !height.is_valid_length() {
        log::warn!("Rect has an invalid size. Skipped.");
        return None;
    }

    let x = length_or(node, "x", 0.0);
    let y = length_or(node, "y", 0.0);

    let (mut rx, mut ry) = resolve_rx_ry(node);

    // Clamp rx/ry to the half of the width/height.
    if rx > width / 2.0 {
        rx = width / 2.0;
    }
    if ry > height / 2.0 {
        ry = height / 2.0;
    }

    // Conversion according to https://www.w3.org/TR/SVG11/shapes.html#RectElement
    if rx > 0.0 && ry > 0.0 {
        Some(format!(
            "M {},{} L {},{} A {} {} 0 0 1 {},{} \
             L {},{} A {} {} 0 0 1 {},{} \
             L {},{} A {} {} 0 0 1 {},{} \
             L {},{} A {} {} 0 0 1 {},{} Z",
            x + rx, y,
            x + width - rx, y,
            rx, ry, x + width, y + ry,
            x + width, y + height - ry,
            rx, ry, x + width - rx, y + height,
            x + rx, y + height,
            rx, ry, x, y + height - ry,
            x, y + ry,
            rx, ry, x + rx, y,
        ))
    } else {
        Some(format!(
            "M {},{} L {},{} L {},{} L {},{} Z",
            x, y,
            x + width, y,
            x + width, y + height,
            x, y + height,
        ))
    }
}

fn resolve_rx_ry(node: roxmltree::Node) -> (f64, f64) {
    // Negative values are treated as not set.
    let rx = length(node, "rx").filter(|v| !v.is_sign_negative());
    let ry = length(node, "ry").filter(|v| !v.is_sign_negative());

    match (rx, ry) {
        (None, None) => (0.0, 0.0),
        (Some(rx), None) => (rx, rx),
        (None, Some(ry)) => (ry, ry),
        (Some(rx), Some(ry)) => (rx, ry),
    }
}

fn convert_circle(node: roxmltree::Node) -> Option<String> {
    let cx = length_or(node, "cx", 0.0);
    let cy = length_or(node, "cy", 0.0);
    let r = length_or(node, "r", 0.0);

    if !r.is_valid_length() {
        log::warn!("Circle has an invalid 'r' value. Skipped.");
        return None;
    }

    Some(ellipse_to_path(cx, cy, r, r))
}

fn convert_ellipse(node: roxmltree::Node) -> Option<String> {
    let cx = length_or(node, "cx", 0.0);
    let cy = length_or(node, "cy", 0.0);
    let (rx, ry) = resolve_rx_ry(node);

    if !rx.is_valid_length() || !ry.is_valid_length() {
        log::warn!("Ellipse has an invalid radius. Skipped.");
        return None;
    }

    Some(ellipse_to_path(cx, cy, rx, ry))
}

// Two semicircular arcs forming a closed outline.
fn ellipse_to_path(cx: f64, cy: f64, rx: f64, ry: f64) -> String {
    format!(
        "M {},{} A {} {} 0 1 1 {},{} A {} {} 0 1 1 {},{} Z",
        cx + rx, cy,
        rx, ry, cx - rx, cy,
        rx, ry, cx + rx, cy,
    )
}

fn convert_line(node: roxmltree::Node) -> Option<String> {
    let x1 = length_or(node, "x1", 0.0);
    let y1 = length_or(node, "y1", 0.0);
    let x2 = length_or(node, "x2", 0.0);
    let y2 = length_or(node, "y2", 0.0);

    Some(format!("M {},{} L {},{}", x1, y1, x2, y2))
}

fn convert_polyline(node: roxmltree::Node) -> Option<String> {
    points_to_path(node, "Polyline", false)
}

fn convert_polygon(node: roxmltree::Node) -> Option<String> {
    points_to_path(node, "Polygon", true)
}

fn points_to_path(node: roxmltree::Node, eid: &str, close: bool) -> Option<String> {
    let text = match node.attribute("points") {
        Some(v) => v,
        None => {
            log::warn!("{} has no 'points' value. Skipped.", eid);
            return None;
        }
    };

    let mut d = String::new();
    let mut count = 0;
    for (x, y) in svgtypes::PointsParser::from(text) {
        if count == 0 {
            d.push_str(&format!("M {},{}", x, y));
        } else {
            d.push_str(&format!(" L {},{}", x, y));
        }
        count += 1;
    }

    // 'polyline' and 'polygon' elements must contain at least 2 points.
    if count < 2 {
        log::warn!("{} has less than 2 points. Skipped.", eid);
        return None;
    }

    if close {
        d.push_str(" Z");
    }

    Some(d)
}
