// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use crate::color;
use crate::error::Error;
use crate::geom::{IsValidLength, Transform, ViewBox};
use crate::shapes;

/// A flattened leaf element.
///
/// All inheritance, transforms and shape primitives are already resolved,
/// so a leaf is just a path with paint.
#[derive(Clone, Debug)]
pub struct FlatElement {
    /// The path data.
    pub d: String,

    /// Fill color as a normalized hex value. `None` means no paint.
    pub fill: Option<String>,

    /// Stroke color as a normalized hex value. `None` means no paint.
    pub stroke: Option<String>,

    /// Resolved stroke width.
    pub stroke_width: f64,

    /// The transform accumulated from the document root to this element.
    pub transform: Transform,
}

/// A flattened SVG document.
#[derive(Clone, Debug)]
pub struct FlatDocument {
    /// The document view box.
    pub view_box: ViewBox,

    /// Leaf elements in document order.
    pub elements: Vec<FlatElement>,

    /// Distinct normalized colors used by the leaves, in first-use order.
    pub colors: Vec<String>,

    /// Warnings collected while flattening.
    pub warnings: Vec<String>,
}

impl FlatDocument {
    /// Parses and flattens an SVG string.
    pub fn from_str(text: &str) -> Result<Self, Error> {
        let mut xml_opt = roxmltree::ParsingOptions::default();
        xml_opt.allow_dtd = true;

        let doc = roxmltree::Document::parse_with_options(text, xml_opt)?;
        Self::from_xmltree(&doc)
    }

    /// Flattens a parsed SVG document.
    pub fn from_xmltree(doc: &roxmltree::Document) -> Result<Self, Error> {
        let svg = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "svg")
            .ok_or(Error::NoSvgElement)?;

        let mut flat = FlatDocument {
            view_box: resolve_view_box(svg),
            elements: Vec::new(),
            colors: Vec::new(),
            warnings: Vec::new(),
        };

        let state = State {
            transform: Transform::default(),
            fill: None,
            stroke: None,
            stroke_width: None,
        };

        convert_element(svg, &state, doc, &mut flat);

        Ok(flat)
    }
}

/// Paint and transform state inherited from ancestor elements.
#[derive(Clone)]
struct State {
    transform: Transform,
    fill: Option<String>,
    stroke: Option<String>,
    stroke_width: Option<f64>,
}

fn resolve_view_box(svg: roxmltree::Node) -> ViewBox {
    let vb = svg
        .attribute("viewBox")
        .and_then(|v| svgtypes::ViewBox::from_str(v).ok())
        .and_then(|v| ViewBox::new(v.x, v.y, v.w, v.h));

    if let Some(vb) = vb {
        return vb;
    }

    let width = attr_length(svg, "width").filter(|v| v.is_valid_length()).unwrap_or(100.0);
    let height = attr_length(svg, "height").filter(|v| v.is_valid_length()).unwrap_or(100.0);

    // Cannot fail: both values are > 0 at this point.
    ViewBox::new(0.0, 0.0, width, height).unwrap()
}

fn convert_element(
    node: roxmltree::Node,
    state: &State,
    doc: &roxmltree::Document,
    flat: &mut FlatDocument,
) {
    if !node.is_element() {
        return;
    }

    match node.tag_name().name() {
        // Definitions are only converted when referenced.
        "defs" | "clipPath" | "mask" | "linearGradient" | "radialGradient" => {}
        "g" | "svg" => {
            let state = inherit_state(node, state, doc, flat);
            for child in node.children() {
                convert_element(child, &state, doc, flat);
            }
        }
        "path" | "rect" | "circle" | "ellipse" | "line" | "polygon" | "polyline" => {
            convert_leaf(node, state, doc, flat);
        }
        // Unrecognized elements are silently dropped.
        _ => {}
    }
}

fn inherit_state(
    node: roxmltree::Node,
    parent: &State,
    doc: &roxmltree::Document,
    flat: &mut FlatDocument,
) -> State {
    State {
        transform: node_transform(node, parent),
        fill: resolve_paint(node, doc, "fill", parent.fill.as_deref(), flat),
        stroke: resolve_paint(node, doc, "stroke", parent.stroke.as_deref(), flat),
        stroke_width: resolve_stroke_width(node, parent.stroke_width),
    }
}

fn convert_leaf(
    node: roxmltree::Node,
    state: &State,
    doc: &roxmltree::Document,
    flat: &mut FlatDocument,
) {
    let d = match shapes::convert(node) {
        Some(d) => d,
        None => return,
    };

    let raw_fill = resolve_paint(node, doc, "fill", state.fill.as_deref(), flat);
    let raw_stroke = resolve_paint(node, doc, "stroke", state.stroke.as_deref(), flat);

    // An absent fill defaults to black, while a present but
    // unrecognized one means no paint.
    let fill = match raw_fill {
        Some(value) => color::normalize(&value),
        None => Some("#000000".to_string()),
    };
    let stroke = raw_stroke.and_then(|value| color::normalize(&value));
    let stroke_width = resolve_stroke_width(node, state.stroke_width).unwrap_or(1.0);

    if let Some(hex) = &fill {
        push_color(&mut flat.colors, hex);
    }
    if let Some(hex) = &stroke {
        push_color(&mut flat.colors, hex);
    }

    flat.elements.push(FlatElement {
        d,
        fill,
        stroke,
        stroke_width,
        transform: node_transform(node, state),
    });
}

fn node_transform(node: roxmltree::Node, parent: &State) -> Transform {
    let mut transform = parent.transform;
    if let Some(value) = node.attribute("transform") {
        transform.append(&Transform::from_attribute(value));
    }
    transform
}

/// Resolves a paint value for `fill` or `stroke`.
///
/// An inline `style` declaration wins over the attribute,
/// and the attribute wins over the inherited value.
/// A `url(#id)` fill is flattened to the gradient's first stop color.
fn resolve_paint(
    node: roxmltree::Node,
    doc: &roxmltree::Document,
    name: &str,
    inherited: Option<&str>,
    flat: &mut FlatDocument,
) -> Option<String> {
    let own = style_value(node, name).or_else(|| node.attribute(name).map(|v| v.to_string()));

    let value = match own {
        Some(v) => v.trim().to_string(),
        None => return inherited.map(|v| v.to_string()),
    };

    if name == "fill" {
        if let Some(id) = parse_func_iri(&value) {
            flat.warnings.push(format!(
                "Gradient fill 'url(#{})' is not supported and was flattened to a solid color.",
                id
            ));

            if let Some(stop_color) = gradient_first_stop(doc, &id) {
                return Some(stop_color);
            }
            // An unresolved reference falls through as-is
            // and will normalize to "no paint".
        }
    }

    Some(value)
}

fn resolve_stroke_width(node: roxmltree::Node, inherited: Option<f64>) -> Option<f64> {
    let own = style_value(node, "stroke-width")
        .or_else(|| node.attribute("stroke-width").map(|v| v.to_string()));

    match own {
        Some(v) => svgtypes::Length::from_str(&v)
            .ok()
            .map(|l| l.number)
            .or(inherited),
        None => inherited,
    }
}

/// Returns the value of an inline `style` declaration.
fn style_value(node: roxmltree::Node, name: &str) -> Option<String> {
    let style = node.attribute("style")?;

    let mut result = None;
    for declaration in simplecss::DeclarationTokenizer::from(style) {
        if declaration.name == name {
            result = Some(declaration.value.to_string());
        }
    }

    result
}

/// Extracts `id` from a `url(#id)` value.
fn parse_func_iri(value: &str) -> Option<String> {
    let value = value.trim();
    let rest = value.strip_prefix("url(")?;
    let rest = rest.trim_start().strip_prefix('#')?;
    let id = rest.split(')').next()?.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Looks up a gradient by id and returns its first stop's color value.
fn gradient_first_stop(doc: &roxmltree::Document, id: &str) -> Option<String> {
    let node = doc
        .descendants()
        .find(|n| n.is_element() && n.attribute("id") == Some(id))?;

    let tag = node.tag_name().name();
    if tag != "linearGradient" && tag != "radialGradient" {
        return None;
    }

    let stop = node
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "stop")?;

    style_value(stop, "stop-color").or_else(|| stop.attribute("stop-color").map(|v| v.to_string()))
}

fn push_color(colors: &mut Vec<String>, hex: &str) {
    if !colors.iter().any(|c| c == hex) {
        colors.push(hex.to_string());
    }
}

fn attr_length(node: roxmltree::Node, name: &str) -> Option<f64> {
    let value = node.attribute(name)?;
    svgtypes::Length::from_str(value).ok().map(|l| l.number)
}
