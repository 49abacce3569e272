// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svg2drawing` converts an arbitrary SVG document into a fixed-schema
vector drawing consumable by a pixel-art editor.

The editor's primitives are far more restrictive than SVG's: a bounded
square canvas in floating-point drawing units, a palette of up to
64 colors, path segments limited to straight lines and single-bend
quadratic curves, and a raster fill layer baked at a fixed resolution.
The conversion therefore degrades the input on purpose:

- Basic shapes (like `rect` and `circle`) are converted into paths
- Inheritable attributes, transforms and nested containers are resolved
- Cubic curves are reduced to quadratics by adaptive subdivision,
  elliptical arcs are split into at most 90° quadratic slices
- Every color is snapped to the perceptually nearest palette entry
  under the CIE94 metric
- Gradients collapse to their first stop color
- All input paths merge into a single output layer

## Limitations

- Stroke widths are not preserved; varying widths produce a warning
- Clip paths, masks, text, filters and patterns are ignored
- Smooth path commands (`S`/`T`) lose their reflected control points

The converter never fails on degraded input. Only unparsable XML or a
missing root `svg` element are fatal; everything else is dropped or
substituted locally and reported as a warning.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::too_many_arguments)]

mod color;
mod converter;
mod drawing;
mod error;
mod flatten;
mod geom;
mod palette;
mod path;
mod rasterize;
mod shapes;

pub use roxmltree;

pub use crate::color::{cie94_distance, hex_to_rgb, normalize, srgb_to_lab, Lab};
pub use crate::converter::{Conversion, Options};
pub use crate::drawing::*;
pub use crate::error::*;
pub use crate::flatten::{FlatDocument, FlatElement};
pub use crate::geom::*;
pub use crate::palette::*;
pub use crate::rasterize::{PixmapRasterizer, Rasterize};
