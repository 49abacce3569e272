// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::Serialize;

use crate::color::{self, Lab};

/// The maximum number of colors a palette can hold.
pub const MAX_PALETTE_SIZE: usize = 64;

/// The AAP-64 palette, the editor's default.
const AAP64_HEX: [&str; 64] = [
    "#060608", "#141013", "#3b1725", "#73172d", "#b4202a", "#df3e23", "#fa6a0a", "#f9a31b",
    "#ffd541", "#fffc40", "#d6f264", "#9cdb43", "#59c135", "#14a02e", "#1a7a3e", "#24523b",
    "#122020", "#143464", "#285cc4", "#249fde", "#20d6c7", "#a6fcdb", "#ffffff", "#fef3c0",
    "#fad6b8", "#f5a097", "#e86a73", "#bc4a9b", "#793a80", "#403353", "#242234", "#221c1a",
    "#322b28", "#71413b", "#bb7547", "#dba463", "#f4d29c", "#dae0ea", "#b3b9d1", "#8b93af",
    "#6d758d", "#4a5462", "#333941", "#422433", "#5b3138", "#8e5252", "#ba756a", "#e9b5a3",
    "#e3e6ff", "#b9bffb", "#849be4", "#588dbe", "#477d85", "#23674e", "#328464", "#5daf8d",
    "#92dcba", "#cdf7e2", "#e4d2aa", "#c7b08b", "#a08662", "#796755", "#5a4e44", "#423934",
];

/// A palette entry: four floats in [0, 1].
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct PaletteColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl PaletteColor {
    /// Creates an opaque palette color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        PaletteColor {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// Returns the color as a flat `[r, g, b, a]` array.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// How an input color was snapped to the palette.
#[derive(Clone, Debug)]
pub struct ColorMapping {
    /// Index of the chosen palette entry.
    pub palette_index: usize,

    /// Hex value of the chosen palette entry.
    pub palette_hex: String,

    /// The chosen palette entry.
    pub palette_color: PaletteColor,

    /// The CIE94 difference between the input and the chosen entry.
    pub distance: f64,
}

/// An ordered color palette of up to 64 entries.
///
/// Entry indices are stable and referenced by the output document.
#[derive(Clone, Debug)]
pub struct Palette {
    hex: Vec<String>,
    colors: Vec<PaletteColor>,
    labs: Vec<Lab>,
}

impl Palette {
    /// Creates a palette from parallel hex and color arrays.
    ///
    /// Returns `None` when the arrays are empty, have different lengths,
    /// exceed [`MAX_PALETTE_SIZE`] or contain an unparsable hex value.
    pub fn new(hex: Vec<String>, colors: Vec<PaletteColor>) -> Option<Self> {
        if hex.is_empty() || hex.len() != colors.len() || hex.len() > MAX_PALETTE_SIZE {
            return None;
        }

        let mut labs = Vec::with_capacity(hex.len());
        for h in &hex {
            let (r, g, b) = color::hex_to_rgb(h)?;
            labs.push(color::srgb_to_lab(r, g, b));
        }

        Some(Palette { hex, colors, labs })
    }

    /// Creates a palette from a hex list, deriving opaque palette colors.
    pub fn from_hex(hex: Vec<String>) -> Option<Self> {
        let mut colors = Vec::with_capacity(hex.len());
        for h in &hex {
            let (r, g, b) = color::hex_to_rgb(h)?;
            colors.push(PaletteColor::from_rgb8(r, g, b));
        }

        Palette::new(hex, colors)
    }

    /// Returns the default AAP-64 palette.
    pub fn aap64() -> Self {
        // The table is known-good, so this cannot fail.
        Palette::from_hex(AAP64_HEX.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    /// Returns the palette hex values.
    #[inline]
    pub fn hex(&self) -> &[String] {
        &self.hex
    }

    /// Returns the palette colors.
    #[inline]
    pub fn colors(&self) -> &[PaletteColor] {
        &self.colors
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.hex.len()
    }

    /// Returns `true` if the palette has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hex.is_empty()
    }

    /// Snaps a normalized input hex value to the perceptually nearest entry.
    ///
    /// Ties are broken by the lowest palette index.
    pub fn nearest(&self, hex: &str) -> Option<ColorMapping> {
        let (r, g, b) = color::hex_to_rgb(hex)?;
        let lab = color::srgb_to_lab(r, g, b);

        let mut best = 0;
        let mut best_distance = f64::MAX;
        for (i, entry) in self.labs.iter().enumerate() {
            let distance = color::cie94_distance(&lab, entry);
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }

        Some(ColorMapping {
            palette_index: best,
            palette_hex: self.hex[best].clone(),
            palette_color: self.colors[best],
            distance: best_distance,
        })
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::aap64()
    }
}
