// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

/// A color in the CIE L*a*b* space.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Normalizes a CSS color string into a 6-digit lowercase hex value.
///
/// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa` (alpha is dropped),
/// `rgb()`/`rgba()` functions (alpha is ignored) and named colors.
/// `none`, `transparent` and unrecognized values resolve to `None`,
/// aka "no paint".
pub fn normalize(text: &str) -> Option<String> {
    let text = text.trim().to_lowercase();
    if text.is_empty() || text == "none" || text == "transparent" {
        return None;
    }

    let c = svgtypes::Color::from_str(&text).ok()?;
    Some(format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue))
}

/// Parses a normalized `#rrggbb` value into its channels.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Converts an sRGB color into CIE L*a*b* under the D65 illuminant.
pub fn srgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    fn linearize(c: f64) -> f64 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    // CIE standard constants.
    const EPSILON: f64 = 0.008856;
    const KAPPA: f64 = 903.3;

    fn lab_f(t: f64) -> f64 {
        if t > EPSILON {
            t.cbrt()
        } else {
            (KAPPA * t + 16.0) / 116.0
        }
    }

    let r = linearize(r as f64 / 255.0);
    let g = linearize(g as f64 / 255.0);
    let b = linearize(b as f64 / 255.0);

    // sRGB to XYZ, normalized by the D65 white point.
    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / 0.95047;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / 1.08883;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Calculates the CIE94 color difference with graphic-arts weighting.
///
/// kL=1, K1=0.045, K2=0.015. Identical inputs yield 0.
pub fn cie94_distance(c1: &Lab, c2: &Lab) -> f64 {
    const K1: f64 = 0.045;
    const K2: f64 = 0.015;

    let delta_l = c1.l - c2.l;
    let chroma1 = (c1.a * c1.a + c1.b * c1.b).sqrt();
    let chroma2 = (c2.a * c2.a + c2.b * c2.b).sqrt();
    let delta_c = chroma1 - chroma2;
    let delta_a = c1.a - c2.a;
    let delta_b = c1.b - c2.b;
    let delta_h2 = (delta_a * delta_a + delta_b * delta_b - delta_c * delta_c).max(0.0);

    let sc = 1.0 + K1 * chroma1;
    let sh = 1.0 + K2 * chroma1;

    let dc = delta_c / sc;
    (delta_l * delta_l + dc * dc + delta_h2 / (sh * sh)).sqrt()
}
