// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use float_cmp::ApproxEqUlps;

/// A trait for fuzzy/approximate equality comparisons of float numbers.
pub trait FuzzyEq<Rhs: ?Sized = Self> {
    /// Returns `true` if values are approximately equal.
    fn fuzzy_eq(&self, other: &Rhs) -> bool;

    /// Returns `true` if values are not approximately equal.
    #[inline]
    fn fuzzy_ne(&self, other: &Rhs) -> bool {
        !self.fuzzy_eq(other)
    }
}

/// A trait for fuzzy/approximate comparisons of float numbers.
pub trait FuzzyZero: FuzzyEq {
    /// Returns `true` if the number is approximately zero.
    fn is_fuzzy_zero(&self) -> bool;
}

impl FuzzyEq for f64 {
    #[inline]
    fn fuzzy_eq(&self, other: &f64) -> bool {
        self.approx_eq_ulps(other, 4)
    }
}

impl FuzzyZero for f64 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.fuzzy_eq(&0.0)
    }
}

/// Checks that the current number is > 0.
pub trait IsValidLength {
    /// Checks that the current number is > 0.
    fn is_valid_length(&self) -> bool;
}

impl IsValidLength for f64 {
    #[inline]
    fn is_valid_length(&self) -> bool {
        *self > 0.0
    }
}

/// A 2D affine transform in SVG's six-component form.
///
/// The components map a point as
/// `(a*x + c*y + e, b*x + d*y + f)`; the identity is `(1 0 0 1 0 0)`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl From<svgtypes::Transform> for Transform {
    fn from(ts: svgtypes::Transform) -> Self {
        Transform::new(ts.a, ts.b, ts.c, ts.d, ts.e, ts.f)
    }
}

impl Transform {
    /// Creates a transform from its six components.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// Creates a translation by `(tx, ty)`.
    pub fn new_translate(tx: f64, ty: f64) -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Creates a scale by `(sx, sy)`.
    pub fn new_scale(sx: f64, sy: f64) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Creates a rotation around the origin, in degrees.
    pub fn new_rotate(angle: f64) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        Transform::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Parses a `transform` attribute value.
    ///
    /// Any whitespace or comma separated list of `matrix`, `translate`,
    /// `scale`, `rotate`, `skewX` and `skewY` primitives is accepted,
    /// with `rotate(angle cx cy)` resolved per the SVG spec.
    /// An unparsable value resolves to the identity transform.
    pub fn from_attribute(text: &str) -> Self {
        svgtypes::Transform::from_str(text)
            .map(Transform::from)
            .unwrap_or_default()
    }

    /// Appends a translation.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.append(&Transform::new_translate(tx, ty));
    }

    /// Appends a scale.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.append(&Transform::new_scale(sx, sy));
    }

    /// Appends a rotation around the origin, in degrees.
    pub fn rotate(&mut self, angle: f64) {
        self.append(&Transform::new_rotate(angle));
    }

    /// Appends a rotation around `(x, y)`, in degrees.
    pub fn rotate_at(&mut self, angle: f64, x: f64, y: f64) {
        self.translate(x, y);
        self.rotate(angle);
        self.translate(-x, -y);
    }

    /// Appends `other` to this transform.
    ///
    /// A point run through the combined transform passes through
    /// `other` first.
    pub fn append(&mut self, other: &Transform) {
        *self = self.combined(other);
    }

    // The matrix product `self x other`.
    fn combined(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Returns `true` for the identity transform.
    pub fn is_identity(&self) -> bool {
        self.fuzzy_eq(&Transform::default())
    }

    /// Maps a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

impl Default for Transform {
    fn default() -> Transform {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl FuzzyEq for Transform {
    fn fuzzy_eq(&self, other: &Self) -> bool {
        let lhs = [self.a, self.b, self.c, self.d, self.e, self.f];
        let rhs = [other.a, other.b, other.c, other.d, other.e, other.f];
        lhs.iter().zip(rhs.iter()).all(|(a, b)| a.fuzzy_eq(b))
    }
}

/// View box.
///
/// Width and height are guarantee to be > 0.
#[derive(Clone, Copy, Debug)]
pub struct ViewBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl ViewBox {
    /// Creates a new `ViewBox` from values.
    #[inline]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Option<Self> {
        if w.is_valid_length() && h.is_valid_length() {
            Some(ViewBox { x, y, w, h })
        } else {
            None
        }
    }

    /// Returns the X origin.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Returns the Y origin.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns the width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.w
    }

    /// Returns the height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.h
    }

    /// Returns the transform from viewBox space into drawing-unit space.
    ///
    /// The longer viewBox dimension spans the full drawing width
    /// `2 * half_extent`, the aspect ratio is preserved and the result
    /// is centered at the origin.
    pub fn fit_to_drawing(&self, half_extent: f64) -> Transform {
        let s = half_extent * 2.0 / self.w.max(self.h);
        Transform::new(
            s,
            0.0,
            0.0,
            s,
            -self.x * s - self.w * s / 2.0,
            -self.y * s - self.h * s / 2.0,
        )
    }
}
