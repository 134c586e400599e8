//! 3x3 primaries conversion matrices.
//!
//! All transforms in and out of the BT.2020 working primaries are literal
//! constants; inverses are shipped alongside their forward matrices and no
//! inversion happens at runtime. The matrix set is frozen configuration: the
//! identity choice per color space pair is part of the determinism contract.
//!
//! The ACEScg pair ships as identity placeholders. Replacing them with real
//! AP1 matrices is a deployment decision, not an algorithm change.

use crate::types::ColorSpace;

/// A 3x3 row-major matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3(pub [[f32; 3]; 3]);

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Applies the matrix to a column vector.
    #[must_use]
    pub fn transform(&self, v: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Matrix product `self * rhs`.
    #[must_use]
    pub fn mul(&self, rhs: &Self) -> Self {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [[0.0f32; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
            }
        }
        Self(out)
    }

    /// Returns whether the matrix is the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// BT.2020 linear RGB to CIE XYZ (D65).
pub const BT2020_TO_XYZ: Mat3 = Mat3([
    [0.6369580, 0.1446169, 0.1688810],
    [0.2627002, 0.6779981, 0.0593017],
    [0.0000000, 0.0280727, 1.0609851],
]);

/// CIE XYZ (D65) to BT.2020 linear RGB.
pub const XYZ_TO_BT2020: Mat3 = Mat3([
    [1.7166512, -0.3556708, -0.2533663],
    [-0.6666844, 1.6164812, 0.0157685],
    [0.0176399, -0.0427706, 0.9421031],
]);

/// BT.2020 linear RGB to P3-D65 linear RGB.
pub const BT2020_TO_P3D65: Mat3 = Mat3([
    [1.3435783, -0.2821797, -0.0613986],
    [-0.0652975, 1.0757879, -0.0104905],
    [0.0028218, -0.0195985, 1.0167767],
]);

/// P3-D65 linear RGB to BT.2020 linear RGB.
pub const P3D65_TO_BT2020: Mat3 = Mat3([
    [0.7538330, 0.1985974, 0.0475696],
    [0.0457438, 0.9417772, 0.0124789],
    [-0.0012103, 0.0176017, 0.9836086],
]);

/// BT.2020 linear RGB to BT.709 linear RGB.
pub const BT2020_TO_REC709: Mat3 = Mat3([
    [1.6604910, -0.5876411, -0.0728499],
    [-0.1245505, 1.1328999, -0.0083494],
    [-0.0181508, -0.1005789, 1.1187297],
]);

/// BT.709 linear RGB to BT.2020 linear RGB.
pub const REC709_TO_BT2020: Mat3 = Mat3([
    [0.6274039, 0.3292830, 0.0433131],
    [0.0690973, 0.9195404, 0.0113623],
    [0.0163914, 0.0880133, 0.8955953],
]);

/// BT.2020 linear RGB to ACEScg. Frozen identity placeholder.
pub const BT2020_TO_ACESCG: Mat3 = Mat3::IDENTITY;

/// ACEScg to BT.2020 linear RGB. Frozen identity placeholder.
pub const ACESCG_TO_BT2020: Mat3 = Mat3::IDENTITY;

/// Returns the matrix converting a space's linear RGB into BT.2020.
#[must_use]
pub const fn to_working_matrix(space: ColorSpace) -> Mat3 {
    match space {
        ColorSpace::Bt2020Pq => Mat3::IDENTITY,
        ColorSpace::P3D65 => P3D65_TO_BT2020,
        ColorSpace::AcesCg => ACESCG_TO_BT2020,
        ColorSpace::Rec709 => REC709_TO_BT2020,
    }
}

/// Returns the matrix converting BT.2020 linear RGB into a space.
#[must_use]
pub const fn from_working_matrix(space: ColorSpace) -> Mat3 {
    match space {
        ColorSpace::Bt2020Pq => Mat3::IDENTITY,
        ColorSpace::P3D65 => BT2020_TO_P3D65,
        ColorSpace::AcesCg => BT2020_TO_ACESCG,
        ColorSpace::Rec709 => BT2020_TO_REC709,
    }
}
