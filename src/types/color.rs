//! Color space tags for frames entering and leaving the pipeline.
//!
//! The engine processes internally in the working domain (BT.2020 primaries,
//! PQ-normalized encoding). Tags describe the encoding of host-facing frames:
//! `Bt2020Pq` carries PQ signal values, the remaining tags carry linear-light
//! channels normalized so that 1.0 corresponds to 10 000 cd/m².

/// Color space tag attached to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// BT.2020 primaries with PQ (SMPTE ST 2084) encoding.
    #[default]
    Bt2020Pq,
    /// DCI-P3 primaries with D65 white, linear light.
    P3D65,
    /// ACEScg (AP1) primaries, linear light.
    AcesCg,
    /// ITU-R BT.709 primaries, linear light.
    Rec709,
}

impl ColorSpace {
    /// Returns the tag name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bt2020Pq => "BT2020_PQ",
            Self::P3D65 => "P3_D65",
            Self::AcesCg => "ACESG",
            Self::Rec709 => "REC709",
        }
    }

    /// Returns whether channel values are PQ-encoded.
    #[must_use]
    pub const fn is_pq_encoded(&self) -> bool {
        matches!(self, Self::Bt2020Pq)
    }

    /// Returns whether this is a wide-gamut space.
    #[must_use]
    pub const fn is_wide_gamut(&self) -> bool {
        !matches!(self, Self::Rec709)
    }

    /// Returns the admissible per-channel range as `(floor, ceiling)`.
    ///
    /// ACEScg keeps a permissive scene-referred range; every other space is
    /// display-referred and bounded to the unit cube.
    #[must_use]
    pub const fn gamut_range(&self) -> (f32, f32) {
        match self {
            Self::AcesCg => (-0.5, 2.0),
            _ => (0.0, 1.0),
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
