//! YUV frame buffers
//!
//! A layer can read YUV 4:2:0 or 4:2:2 frame buffers and convert them to
//! RGB before blending. Luma is always read from the main frame buffer,
//! chroma from the same buffer (co-planar) or from one or two auxiliary
//! planes.

use super::mirror::Plane;

/// Arrangement of the Y, U and V samples in memory
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum YuvLayout {
    /// 4:2:2 with Y, U and V interleaved in one plane, 2 bytes per pixel
    Coplanar = 0,
    /// 4:2:0 with a luma plane and one plane of interleaved U and V
    SemiPlanar = 1,
    /// 4:2:0 with a luma plane and separate U and V planes
    FullPlanar = 2,
}

impl YuvLayout {
    pub(crate) const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(YuvLayout::Coplanar),
            1 => Some(YuvLayout::SemiPlanar),
            2 => Some(YuvLayout::FullPlanar),
            _ => None,
        }
    }

    /// Bytes per pixel of the luma plane
    pub const fn luma_bytes_per_pixel(self) -> u32 {
        match self {
            YuvLayout::Coplanar => 2,
            YuvLayout::SemiPlanar | YuvLayout::FullPlanar => 1,
        }
    }

    /// Number of auxiliary chroma planes
    pub const fn chroma_planes(self) -> usize {
        match self {
            YuvLayout::Coplanar => 0,
            YuvLayout::SemiPlanar => 1,
            YuvLayout::FullPlanar => 2,
        }
    }

    /// Geometry of the chroma planes of an image, `None` for co-planar
    /// buffers
    pub const fn chroma_plane(self, width: u32, height: u32) -> Option<Plane> {
        match self {
            YuvLayout::Coplanar => None,
            // One UV pair for every two pixels of every other line
            YuvLayout::SemiPlanar => Some(Plane {
                width: width / 2,
                height: height / 2,
                bytes_per_pixel: 2,
            }),
            YuvLayout::FullPlanar => Some(Plane {
                width: width / 2,
                height: height / 2,
                bytes_per_pixel: 1,
            }),
        }
    }
}

/// YUV to RGB conversion standard and range
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum YuvConverter {
    /// ITU-R BT.601, full range
    #[default]
    Bt601Full,
    /// ITU-R BT.601, reduced range (Y 16 to 235)
    Bt601Reduced,
    /// ITU-R BT.709, full range
    Bt709Full,
    /// ITU-R BT.709, reduced range (Y 16 to 235)
    Bt709Reduced,
}

/// Conversion coefficients, scaled by 256
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coefficients {
    /// Cr contribution to red
    pub cr_r: u16,
    /// Cb contribution to blue
    pub cb_b: u16,
    /// Cr contribution to green
    pub cr_g: u16,
    /// Cb contribution to green
    pub cb_g: u16,
}

const fn coefficients(cr_r: u16, cb_b: u16, cr_g: u16, cb_g: u16) -> Coefficients {
    Coefficients { cr_r, cb_b, cr_g, cb_g }
}

impl YuvConverter {
    /// Coefficients written into the conversion matrix
    pub const fn coefficients(self) -> Coefficients {
        match self {
            YuvConverter::Bt601Full => coefficients(359, 454, 183, 88),
            YuvConverter::Bt601Reduced => coefficients(409, 517, 208, 100),
            YuvConverter::Bt709Full => coefficients(403, 475, 120, 48),
            YuvConverter::Bt709Reduced => coefficients(459, 541, 136, 55),
        }
    }

    /// True if luma is limited to 16 to 235
    pub const fn is_reduced_range(self) -> bool {
        matches!(self, YuvConverter::Bt601Reduced | YuvConverter::Bt709Reduced)
    }

    /// Converter matching the coefficients read back from a layer
    pub(crate) fn from_coefficients(coef: Coefficients, reduced: bool) -> Self {
        let bt709 = coef == YuvConverter::Bt709Full.coefficients()
            || coef == YuvConverter::Bt709Reduced.coefficients();
        match (bt709, reduced) {
            (false, false) => YuvConverter::Bt601Full,
            (false, true) => YuvConverter::Bt601Reduced,
            (true, false) => YuvConverter::Bt709Full,
            (true, true) => YuvConverter::Bt709Reduced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_table() {
        let c = YuvConverter::Bt709Reduced.coefficients();
        assert_eq!((c.cr_r, c.cb_b, c.cr_g, c.cb_g), (459, 541, 136, 55));

        for conv in [
            YuvConverter::Bt601Full,
            YuvConverter::Bt601Reduced,
            YuvConverter::Bt709Full,
            YuvConverter::Bt709Reduced,
        ] {
            // All coefficients fit in the 10-bit register fields
            let c = conv.coefficients();
            assert!([c.cr_r, c.cb_b, c.cr_g, c.cb_g].iter().all(|&v| v < 1024));
            assert_eq!(
                YuvConverter::from_coefficients(c, conv.is_reduced_range()),
                conv
            );
        }
    }

    #[test]
    fn chroma_geometry() {
        assert_eq!(YuvLayout::Coplanar.chroma_plane(640, 480), None);
        let semi = YuvLayout::SemiPlanar.chroma_plane(640, 480).unwrap();
        assert_eq!((semi.line_bytes(), semi.height), (640, 240));
        let full = YuvLayout::FullPlanar.chroma_plane(640, 480).unwrap();
        assert_eq!((full.line_bytes(), full.height), (320, 240));
        assert_eq!(YuvLayout::FullPlanar.chroma_planes(), 2);
        assert_eq!(YuvLayout::from_bits(3), None);
    }
}
