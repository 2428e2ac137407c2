//! Mirroring through start address and pitch
//!
//! The LTDC always scans a frame buffer from its start address, line by
//! line. A mirrored image is produced without touching the frame buffer:
//!
//! * horizontal: the start address points at the last byte of the first
//!   line and the layer reads each line backwards (`HMEN`)
//! * vertical: the start address points at the first byte of the last line
//!   and the pitch is negative, so the scan moves up through the buffer
//!
//! Both can be combined. [`mirrored_start_address`] computes the address
//! programmed into the layer, [`unmirrored_start_address`] recovers the
//! address of the frame buffer from it.

/// Mirror mode of a layer
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MirrorMode {
    /// Image as stored in memory
    #[default]
    None,
    /// Flipped left to right
    Horizontal,
    /// Flipped top to bottom
    Vertical,
    /// Rotated by 180 degrees
    Both,
}

impl MirrorMode {
    /// Mirror mode from its horizontal and vertical components
    pub const fn from_flags(horizontal: bool, vertical: bool) -> Self {
        match (horizontal, vertical) {
            (false, false) => MirrorMode::None,
            (true, false) => MirrorMode::Horizontal,
            (false, true) => MirrorMode::Vertical,
            (true, true) => MirrorMode::Both,
        }
    }

    /// True if lines are read right to left
    pub const fn is_horizontal(self) -> bool {
        matches!(self, MirrorMode::Horizontal | MirrorMode::Both)
    }

    /// True if lines are read bottom to top
    pub const fn is_vertical(self) -> bool {
        matches!(self, MirrorMode::Vertical | MirrorMode::Both)
    }
}

/// Geometry of one plane of a frame buffer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Plane {
    /// Elements per line
    pub width: u32,
    /// Number of lines
    pub height: u32,
    /// Bytes per element
    pub bytes_per_pixel: u32,
}

impl Plane {
    /// Bytes per line, saturating at `u32::MAX`
    pub const fn line_bytes(&self) -> u32 {
        self.width.saturating_mul(self.bytes_per_pixel)
    }

    /// Signed pitch in bytes for a mirror mode, saturating at `i32::MAX`
    /// bytes either way
    pub const fn pitch(&self, mode: MirrorMode) -> i32 {
        let bytes = if self.line_bytes() > i32::MAX as u32 {
            i32::MAX
        } else {
            self.line_bytes() as i32
        };
        if mode.is_vertical() {
            -bytes
        } else {
            bytes
        }
    }

    /// Offset from the frame buffer to the first byte read by the layer
    const fn offset(&self, mode: MirrorMode) -> u32 {
        let mut offset: u32 = 0;
        if mode.is_horizontal() {
            offset = offset.saturating_add(self.line_bytes().saturating_sub(1));
        }
        if mode.is_vertical() {
            offset = offset.saturating_add(
                self.line_bytes().saturating_mul(self.height.saturating_sub(1)),
            );
        }
        offset
    }
}

/// Address programmed into the layer for a frame buffer at `address`
pub const fn mirrored_start_address(
    address: u32,
    mode: MirrorMode,
    plane: Plane,
) -> u32 {
    address.wrapping_add(plane.offset(mode))
}

/// Frame buffer address for a layer programmed with `start`
pub const fn unmirrored_start_address(
    start: u32,
    mode: MirrorMode,
    plane: Plane,
) -> u32 {
    start.wrapping_sub(plane.offset(mode))
}
