//! Board configuration
//!
//! Identity and build options of the STM32N6570-DK discovery kit, as seen
//! by the firmware running on it.

use embedded_display_controller::DisplayConfiguration;

use crate::time::Hertz;

#[cfg(feature = "log")]
use log::error;

/// Board name
pub const BOARD_NAME: &str = "STM32N6570-DK";
/// Microcontroller fitted to the board
pub const MCU_NAME: &str = "STM32N657X0";

/// Crystal on the HSE pins
pub const HSE_FREQ: Hertz = Hertz::from_raw(48_000_000);
/// Crystal on the LSE pins
pub const LSE_FREQ: Hertz = Hertz::from_raw(32_768);

/// The 800x480 RGB panel of the board
pub const DISPLAY_CONFIGURATION: DisplayConfiguration = DisplayConfiguration {
    active_width: 800,
    active_height: 480,
    h_back_porch: 8,
    h_front_porch: 8,
    v_back_porch: 8,
    v_front_porch: 8,
    h_sync: 4,
    v_sync: 4,
    h_sync_pol: false,
    v_sync_pol: false,
    not_data_enable_pol: false,
    pixel_clock_pol: false,
};

/// Log output through the `log` crate
pub const HAS_LOG: bool = cfg!(feature = "log");
/// `defmt::Format` implementations
pub const HAS_DEFMT: bool = cfg!(feature = "defmt");
/// Peripherals are accessed through their non-secure aliases
pub const NON_SECURE: bool = cfg!(feature = "non-secure");

/// Report an unrecoverable error and stop
pub fn fatal_error(msg: &str) -> ! {
    #[cfg(feature = "log")]
    error!("Fatal error: {}", msg);

    panic!("{}", msg);
}
