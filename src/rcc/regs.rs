//! RCC register fields
//!
//! See RM0486 Section 14.10 "RCC registers". The register offsets are in
//! [`RccRegisters`](super::RccRegisters).

#![allow(missing_docs)]

use tock_registers::fields::Field;
use tock_registers::register_bitfields;

register_bitfields![u32,
    /// Oscillator and PLL enables. Also the layout of the set and clear
    /// aliases.
    pub CR [
        LSION OFFSET(0) NUMBITS(1) [],
        LSEON OFFSET(1) NUMBITS(1) [],
        MSION OFFSET(2) NUMBITS(1) [],
        HSION OFFSET(3) NUMBITS(1) [],
        HSEON OFFSET(4) NUMBITS(1) [],
        PLL1ON OFFSET(8) NUMBITS(1) [],
        PLL2ON OFFSET(9) NUMBITS(1) [],
        PLL3ON OFFSET(10) NUMBITS(1) [],
        PLL4ON OFFSET(11) NUMBITS(1) []
    ],
    /// Oscillator and PLL ready flags, at the positions of the enables
    pub SR [
        LSIRDY OFFSET(0) NUMBITS(1) [],
        LSERDY OFFSET(1) NUMBITS(1) [],
        MSIRDY OFFSET(2) NUMBITS(1) [],
        HSIRDY OFFSET(3) NUMBITS(1) [],
        HSERDY OFFSET(4) NUMBITS(1) [],
        PLL1RDY OFFSET(8) NUMBITS(1) [],
        PLL2RDY OFFSET(9) NUMBITS(1) [],
        PLL3RDY OFFSET(10) NUMBITS(1) [],
        PLL4RDY OFFSET(11) NUMBITS(1) []
    ],
    pub CFGR1 [
        /// CPU clock switch
        CPUSW OFFSET(16) NUMBITS(2) [],
        /// CPU clock switch status
        CPUSWS OFFSET(20) NUMBITS(2) [],
        /// System bus clock switch
        SYSSW OFFSET(24) NUMBITS(2) [],
        /// System bus clock switch status
        SYSSWS OFFSET(28) NUMBITS(2) []
    ],
    /// Bus prescalers, as log2 of the division factor
    pub CFGR2 [
        PPRE1 OFFSET(0) NUMBITS(3) [],
        PPRE2 OFFSET(4) NUMBITS(3) [],
        PPRE4 OFFSET(12) NUMBITS(3) [],
        PPRE5 OFFSET(16) NUMBITS(3) [],
        HPRE OFFSET(20) NUMBITS(3) [],
        TIMPRE OFFSET(24) NUMBITS(2) []
    ],
    pub MSICFGR [
        MSIFREQSEL OFFSET(9) NUMBITS(1) [
            Freq4MHz = 0,
            Freq16MHz = 1
        ]
    ],
    pub HSICFGR [
        HSIDIV OFFSET(7) NUMBITS(2) []
    ],
    pub HSECFGR [
        /// External clock instead of a crystal. Writable while HSE is off.
        HSEBYP OFFSET(4) NUMBITS(1) []
    ],
    pub PLLCFGR1 [
        PLLDIVN OFFSET(8) NUMBITS(12) [],
        PLLDIVM OFFSET(20) NUMBITS(6) [],
        PLLBYP OFFSET(27) NUMBITS(1) [],
        PLLSEL OFFSET(28) NUMBITS(3) []
    ],
    pub PLLCFGR2 [
        PLLDIVNFRAC OFFSET(0) NUMBITS(24) []
    ],
    pub PLLCFGR3 [
        PLLPDIV2 OFFSET(24) NUMBITS(3) [],
        PLLPDIV1 OFFSET(27) NUMBITS(3) [],
        PLLPDIVEN OFFSET(30) NUMBITS(1) []
    ],
    pub ICCFGR [
        /// Division factor minus one
        ICINT OFFSET(16) NUMBITS(8) [],
        ICSEL OFFSET(28) NUMBITS(2) []
    ]
];

/// ADC prescaler in CCIPR1, next to the ADF1 and ADC multiplexers. The
/// kernel clock multiplexer registers are untyped, so is this field.
pub const ADCPRE: Field<u32, ()> = Field::new(0xFF, 8);

/// Number of kernel clock configuration registers, CCIPR1 to CCIPR14
pub const CCIPR_COUNT: usize = 14;

/// Number of bus reset and enable registers
pub const BUS_COUNT: usize = 12;

// Index of each bus in the reset and enable register arrays
pub const AHB1: usize = 0;
pub const AHB2: usize = 1;
pub const AHB3: usize = 2;
pub const AHB4: usize = 3;
pub const AHB5: usize = 4;
pub const APB1_1: usize = 5;
pub const APB1_2: usize = 6;
pub const APB2: usize = 7;
pub const APB3: usize = 8;
pub const APB4_1: usize = 9;
pub const APB4_2: usize = 10;
pub const APB5: usize = 11;
