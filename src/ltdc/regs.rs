//! LTDC register fields
//!
//! See RM0486 Section 40.7 "LTDC registers". The register offsets are in
//! [`LtdcRegisters`](super::LtdcRegisters) and
//! [`LayerRegisters`](super::LayerRegisters).

#![allow(missing_docs)]

use tock_registers::register_bitfields;

/// Largest value of the timing and window position fields, plus one
pub const TIMING_LIMIT: u32 = 1 << 12;

/// Added by the hardware to the line length of a frame buffer
pub const LINE_LENGTH_EXTRA: u32 = 7;

register_bitfields![u32,
    /// Layout shared by SSCR, BPCR, AWCR and TWCR
    pub TIMING [
        V OFFSET(0) NUMBITS(12) [],
        H OFFSET(16) NUMBITS(12) []
    ],
    pub GCR [
        LTDCEN OFFSET(0) NUMBITS(1) [],
        /// Dither enable
        DEN OFFSET(16) NUMBITS(1) [],
        PCPOL OFFSET(28) NUMBITS(1) [],
        DEPOL OFFSET(29) NUMBITS(1) [],
        VSPOL OFFSET(30) NUMBITS(1) [],
        HSPOL OFFSET(31) NUMBITS(1) []
    ],
    /// Shadow reload
    pub SRCR [
        IMR OFFSET(0) NUMBITS(1) [],
        VBR OFFSET(1) NUMBITS(1) []
    ],
    /// Layout shared by IER, ISR and ICR
    pub INTERRUPT [
        /// Line
        LIF OFFSET(0) NUMBITS(1) [],
        /// FIFO underrun
        FUIF OFFSET(1) NUMBITS(1) [],
        /// Transfer error
        TERRIF OFFSET(2) NUMBITS(1) [],
        /// Register reload
        RRIF OFFSET(3) NUMBITS(1) [],
        CRCIF OFFSET(5) NUMBITS(1) []
    ],
    pub LIPCR [
        LIPOS OFFSET(0) NUMBITS(12) []
    ],
    /// Current scan position
    pub CPSR [
        CYPOS OFFSET(0) NUMBITS(16) [],
        CXPOS OFFSET(16) NUMBITS(16) []
    ],
    pub CDSR [
        VDES OFFSET(0) NUMBITS(1) [],
        HDES OFFSET(1) NUMBITS(1) [],
        VSYNCS OFFSET(2) NUMBITS(1) [],
        HSYNCS OFFSET(3) NUMBITS(1) []
    ],

    pub LCR [
        LEN OFFSET(0) NUMBITS(1) [],
        COLKEN OFFSET(1) NUMBITS(1) [],
        CLUTEN OFFSET(4) NUMBITS(1) [],
        /// Horizontal mirror
        HMEN OFFSET(8) NUMBITS(1) []
    ],
    /// Layout shared by WHPCR and WVPCR
    pub WINDOW [
        START OFFSET(0) NUMBITS(12) [],
        STOP OFFSET(16) NUMBITS(12) []
    ],
    pub PFCR [
        PF OFFSET(0) NUMBITS(3) [
            Flexible = 7
        ]
    ],
    pub CACR [
        CONSTA OFFSET(0) NUMBITS(8) []
    ],
    pub BFCR [
        BF2 OFFSET(0) NUMBITS(3) [],
        BF1 OFFSET(8) NUMBITS(3) []
    ],
    /// YUV planar configuration
    pub PCR [
        YCEN OFFSET(0) NUMBITS(1) [],
        YCM OFFSET(1) NUMBITS(2) [],
        YREN OFFSET(3) NUMBITS(1) []
    ],
    /// Layout shared by CFBLR and AFBLR
    pub FBLR [
        /// Line length in bytes plus 7
        LL OFFSET(0) NUMBITS(13) [],
        /// Signed pitch in bytes
        PITCH OFFSET(16) NUMBITS(16) []
    ],
    /// Layout shared by CFBLNR and AFBLNR
    pub FBLNR [
        LN OFFSET(0) NUMBITS(11) []
    ],
    pub CLUTWR [
        RGB OFFSET(0) NUMBITS(24) [],
        CLUTADD OFFSET(24) NUMBITS(8) []
    ],
    /// YUV to RGB conversion coefficients, CYR0R and CYR1R
    pub CYR [
        LOW OFFSET(0) NUMBITS(10) [],
        HIGH OFFSET(16) NUMBITS(10) []
    ],
    /// Flexible pixel format, alpha and red in FPF0R, green and blue with
    /// the pixel size in FPF1R
    pub FPF [
        LOW_POS OFFSET(0) NUMBITS(5) [],
        LOW_LEN OFFSET(5) NUMBITS(4) [],
        HIGH_POS OFFSET(9) NUMBITS(5) [],
        HIGH_LEN OFFSET(14) NUMBITS(4) [],
        PSIZE OFFSET(18) NUMBITS(3) []
    ]
];
