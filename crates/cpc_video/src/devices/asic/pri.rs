/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    devices::asic::pri.rs

    Programmable raster interrupt.

*/

/// Bit of the Gate Array HSYNC counter cleared when the PRI fires. The same
/// bit is cleared by an interrupt acknowledge, so a PRI interrupt pushes the
/// next periodic interrupt back exactly as a taken one would.
pub const PRI_COUNTER_RESET_BIT: u8 = 0x20;

/// The ASIC line counter compared against PRI and SPLT.
#[inline(always)]
pub const fn asic_line(row: u8, scanline: u8) -> u8 {
    ((row & 0x1F) << 3) | (scanline & 0x07)
}

#[derive(Copy, Clone, Debug, Default)]
pub struct RasterInterrupt {
    target: u8,
}

impl RasterInterrupt {
    pub fn set_target(&mut self, line: u8) {
        self.target = line;
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    /// A non-zero PRI takes the interrupt line away from the Gate Array's
    /// periodic HSYNC counter.
    pub fn owns_interrupts(&self) -> bool {
        self.target != 0
    }

    /// Compare the current (row, scanline) against the programmed line.
    /// On a match, clears bit 5 of the Gate Array HSYNC counter and returns
    /// true; the caller raises the interrupt.
    pub fn check_pri(&self, row: u8, scanline: u8, hsync_counter: &mut u8) -> bool {
        if self.target == 0 || asic_line(row, scanline) != self.target {
            return false;
        }
        *hsync_counter &= !PRI_COUNTER_RESET_BIT;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_counter_layout() {
        assert_eq!(asic_line(0, 0), 0);
        assert_eq!(asic_line(10, 0), 80);
        assert_eq!(asic_line(10, 7), 87);
        // Row wraps at 32, scanline at 8.
        assert_eq!(asic_line(33, 9), asic_line(1, 1));
    }

    #[test]
    fn disabled_never_fires() {
        let pri = RasterInterrupt::default();
        let mut counter = 0x3F;
        for row in 0..40 {
            for sl in 0..8 {
                assert!(!pri.check_pri(row, sl, &mut counter));
            }
        }
        assert_eq!(counter, 0x3F);
        assert!(!pri.owns_interrupts());
    }

    #[test]
    fn match_clears_counter_bit5() {
        let mut pri = RasterInterrupt::default();
        pri.set_target(asic_line(12, 3));
        assert!(pri.owns_interrupts());

        let mut counter = 0x2A;
        assert!(!pri.check_pri(12, 2, &mut counter));
        assert_eq!(counter, 0x2A);
        assert!(pri.check_pri(12, 3, &mut counter));
        assert_eq!(counter, 0x0A);

        // Bit 5 already clear: only the interrupt is reported.
        let mut counter = 0x11;
        assert!(pri.check_pri(12, 3, &mut counter));
        assert_eq!(counter, 0x11);
    }
}
