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

    devices::asic::scroll.rs

    Split screen (SPLT/SSA) and soft scroll (SSCR) registers.

*/

use modular_bitfield::{bitfield, prelude::*};

use super::pri::asic_line;

/// Hi-res dots output per CRTC character.
pub const GROUP_DOTS: usize = 16;

#[derive(Copy, Clone, Debug)]
pub struct SplitScreenState {
    line: u8,
    address: u16,
    armed: bool,
}

impl Default for SplitScreenState {
    fn default() -> Self {
        Self {
            line: 0,
            address: 0,
            armed: true,
        }
    }
}

impl SplitScreenState {
    pub fn set_split(&mut self, line: u8, address: u16) {
        self.line = line;
        self.address = address;
    }

    pub fn set_line(&mut self, line: u8) {
        self.line = line;
    }

    pub fn set_address_high(&mut self, byte: u8) {
        self.address = (self.address & 0x00FF) | (byte as u16) << 8;
    }

    pub fn set_address_low(&mut self, byte: u8) {
        self.address = (self.address & 0xFF00) | byte as u16;
    }

    pub fn line(&self) -> u8 {
        self.line
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Re-arm for a new frame.
    pub fn rearm(&mut self) {
        self.armed = true;
    }

    /// Returns the address to load into the CRTC if this scanline is the
    /// split point. Fires at most once per frame.
    pub fn check(&mut self, row: u8, scanline: u8) -> Option<u16> {
        if self.line == 0 || !self.armed || asic_line(row, scanline) != self.line {
            return None;
        }
        self.armed = false;
        Some(self.address)
    }
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SoftScrollRegister {
    pub h_delay: B4,
    pub v_offset: B3,
    pub border_extend: bool,
}

#[derive(Copy, Clone, Debug)]
pub struct ScrollState {
    reg: SoftScrollRegister,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            reg: SoftScrollRegister::new(),
        }
    }
}

impl ScrollState {
    pub fn set_scroll(&mut self, x_offset: u8, y_offset: u8, border_extend: bool) {
        self.reg = SoftScrollRegister::new()
            .with_h_delay(x_offset & 0x0F)
            .with_v_offset(y_offset & 0x07)
            .with_border_extend(border_extend);
    }

    pub fn write(&mut self, byte: u8) {
        self.reg = SoftScrollRegister::from_bytes([byte]);
    }

    pub fn read(&self) -> u8 {
        self.reg.into_bytes()[0]
    }

    pub fn x_offset(&self) -> usize {
        self.reg.h_delay() as usize
    }

    pub fn y_offset(&self) -> u8 {
        self.reg.v_offset()
    }

    pub fn border_extend(&self) -> bool {
        self.reg.border_extend()
    }

    /// Row address as seen by the video fetch.
    #[inline(always)]
    pub fn row_address(&self, ra: u8) -> u8 {
        ra.wrapping_add(self.reg.v_offset()) & 0x07
    }

    /// Delay a 16-dot group by the horizontal offset. The dots shifted in on
    /// the left come from the tail of the previous group.
    #[inline]
    pub fn shift_group(&self, prev: &[u32; GROUP_DOTS], cur: &[u32; GROUP_DOTS], out: &mut [u32; GROUP_DOTS]) {
        let delay = self.x_offset();
        out[..delay].copy_from_slice(&prev[GROUP_DOTS - delay..]);
        out[delay..].copy_from_slice(&cur[..GROUP_DOTS - delay]);
    }
}
