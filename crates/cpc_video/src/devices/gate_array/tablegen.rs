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

    devices::gate_array::tablegen.rs

    Const table generation for Gate Array pixel decoding.

    Screen bytes are bit-interleaved: in mode 0 each byte holds two 4-bit
    pixels, in mode 1 four 2-bit pixels and in mode 2 eight 1-bit pixels.
    Mode 3 is the undocumented 160x200 4-colour mode, decoded like mode 0 with
    the upper two pen bits dropped.

*/

use modular_bitfield::prelude::*;
use strum_macros::{Display, EnumIter};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, EnumIter, BitfieldSpecifier)]
#[bits = 2]
pub enum VideoMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl VideoMode {
    /// Pixels decoded from a single screen byte.
    pub const fn pixels_per_byte(&self) -> usize {
        match self {
            VideoMode::Mode0 | VideoMode::Mode3 => 2,
            VideoMode::Mode1 => 4,
            VideoMode::Mode2 => 8,
        }
    }

    /// Width of one pixel in hi-res dots.
    pub const fn dots_per_pixel(&self) -> usize {
        8 / self.pixels_per_byte()
    }
}

/// Mode 0. Pixel 0 is built from bits 7,3,5,1 and pixel 1 from bits 6,2,4,0
/// (pen bit 0 first).
pub const MODE0_TABLE: [[u8; 2]; 256] = {
    let mut table = [[0u8; 2]; 256];
    let mut byte: usize = 0;
    loop {
        let b = byte as u8;
        let mut px = 0;
        while px < 2 {
            let shift = 1 - px;
            table[byte][px] = ((b >> (6 + shift)) & 0x01)
                | (((b >> (2 + shift)) & 0x01) << 1)
                | (((b >> (4 + shift)) & 0x01) << 2)
                | (((b >> shift) & 0x01) << 3);
            px += 1;
        }
        if byte < 255 {
            byte += 1;
        }
        else {
            break;
        }
    }
    table
};

/// Mode 1. Pixel n takes pen bit 0 from bit 7-n and pen bit 1 from bit 3-n.
pub const MODE1_TABLE: [[u8; 4]; 256] = {
    let mut table = [[0u8; 4]; 256];
    let mut byte: usize = 0;
    loop {
        let b = byte as u8;
        let mut px = 0;
        while px < 4 {
            table[byte][px] = ((b >> (7 - px)) & 0x01) | (((b >> (3 - px)) & 0x01) << 1);
            px += 1;
        }
        if byte < 255 {
            byte += 1;
        }
        else {
            break;
        }
    }
    table
};

/// Mode 2. One bit per pixel, msb first.
pub const MODE2_TABLE: [[u8; 8]; 256] = {
    let mut table = [[0u8; 8]; 256];
    let mut byte: usize = 0;
    loop {
        let mut px = 0;
        while px < 8 {
            table[byte][px] = ((byte >> (7 - px)) & 0x01) as u8;
            px += 1;
        }
        if byte < 255 {
            byte += 1;
        }
        else {
            break;
        }
    }
    table
};

pub const MODE3_TABLE: [[u8; 2]; 256] = {
    let mut table = [[0u8; 2]; 256];
    let mut byte: usize = 0;
    loop {
        table[byte][0] = MODE0_TABLE[byte][0] & 0x03;
        table[byte][1] = MODE0_TABLE[byte][1] & 0x03;
        if byte < 255 {
            byte += 1;
        }
        else {
            break;
        }
    }
    table
};

/// Decode one screen byte into pens for the given mode.
#[inline(always)]
pub fn decode_byte(mode: VideoMode, byte: u8) -> &'static [u8] {
    match mode {
        VideoMode::Mode0 => &MODE0_TABLE[byte as usize],
        VideoMode::Mode1 => &MODE1_TABLE[byte as usize],
        VideoMode::Mode2 => &MODE2_TABLE[byte as usize],
        VideoMode::Mode3 => &MODE3_TABLE[byte as usize],
    }
}
