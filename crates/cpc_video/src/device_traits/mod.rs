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

    device_traits::mod.rs

    Seams to the chips that surround the Gate Array and ASIC.

*/

pub mod crtc;
pub mod interrupt;
pub mod psg;

pub use crtc::CrtcSignalSource;
pub use interrupt::InterruptLine;
pub use psg::PsgPort;

/// Everything the video core touches outside of itself for the duration of
/// one callback. Built by the host machine around its own devices.
pub struct RasterBus<'a> {
    pub crtc: &'a mut dyn CrtcSignalSource,
    /// Base 64K of machine RAM. Video fetch and DMA instruction fetch both
    /// read from here.
    pub mem:  &'a [u8],
    pub psg:  &'a mut dyn PsgPort,
    pub irq:  &'a mut dyn InterruptLine,
}

impl<'a> RasterBus<'a> {
    pub fn new(
        crtc: &'a mut dyn CrtcSignalSource,
        mem: &'a [u8],
        psg: &'a mut dyn PsgPort,
        irq: &'a mut dyn InterruptLine,
    ) -> Self {
        Self { crtc, mem, psg, irq }
    }
}

/// Read a byte of machine memory with 16-bit address wrap. Addresses past the
/// end of a short slice read as 0.
#[inline(always)]
pub fn read_u8(mem: &[u8], addr: usize) -> u8 {
    mem.get(addr & 0xFFFF).copied().unwrap_or(0)
}

/// Read a little-endian word. The high byte wraps within 64K.
#[inline(always)]
pub fn read_u16(mem: &[u8], addr: usize) -> u16 {
    read_u8(mem, addr) as u16 | (read_u8(mem, addr.wrapping_add(1)) as u16) << 8
}
