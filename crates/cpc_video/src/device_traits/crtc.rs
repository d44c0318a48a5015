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

    device_traits::crtc.rs

    The signal side of a 6845 as seen by the Gate Array and ASIC. The CRTC
    register file and counters live in the host; the video core only samples
    its outputs and, for split screen, overrides the latched start address.

*/

pub trait CrtcSignalSource {
    /// MA0-MA13 for the character currently being fetched.
    fn memory_address(&self) -> u16;

    /// RA0-RA4, the scanline within the current character row.
    fn row_address(&self) -> u8;

    /// Vertical character counter (C4).
    fn vertical_character_count(&self) -> u8;

    /// R1
    fn horizontal_displayed(&self) -> u8;

    /// R6
    fn vertical_displayed(&self) -> u8;

    /// R9
    fn maximum_scanline(&self) -> u8;

    /// Replace the CRTC's current memory address and the row start latch it
    /// reloads from at the start of each scanline. Used by the ASIC split
    /// screen.
    fn load_memory_address(&mut self, addr: u16);
}
