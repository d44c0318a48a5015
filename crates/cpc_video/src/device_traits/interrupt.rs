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

    device_traits::interrupt.rs

    The Z80 /INT line. The Gate Array counter, the ASIC raster interrupt and
    the DMA INT instruction all drive the same line.

*/

pub trait InterruptLine {
    fn assert_irq(&mut self);
}

/// Latch that remembers a request until the CPU takes it. Convenient for
/// hosts that poll for pending interrupts between instructions.
#[derive(Debug, Default)]
pub struct IrqLatch {
    pub pending: bool,
    pub count:   u64,
}

impl IrqLatch {
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl InterruptLine for IrqLatch {
    fn assert_irq(&mut self) {
        self.pending = true;
        self.count += 1;
    }
}
