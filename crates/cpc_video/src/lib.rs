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

    cpc_video::lib.rs

    Gate Array and ASIC raster emulation for the Amstrad CPC and CPC Plus.

    The crate does not own a CRTC, a CPU or a sound chip. A host machine drives
    it from its 6845 clock and sync edge callbacks, passing the collaborators in
    through a RasterBus on every call.

*/

pub mod config;
pub mod device_traits;
pub mod devices;
pub mod error;
pub mod tracelogger;

pub use config::{MachineVariant, ModeLatch, VideoConfig};
pub use device_traits::{CrtcSignalSource, InterruptLine, PsgPort, RasterBus};
pub use devices::video::CpcVideo;
pub use error::VideoError;
