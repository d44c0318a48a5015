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

    devices::gate_array::palette.rs

    Pen to colour resolution.

    The Gate Array selects one of 32 hardware colour numbers (27 distinct
    colours, each RGB channel at 0, 50% or 100%) for each of its 16 inks and
    the border. The Plus ASIC replaces this with 32 entries of 12-bit colour
    RAM. On the Plus, Gate Array ink writes are converted and stored into the
    ASIC RAM so both paths resolve to the same colour.

    Every entry keeps a resolved 0x00RRGGBB value which is refreshed on write,
    so the raster never has to convert colours while drawing.

*/

use crate::config::MachineVariant;

pub const PEN_COUNT: usize = 17;
pub const BORDER_PEN: usize = 16;
/// ASIC palette entries: 16 inks, the border and sprite pens 1-15.
pub const ASIC_PALETTE_ENTRIES: usize = 32;
pub const ASIC_PALETTE_SIZE: usize = ASIC_PALETTE_ENTRIES * 2;
/// Sprite pen n resolves through palette entry SPRITE_PEN_BASE + n.
pub const SPRITE_PEN_BASE: usize = 16;

/// Channel levels (red, green, blue) of each hardware colour number.
const HARDWARE_LEVELS: [(u8, u8, u8); 32] = [
    (1, 1, 1), // 00
    (1, 1, 1),
    (0, 2, 1),
    (2, 2, 1),
    (0, 0, 1),
    (2, 0, 1),
    (0, 1, 1),
    (2, 1, 1),
    (2, 0, 1), // 08
    (2, 2, 1),
    (2, 2, 0),
    (2, 2, 2),
    (2, 0, 0),
    (2, 0, 2),
    (2, 1, 0),
    (2, 1, 2),
    (0, 0, 1), // 10
    (0, 2, 1),
    (0, 2, 0),
    (0, 2, 2),
    (0, 0, 0),
    (0, 0, 2),
    (0, 1, 0),
    (0, 1, 2),
    (1, 0, 1), // 18
    (1, 2, 1),
    (1, 2, 0),
    (1, 2, 2),
    (1, 0, 0),
    (1, 0, 2),
    (1, 1, 0),
    (1, 1, 2),
];

const RGB_LEVELS: [u32; 3] = [0x00, 0x80, 0xFF];
const ASIC_LEVELS: [u16; 3] = [0x0, 0x6, 0xF];

/// Hardware colour number to 0x00RRGGBB.
pub const HARDWARE_PALETTE: [u32; 32] = {
    let mut table = [0u32; 32];
    let mut i = 0;
    while i < 32 {
        let (r, g, b) = HARDWARE_LEVELS[i];
        table[i] = RGB_LEVELS[r as usize] << 16 | RGB_LEVELS[g as usize] << 8 | RGB_LEVELS[b as usize];
        i += 1;
    }
    table
};

/// Hardware colour number to the ASIC's 12-bit 0x0GRB representation.
pub const HARDWARE_TO_ASIC: [u16; 32] = {
    let mut table = [0u16; 32];
    let mut i = 0;
    while i < 32 {
        let (r, g, b) = HARDWARE_LEVELS[i];
        table[i] = ASIC_LEVELS[g as usize] << 8 | ASIC_LEVELS[r as usize] << 4 | ASIC_LEVELS[b as usize];
        i += 1;
    }
    table
};

/// Expand a 12-bit 0x0GRB ASIC colour to 0x00RRGGBB.
#[inline]
pub const fn expand_asic_color(color: u16) -> u32 {
    let g = ((color >> 8) & 0x0F) as u32;
    let r = ((color >> 4) & 0x0F) as u32;
    let b = (color & 0x0F) as u32;
    (r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)
}

pub struct PaletteState {
    mirror_to_asic: bool,
    hardware_colors: [u8; PEN_COUNT],
    asic_ram: [u8; ASIC_PALETTE_SIZE],
    render: [u32; ASIC_PALETTE_ENTRIES],
}

impl PaletteState {
    pub fn new(variant: MachineVariant) -> Self {
        let mut palette = Self {
            mirror_to_asic: variant == MachineVariant::Plus,
            hardware_colors: [0x14; PEN_COUNT],
            asic_ram: [0; ASIC_PALETTE_SIZE],
            render: [0; ASIC_PALETTE_ENTRIES],
        };
        palette.reset();
        palette
    }

    pub fn reset(&mut self) {
        for pen in 0..PEN_COUNT {
            self.write_hardware(pen, 0x14);
        }
        for entry in PEN_COUNT..ASIC_PALETTE_ENTRIES {
            self.set_asic_entry(entry, 0);
        }
    }

    /// Gate Array ink write. `color` is a hardware colour number; bits above
    /// 4 are ignored.
    pub fn write_hardware(&mut self, pen: usize, color: u8) {
        let pen = pen % PEN_COUNT;
        let color = color & 0x1F;
        self.hardware_colors[pen] = color;
        if self.mirror_to_asic {
            self.set_asic_entry(pen, HARDWARE_TO_ASIC[color as usize]);
        }
        else {
            self.render[pen] = HARDWARE_PALETTE[color as usize];
        }
    }

    /// Byte write into ASIC palette RAM. Even offsets hold red and blue,
    /// odd offsets green in the low nibble.
    pub fn write_asic(&mut self, offset: usize, byte: u8) {
        let offset = offset % ASIC_PALETTE_SIZE;
        self.asic_ram[offset] = if offset & 1 == 1 { byte & 0x0F } else { byte };
        let entry = offset >> 1;
        self.render[entry] = expand_asic_color(self.asic_color(entry));
    }

    pub fn read_asic(&self, offset: usize) -> u8 {
        self.asic_ram[offset % ASIC_PALETTE_SIZE]
    }

    /// 12-bit colour of an ASIC palette entry as 0x0GRB.
    pub fn asic_color(&self, entry: usize) -> u16 {
        let entry = entry % ASIC_PALETTE_ENTRIES;
        let rb = self.asic_ram[entry * 2] as u16;
        let g = self.asic_ram[entry * 2 + 1] as u16 & 0x0F;
        g << 8 | rb
    }

    fn set_asic_entry(&mut self, entry: usize, color: u16) {
        self.asic_ram[entry * 2] = (color & 0xFF) as u8;
        self.asic_ram[entry * 2 + 1] = ((color >> 8) & 0x0F) as u8;
        self.render[entry] = expand_asic_color(color);
    }

    /// Hardware colour number last assigned to a pen through the Gate Array.
    pub fn hardware_color(&self, pen: usize) -> u8 {
        self.hardware_colors[pen % PEN_COUNT]
    }

    /// Resolved 0x00RRGGBB colour for a pen (0-15), the border (16) or a
    /// sprite palette entry (17-31).
    #[inline(always)]
    pub fn resolve(&self, pen: usize) -> u32 {
        self.render[pen & (ASIC_PALETTE_ENTRIES - 1)]
    }

    #[inline(always)]
    pub fn border(&self) -> u32 {
        self.render[BORDER_PEN]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_palette_levels() {
        assert_eq!(HARDWARE_PALETTE[0x14], 0x000000);
        assert_eq!(HARDWARE_PALETTE[0x0B], 0xFFFFFF);
        assert_eq!(HARDWARE_PALETTE[0x04], 0x000080);
        assert_eq!(HARDWARE_PALETTE[0x0C], 0xFF0000);
        assert_eq!(HARDWARE_PALETTE[0x12], 0x00FF00);
        assert_eq!(HARDWARE_PALETTE[0x00], 0x808080);
        // 27 distinct colours out of 32 numbers.
        let mut distinct = HARDWARE_PALETTE.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), 27);
    }

    #[test]
    fn asic_conversion() {
        assert_eq!(HARDWARE_TO_ASIC[0x14], 0x000);
        assert_eq!(HARDWARE_TO_ASIC[0x0B], 0xFFF);
        assert_eq!(HARDWARE_TO_ASIC[0x0C], 0x0F0);
        assert_eq!(HARDWARE_TO_ASIC[0x12], 0xF00);
        assert_eq!(HARDWARE_TO_ASIC[0x15], 0x00F);
        assert_eq!(expand_asic_color(0x0F60), 0x66FF00);
    }

    #[test]
    fn base_machine_resolves_every_pen() {
        let mut palette = PaletteState::new(MachineVariant::Cpc);
        for pen in 0..PEN_COUNT {
            let hw = ((pen * 7) % 32) as u8;
            palette.write_hardware(pen, hw);
            assert_eq!(palette.resolve(pen), HARDWARE_PALETTE[hw as usize]);
            assert_eq!(palette.hardware_color(pen), hw);
        }
    }

    #[test]
    fn plus_resolves_from_asic_ram() {
        let mut palette = PaletteState::new(MachineVariant::Plus);
        for pen in 0..PEN_COUNT {
            let rb = (pen as u8) << 4 | (15 - pen as u8 % 16);
            let g = (pen as u8 * 3) & 0x0F;
            palette.write_asic(pen * 2, rb);
            palette.write_asic(pen * 2 + 1, 0xF0 | g);
            let expected = (g as u16) << 8 | rb as u16;
            assert_eq!(palette.asic_color(pen), expected);
            assert_eq!(palette.resolve(pen), expand_asic_color(expected));
        }
    }

    #[test]
    fn plus_mirrors_gate_array_writes() {
        let mut palette = PaletteState::new(MachineVariant::Plus);
        palette.write_hardware(BORDER_PEN, 0x0C);
        assert_eq!(palette.read_asic(BORDER_PEN * 2), 0xF0);
        assert_eq!(palette.read_asic(BORDER_PEN * 2 + 1), 0x00);
        assert_eq!(palette.border(), 0xFF0000);

        // A later ASIC write wins over the mirrored value.
        palette.write_asic(BORDER_PEN * 2 + 1, 0x0F);
        assert_eq!(palette.border(), 0xFFFF00);
    }
}
