use std::fmt;

use super::instructions::MIPS_REG_NAMES;

/// The 32 general purpose registers. `$zero` is hard-wired, writes to it are dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct RegFile {
    regs: [u32; 32],
}

impl RegFile {
    pub fn new() -> RegFile {
        RegFile {
            regs: [0; 32],
        }
    }

    /// Only the low 5 bits of `reg` select a register
    #[inline(always)]
    pub fn read(&self, reg: u8) -> u32 {
        self.regs[usize::from(reg & 0x1f)]
    }

    #[inline(always)]
    pub fn write(&mut self, reg: u8, val: u32) {
        let reg = usize::from(reg & 0x1f);
        if reg != 0 {
            self.regs[reg] = val;
        }
    }

    pub fn as_array(&self) -> &[u32; 32] {
        &self.regs
    }
}

impl Default for RegFile {
    fn default() -> Self {
        RegFile::new()
    }
}

impl fmt::Debug for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(MIPS_REG_NAMES.iter().zip(self.regs.iter().map(|r| format!("{:#010x}", r))))
            .finish()
    }
}

/// Four registers to a line
impl fmt::Display for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, names) in MIPS_REG_NAMES.chunks(4).enumerate() {
            let line: Vec<String> = names.iter().enumerate().map(|(col, name)| {
                format!("{:>5} = {:#010x}", name, self.regs[row * 4 + col])
            }).collect();
            writeln!(f, "{}", line.join("  "))?;
        }
        Ok(())
    }
}
