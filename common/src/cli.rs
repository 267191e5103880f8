use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
#[clap(next_help_heading = "Program Options")]
pub struct ProgramOpts {
    /// Program to load, one word per line. Runs the built-in demo when omitted
    pub program: Option<PathBuf>,

    /// Read PROGRAM as raw big-endian words instead of text
    #[arg(long, requires = "program")]
    pub binary: bool,
}

impl ProgramOpts {
    /// Returns `None` when no program file was given
    pub fn load(&self) -> anyhow::Result<Option<Vec<u32>>> {
        let Some(path) = &self.program else {
            return Ok(None);
        };

        let words = if self.binary {
            crate::program::load_binary(path)?
        } else {
            crate::program::load_text(path)?
        };

        Ok(Some(words))
    }
}

/// Parses an address given as hex (`0x` prefix) or decimal
pub fn parse_address(arg: &str) -> Result<u32, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => arg.parse::<u32>(),
    };

    match parsed {
        Ok(addr) if addr % 4 == 0 => Ok(addr),
        Ok(addr) => Err(format!("{:#010x} is not word aligned", addr)),
        Err(e) => Err(e.to_string()),
    }
}
