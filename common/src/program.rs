//! Loading programs into a word array.
//!
//! Two formats are understood:
//!  - text: one word per line, hex by default (optional `0x` prefix) or binary with a `0b`
//!    prefix. `_` may be used as a separator, `#` starts a comment.
//!  - binary: a flat sequence of big-endian 32 bit words.

use std::path::Path;

use anyhow::{bail, Context};

pub fn load_text(path: &Path) -> anyhow::Result<Vec<u32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    parse_text(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_binary(path: &Path) -> anyhow::Result<Vec<u32>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    parse_binary(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_text(text: &str) -> anyhow::Result<Vec<u32>> {
    let mut words = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let code = match line.split_once('#') {
            Some((code, _comment)) => code,
            None => line,
        }.trim();

        if code.is_empty() {
            continue;
        }

        let word = parse_word(code)
            .with_context(|| format!("line {}: {:?}", line_no + 1, code))?;
        words.push(word);
    }

    Ok(words)
}

pub fn parse_binary(bytes: &[u8]) -> anyhow::Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        bail!("length {} is not a whole number of 32 bit words", bytes.len());
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn parse_word(token: &str) -> anyhow::Result<u32> {
    let token: String = token.chars().filter(|&c| c != '_').collect();

    let (digits, radix) = if let Some(bin) = token.strip_prefix("0b") {
        (bin, 2)
    } else if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        (hex, 16)
    } else {
        (token.as_str(), 16)
    };

    u32::from_str_radix(digits, radix)
        .with_context(|| format!("{:?} is not a 32 bit word", token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_program() {
        let text = "\
            # countdown\n\
            0x2909000a   # slti\n\
            \n\
            11200002\n\
            0b001000_01000_01000_0000000000000001\n\
            0X01000008\n";

        let words = parse_text(text).unwrap();
        assert_eq!(words, vec![0x2909000a, 0x11200002, 0x21080001, 0x01000008]);
    }

    #[test]
    fn text_errors_name_the_line() {
        let err = parse_text("00000000\nnope\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        // 33 bits
        assert!(parse_text("0x1_0000_0000").is_err());
    }

    #[test]
    fn binary_program() {
        let bytes = [0x01, 0x00, 0x00, 0x08, 0x20, 0x08, 0x00, 0x01];
        assert_eq!(parse_binary(&bytes).unwrap(), vec![0x01000008, 0x20080001]);

        assert!(parse_binary(&bytes[..5]).is_err());
        assert!(parse_binary(&[]).unwrap().is_empty());
    }
}
