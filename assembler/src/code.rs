//! Binary encoding of Hack instructions
//!
//! All mnemonic tables are `phf` compile-time perfect-hash maps: O(1) lookup
//! with zero runtime construction cost. Unknown mnemonics are encoding
//! errors, never silently defaulted.

use phf::phf_map;
use std::fmt;

/// Destination mnemonic to binary code mapping (3 bits)
static DEST_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "M" => "001",
    "D" => "010",
    "MD" => "011",
    "A" => "100",
    "AM" => "101",
    "AD" => "110",
    "AMD" => "111",
};

/// Computation mnemonic to binary code mapping (7 bits: 1 bit 'a' + 6 bits 'cccccc')
///
/// Includes both a=0 (A register) and a=1 (M register) variants.
static COMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    // a=0 (A register operations)
    "0" => "0101010",
    "1" => "0111111",
    "-1" => "0111010",
    "D" => "0001100",
    "A" => "0110000",
    "!D" => "0001101",
    "!A" => "0110001",
    "-D" => "0001111",
    "-A" => "0110011",
    "D+1" => "0011111",
    "A+1" => "0110111",
    "D-1" => "0001110",
    "A-1" => "0110010",
    "D+A" => "0000010",
    "D-A" => "0010011",
    "A-D" => "0000111",
    "D&A" => "0000000",
    "D|A" => "0010101",

    // a=1 (M register operations)
    "M" => "1110000",
    "!M" => "1110001",
    "-M" => "1110011",
    "M+1" => "1110111",
    "M-1" => "1110010",
    "D+M" => "1000010",
    "D-M" => "1010011",
    "M-D" => "1000111",
    "D&M" => "1000000",
    "D|M" => "1010101",
};

/// Shift computation mnemonics (extended ALU, instruction prefix `101`)
///
/// Encoding: bit 1 selects shift-left, bit 0 selects the M operand and
/// bit 2 the D operand; all bits clear shifts A right.
static SHIFT_COMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "A<<" => "0100000",
    "D<<" => "0110000",
    "M<<" => "1100000",
    "A>>" => "0000000",
    "D>>" => "0010000",
    "M>>" => "1000000",
};

/// Jump mnemonic to binary code mapping (3 bits)
static JUMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "JGT" => "001",
    "JEQ" => "010",
    "JGE" => "011",
    "JLT" => "100",
    "JNE" => "101",
    "JLE" => "110",
    "JMP" => "111",
};

const C_PREFIX: &str = "111";
const SHIFT_PREFIX: &str = "101";

/// Unknown mnemonic in one of the three C-instruction fields
#[derive(Debug, PartialEq, Eq)]
pub enum EncodingError {
    UnknownDest(String),
    UnknownComp(String),
    UnknownJump(String),
}

impl std::error::Error for EncodingError {}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownDest(m) => write!(f, "unknown dest mnemonic: {m}"),
            Self::UnknownComp(m) => write!(f, "unknown comp mnemonic: {m}"),
            Self::UnknownJump(m) => write!(f, "unknown jump mnemonic: {m}"),
        }
    }
}

/// Translates a destination mnemonic to its 3-bit binary code
#[inline]
#[must_use]
pub fn dest(mnemonic: &str) -> Option<&'static str> {
    DEST_MAP.get(mnemonic).copied()
}

/// Translates a computation mnemonic to its 7-bit binary code
///
/// Returns the code together with the instruction prefix it requires:
/// `111` for the standard ALU, `101` for the shift extension.
#[inline]
#[must_use]
pub fn comp(mnemonic: &str) -> Option<(&'static str, &'static str)> {
    if let Some(&code) = COMP_MAP.get(mnemonic) {
        return Some((C_PREFIX, code));
    }
    SHIFT_COMP_MAP
        .get(mnemonic)
        .map(|&code| (SHIFT_PREFIX, code))
}

/// Translates a jump mnemonic to its 3-bit binary code
#[inline]
#[must_use]
pub fn jump(mnemonic: &str) -> Option<&'static str> {
    JUMP_MAP.get(mnemonic).copied()
}

/// Encodes a complete C-instruction
///
/// Format: `pppaccccccdddjjj` (16 bits) where the prefix `ppp` is `111`
/// normally and `101` for the shift computations.
///
/// # Example
/// ```
/// use hack_assembler::code::encode_c_instruction;
/// assert_eq!(encode_c_instruction("D", "D+1", "").unwrap(), "1110011111010000");
/// assert_eq!(encode_c_instruction("D", "D<<", "").unwrap(), "1010110000010000");
/// ```
pub fn encode_c_instruction(
    dest_mnemonic: &str,
    comp_mnemonic: &str,
    jump_mnemonic: &str,
) -> Result<String, EncodingError> {
    let (prefix, comp_code) = comp(comp_mnemonic)
        .ok_or_else(|| EncodingError::UnknownComp(comp_mnemonic.to_string()))?;
    let dest_code =
        dest(dest_mnemonic).ok_or_else(|| EncodingError::UnknownDest(dest_mnemonic.to_string()))?;
    let jump_code =
        jump(jump_mnemonic).ok_or_else(|| EncodingError::UnknownJump(jump_mnemonic.to_string()))?;

    Ok(format!("{prefix}{comp_code}{dest_code}{jump_code}"))
}

/// Encodes an A-instruction: `0vvvvvvvvvvvvvvv` (15-bit value)
///
/// # Example
/// ```
/// use hack_assembler::code::encode_a_instruction;
/// assert_eq!(encode_a_instruction(100), "0000000001100100");
/// ```
#[inline]
#[must_use]
pub fn encode_a_instruction(address: u16) -> String {
    format!("{address:016b}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dest_translations() {
        assert_eq!(dest(""), Some("000"));
        assert_eq!(dest("M"), Some("001"));
        assert_eq!(dest("D"), Some("010"));
        assert_eq!(dest("MD"), Some("011"));
        assert_eq!(dest("A"), Some("100"));
        assert_eq!(dest("AM"), Some("101"));
        assert_eq!(dest("AD"), Some("110"));
        assert_eq!(dest("AMD"), Some("111"));
        assert_eq!(dest("INVALID"), None);
    }

    #[test]
    fn comp_translations() {
        assert_eq!(comp("0"), Some(("111", "0101010")));
        assert_eq!(comp("D+A"), Some(("111", "0000010")));
        assert_eq!(comp("D&M"), Some(("111", "1000000")));
        assert_eq!(comp("M-D"), Some(("111", "1000111")));
        assert_eq!(comp("INVALID"), None);
    }

    #[test]
    fn shift_comp_translations() {
        assert_eq!(comp("D<<"), Some(("101", "0110000")));
        assert_eq!(comp("D>>"), Some(("101", "0010000")));
        assert_eq!(comp("M<<"), Some(("101", "1100000")));
        assert_eq!(comp("A>>"), Some(("101", "0000000")));
    }

    #[test]
    fn jump_translations() {
        assert_eq!(jump(""), Some("000"));
        assert_eq!(jump("JGT"), Some("001"));
        assert_eq!(jump("JEQ"), Some("010"));
        assert_eq!(jump("JGE"), Some("011"));
        assert_eq!(jump("JLT"), Some("100"));
        assert_eq!(jump("JNE"), Some("101"));
        assert_eq!(jump("JLE"), Some("110"));
        assert_eq!(jump("JMP"), Some("111"));
        assert_eq!(jump("INVALID"), None);
    }

    #[test]
    fn encode_c() {
        // D=D+1
        assert_eq!(
            encode_c_instruction("D", "D+1", "").unwrap(),
            "1110011111010000"
        );
        // MD=M-1;JEQ
        assert_eq!(
            encode_c_instruction("MD", "M-1", "JEQ").unwrap(),
            "1111110010011010"
        );
        // 0;JMP
        assert_eq!(
            encode_c_instruction("", "0", "JMP").unwrap(),
            "1110101010000111"
        );
        // M=1
        assert_eq!(
            encode_c_instruction("M", "1", "").unwrap(),
            "1110111111001000"
        );
    }

    #[test]
    fn encode_c_shift_uses_101_prefix() {
        assert_eq!(
            encode_c_instruction("D", "D<<", "").unwrap(),
            "1010110000010000"
        );
        assert_eq!(
            encode_c_instruction("M", "M>>", "").unwrap(),
            "1011000000001000"
        );
    }

    #[test]
    fn encode_c_rejects_unknown_mnemonics() {
        assert_eq!(
            encode_c_instruction("D", "D+2", ""),
            Err(EncodingError::UnknownComp("D+2".to_string()))
        );
        assert_eq!(
            encode_c_instruction("X", "0", ""),
            Err(EncodingError::UnknownDest("X".to_string()))
        );
        assert_eq!(
            encode_c_instruction("", "0", "JXX"),
            Err(EncodingError::UnknownJump("JXX".to_string()))
        );
    }

    #[test]
    fn encode_a() {
        assert_eq!(encode_a_instruction(0), "0000000000000000");
        assert_eq!(encode_a_instruction(100), "0000000001100100");
        assert_eq!(encode_a_instruction(16384), "0100000000000000");
        assert_eq!(encode_a_instruction(32767), "0111111111111111");
    }
}
