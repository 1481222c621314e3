//! Symbol table for the Hack assembler
//!
//! Predefined symbols live in a `phf` compile-time perfect-hash map; labels
//! and variables discovered during assembly go into a `HashMap`. Variables
//! allocate from RAM[16] upward in first-appearance order.

use phf::phf_map;
use std::collections::HashMap;
use std::fmt;

/// Symbols built into the Hack platform
static PREDEFINED_SYMBOLS: phf::Map<&'static str, u16> = phf_map! {
    // Virtual registers
    "R0" => 0,
    "R1" => 1,
    "R2" => 2,
    "R3" => 3,
    "R4" => 4,
    "R5" => 5,
    "R6" => 6,
    "R7" => 7,
    "R8" => 8,
    "R9" => 9,
    "R10" => 10,
    "R11" => 11,
    "R12" => 12,
    "R13" => 13,
    "R14" => 14,
    "R15" => 15,

    // Special pointers
    "SP" => 0,
    "LCL" => 1,
    "ARG" => 2,
    "THIS" => 3,
    "THAT" => 4,

    // I/O pointers
    "SCREEN" => 16384,
    "KBD" => 24576,
};

/// First RAM address handed out to a program variable
const FIRST_VARIABLE_ADDRESS: u16 = 16;

#[derive(Debug, PartialEq, Eq)]
pub enum SymbolError {
    /// A label was defined twice, or collides with a predefined symbol
    DuplicateLabel(String),
}

impl std::error::Error for SymbolError {}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DuplicateLabel(name) => write!(f, "duplicate label: {name}"),
        }
    }
}

/// Mapping from label/variable name to 16-bit ROM or RAM address
///
/// # Example
/// ```
/// use hack_assembler::SymbolTable;
///
/// let mut table = SymbolTable::new();
/// assert_eq!(table.address_of("SP"), Some(0));
///
/// table.define_label("LOOP", 100).unwrap();
/// assert_eq!(table.address_of("LOOP"), Some(100));
///
/// // Variables allocate from RAM[16] upward
/// assert_eq!(table.resolve_or_allocate("i"), 16);
/// assert_eq!(table.resolve_or_allocate("i"), 16);
/// assert_eq!(table.resolve_or_allocate("j"), 17);
/// ```
#[derive(Debug, Default)]
pub struct SymbolTable {
    user_symbols: HashMap<String, u16>,
    next_variable: u16,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_symbols: HashMap::with_capacity(32),
            next_variable: FIRST_VARIABLE_ADDRESS,
        }
    }

    /// Defines a label at the given ROM address (first pass)
    ///
    /// # Errors
    /// Each label may be defined at most once; redefinition and collision
    /// with a predefined symbol are fatal.
    pub fn define_label(&mut self, name: &str, address: u16) -> Result<(), SymbolError> {
        if PREDEFINED_SYMBOLS.contains_key(name) || self.user_symbols.contains_key(name) {
            return Err(SymbolError::DuplicateLabel(name.to_string()));
        }
        self.user_symbols.insert(name.to_string(), address);
        Ok(())
    }

    /// Looks up a symbol without allocating
    #[inline]
    #[must_use]
    pub fn address_of(&self, name: &str) -> Option<u16> {
        PREDEFINED_SYMBOLS
            .get(name)
            .or_else(|| self.user_symbols.get(name))
            .copied()
    }

    /// Resolves a symbol, allocating the next free RAM address for a new
    /// variable (second pass hot path)
    pub fn resolve_or_allocate(&mut self, name: &str) -> u16 {
        use std::collections::hash_map::Entry;

        if let Some(&address) = PREDEFINED_SYMBOLS.get(name) {
            return address;
        }

        match self.user_symbols.entry(name.to_string()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let address = self.next_variable;
                self.next_variable += 1;
                *entry.insert(address)
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        PREDEFINED_SYMBOLS.contains_key(name) || self.user_symbols.contains_key(name)
    }
}
