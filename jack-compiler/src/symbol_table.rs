//! Two-scope symbol table for Jack compilation
//!
//! Class scope holds `static` and `field` entries for the lifetime of the
//! class; subroutine scope holds arguments and locals and is cleared at each
//! subroutine boundary. Lookup tries the subroutine scope first.

use crate::vm_writer::Segment;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Static,
    Field,
    Arg,
    Var,
}

impl VarKind {
    /// The VM segment this kind of variable lives in
    #[must_use]
    pub fn segment(self) -> Segment {
        match self {
            Self::Static => Segment::Static,
            Self::Field => Segment::This,
            Self::Arg => Segment::Argument,
            Self::Var => Segment::Local,
        }
    }

    fn counter_slot(self) -> usize {
        match self {
            Self::Static => 0,
            Self::Field => 1,
            Self::Arg => 2,
            Self::Var => 3,
        }
    }

    fn is_class_scope(self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub var_type: String,
    pub kind: VarKind,
    pub index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, SymbolEntry>,
    subroutine_scope: HashMap<String, SymbolEntry>,
    counters: [u16; 4],
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the subroutine scope and its ARG/VAR counters
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counters[VarKind::Arg.counter_slot()] = 0;
        self.counters[VarKind::Var.counter_slot()] = 0;
    }

    /// Defines an identifier, assigning it the next index of its kind
    pub fn define(&mut self, name: &str, var_type: &str, kind: VarKind) -> u16 {
        let slot = kind.counter_slot();
        let index = self.counters[slot];
        self.counters[slot] += 1;

        let entry = SymbolEntry {
            var_type: var_type.to_string(),
            kind,
            index,
        };
        if kind.is_class_scope() {
            self.class_scope.insert(name.to_string(), entry);
        } else {
            self.subroutine_scope.insert(name.to_string(), entry);
        }
        index
    }

    /// Number of variables of the given kind defined in its current scope
    #[must_use]
    pub fn var_count(&self, kind: VarKind) -> u16 {
        self.counters[kind.counter_slot()]
    }

    /// Looks a name up, subroutine scope shadowing class scope
    ///
    /// `None` is the unknown sentinel: the caller may then treat the name
    /// as a class or subroutine name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&SymbolEntry> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_per_kind() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a", "int", VarKind::Static), 0);
        assert_eq!(table.define("b", "int", VarKind::Field), 0);
        assert_eq!(table.define("c", "int", VarKind::Field), 1);
        assert_eq!(table.define("d", "int", VarKind::Static), 1);

        assert_eq!(table.var_count(VarKind::Static), 2);
        assert_eq!(table.var_count(VarKind::Field), 2);
    }

    #[test]
    fn start_subroutine_clears_only_the_inner_scope() {
        let mut table = SymbolTable::new();
        table.define("field0", "int", VarKind::Field);
        table.define("x", "int", VarKind::Arg);
        table.define("y", "int", VarKind::Var);

        table.start_subroutine();

        assert!(table.resolve("x").is_none());
        assert!(table.resolve("y").is_none());
        assert_eq!(table.var_count(VarKind::Arg), 0);
        assert_eq!(table.var_count(VarKind::Var), 0);
        // class scope survives
        assert!(table.resolve("field0").is_some());
        assert_eq!(table.var_count(VarKind::Field), 1);

        // fresh definitions restart at index 0
        assert_eq!(table.define("z", "boolean", VarKind::Var), 0);
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.define("value", "int", VarKind::Field);
        table.define("value", "Point", VarKind::Arg);

        let entry = table.resolve("value").unwrap();
        assert_eq!(entry.kind, VarKind::Arg);
        assert_eq!(entry.var_type, "Point");
    }

    #[test]
    fn unknown_name_yields_the_sentinel() {
        let table = SymbolTable::new();
        assert!(table.resolve("Math").is_none());
    }

    #[test]
    fn kinds_map_to_vm_segments() {
        assert_eq!(VarKind::Static.segment(), Segment::Static);
        assert_eq!(VarKind::Field.segment(), Segment::This);
        assert_eq!(VarKind::Arg.segment(), Segment::Argument);
        assert_eq!(VarKind::Var.segment(), Segment::Local);
    }
}
