//! Occurrence role flags.

use bitflags::bitflags;
use serde::{Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Boolean properties of an occurrence, packed as in the index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolRoles: u32 {
        const DEFINITION         = 0b0000_0001;
        const IMPORT             = 0b0000_0010;
        const WRITE_ACCESS       = 0b0000_0100;
        const READ_ACCESS        = 0b0000_1000;
        const GENERATED          = 0b0001_0000;
        const TEST               = 0b0010_0000;
        const FORWARD_DEFINITION = 0b0100_0000;
    }
}

/// Display names, in bit order
const ROLE_NAMES: [(SymbolRoles, &str); 7] = [
    (SymbolRoles::DEFINITION, "Definition"),
    (SymbolRoles::IMPORT, "Import"),
    (SymbolRoles::WRITE_ACCESS, "WriteAccess"),
    (SymbolRoles::READ_ACCESS, "ReadAccess"),
    (SymbolRoles::GENERATED, "Generated"),
    (SymbolRoles::TEST, "Test"),
    (SymbolRoles::FORWARD_DEFINITION, "ForwardDefinition"),
];

impl SymbolRoles {
    /// Decode the raw bitset, testing it against every known role.
    /// Unknown bits are dropped.
    pub fn decode(raw: i32) -> Self {
        let raw = raw as u32;
        ROLE_NAMES
            .iter()
            .filter(|(role, _)| raw & role.bits() != 0)
            .fold(SymbolRoles::empty(), |acc, (role, _)| acc | *role)
    }

    pub fn is_definition(self) -> bool {
        self.contains(SymbolRoles::DEFINITION)
    }

    /// Names of the set roles, e.g. `["Definition", "ReadAccess"]`
    pub fn names(self) -> Vec<&'static str> {
        ROLE_NAMES
            .iter()
            .filter(|(role, _)| self.contains(*role))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for SymbolRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.names().join(", "))
    }
}

impl Serialize for SymbolRoles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
