//! Library types the pointer engine depends on by role rather than name.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WellKnownType {
    /// The untyped base of every array type; target of array-to-base
    /// conversions.
    ArrayBase,
    /// Helper that exposes a string's character buffer for pinning.
    StringPinHelper,
}

impl WellKnownType {
    pub const ALL: [WellKnownType; 2] = [WellKnownType::ArrayBase, WellKnownType::StringPinHelper];

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        match self {
            WellKnownType::ArrayBase => 0,
            WellKnownType::StringPinHelper => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            WellKnownType::ArrayBase => "ArrayBase",
            WellKnownType::StringPinHelper => "StringPinHelper",
        }
    }
}

impl fmt::Display for WellKnownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
