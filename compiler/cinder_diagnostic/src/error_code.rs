//! Error codes for pointer-safety diagnostics.
//!
//! Codes are grouped by the first two digits:
//! - E70xx: unsafe-mode and pointer legality errors
//! - E90xx: internal limits

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Pointer syntax outside an unsafe context
    E7001,
    /// Pointer syntax or unsafe block inside a generator / async body
    E7002,
    /// `unsafe` used while the compilation disallows it
    E7003,
    /// Pointer to, address of, or size of a tracked (managed) type
    E7004,
    /// No conversion exists between the two types
    E7005,
    /// More than one user-defined conversion applies
    E7006,
    /// Address taken of something that is not a variable
    E7007,
    /// Address of a moveable variable taken outside a pin block
    E7008,
    /// Pin initializer is already a pointer, or pins nothing
    E7009,
    /// A closure captures a variable whose address was taken
    E7010,
    /// A closure inside a pin block captures a pinned local or pinned buffer
    E7011,
    /// Stack allocation in an invalid position or with a negative size
    E7012,
    /// Arithmetic on, or dereference of, `void*`
    E7013,
    /// No built-in pointer operator matches the operands
    E7014,
    /// Pin declarator without an initializer
    E7015,
    /// Pin declarator whose declared type is not an explicit pointer type
    E7016,
    /// Dereference or `->` on a non-pointer
    E7017,
    /// Pointer element access with other than one index
    E7018,
    /// A well-known type the engine depends on is missing
    E7019,
    /// Pointer-typed parameter on a generator / async callable
    E7020,
    /// Too many errors, remaining diagnostics dropped
    E9002,
}

impl ErrorCode {
    /// Every code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E7001,
        ErrorCode::E7002,
        ErrorCode::E7003,
        ErrorCode::E7004,
        ErrorCode::E7005,
        ErrorCode::E7006,
        ErrorCode::E7007,
        ErrorCode::E7008,
        ErrorCode::E7009,
        ErrorCode::E7010,
        ErrorCode::E7011,
        ErrorCode::E7012,
        ErrorCode::E7013,
        ErrorCode::E7014,
        ErrorCode::E7015,
        ErrorCode::E7016,
        ErrorCode::E7017,
        ErrorCode::E7018,
        ErrorCode::E7019,
        ErrorCode::E7020,
        ErrorCode::E9002,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E7001 => "E7001",
            ErrorCode::E7002 => "E7002",
            ErrorCode::E7003 => "E7003",
            ErrorCode::E7004 => "E7004",
            ErrorCode::E7005 => "E7005",
            ErrorCode::E7006 => "E7006",
            ErrorCode::E7007 => "E7007",
            ErrorCode::E7008 => "E7008",
            ErrorCode::E7009 => "E7009",
            ErrorCode::E7010 => "E7010",
            ErrorCode::E7011 => "E7011",
            ErrorCode::E7012 => "E7012",
            ErrorCode::E7013 => "E7013",
            ErrorCode::E7014 => "E7014",
            ErrorCode::E7015 => "E7015",
            ErrorCode::E7016 => "E7016",
            ErrorCode::E7017 => "E7017",
            ErrorCode::E7018 => "E7018",
            ErrorCode::E7019 => "E7019",
            ErrorCode::E7020 => "E7020",
            ErrorCode::E9002 => "E9002",
        }
    }

    /// Access-mode errors: the construct is fine, the position is not.
    pub fn is_mode_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E7001 | ErrorCode::E7002 | ErrorCode::E7003 | ErrorCode::E7020
        )
    }

    /// Errors about address stability and pinning.
    pub fn is_pinning_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E7007
                | ErrorCode::E7008
                | ErrorCode::E7009
                | ErrorCode::E7010
                | ErrorCode::E7011
                | ErrorCode::E7015
                | ErrorCode::E7016
        )
    }

    pub fn is_conversion_error(&self) -> bool {
        matches!(self, ErrorCode::E7005 | ErrorCode::E7006)
    }

    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9002)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `"E7008"` (case-insensitive).
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
