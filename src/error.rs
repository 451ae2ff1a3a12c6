use core::fmt;

/// Failure modes of the sanitizer.
///
/// Parsing is all-or-nothing: the first violated invariant rejects the whole
/// table, so errors carry no position or recovery information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A structural or semantic invariant of the table was violated.
    ParseFailed,
    /// The table defines neither an MS Symbol (3,0,4) nor an MS Unicode BMP
    /// (3,1,4) subtable, so no usable table can be emitted.
    MissingRequiredSubtable,
    /// The output stream rejected a write or seek.
    Stream,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseFailed => f.write_str("cmap table failed validation"),
            Error::MissingRequiredSubtable => {
                f.write_str("cmap table has no MS Symbol or MS Unicode BMP subtable")
            }
            Error::Stream => f.write_str("output stream rejected a write or seek"),
        }
    }
}

impl std::error::Error for Error {}

impl From<bytes::TryGetError> for Error {
    fn from(_value: bytes::TryGetError) -> Self {
        Self::ParseFailed
    }
}

#[cfg(not(feature = "debug"))]
mod regular {
    macro_rules! bail {
        () => {
            return Err($crate::error::Error::ParseFailed)
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr) => {
            if $cond {
                return Err($crate::error::Error::ParseFailed);
            }
        };
    }
    pub(crate) use bail_if;
}
#[cfg(not(feature = "debug"))]
pub(crate) use regular::*;

#[cfg(feature = "debug")]
mod debug {
    macro_rules! bail {
        () => {
            panic!()
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr) => {
            if $cond {
                panic!("{}", stringify!($cond))
            }
        };
    }
    pub(crate) use bail_if;
}
#[cfg(feature = "debug")]
pub(crate) use debug::*;
