//! Fixed-width scalar encoding.
//!
//! All scalars travel little-endian. Encoding goes through `to_le_bytes` /
//! `from_le_bytes` rather than reinterpreting memory, so the wire layout is
//! the same on every host.

use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Longest scalar the codec knows about (u64, i64, f64).
pub const MAX_SCALAR_SIZE: usize = 8;

/// A fixed-width value the codec can write and read.
///
/// Sealed: the set of wire scalars is closed.
pub trait Scalar: Copy + fmt::Display + sealed::Sealed {
    /// Encoded width in bytes
    const SIZE: usize;

    /// Name used in diagnostics
    const TYPE_NAME: &'static str;

    /// Write the little-endian encoding into `out`, which is exactly `SIZE` bytes.
    fn encode(self, out: &mut [u8]);

    /// Decode from exactly `SIZE` bytes.
    fn decode(raw: &[u8]) -> Self;

    /// Whether a decoded value is acceptable on the wire.
    fn is_valid(&self) -> bool {
        true
    }
}

macro_rules! impl_int_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                const TYPE_NAME: &'static str = stringify!($t);

                #[inline]
                fn encode(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(raw: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$t>()];
                    bytes.copy_from_slice(raw);
                    <$t>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_int_scalar!(u8, u16, u32, u64, i8, i16, i32, i64);

macro_rules! impl_float_scalar {
    ($($t:ty => $name:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                const TYPE_NAME: &'static str = $name;

                #[inline]
                fn encode(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(raw: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$t>()];
                    bytes.copy_from_slice(raw);
                    <$t>::from_le_bytes(bytes)
                }

                #[inline]
                fn is_valid(&self) -> bool {
                    self.is_finite()
                }
            }
        )*
    };
}

impl_float_scalar!(f32 => "float", f64 => "double");

impl sealed::Sealed for bool {}

impl Scalar for bool {
    const SIZE: usize = 1;
    const TYPE_NAME: &'static str = "bool";

    #[inline]
    fn encode(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    #[inline]
    fn decode(raw: &[u8]) -> Self {
        raw[0] != 0
    }
}
