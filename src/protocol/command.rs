//! Command definitions
//!
//! A command is an ordered list of opaque byte strings: the name followed by
//! its arguments. Arguments are never reordered or deduplicated.

use bytes::Bytes;

/// Conversion of a value into a single wire argument
///
/// Numbers are rendered in plain decimal (`Display`), independent of locale.
pub trait ToArg {
    fn to_arg(&self) -> Bytes;
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Bytes {
        (**self).to_arg()
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl<const N: usize> ToArg for [u8; N] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

impl ToArg for bool {
    fn to_arg(&self) -> Bytes {
        Bytes::from_static(if *self { b"1" } else { b"0" })
    }
}

macro_rules! display_to_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

display_to_arg!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// A command ready to be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: Bytes,
    args: Vec<Bytes>,
}

impl Command {
    /// Start a command with no arguments
    pub fn new(name: impl ToArg) -> Self {
        Self {
            name: name.to_arg(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl ToArg) -> Self {
        self.args.push(arg.to_arg());
        self
    }

    /// Append every argument from an iterator, in order
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.args.extend(args.into_iter().map(|a| a.to_arg()));
        self
    }

    /// Command name as given by the caller (not yet upper-cased)
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn arguments(&self) -> &[Bytes] {
        &self.args
    }

    /// Number of wire elements, name included (always at least 1)
    pub fn len(&self) -> usize {
        1 + self.args.len()
    }

    /// Always false; a command carries at least its name.
    pub fn is_empty(&self) -> bool {
        false
    }
}
