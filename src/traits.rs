//! # Traits
//!
//! General purpose traits required to write (and read back) VTK data arrays. Any
//! container that implements [`Components`](crate::array::Components) gets an
//! [`Array`] implementation for free, and can be written inline (ascii or base64)
//! or as raw bytes in the `<AppendedData>` section of a file.

use crate::Error;
use quick_xml::writer::Writer;
use std::fmt;
use std::io::Write;

/// The value of the `type` attribute of a `<DataArray>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Float32,
    Float64,
    Int64,
    UInt8,
}

impl Precision {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
        }
    }

    /// parse the `type` attribute of a `<DataArray>`, `None` for types this crate
    /// does not handle
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Float32" => Some(Self::Float32),
            "Float64" => Some(Self::Float64),
            "Int64" => Some(Self::Int64),
            "UInt8" => Some(Self::UInt8),
            _ => None,
        }
    }

    /// size in bytes of a single element
    pub fn size(&self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Float64 | Self::Int64 => 8,
            Self::UInt8 => 1,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Element types that can be stored in a VTK data array
pub trait Numeric:
    Copy + fmt::Debug + PartialEq + num_traits::Num + num_traits::ToPrimitive + Send + Sync + 'static
{
    /// size of the element in bytes
    const SIZE: usize;

    fn as_precision() -> Precision;

    /// append the little endian bytes of this number to a buffer
    fn extend_le_bytes(&self, buffer: &mut Vec<u8>);

    /// read a number from exactly `Self::SIZE` little endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// append the ascii representation of the number
    fn push_ascii(&self, out: &mut String);

    fn write_le_bytes<W: Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        self.extend_le_bytes(&mut bytes);
        writer.write_all(&bytes)
    }

    fn parse_ascii(token: &str) -> Option<Self> {
        <Self as num_traits::Num>::from_str_radix(token, 10).ok()
    }
}

macro_rules! impl_float {
    ($type:ty, $precision:ident, $size:expr) => {
        impl Numeric for $type {
            const SIZE: usize = $size;

            fn as_precision() -> Precision {
                Precision::$precision
            }

            fn extend_le_bytes(&self, buffer: &mut Vec<u8>) {
                buffer.extend_from_slice(&self.to_le_bytes());
            }

            fn from_le_slice(bytes: &[u8]) -> Self {
                <$type>::from_le_bytes(crate::utils::le_array(bytes))
            }

            fn push_ascii(&self, out: &mut String) {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*self));
            }
        }
    };
}

macro_rules! impl_integer {
    ($type:ty, $precision:ident, $size:expr) => {
        impl Numeric for $type {
            const SIZE: usize = $size;

            fn as_precision() -> Precision {
                Precision::$precision
            }

            fn extend_le_bytes(&self, buffer: &mut Vec<u8>) {
                buffer.extend_from_slice(&self.to_le_bytes());
            }

            fn from_le_slice(bytes: &[u8]) -> Self {
                <$type>::from_le_bytes(crate::utils::le_array(bytes))
            }

            fn push_ascii(&self, out: &mut String) {
                out.push_str(&self.to_string());
            }
        }
    };
}

impl_float!(f32, Float32, 4);
impl_float!(f64, Float64, 8);
impl_integer!(i64, Int64, 8);
impl_integer!(u8, UInt8, 1);

/// describes how to write a single `<DataArray>` to a vtk file
///
/// There are two main ways to write data to a vtk file. Either you can write the data inline
/// within the `DataArray` element (ascii or base64) or you can write the data as raw binary
/// to the appended section with a specified offset. Writing the data inline, while more clear,
/// uses significantly more space than the appended data.
pub trait Array {
    /// write a complete `<DataArray format="ascii">` element
    fn write_ascii<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error>;

    /// write a complete `<DataArray format="binary">` element, base64 encoded
    fn write_base64<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error>;

    /// write the array to the appended section in raw binary form, including the
    /// `UInt64` byte count header
    ///
    /// You must ensure that you have called `write_appended_dataarray_header` with
    /// the correct offset before calling this function.
    fn write_binary<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error>;

    /// total number of values (tuples times components)
    fn length(&self) -> usize;

    fn components(&self) -> usize {
        1
    }

    fn precision(&self) -> Precision;

    fn size_of_elem(&self) -> usize;

    /// number of data bytes, excluding the byte count header
    fn num_bytes(&self) -> usize {
        self.length() * self.size_of_elem()
    }
}
