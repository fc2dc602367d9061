//! Value types shared by the Record Access Control Point engine and its transports
//!
//! Things that are not specific to the RACP procedures, but are needed to put them onto the air,
//! are put here. This includes the transfer format traits used to convert between values and the
//! bytes of a characteristic, the Bluetooth *Date Time* representation ([`CalendarTime`]), and the
//! IEEE-11073 16 bit medical float ([`SFloat`]).

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod sfloat;
pub mod time;

use alloc::{format, string::String, vec::Vec};

pub use sfloat::SFloat;
pub use time::CalendarTime;

/// Error for converting from the transfer format
///
/// This is returned whenever the raw bytes of a characteristic value cannot be converted into the
/// type they are supposed to represent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferFormatError {
    pub message: String,
}

impl TransferFormatError {
    /// Create a `TransferFormatError` for incorrect size
    pub fn bad_size<D1, D2>(name: &'static str, expected_len: D1, incorrect_len: D2) -> Self
    where
        D1: core::fmt::Display,
        D2: core::fmt::Display,
    {
        TransferFormatError {
            message: format!(
                "Expected a size of {} bytes for {}, data length is {}",
                expected_len, name, incorrect_len
            ),
        }
    }

    /// Create a `TransferFormatError` for a field whose value is outside of its valid range
    pub fn out_of_range<D>(name: &'static str, field: &'static str, value: D) -> Self
    where
        D: core::fmt::Display,
    {
        TransferFormatError {
            message: format!("Field '{}' of {} has the invalid value {}", field, name, value),
        }
    }
}

impl From<&'_ str> for TransferFormatError {
    fn from(msg: &'_ str) -> Self {
        TransferFormatError { message: msg.into() }
    }
}

impl core::fmt::Display for TransferFormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransferFormatError {}

/// Conversion from the transfer format
///
/// The transfer format is the little endian byte layout of a value as it is written to or read
/// from a characteristic.
pub trait TransferFormatTryFrom {
    /// Make Self from the raw transfer format
    ///
    /// The slice must contain exactly the bytes of `Self`, implementations return an error when
    /// there are bytes remaining.
    fn try_from(raw: &[u8]) -> Result<Self, TransferFormatError>
    where
        Self: Sized;
}

/// Conversion into the transfer format
///
/// Implementors only need to provide `len_of_into` and `build_into_ret`; the default
/// implementation of `into` uses them to allocate a single buffer for the whole value. Container
/// types call these methods on their fields so that nested values are written in place.
pub trait TransferFormatInto {
    /// Get the length of the return of function `into`
    fn len_of_into(&self) -> usize;

    /// Build the return of into
    ///
    /// # Panic
    /// This should panic if the size of slice referenced by `into_ret` is not the same as
    /// the return of `len_of_into`.
    fn build_into_ret(&self, into_ret: &mut [u8]);

    /// Convert Self into the transferred bytes
    fn into(&self) -> Vec<u8> {
        let mut buff = alloc::vec![0u8; self.len_of_into()];

        self.build_into_ret(&mut buff);

        buff
    }
}

macro_rules! impl_transfer_format_for_number {
    ($num: ty) => {
        impl TransferFormatTryFrom for $num {
            fn try_from(raw: &[u8]) -> Result<Self, TransferFormatError> {
                if raw.len() == core::mem::size_of::<$num>() {
                    let mut bytes = <[u8; core::mem::size_of::<$num>()]>::default();

                    bytes.copy_from_slice(raw);

                    Ok(<$num>::from_le_bytes(bytes))
                } else {
                    Err(TransferFormatError::bad_size(
                        stringify!($num),
                        core::mem::size_of::<$num>(),
                        raw.len(),
                    ))
                }
            }
        }

        impl TransferFormatInto for $num {
            fn len_of_into(&self) -> usize {
                core::mem::size_of::<$num>()
            }

            fn build_into_ret(&self, into_ret: &mut [u8]) {
                into_ret.copy_from_slice(&self.to_le_bytes())
            }
        }
    };
}

impl_transfer_format_for_number! {u16}
impl_transfer_format_for_number! {i16}
