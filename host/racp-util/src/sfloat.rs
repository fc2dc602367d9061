//! IEEE-11073 16 bit medical float

use crate::{TransferFormatError, TransferFormatInto, TransferFormatTryFrom};

/// A 16 bit medical float (SFLOAT)
///
/// The upper four bits are a signed base 10 exponent and the lower twelve bits are a signed
/// mantissa. A few mantissa values (with an exponent of zero) are reserved for special values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "f32", try_from = "f32"))]
pub struct SFloat(u16);

impl SFloat {
    /// Not a Number
    pub const NAN: SFloat = SFloat(0x07FF);

    /// Not at this resolution
    pub const NRES: SFloat = SFloat(0x0800);

    pub const POSITIVE_INFINITY: SFloat = SFloat(0x07FE);

    pub const NEGATIVE_INFINITY: SFloat = SFloat(0x0802);

    const RESERVED: u16 = 0x0801;

    const MANTISSA_MAX: i16 = 0x07FD;
    const MANTISSA_MIN: i16 = -0x07FD;

    const EXPONENT_MAX: i8 = 7;
    const EXPONENT_MIN: i8 = -8;

    /// Create a new `SFloat` with the value `mantissa * 10^exponent`
    ///
    /// `None` is returned if the mantissa does not fit within 12 bits (or is one of the reserved
    /// values) or the exponent does not fit within 4 bits.
    pub fn new(mantissa: i16, exponent: i8) -> Option<Self> {
        if (Self::MANTISSA_MIN..=Self::MANTISSA_MAX).contains(&mantissa)
            && (Self::EXPONENT_MIN..=Self::EXPONENT_MAX).contains(&exponent)
        {
            let raw = ((exponent as u16 & 0xF) << 12) | (mantissa as u16 & 0x0FFF);

            Some(SFloat(raw))
        } else {
            None
        }
    }

    /// Create a `SFloat` from its raw value
    pub fn from_raw(raw: u16) -> Self {
        SFloat(raw)
    }

    /// Get the raw value
    pub fn into_raw(self) -> u16 {
        self.0
    }

    /// Check if this is one of the special (non-numeric) values
    pub fn is_special(&self) -> bool {
        matches!(self.0, 0x07FE..=0x0802)
    }

    /// Get the mantissa (sign extended from 12 bits)
    pub fn mantissa(&self) -> i16 {
        ((self.0 << 4) as i16) >> 4
    }

    /// Get the exponent (sign extended from 4 bits)
    pub fn exponent(&self) -> i8 {
        ((self.0 >> 8) as i8) >> 4
    }

    /// Convert to a `f32`
    ///
    /// The reserved value and 'not at this resolution' are converted to NaN.
    pub fn to_f32(&self) -> f32 {
        match *self {
            Self::POSITIVE_INFINITY => f32::INFINITY,
            Self::NEGATIVE_INFINITY => f32::NEG_INFINITY,
            Self::NAN | Self::NRES => f32::NAN,
            SFloat(Self::RESERVED) => f32::NAN,
            _ => Self::scale(self.mantissa() as f32, self.exponent()),
        }
    }

    /// Convert from a `f32`
    ///
    /// The smallest exponent that fits the value within the mantissa is chosen, so the value is
    /// kept at the best available precision. Values too large for an SFLOAT become an infinity.
    pub fn from_f32(val: f32) -> Self {
        if val.is_nan() {
            return Self::NAN;
        }

        let limit = Self::MANTISSA_MAX as f32;

        (Self::EXPONENT_MIN..=Self::EXPONENT_MAX)
            .find_map(|exponent| {
                let scaled = Self::scale(val, -exponent);

                if (-limit..=limit).contains(&scaled) {
                    Self::new(Self::round(scaled), exponent)
                } else {
                    None
                }
            })
            .unwrap_or(if val.is_sign_negative() {
                Self::NEGATIVE_INFINITY
            } else {
                Self::POSITIVE_INFINITY
            })
    }

    /// Calculate `val * 10^exponent`, dividing for negative exponents to keep precision
    fn scale(val: f32, exponent: i8) -> f32 {
        let factor = (0..exponent.unsigned_abs()).fold(1f32, |factor, _| factor * 10.0);

        if exponent < 0 {
            val / factor
        } else {
            val * factor
        }
    }

    /// Round half away from zero
    fn round(val: f32) -> i16 {
        if val < 0.0 {
            (val - 0.5) as i16
        } else {
            (val + 0.5) as i16
        }
    }
}

impl From<SFloat> for f32 {
    fn from(sfloat: SFloat) -> f32 {
        sfloat.to_f32()
    }
}

impl TryFrom<f32> for SFloat {
    type Error = &'static str;

    fn try_from(val: f32) -> Result<Self, Self::Error> {
        let sfloat = SFloat::from_f32(val);

        if sfloat.is_special() && val.is_finite() {
            Err("value is out of range for an SFLOAT")
        } else {
            Ok(sfloat)
        }
    }
}

impl core::fmt::Display for SFloat {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::NAN => f.write_str("NaN"),
            Self::NRES => f.write_str("NRes"),
            Self::POSITIVE_INFINITY => f.write_str("+INF"),
            Self::NEGATIVE_INFINITY => f.write_str("-INF"),
            SFloat(Self::RESERVED) => f.write_str("reserved"),
            _ => write!(f, "{}e{}", self.mantissa(), self.exponent()),
        }
    }
}

impl TransferFormatTryFrom for SFloat {
    fn try_from(raw: &[u8]) -> Result<Self, TransferFormatError> {
        <u16 as TransferFormatTryFrom>::try_from(raw).map(SFloat)
    }
}

impl TransferFormatInto for SFloat {
    fn len_of_into(&self) -> usize {
        2
    }

    fn build_into_ret(&self, into_ret: &mut [u8]) {
        self.0.build_into_ret(into_ret)
    }
}
