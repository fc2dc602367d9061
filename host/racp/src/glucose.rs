//! Glucose measurement payloads
//!
//! The payload of a record is the data of a *Glucose Measurement* and, optionally, a *Glucose
//! Measurement Context*. The RACP engine does not look at any of it, it is only forwarded to the
//! transport when a record is reported. [`MeasurementFrame`] and [`ContextFrame`] are the
//! notification values of the two characteristics.

use crate::record::Record;
use racp_util::{SFloat, TransferFormatInto};

/// Define an assigned number field that is packed into the characteristic value
macro_rules! assigned_field {
    ( $(#[$attrs:meta])* $name:ident { $( $(#[$v_attrs:meta])* $variant:ident = $val:literal ),* $(,)? } ) => {
        $(#[$attrs])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $( $(#[$v_attrs])* $variant, )*
        }

        impl $name {
            /// Get the assigned value
            pub fn into_raw(self) -> u8 {
                match self {
                    $( $name::$variant => $val, )*
                }
            }
        }
    };
}

assigned_field! {
    /// Glucose sample type
    SampleType {
        CapillaryWholeBlood = 0x1,
        CapillaryPlasma = 0x2,
        VenousWholeBlood = 0x3,
        VenousPlasma = 0x4,
        ArterialWholeBlood = 0x5,
        ArterialPlasma = 0x6,
        UndeterminedWholeBlood = 0x7,
        UndeterminedPlasma = 0x8,
        InterstitialFluid = 0x9,
        ControlSolution = 0xA,
    }
}

assigned_field! {
    /// Location the sample was taken from
    SampleLocation {
        Finger = 0x1,
        AlternateSiteTest = 0x2,
        Earlobe = 0x3,
        ControlSolution = 0x4,
        NotAvailable = 0xF,
    }
}

assigned_field! {
    /// Carbohydrate (meal) identifier
    CarbohydrateId {
        Breakfast = 0x1,
        Lunch = 0x2,
        Dinner = 0x3,
        Snack = 0x4,
        Drink = 0x5,
        Supper = 0x6,
        Brunch = 0x7,
    }
}

assigned_field! {
    /// Relation of the measurement to a meal
    Meal {
        Preprandial = 0x1,
        Postprandial = 0x2,
        Fasting = 0x3,
        Casual = 0x4,
        Bedtime = 0x5,
    }
}

assigned_field! {
    Tester {
        SelfTest = 0x1,
        HealthCareProfessional = 0x2,
        LabTest = 0x3,
        NotAvailable = 0xF,
    }
}

assigned_field! {
    Health {
        MinorIssues = 0x1,
        MajorIssues = 0x2,
        DuringMenses = 0x3,
        UnderStress = 0x4,
        NoIssues = 0x5,
        NotAvailable = 0xF,
    }
}

/// Unit of a glucose concentration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcentrationUnit {
    KilogramPerLiter,
    MolePerLiter,
}

/// A glucose concentration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concentration {
    pub value: SFloat,
    pub unit: ConcentrationUnit,
    pub sample_type: SampleType,
    pub sample_location: SampleLocation,
}

/// The glucose measurement data of a record
///
/// The sequence number and base time of a measurement are part of the [`Record`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlucoseMeasurement {
    /// Offset (in minutes) of the user facing time from the base time
    pub time_offset: Option<i16>,
    pub concentration: Option<Concentration>,
    /// The sensor status annunciation bits
    pub sensor_status: Option<u16>,
}

/// The glucose measurement context of a record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlucoseContext {
    /// Carbohydrate intake in kilograms
    pub carbohydrate: Option<(CarbohydrateId, SFloat)>,
    pub meal: Option<Meal>,
    pub tester_health: Option<(Tester, Health)>,
    /// HbA1c in percent
    pub hba1c: Option<SFloat>,
}

/// The *Glucose Measurement* notification of a record
pub struct MeasurementFrame<'a> {
    record: &'a Record,
}

impl<'a> MeasurementFrame<'a> {
    const TIME_OFFSET_PRESENT: u8 = 1 << 0;
    const CONCENTRATION_PRESENT: u8 = 1 << 1;
    const UNIT_MOLE_PER_LITER: u8 = 1 << 2;
    const SENSOR_STATUS_PRESENT: u8 = 1 << 3;
    const CONTEXT_FOLLOWS: u8 = 1 << 4;

    pub(crate) fn new(record: &'a Record) -> Self {
        MeasurementFrame { record }
    }

    fn flags(&self) -> u8 {
        let measurement = &self.record.measurement;

        let mut flags = 0;

        if measurement.time_offset.is_some() {
            flags |= Self::TIME_OFFSET_PRESENT;
        }

        if let Some(concentration) = &measurement.concentration {
            flags |= Self::CONCENTRATION_PRESENT;

            if concentration.unit == ConcentrationUnit::MolePerLiter {
                flags |= Self::UNIT_MOLE_PER_LITER;
            }
        }

        if measurement.sensor_status.is_some() {
            flags |= Self::SENSOR_STATUS_PRESENT;
        }

        if self.record.context.is_some() {
            flags |= Self::CONTEXT_FOLLOWS;
        }

        flags
    }
}

impl TransferFormatInto for MeasurementFrame<'_> {
    fn len_of_into(&self) -> usize {
        let measurement = &self.record.measurement;

        10 + measurement.time_offset.map_or(0, |_| 2)
            + measurement.concentration.map_or(0, |_| 3)
            + measurement.sensor_status.map_or(0, |_| 2)
    }

    fn build_into_ret(&self, into_ret: &mut [u8]) {
        let measurement = &self.record.measurement;

        into_ret[0] = self.flags();

        self.record.sequence_number.build_into_ret(&mut into_ret[1..3]);

        self.record.timestamp.build_into_ret(&mut into_ret[3..10]);

        let mut at = 10;

        if let Some(offset) = measurement.time_offset {
            offset.build_into_ret(&mut into_ret[at..at + 2]);

            at += 2;
        }

        if let Some(concentration) = &measurement.concentration {
            concentration.value.build_into_ret(&mut into_ret[at..at + 2]);

            into_ret[at + 2] =
                concentration.sample_type.into_raw() | concentration.sample_location.into_raw() << 4;

            at += 3;
        }

        if let Some(status) = measurement.sensor_status {
            status.build_into_ret(&mut into_ret[at..at + 2]);
        }
    }
}

/// The *Glucose Measurement Context* notification of a record
pub struct ContextFrame<'a> {
    sequence_number: u16,
    context: &'a GlucoseContext,
}

impl<'a> ContextFrame<'a> {
    const CARBOHYDRATE_PRESENT: u8 = 1 << 0;
    const MEAL_PRESENT: u8 = 1 << 1;
    const TESTER_HEALTH_PRESENT: u8 = 1 << 2;
    const HBA1C_PRESENT: u8 = 1 << 6;

    pub(crate) fn new(sequence_number: u16, context: &'a GlucoseContext) -> Self {
        ContextFrame {
            sequence_number,
            context,
        }
    }

    fn flags(&self) -> u8 {
        [
            (self.context.carbohydrate.is_some(), Self::CARBOHYDRATE_PRESENT),
            (self.context.meal.is_some(), Self::MEAL_PRESENT),
            (self.context.tester_health.is_some(), Self::TESTER_HEALTH_PRESENT),
            (self.context.hba1c.is_some(), Self::HBA1C_PRESENT),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .fold(0, |flags, (_, bit)| flags | bit)
    }
}

impl TransferFormatInto for ContextFrame<'_> {
    fn len_of_into(&self) -> usize {
        3 + self.context.carbohydrate.map_or(0, |_| 3)
            + self.context.meal.map_or(0, |_| 1)
            + self.context.tester_health.map_or(0, |_| 1)
            + self.context.hba1c.map_or(0, |_| 2)
    }

    fn build_into_ret(&self, into_ret: &mut [u8]) {
        into_ret[0] = self.flags();

        self.sequence_number.build_into_ret(&mut into_ret[1..3]);

        let mut at = 3;

        if let Some((id, kilograms)) = self.context.carbohydrate {
            into_ret[at] = id.into_raw();

            kilograms.build_into_ret(&mut into_ret[at + 1..at + 3]);

            at += 3;
        }

        if let Some(meal) = self.context.meal {
            into_ret[at] = meal.into_raw();

            at += 1;
        }

        if let Some((tester, health)) = self.context.tester_health {
            into_ret[at] = tester.into_raw() | health.into_raw() << 4;

            at += 1;
        }

        if let Some(hba1c) = self.context.hba1c {
            hba1c.build_into_ret(&mut into_ret[at..at + 2]);
        }
    }
}
