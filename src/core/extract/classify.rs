//! Property classification
//!
//! Routes a property to the extraction path that can read it and decides
//! whether its cached last value may stand in for missing samples.

use crate::domain::{Property, PropertyType, UpdateStrategy};

/// Coarse value class of a property type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyClass {
    Numeric,
    StringLike,
    Boolean,
    /// Complex or unknown types
    Unsupported,
}

pub fn classify(property_type: &PropertyType) -> PropertyClass {
    if is_numeric(property_type) {
        PropertyClass::Numeric
    } else if is_string_like(property_type) {
        PropertyClass::StringLike
    } else if is_boolean(property_type) {
        PropertyClass::Boolean
    } else {
        PropertyClass::Unsupported
    }
}

pub fn is_float(property_type: &PropertyType) -> bool {
    use PropertyType::*;
    matches!(
        property_type,
        Analog
            | Float
            | LenghtC
            | LenghtI
            | LenghtM
            | Percentage
            | TemperatureC
            | TemperatureF
            | Meter
            | Kilogram
            | Gram
            | Second
            | Ampere
            | Kelvin
            | Candela
            | Mole
            | Hertz
            | Radian
            | Steradian
            | Newton
            | Pascal
            | Joule
            | Watt
            | Coulomb
            | Volt
            | Farad
            | Ohm
            | Siemens
            | Weber
            | Tesla
            | Henry
            | DegreesCelsius
            | Lumen
            | Lux
            | Becquerel
            | Gray
            | Sievert
            | Katal
            | SquareMeter
            | CubicMeter
            | Liter
            | MeterPerSecond
            | MeterPerSquareSecond
            | CubicMeterPerSecond
            | LiterPerSecond
            | WattPerSquareMeter
            | CandelaPerSquareMeter
            | Bit
            | BitPerSecond
            | DegreesLatitude
            | DegreesLongitude
            | PhValue
            | Decibel
            | Decibel1w
            | Bel
            | RatioDiv
            | RatioMod
            | PercentageRelativeHumidity
            | PercentageBatteryLevel
            | SecondsBatteryLevel
            | EventRateSecond
            | EventRateMinute
            | HeartRate
            | HeartBeats
            | SiemensPerMeter
            | HomeTemperature
            | HomeTemperatureC
            | HomeTemperatureF
            | Energy
            | Force
            | Temperature
            | Power
            | ElectricCurrent
            | ElectricPotential
            | ElectricalResistance
            | Capacitance
            | Frequency
            | DataRate
            | Acceleration
            | Area
            | Length
            | Velocity
            | Mass
            | Volume
            | FlowRate
            | Angle
            | Illuminance
            | LuminousFlux
            | Luminance
            | LuminousIntensity
            | LogarithmicQuantity
            | Pressure
    )
}

pub fn is_int(property_type: &PropertyType) -> bool {
    use PropertyType::*;
    matches!(property_type, Int | Count | Time | InformationContent)
}

/// Float-like or int-like
pub fn is_numeric(property_type: &PropertyType) -> bool {
    is_float(property_type) || is_int(property_type)
}

/// Types only readable through sampled (non-aggregated) queries
pub fn is_string_like(property_type: &PropertyType) -> bool {
    matches!(property_type, PropertyType::CharString | PropertyType::Location)
}

pub fn is_boolean(property_type: &PropertyType) -> bool {
    use PropertyType::*;
    matches!(
        property_type,
        Status | HomeLight | HomeSwitch | HomeContactSensor | HomeMotionSensor
    )
}

/// Change-triggered property of a supported value class.
///
/// Whether the property was already populated in the current run and whether
/// it has a last-updated timestamp are checked by the caller.
pub fn is_last_value_eligible(property: &Property) -> bool {
    property.update_strategy == UpdateStrategy::OnChange
        && classify(&property.property_type) != PropertyClass::Unsupported
}
