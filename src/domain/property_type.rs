//! Declared property types
//!
//! The IoT cloud tags every property with a type name drawn from a fixed
//! vocabulary. Unknown names are kept verbatim in [`PropertyType::Other`] so
//! newer upstream types still flow through to the output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! property_types {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Property type as declared by the IoT cloud
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum PropertyType {
            $(
                #[doc = $name]
                $variant,
            )*
            /// Type name outside the known vocabulary
            Other(String),
        }

        impl PropertyType {
            /// Upstream type name
            pub fn as_str(&self) -> &str {
                match self {
                    $(PropertyType::$variant => $name,)*
                    PropertyType::Other(name) => name,
                }
            }
        }

        impl From<&str> for PropertyType {
            fn from(name: &str) -> Self {
                match name {
                    $($name => PropertyType::$variant,)*
                    other => PropertyType::Other(other.to_string()),
                }
            }
        }
    };
}

property_types! {
    Analog => "ANALOG",
    CharString => "CHARSTRING",
    Float => "FLOAT",
    Int => "INT",
    LenghtC => "LENGHT_C",
    LenghtI => "LENGHT_I",
    LenghtM => "LENGHT_M",
    Percentage => "PERCENTAGE",
    Status => "STATUS",
    TemperatureC => "TEMPERATURE_C",
    TemperatureF => "TEMPERATURE_F",
    Meter => "METER",
    Kilogram => "KILOGRAM",
    Gram => "GRAM",
    Second => "SECOND",
    Ampere => "AMPERE",
    Kelvin => "KELVIN",
    Candela => "CANDELA",
    Mole => "MOLE",
    Hertz => "HERTZ",
    Radian => "RADIAN",
    Steradian => "STERADIAN",
    Newton => "NEWTON",
    Pascal => "PASCAL",
    Joule => "JOULE",
    Watt => "WATT",
    Coulomb => "COULOMB",
    Volt => "VOLT",
    Farad => "FARAD",
    Ohm => "OHM",
    Siemens => "SIEMENS",
    Weber => "WEBER",
    Tesla => "TESLA",
    Henry => "HENRY",
    DegreesCelsius => "DEGREES_CELSIUS",
    Lumen => "LUMEN",
    Lux => "LUX",
    Becquerel => "BECQUEREL",
    Gray => "GRAY",
    Sievert => "SIEVERT",
    Katal => "KATAL",
    SquareMeter => "SQUARE_METER",
    CubicMeter => "CUBIC_METER",
    Liter => "LITER",
    MeterPerSecond => "METER_PER_SECOND",
    MeterPerSquareSecond => "METER_PER_SQUARE_SECOND",
    CubicMeterPerSecond => "CUBIC_METER_PER_SECOND",
    LiterPerSecond => "LITER_PER_SECOND",
    WattPerSquareMeter => "WATT_PER_SQUARE_METER",
    CandelaPerSquareMeter => "CANDELA_PER_SQUARE_METER",
    Bit => "BIT",
    BitPerSecond => "BIT_PER_SECOND",
    DegreesLatitude => "DEGREES_LATITUDE",
    DegreesLongitude => "DEGREES_LONGITUDE",
    PhValue => "PH_VALUE",
    Decibel => "DECIBEL",
    Decibel1w => "DECIBEL_1W",
    Bel => "BEL",
    Count => "COUNT",
    RatioDiv => "RATIO_DIV",
    RatioMod => "RATIO_MOD",
    PercentageRelativeHumidity => "PERCENTAGE_RELATIVE_HUMIDITY",
    PercentageBatteryLevel => "PERCENTAGE_BATTERY_LEVEL",
    SecondsBatteryLevel => "SECONDS_BATTERY_LEVEL",
    EventRateSecond => "EVENT_RATE_SECOND",
    EventRateMinute => "EVENT_RATE_MINUTE",
    HeartRate => "HEART_RATE",
    HeartBeats => "HEART_BEATS",
    SiemensPerMeter => "SIEMENS_PER_METER",
    Location => "LOCATION",
    ColorHsb => "COLOR_HSB",
    ColorRgb => "COLOR_RGB",
    GenericComplexProperty => "GENERIC_COMPLEX_PROPERTY",
    Schedule => "SCHEDULE",
    HomeColoredLight => "HOME_COLORED_LIGHT",
    HomeDimmedLight => "HOME_DIMMED_LIGHT",
    HomeLight => "HOME_LIGHT",
    HomeContactSensor => "HOME_CONTACT_SENSOR",
    HomeMotionSensor => "HOME_MOTION_SENSOR",
    HomeSmartPlug => "HOME_SMART_PLUG",
    HomeTemperature => "HOME_TEMPERATURE",
    HomeTemperatureC => "HOME_TEMPERATURE_C",
    HomeTemperatureF => "HOME_TEMPERATURE_F",
    HomeSwitch => "HOME_SWITCH",
    HomeTelevision => "HOME_TELEVISION",
    Energy => "ENERGY",
    Force => "FORCE",
    Temperature => "TEMPERATURE",
    Power => "POWER",
    ElectricCurrent => "ELECTRIC_CURRENT",
    ElectricPotential => "ELECTRIC_POTENTIAL",
    ElectricalResistance => "ELECTRICAL_RESISTANCE",
    Capacitance => "CAPACITANCE",
    Time => "TIME",
    Frequency => "FREQUENCY",
    DataRate => "DATA_RATE",
    Acceleration => "ACCELERATION",
    Area => "AREA",
    Length => "LENGTH",
    Velocity => "VELOCITY",
    Mass => "MASS",
    Volume => "VOLUME",
    FlowRate => "FLOW_RATE",
    Angle => "ANGLE",
    Illuminance => "ILLUMINANCE",
    LuminousFlux => "LUMINOUS_FLUX",
    Luminance => "LUMINANCE",
    LuminousIntensity => "LUMINOUS_INTENSITY",
    LogarithmicQuantity => "LOGARITHMIC_QUANTITY",
    Pressure => "PRESSURE",
    InformationContent => "INFORMATION_CONTENT",
}

impl PropertyType {
    /// Type name written to the output file.
    ///
    /// `STATUS` is reported as `BOOLEAN`; everything else keeps its name.
    pub fn normalized(&self) -> &str {
        match self {
            PropertyType::Status => "BOOLEAN",
            other => other.as_str(),
        }
    }
}

impl From<String> for PropertyType {
    fn from(name: String) -> Self {
        PropertyType::from(name.as_str())
    }
}

impl From<PropertyType> for String {
    fn from(property_type: PropertyType) -> Self {
        property_type.as_str().to_string()
    }
}

impl FromStr for PropertyType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PropertyType::from(s))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_round_trip() {
        assert_eq!(PropertyType::from("FLOAT"), PropertyType::Float);
        assert_eq!(PropertyType::from("CHARSTRING").as_str(), "CHARSTRING");
        assert_eq!(
            PropertyType::from("PERCENTAGE_RELATIVE_HUMIDITY"),
            PropertyType::PercentageRelativeHumidity
        );
    }

    #[test]
    fn test_unknown_name_preserved() {
        let t = PropertyType::from("QUANTUM_FLUX");
        assert_eq!(t, PropertyType::Other("QUANTUM_FLUX".to_string()));
        assert_eq!(t.to_string(), "QUANTUM_FLUX");
        assert_eq!(t.normalized(), "QUANTUM_FLUX");
    }

    #[test]
    fn test_status_normalized_to_boolean() {
        assert_eq!(PropertyType::Status.normalized(), "BOOLEAN");
        assert_eq!(PropertyType::HomeSwitch.normalized(), "HOME_SWITCH");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let t: PropertyType = serde_json::from_str("\"TEMPERATURE_C\"").unwrap();
        assert_eq!(t, PropertyType::TemperatureC);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"TEMPERATURE_C\"");
    }
}
