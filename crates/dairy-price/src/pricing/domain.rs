use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;

use super::errors::{InputError, SchemaError};

/// Number of model features, shared by the encoder, scaler and model.
pub const FEATURE_COUNT: usize = 5;

/// Column names in the order the scaler and model were fitted on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Animal_Breed",
    "Milk_Yield",
    "Parity_No",
    "Pregnancy_Status",
    "Pregnancy_Trimester",
];

/// Named artifact columns must match [`FEATURE_NAMES`] position by position.
pub(crate) fn check_feature_order(names: &[String]) -> Result<(), SchemaError> {
    if names.len() != FEATURE_COUNT {
        return Err(SchemaError::FeatureCount {
            expected: names.len(),
            actual: FEATURE_COUNT,
        });
    }

    let mismatch = names
        .iter()
        .zip(FEATURE_NAMES)
        .enumerate()
        .find(|(_, (found, expected))| found.as_str() != *expected);
    match mismatch {
        Some((position, (found, expected))) => Err(SchemaError::FeatureOrder {
            position,
            expected,
            found: found.clone(),
        }),
        None => Ok(()),
    }
}

pub const MILK_YIELD_LITERS: RangeInclusive<i64> = 10..=30;
pub const PARITY_NO: RangeInclusive<i64> = 0..=3;
pub const PREGNANCY_TRIMESTER: RangeInclusive<i64> = 1..=3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Breed {
    #[serde(rename = "HF")]
    HolsteinFriesian,
    #[serde(rename = "JY")]
    Jersey,
}

impl Breed {
    pub const fn code(self) -> u8 {
        match self {
            Self::HolsteinFriesian => 0,
            Self::Jersey => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HolsteinFriesian => "HF",
            Self::Jersey => "JY",
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::HolsteinFriesian),
            1 => Some(Self::Jersey),
            _ => None,
        }
    }

    /// Accepts the form labels `HF` / `JY`, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("HF") {
            Some(Self::HolsteinFriesian)
        } else if label.eq_ignore_ascii_case("JY") {
            Some(Self::Jersey)
        } else {
            None
        }
    }
}

pub const fn pregnancy_label(pregnant: bool) -> &'static str {
    if pregnant {
        "Yes"
    } else {
        "No"
    }
}

/// Pregnancy answer as submitted: either a JSON boolean or a `Yes`/`No` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PregnancyAnswer {
    Flag(bool),
    Label(String),
}

impl From<bool> for PregnancyAnswer {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Free-text identity fields. Reported back, never fed to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farmer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<String>,
}

impl AnimalIdentity {
    /// Trim every field and drop the blank ones.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        }

        Self {
            farmer_name: clean(&self.farmer_name),
            parentage: clean(&self.parentage),
            address: clean(&self.address),
            tag_number: clean(&self.tag_number),
        }
    }
}

/// Form submission before validation. Integers are wide so out-of-domain values can be
/// reported instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub breed: String,
    pub milk_yield: i64,
    pub parity_no: i64,
    pub pregnancy_status: PregnancyAnswer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pregnancy_trimester: Option<i64>,
    #[serde(flatten)]
    pub identity: AnimalIdentity,
}

impl RawInput {
    pub fn new(
        breed: impl Into<String>,
        milk_yield: i64,
        parity_no: i64,
        pregnancy_status: impl Into<PregnancyAnswer>,
        pregnancy_trimester: Option<i64>,
    ) -> Self {
        Self {
            breed: breed.into(),
            milk_yield,
            parity_no,
            pregnancy_status: pregnancy_status.into(),
            pregnancy_trimester,
            identity: AnimalIdentity::default(),
        }
    }

    pub fn with_identity(mut self, identity: AnimalIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Decode a submitted form object one field at a time, so a wrong type or a missing field
    /// is reported against that field. Domain checks are left to the encoder.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, InputError> {
        let breed = match required(body, InputField::Breed)? {
            Value::String(label) => label.clone(),
            _ => return Err(wrong_type(InputField::Breed, "a breed label")),
        };
        let milk_yield = whole_number(body, InputField::MilkYield)?
            .ok_or(InputError::Missing(InputField::MilkYield))?;
        let parity_no = whole_number(body, InputField::ParityNo)?
            .ok_or(InputError::Missing(InputField::ParityNo))?;
        let pregnancy_status = match required(body, InputField::PregnancyStatus)? {
            Value::Bool(flag) => PregnancyAnswer::Flag(*flag),
            Value::String(label) => PregnancyAnswer::Label(label.clone()),
            other => return Err(InputError::UnknownPregnancyStatus(other.to_string())),
        };
        let pregnancy_trimester = whole_number(body, InputField::PregnancyTrimester)?;

        let identity = AnimalIdentity {
            farmer_name: text(body, InputField::FarmerName)?,
            parentage: text(body, InputField::Parentage)?,
            address: text(body, InputField::Address)?,
            tag_number: text(body, InputField::TagNumber)?,
        };

        Ok(Self {
            breed,
            milk_yield,
            parity_no,
            pregnancy_status,
            pregnancy_trimester,
            identity,
        })
    }
}

fn wrong_type(field: InputField, expected: &'static str) -> InputError {
    InputError::WrongType { field, expected }
}

fn present(body: &Map<String, Value>, field: InputField) -> Option<&Value> {
    body.get(field.as_str()).filter(|value| !value.is_null())
}

fn required(body: &Map<String, Value>, field: InputField) -> Result<&Value, InputError> {
    present(body, field).ok_or(InputError::Missing(field))
}

fn whole_number(body: &Map<String, Value>, field: InputField) -> Result<Option<i64>, InputError> {
    present(body, field)
        .map(|value| value.as_i64().ok_or_else(|| wrong_type(field, "a whole number")))
        .transpose()
}

/// Identity fields are free text; numeric tags are kept as written.
fn text(body: &Map<String, Value>, field: InputField) -> Result<Option<String>, InputError> {
    present(body, field)
        .map(|value| match value {
            Value::String(value) => Ok(value.clone()),
            Value::Number(number) => Ok(number.to_string()),
            _ => Err(wrong_type(field, "text")),
        })
        .transpose()
}

/// Encoded, validated features. Only the encoder builds these, which keeps the trimester at
/// zero whenever the animal is not pregnant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub(crate) breed: Breed,
    pub(crate) milk_yield: u8,
    pub(crate) parity_no: u8,
    pub(crate) pregnant: bool,
    pub(crate) pregnancy_trimester: u8,
}

impl FeatureVector {
    pub fn breed(&self) -> Breed {
        self.breed
    }

    pub fn breed_code(&self) -> u8 {
        self.breed.code()
    }

    pub fn milk_yield(&self) -> u8 {
        self.milk_yield
    }

    pub fn parity_no(&self) -> u8 {
        self.parity_no
    }

    pub fn pregnancy_status(&self) -> u8 {
        u8::from(self.pregnant)
    }

    pub fn is_pregnant(&self) -> bool {
        self.pregnant
    }

    pub fn pregnancy_trimester(&self) -> u8 {
        self.pregnancy_trimester
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.breed_code()),
            f64::from(self.milk_yield),
            f64::from(self.parity_no),
            f64::from(self.pregnancy_status()),
            f64::from(self.pregnancy_trimester),
        ]
    }
}

/// Standardized features, same order as [`FeatureVector::values`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector {
    values: Vec<f64>,
}

impl ScaledVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Raw model output. Rounding for display happens when the report is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub raw_score: f64,
}

/// Form fields, used to point error messages at the offending input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Breed,
    MilkYield,
    ParityNo,
    PregnancyStatus,
    PregnancyTrimester,
    FarmerName,
    Parentage,
    Address,
    TagNumber,
}

impl InputField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breed => "breed",
            Self::MilkYield => "milk_yield",
            Self::ParityNo => "parity_no",
            Self::PregnancyStatus => "pregnancy_status",
            Self::PregnancyTrimester => "pregnancy_trimester",
            Self::FarmerName => "farmer_name",
            Self::Parentage => "parentage",
            Self::Address => "address",
            Self::TagNumber => "tag_number",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
