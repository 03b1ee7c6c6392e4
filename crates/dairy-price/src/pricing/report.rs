use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;
use serde::Serialize;

use super::domain::{pregnancy_label, AnimalIdentity, FeatureVector, PredictionResult, RawInput};
use crate::config::ReportConfig;

pub const CURRENCY: &str = "INR";
pub const DISCLAIMER: &str =
    "This is a system generated price and may vary slightly from the actual price.";

/// Round the raw score to whole currency units, ties to even.
pub fn displayed_price(raw_score: f64) -> i64 {
    raw_score.round_ties_even() as i64
}

/// `<OrgCode>/<RegionCode>/<NNNN>`. Cosmetic only: two reports may share a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportNumber(String);

impl ReportNumber {
    pub fn compose(org_code: &str, region_code: &str, suffix: u16) -> Self {
        Self(format!("{org_code}/{region_code}/{:04}", suffix % 10_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the trailing four digits of a report number.
pub trait ReportNumberSource: Send + Sync {
    fn next_suffix(&self) -> u16;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReportNumbers;

impl ReportNumberSource for RandomReportNumbers {
    fn next_suffix(&self) -> u16 {
        rand::thread_rng().gen_range(1000..=9999)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Generation metadata attached to a single report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    pub generated_at: DateTime<FixedOffset>,
    pub report_number: Option<ReportNumber>,
}

/// Immutable snapshot of one successful prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    report_number: Option<ReportNumber>,
    generated_at: DateTime<FixedOffset>,
    timezone: String,
    identity: AnimalIdentity,
    breed_code: u8,
    breed_label: &'static str,
    milk_yield_liters: u8,
    parity_no: u8,
    pregnancy_code: u8,
    pregnancy_label: &'static str,
    pregnancy_trimester: u8,
    raw_score: f64,
    displayed_price: i64,
    currency: &'static str,
    courtesy: String,
    disclaimer: &'static str,
}

impl ReportRecord {
    pub fn report_number(&self) -> Option<&ReportNumber> {
        self.report_number.as_ref()
    }

    pub fn generated_at(&self) -> DateTime<FixedOffset> {
        self.generated_at
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn identity(&self) -> &AnimalIdentity {
        &self.identity
    }

    pub fn breed_code(&self) -> u8 {
        self.breed_code
    }

    pub fn breed_label(&self) -> &'static str {
        self.breed_label
    }

    pub fn milk_yield_liters(&self) -> u8 {
        self.milk_yield_liters
    }

    pub fn parity_no(&self) -> u8 {
        self.parity_no
    }

    pub fn pregnancy_code(&self) -> u8 {
        self.pregnancy_code
    }

    pub fn pregnancy_label(&self) -> &'static str {
        self.pregnancy_label
    }

    pub fn pregnancy_trimester(&self) -> u8 {
        self.pregnancy_trimester
    }

    pub fn raw_score(&self) -> f64 {
        self.raw_score
    }

    pub fn displayed_price(&self) -> i64 {
        self.displayed_price
    }

    pub fn currency(&self) -> &'static str {
        self.currency
    }

    pub fn courtesy(&self) -> &str {
        &self.courtesy
    }

    pub fn disclaimer(&self) -> &'static str {
        self.disclaimer
    }

    /// Everything except the per-request metadata (timestamp and number).
    pub fn same_prediction_as(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.breed_code == other.breed_code
            && self.milk_yield_liters == other.milk_yield_liters
            && self.parity_no == other.parity_no
            && self.pregnancy_code == other.pregnancy_code
            && self.pregnancy_trimester == other.pregnancy_trimester
            && self.raw_score.to_bits() == other.raw_score.to_bits()
            && self.displayed_price == other.displayed_price
            && self.courtesy == other.courtesy
    }
}

/// Builds report records and their metadata.
#[derive(Clone)]
pub struct ReportAssembler {
    org_code: String,
    region_code: String,
    org_name: String,
    utc_offset: FixedOffset,
    numbering: Option<Arc<dyn ReportNumberSource>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ReportAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportAssembler")
            .field("org_code", &self.org_code)
            .field("region_code", &self.region_code)
            .field("utc_offset", &self.utc_offset)
            .field("numbering", &self.numbering.is_some())
            .finish_non_exhaustive()
    }
}

impl ReportAssembler {
    pub fn from_config(config: &ReportConfig) -> Self {
        let numbering: Option<Arc<dyn ReportNumberSource>> = if config.numbering {
            Some(Arc::new(RandomReportNumbers))
        } else {
            None
        };

        Self {
            org_code: config.org_code.clone(),
            region_code: config.region_code.clone(),
            org_name: config.org_name.clone(),
            utc_offset: config.utc_offset,
            numbering,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_numbering(mut self, source: Arc<dyn ReportNumberSource>) -> Self {
        self.numbering = Some(source);
        self
    }

    pub fn without_numbering(mut self) -> Self {
        self.numbering = None;
        self
    }

    /// Capture the timestamp (in the configured offset) and draw a report number.
    pub fn issue_meta(&self) -> ReportMeta {
        let generated_at = self.clock.now().with_timezone(&self.utc_offset);
        let report_number = self.numbering.as_ref().map(|source| {
            ReportNumber::compose(&self.org_code, &self.region_code, source.next_suffix())
        });

        ReportMeta {
            generated_at,
            report_number,
        }
    }

    pub fn assemble(
        &self,
        raw: &RawInput,
        features: &FeatureVector,
        result: &PredictionResult,
        meta: ReportMeta,
    ) -> ReportRecord {
        ReportRecord {
            report_number: meta.report_number,
            generated_at: meta.generated_at,
            timezone: meta.generated_at.offset().to_string(),
            identity: raw.identity.normalized(),
            breed_code: features.breed_code(),
            breed_label: features.breed().label(),
            milk_yield_liters: features.milk_yield(),
            parity_no: features.parity_no(),
            pregnancy_code: features.pregnancy_status(),
            pregnancy_label: pregnancy_label(features.is_pregnant()),
            pregnancy_trimester: features.pregnancy_trimester(),
            raw_score: result.raw_score,
            displayed_price: displayed_price(result.raw_score),
            currency: CURRENCY,
            courtesy: format!("Courtesy: {}", self.org_name),
            disclaimer: DISCLAIMER,
        }
    }
}
