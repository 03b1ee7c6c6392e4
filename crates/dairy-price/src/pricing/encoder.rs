use std::ops::RangeInclusive;

use super::domain::{
    Breed, FeatureVector, InputField, PregnancyAnswer, RawInput, MILK_YIELD_LITERS, PARITY_NO,
    PREGNANCY_TRIMESTER,
};
use super::errors::InputError;

/// Validates raw form inputs and encodes them into the fitted feature layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn encode(raw: &RawInput) -> Result<FeatureVector, InputError> {
        let breed = Breed::from_label(&raw.breed)
            .ok_or_else(|| InputError::UnknownBreed(raw.breed.clone()))?;
        let milk_yield = within(InputField::MilkYield, raw.milk_yield, MILK_YIELD_LITERS)?;
        let parity_no = within(InputField::ParityNo, raw.parity_no, PARITY_NO)?;
        let pregnant = resolve_pregnancy(&raw.pregnancy_status)?;

        // Trimester only exists for pregnant animals; anything supplied otherwise is dropped.
        let pregnancy_trimester = if pregnant {
            let trimester = raw.pregnancy_trimester.ok_or(InputError::MissingTrimester)?;
            within(
                InputField::PregnancyTrimester,
                trimester,
                PREGNANCY_TRIMESTER,
            )?
        } else {
            0
        };

        Ok(FeatureVector {
            breed,
            milk_yield,
            parity_no,
            pregnant,
            pregnancy_trimester,
        })
    }
}

fn within(field: InputField, value: i64, domain: RangeInclusive<i64>) -> Result<u8, InputError> {
    let out_of_range = || InputError::OutOfRange {
        field,
        value,
        min: *domain.start(),
        max: *domain.end(),
    };
    if !domain.contains(&value) {
        return Err(out_of_range());
    }
    u8::try_from(value).map_err(|_| out_of_range())
}

fn resolve_pregnancy(answer: &PregnancyAnswer) -> Result<bool, InputError> {
    match answer {
        PregnancyAnswer::Flag(flag) => Ok(*flag),
        PregnancyAnswer::Label(label) => {
            let trimmed = label.trim();
            if trimmed.eq_ignore_ascii_case("yes") || trimmed.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if trimmed.eq_ignore_ascii_case("no") || trimmed.eq_ignore_ascii_case("false")
            {
                Ok(false)
            } else {
                Err(InputError::UnknownPregnancyStatus(label.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(milk_yield: i64) -> RawInput {
        RawInput::new("HF", milk_yield, 1, true, Some(2))
    }

    #[test]
    fn encodes_fields_in_fitted_order() {
        let vector = FeatureEncoder::encode(&raw(20)).expect("valid input encodes");
        assert_eq!(vector.values(), [0.0, 20.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn milk_yield_bounds_are_inclusive() {
        assert!(FeatureEncoder::encode(&raw(10)).is_ok());
        assert!(FeatureEncoder::encode(&raw(30)).is_ok());

        for value in [9, 31] {
            match FeatureEncoder::encode(&raw(value)) {
                Err(InputError::OutOfRange {
                    field: InputField::MilkYield,
                    value: reported,
                    min: 10,
                    max: 30,
                }) => assert_eq!(reported, value),
                other => panic!("expected milk yield rejection for {value}, got {other:?}"),
            }
        }
    }

    #[test]
    fn not_pregnant_forces_trimester_to_zero() {
        let input = RawInput::new("HF", 20, 1, PregnancyAnswer::Label("No".into()), Some(2));
        let vector = FeatureEncoder::encode(&input).expect("normalization is not an error");
        assert_eq!(vector.pregnancy_status(), 0);
        assert_eq!(vector.pregnancy_trimester(), 0);

        let input = RawInput::new("JY", 20, 1, false, Some(9));
        let vector = FeatureEncoder::encode(&input).expect("ignored trimester is not validated");
        assert_eq!(vector.pregnancy_trimester(), 0);
    }

    #[test]
    fn pregnant_animals_need_a_valid_trimester() {
        let missing = RawInput::new("HF", 20, 1, true, None);
        assert_eq!(
            FeatureEncoder::encode(&missing),
            Err(InputError::MissingTrimester)
        );

        let out_of_range = RawInput::new("HF", 20, 1, true, Some(4));
        assert_eq!(
            FeatureEncoder::encode(&out_of_range)
                .expect_err("trimester 4 is invalid")
                .field(),
            InputField::PregnancyTrimester
        );
    }

    #[test]
    fn rejects_unknown_labels_and_parity() {
        let breed = RawInput::new("Sahiwal", 20, 1, true, Some(1));
        assert_eq!(
            FeatureEncoder::encode(&breed),
            Err(InputError::UnknownBreed("Sahiwal".to_string()))
        );

        let status = RawInput::new("HF", 20, 1, PregnancyAnswer::Label("maybe".into()), None);
        assert_eq!(
            FeatureEncoder::encode(&status),
            Err(InputError::UnknownPregnancyStatus("maybe".to_string()))
        );

        let parity = RawInput::new("HF", 20, 4, false, None);
        assert_eq!(
            FeatureEncoder::encode(&parity)
                .expect_err("parity 4 is invalid")
                .field(),
            InputField::ParityNo
        );
    }

    #[test]
    fn parity_bounds_are_inclusive() {
        for accepted in [0, 3] {
            let vector = FeatureEncoder::encode(&RawInput::new("HF", 20, accepted, false, None))
                .expect("parity within domain");
            assert_eq!(i64::from(vector.parity_no()), accepted);
        }

        for rejected in [-1, 4] {
            match FeatureEncoder::encode(&RawInput::new("HF", 20, rejected, false, None)) {
                Err(InputError::OutOfRange {
                    field: InputField::ParityNo,
                    value,
                    min: 0,
                    max: 3,
                }) => assert_eq!(value, rejected),
                other => panic!("expected parity rejection for {rejected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn pregnant_with_trimester_zero_is_rejected() {
        assert_eq!(
            FeatureEncoder::encode(&RawInput::new("JY", 20, 1, true, Some(0))),
            Err(InputError::OutOfRange {
                field: InputField::PregnancyTrimester,
                value: 0,
                min: 1,
                max: 3,
            })
        );
    }

    #[test]
    fn every_valid_input_encodes_in_order_with_normalized_trimester() {
        let mut encoded = 0;
        for breed in [Breed::HolsteinFriesian, Breed::Jersey] {
            for milk_yield in MILK_YIELD_LITERS {
                for parity_no in PARITY_NO {
                    for pregnant in [true, false] {
                        let trimesters: Vec<Option<i64>> = if pregnant {
                            PREGNANCY_TRIMESTER.map(Some).collect()
                        } else {
                            vec![None, Some(1), Some(2), Some(3)]
                        };

                        for trimester in trimesters {
                            let raw = RawInput::new(
                                breed.label(),
                                milk_yield,
                                parity_no,
                                pregnant,
                                trimester,
                            );
                            let vector = FeatureEncoder::encode(&raw).expect("valid input");
                            let expected_trimester = if pregnant {
                                trimester.unwrap_or_default() as f64
                            } else {
                                0.0
                            };

                            assert_eq!(
                                vector.values(),
                                [
                                    f64::from(breed.code()),
                                    milk_yield as f64,
                                    parity_no as f64,
                                    if pregnant { 1.0 } else { 0.0 },
                                    expected_trimester,
                                ]
                            );
                            encoded += 1;
                        }
                    }
                }
            }
        }

        assert_eq!(encoded, 2 * 21 * 4 * (3 + 4));
    }

    #[test]
    fn jersey_encodes_to_code_one() {
        let input = RawInput::new("JY", 15, 0, PregnancyAnswer::Label("Yes".into()), Some(3));
        let vector = FeatureEncoder::encode(&input).expect("valid input encodes");
        assert_eq!(vector.breed_code(), 1);
        assert_eq!(vector.values(), [1.0, 15.0, 0.0, 1.0, 3.0]);
    }
}
