//! Validated vaccination record model
//!
//! A [`Record`] is one source row handed over by the upstream validation
//! collaborator: the individual's identity fields plus one encounter's worth
//! of vaccination fields. Records are immutable once planned into a batch;
//! the resubmission handler produces a new record version via
//! [`Record::apply_edits`] instead of mutating in place.

use crate::domain::errors::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Administrative gender as the registry expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Female,
    Male,
    Other,
    Unknown,
}

impl Gender {
    /// Single-letter wire code
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
            Gender::Other => "O",
            Gender::Unknown => "U",
        }
    }
}

/// Individual identity fields for one record
///
/// The registry matches individuals on name/date-of-birth/gender plus at
/// least one of: Medicare card number with its individual reference number,
/// a health identifier, or name with postcode. Which path is present varies
/// per row; [`PatientIdentity::has_identification`] checks that at least one
/// complete path exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientIdentity {
    /// Given name
    pub given_name: String,

    /// Family name
    pub family_name: String,

    /// Date of birth
    pub date_of_birth: NaiveDate,

    /// Administrative gender
    pub gender: Gender,

    /// Medicare card number (used together with `medicare_irn`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicare_card_number: Option<String>,

    /// Individual reference number on the Medicare card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicare_irn: Option<String>,

    /// Individual health identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_identifier: Option<String>,

    /// Residential postcode (identification fallback with name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl PatientIdentity {
    /// Whether at least one complete identification path is present
    pub fn has_identification(&self) -> bool {
        let card = matches!(&self.medicare_card_number, Some(c) if !c.trim().is_empty())
            && matches!(&self.medicare_irn, Some(r) if !r.trim().is_empty());
        let ihi = matches!(&self.health_identifier, Some(h) if !h.trim().is_empty());
        let postcode = matches!(&self.postcode, Some(p) if !p.trim().is_empty());
        card || ihi || postcode
    }
}

/// One encounter's worth of vaccination fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationDetails {
    /// Date the vaccine was administered
    pub date_of_service: NaiveDate,

    /// Vaccine code as catalogued by the registry
    pub vaccine_code: String,

    /// Dose number within the schedule
    pub dose: String,

    /// Vaccine batch number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,

    /// Route of administration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Immunisation type (e.g. scheduled, catch-up, antenatal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immunisation_type: Option<String>,
}

/// One validated record: a source row ready for batch planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based row number in the source upload, used to map outcomes back
    pub row_number: usize,

    /// Individual identity fields
    pub identity: PatientIdentity,

    /// Vaccination encounter fields
    pub vaccination: VaccinationDetails,
}

impl Record {
    /// Creates a new record
    pub fn new(row_number: usize, identity: PatientIdentity, vaccination: VaccinationDetails) -> Self {
        Self {
            row_number,
            identity,
            vaccination,
        }
    }

    /// Structural validation applied before any submission
    ///
    /// Checks required fields are non-empty and that one identification
    /// path is complete. The batch planner applies this per row; the
    /// resubmission handler applies the same rules to an edited record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(self.row_number, "record failed structural validation");

        if self.identity.given_name.trim().is_empty() {
            err = err.with_field("given_name", "must not be empty");
        }
        if self.identity.family_name.trim().is_empty() {
            err = err.with_field("family_name", "must not be empty");
        }
        if !self.identity.has_identification() {
            err = err.with_field(
                "identity",
                "requires Medicare card number with reference number, a health identifier, or a postcode",
            );
        }
        if self.vaccination.vaccine_code.trim().is_empty() {
            err = err.with_field("vaccine_code", "must not be empty");
        }
        if self.vaccination.dose.trim().is_empty() {
            err = err.with_field("dose", "must not be empty");
        }

        if err.field_errors.is_empty() {
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Produces a new record version with the caller's edits applied
    ///
    /// The original record is left untouched; the returned version carries
    /// the same row number so outcomes keep mapping to the source row.
    pub fn apply_edits(&self, edits: &EditedFields) -> Record {
        let mut record = self.clone();

        if let Some(ref v) = edits.given_name {
            record.identity.given_name = v.clone();
        }
        if let Some(ref v) = edits.family_name {
            record.identity.family_name = v.clone();
        }
        if let Some(v) = edits.date_of_birth {
            record.identity.date_of_birth = v;
        }
        if let Some(v) = edits.gender {
            record.identity.gender = v;
        }
        if let Some(ref v) = edits.medicare_card_number {
            record.identity.medicare_card_number = Some(v.clone());
        }
        if let Some(ref v) = edits.medicare_irn {
            record.identity.medicare_irn = Some(v.clone());
        }
        if let Some(ref v) = edits.health_identifier {
            record.identity.health_identifier = Some(v.clone());
        }
        if let Some(ref v) = edits.postcode {
            record.identity.postcode = Some(v.clone());
        }
        if let Some(v) = edits.date_of_service {
            record.vaccination.date_of_service = v;
        }
        if let Some(ref v) = edits.vaccine_code {
            record.vaccination.vaccine_code = v.clone();
        }
        if let Some(ref v) = edits.dose {
            record.vaccination.dose = v.clone();
        }
        if let Some(ref v) = edits.batch_number {
            record.vaccination.batch_number = Some(v.clone());
        }
        if let Some(ref v) = edits.route {
            record.vaccination.route = Some(v.clone());
        }
        if let Some(ref v) = edits.immunisation_type {
            record.vaccination.immunisation_type = Some(v.clone());
        }

        record
    }
}

/// Caller-edited field set for a resubmission
///
/// Every field is optional; only present fields override the original
/// record. Deserialized from the correction form of the calling layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicare_card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicare_irn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_service: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immunisation_type: Option<String>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a minimal valid record for unit tests
    pub fn record(row_number: usize, given_name: &str, date_of_service: &str) -> Record {
        Record::new(
            row_number,
            PatientIdentity {
                given_name: given_name.to_string(),
                family_name: "Citizen".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
                gender: Gender::Female,
                medicare_card_number: Some("2951233711".to_string()),
                medicare_irn: Some("1".to_string()),
                health_identifier: None,
                postcode: None,
            },
            VaccinationDetails {
                date_of_service: date_of_service.parse().unwrap(),
                vaccine_code: "FLUVAX".to_string(),
                dose: "1".to_string(),
                batch_number: Some("AB1234".to_string()),
                route: Some("IM".to_string()),
                immunisation_type: None,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_valid_record_passes_validation() {
        assert!(record(1, "Jane", "2025-06-01").validate().is_ok());
    }

    #[test]
    fn test_missing_vaccine_code_rejected() {
        let mut r = record(3, "Jane", "2025-06-01");
        r.vaccination.vaccine_code = "  ".to_string();

        let err = r.validate().unwrap_err();
        assert_eq!(err.row_number, 3);
        assert!(err.field_errors.iter().any(|f| f.field == "vaccine_code"));
    }

    #[test]
    fn test_identification_paths() {
        let mut r = record(1, "Jane", "2025-06-01");
        assert!(r.identity.has_identification());

        // Card number without reference number is incomplete
        r.identity.medicare_irn = None;
        assert!(!r.identity.has_identification());

        // Health identifier alone is sufficient
        r.identity.health_identifier = Some("8003608166690503".to_string());
        assert!(r.identity.has_identification());

        // Postcode alone is sufficient (with the always-present name)
        r.identity.health_identifier = None;
        r.identity.postcode = Some("2000".to_string());
        assert!(r.identity.has_identification());
    }

    #[test]
    fn test_record_without_identification_rejected() {
        let mut r = record(5, "Jane", "2025-06-01");
        r.identity.medicare_card_number = None;
        r.identity.medicare_irn = None;

        let err = r.validate().unwrap_err();
        assert!(err.field_errors.iter().any(|f| f.field == "identity"));
    }

    #[test]
    fn test_apply_edits_produces_new_version() {
        let original = record(2, "Jane", "2025-06-01");
        let edits = EditedFields {
            vaccine_code: Some("COVAST".to_string()),
            date_of_service: Some(NaiveDate::from_ymd_opt(2025, 5, 30).unwrap()),
            ..Default::default()
        };

        let edited = original.apply_edits(&edits);

        assert_eq!(edited.row_number, 2);
        assert_eq!(edited.vaccination.vaccine_code, "COVAST");
        assert_eq!(
            edited.vaccination.date_of_service,
            NaiveDate::from_ymd_opt(2025, 5, 30).unwrap()
        );
        // Original untouched
        assert_eq!(original.vaccination.vaccine_code, "FLUVAX");
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::Female.code(), "F");
        assert_eq!(Gender::Male.code(), "M");
        assert_eq!(Gender::Other.code(), "O");
        assert_eq!(Gender::Unknown.code(), "U");
    }
}
