//! Plaintext summary encoded in the attestation QR code
//!
//! The payload is a fixed sequence of `label: value` lines joined by
//! `";\n "`. Label text and order are read by whatever scans the code, so
//! they must not change.

use chrono::NaiveDateTime;

use crate::error::AttestationError;
use crate::profile::{Category, Profile, ReasonSet};

/// Separator between summary lines
pub const LINE_SEPARATOR: &str = ";\n ";

pub const LABEL_CREATED: &str = "Cree le";
pub const LABEL_LASTNAME: &str = "Nom";
pub const LABEL_FIRSTNAME: &str = "Prenom";
pub const LABEL_BIRTH: &str = "Naissance";
pub const LABEL_ADDRESS: &str = "Adresse";
pub const LABEL_EXIT: &str = "Sortie";
pub const LABEL_MOTIFS: &str = "Motifs";

/// `DD/MM/YYYY`
pub fn format_creation_date(at: &NaiveDateTime) -> String {
    at.format("%d/%m/%Y").to_string()
}

/// `HHhMM`
pub fn format_creation_hour(at: &NaiveDateTime) -> String {
    at.format("%Hh%M").to_string()
}

/// `DD/MM`, the short date written next to "on" in the issued block
pub fn format_issue_day(at: &NaiveDateTime) -> String {
    at.format("%d/%m").to_string()
}

/// Build the summary string for the QR code
pub fn build_summary(
    profile: &Profile,
    category: &Category,
    reasons: &ReasonSet,
    created_at: &NaiveDateTime,
) -> String {
    [
        format!(
            "{}: {} a {}",
            LABEL_CREATED,
            format_creation_date(created_at),
            format_creation_hour(created_at)
        ),
        format!("{}: {}", LABEL_LASTNAME, profile.lastname),
        format!("{}: {}", LABEL_FIRSTNAME, profile.firstname),
        format!(
            "{}: {} ({})",
            LABEL_BIRTH, profile.birthday, profile.nationality
        ),
        format!(
            "{}: {} {} {} {}",
            LABEL_ADDRESS, profile.address, profile.zipcode, profile.town, profile.country
        ),
        format!("{}: N/A", LABEL_EXIT),
        format!(
            "{}: {}-{}",
            LABEL_MOTIFS,
            category.code(),
            reasons.motif(category)
        ),
    ]
    .join(LINE_SEPARATOR)
}

/// A decoded summary payload, one value per label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub created: String,
    pub lastname: String,
    pub firstname: String,
    pub birth: String,
    pub address: String,
    pub exit: String,
    pub motifs: String,
}

impl SummaryRecord {
    /// Parse a scanned payload back into its labelled values.
    ///
    /// Lines must appear in the canonical order with the canonical labels.
    pub fn parse(payload: &str) -> Result<Self, AttestationError> {
        let lines: Vec<&str> = payload.split(LINE_SEPARATOR).collect();
        let labels = [
            LABEL_CREATED,
            LABEL_LASTNAME,
            LABEL_FIRSTNAME,
            LABEL_BIRTH,
            LABEL_ADDRESS,
            LABEL_EXIT,
            LABEL_MOTIFS,
        ];
        if lines.len() != labels.len() {
            return Err(AttestationError::Validation(format!(
                "Expected {} summary lines, found {}",
                labels.len(),
                lines.len()
            )));
        }

        let mut values = Vec::with_capacity(labels.len());
        for (line, label) in lines.iter().zip(labels) {
            let value = line
                .strip_prefix(label)
                .and_then(|rest| rest.strip_prefix(": "))
                .ok_or_else(|| {
                    AttestationError::Validation(format!("Expected '{}' line, found '{}'", label, line))
                })?;
            values.push(value.to_string());
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Self {
            created: next(),
            lastname: next(),
            firstname: next(),
            birth: next(),
            address: next(),
            exit: next(),
            motifs: next(),
        })
    }

    /// Category code and reason motif, split on the first dash
    pub fn motif_parts(&self) -> (&str, &str) {
        self.motifs.split_once('-').unwrap_or((&self.motifs, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample_profile() -> Profile {
        Profile {
            firstname: "Camille".into(),
            lastname: "Martin".into(),
            birthday: "01/02/1990".into(),
            nationality: "Belge".into(),
            address: "3 rue des Lilas".into(),
            zipcode: "75011".into(),
            town: "Paris".into(),
            country: "France".into(),
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 11, 3)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_summary_exact_format() {
        let reasons = ReasonSet::from_codes(["transit", "diplomatique"]).unwrap();
        let summary = build_summary(&sample_profile(), &Category::ForeignNational, &reasons, &at());
        assert_eq!(
            summary,
            "Cree le: 03/11/2020 a 09h05;\n \
             Nom: Martin;\n \
             Prenom: Camille;\n \
             Naissance: 01/02/1990 (Belge);\n \
             Adresse: 3 rue des Lilas 75011 Paris France;\n \
             Sortie: N/A;\n \
             Motifs: tiers-transit-diplomatique"
        );
    }

    #[test]
    fn test_national_motif() {
        let summary = build_summary(&sample_profile(), &Category::National, &ReasonSet::new(), &at());
        assert!(summary.ends_with("Motifs: fr-N/A"));
    }

    #[test]
    fn test_parse_round_trip() {
        let reasons = ReasonSet::from_codes(["resident"]).unwrap();
        let summary = build_summary(&sample_profile(), &Category::EuNational, &reasons, &at());
        let record = SummaryRecord::parse(&summary).unwrap();
        assert_eq!(record.lastname, "Martin");
        assert_eq!(record.firstname, "Camille");
        assert_eq!(record.birth, "01/02/1990 (Belge)");
        assert_eq!(record.address, "3 rue des Lilas 75011 Paris France");
        assert_eq!(record.exit, "N/A");
        assert_eq!(record.motif_parts(), ("eu", "resident"));
    }

    #[test]
    fn test_parse_rejects_reordered_lines() {
        let payload = "Nom: X;\n Cree le: Y;\n Prenom: a;\n Naissance: b;\n Adresse: c;\n Sortie: N/A;\n Motifs: fr-N/A";
        assert!(SummaryRecord::parse(payload).is_err());
    }

    #[test]
    fn test_date_helpers() {
        assert_eq!(format_creation_date(&at()), "03/11/2020");
        assert_eq!(format_creation_hour(&at()), "09h05");
        assert_eq!(format_issue_day(&at()), "03/11");
    }
}
