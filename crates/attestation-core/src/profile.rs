//! Profile data collected from the form
//!
//! A profile is a flat set of free-text fields. The traveler category and
//! the selected reasons travel alongside it and decide which checkbox marks
//! end up on the attestation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AttestationError;

/// Prefix carried by form input ids (`field-firstname`, ...)
pub const FIELD_PREFIX: &str = "field-";

/// Motif placeholder used when the traveler is a national
pub const NO_REASON: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub firstname: String,
    pub lastname: String,
    /// Birth date as typed in the form, `DD/MM/YYYY`
    pub birthday: String,
    pub nationality: String,
    pub address: String,
    pub zipcode: String,
    pub town: String,
    pub country: String,
}

impl Profile {
    /// Field names in form order. These are also the storage keys.
    pub const FIELD_NAMES: [&'static str; 8] = [
        "firstname",
        "lastname",
        "birthday",
        "nationality",
        "address",
        "zipcode",
        "town",
        "country",
    ];

    /// Rebuild a profile from a field map. Missing fields become empty and
    /// unknown keys are ignored.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        let get = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            firstname: get("firstname"),
            lastname: get("lastname"),
            birthday: get("birthday"),
            nationality: get("nationality"),
            address: get("address"),
            zipcode: get("zipcode"),
            town: get("town"),
            country: get("country"),
        }
    }

    /// Build a profile from form input ids and values, stripping the
    /// `field-` prefix from each id.
    pub fn from_form<'a, I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = inputs
            .into_iter()
            .map(|(id, value)| (strip_field_prefix(id).to_string(), value.to_string()))
            .collect();
        Self::from_fields(&fields)
    }

    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("firstname", self.firstname.as_str()),
            ("lastname", self.lastname.as_str()),
            ("birthday", self.birthday.as_str()),
            ("nationality", self.nationality.as_str()),
            ("address", self.address.as_str()),
            ("zipcode", self.zipcode.as_str()),
            ("town", self.town.as_str()),
            ("country", self.country.as_str()),
        ]
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Strip the `field-` prefix from a form input id, if present
pub fn strip_field_prefix(id: &str) -> &str {
    id.strip_prefix(FIELD_PREFIX).unwrap_or(id)
}

/// Traveler nationality classification.
///
/// Parsing never fails: codes outside the known three are kept as
/// `Other` and render no checkbox at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Third-country national (`tiers`)
    ForeignNational,
    /// EU national (`eu`)
    EuNational,
    /// French national (`fr`)
    National,
    Other(String),
}

impl Category {
    pub fn code(&self) -> &str {
        match self {
            Category::ForeignNational => "tiers",
            Category::EuNational => "eu",
            Category::National => "fr",
            Category::Other(code) => code,
        }
    }

    pub fn is_national(&self) -> bool {
        matches!(self, Category::National)
    }
}

impl From<&str> for Category {
    fn from(code: &str) -> Self {
        match code.trim() {
            "tiers" => Category::ForeignNational,
            "eu" => Category::EuNational,
            "fr" => Category::National,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(code: String) -> Self {
        Category::from(code.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.code().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// Returning to a residence (third-country nationals)
    #[serde(rename = "residence")]
    Residence,
    /// Returning to a residence (EU nationals)
    #[serde(rename = "resident")]
    Resident,
    #[serde(rename = "transit")]
    Transit,
    /// Health professional
    #[serde(rename = "prof._sante")]
    HealthProfessional,
    /// Goods transport
    #[serde(rename = "marchandises")]
    Goods,
    /// Aircraft or ship crew
    #[serde(rename = "equipage")]
    Crew,
    #[serde(rename = "diplomatique")]
    Diplomatic,
    /// Cross-border worker
    #[serde(rename = "frontalier")]
    CrossBorder,
}

impl Reason {
    pub const ALL: [Reason; 8] = [
        Reason::Residence,
        Reason::Resident,
        Reason::Transit,
        Reason::HealthProfessional,
        Reason::Goods,
        Reason::Crew,
        Reason::Diplomatic,
        Reason::CrossBorder,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Reason::Residence => "residence",
            Reason::Resident => "resident",
            Reason::Transit => "transit",
            Reason::HealthProfessional => "prof._sante",
            Reason::Goods => "marchandises",
            Reason::Crew => "equipage",
            Reason::Diplomatic => "diplomatique",
            Reason::CrossBorder => "frontalier",
        }
    }
}

impl FromStr for Reason {
    type Err = AttestationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Reason::ALL
            .iter()
            .copied()
            .find(|reason| reason.code() == code)
            .ok_or_else(|| AttestationError::UnknownReason(code.to_string()))
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Selected reasons, kept in selection order without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonSet {
    reasons: Vec<Reason>,
}

impl ReasonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the reason was already selected
    pub fn insert(&mut self, reason: Reason) -> bool {
        if self.contains(reason) {
            return false;
        }
        self.reasons.push(reason);
        true
    }

    pub fn contains(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Reason> + '_ {
        self.reasons.iter().copied()
    }

    /// Dash-joined codes, the format used in storage and in the QR payload
    pub fn joined(&self) -> String {
        self.reasons
            .iter()
            .map(Reason::code)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Reason part of the motif line. Nationals have no reason to give.
    pub fn motif(&self, category: &Category) -> String {
        if category.is_national() {
            NO_REASON.to_string()
        } else {
            self.joined()
        }
    }

    /// Parse a list of reason codes, failing on the first unknown code
    pub fn from_codes<I, S>(codes: I) -> Result<Self, AttestationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = ReasonSet::new();
        for code in codes {
            set.insert(code.as_ref().parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<Reason> for ReasonSet {
    fn from_iter<T: IntoIterator<Item = Reason>>(iter: T) -> Self {
        let mut set = ReasonSet::new();
        for reason in iter {
            set.insert(reason);
        }
        set
    }
}

impl FromStr for ReasonSet {
    type Err = AttestationError;

    /// Parse the dash-joined storage form. Empty and `N/A` are the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == NO_REASON {
            return Ok(ReasonSet::new());
        }
        ReasonSet::from_codes(s.split('-'))
    }
}

/// Raw form state as submitted by a front end: input ids with their
/// values, the checked category radio and the checked reason boxes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmission {
    pub fields: BTreeMap<String, String>,
    #[serde(rename = "typeNationality")]
    pub category: String,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl FormSubmission {
    pub fn profile(&self) -> Profile {
        Profile::from_form(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn category(&self) -> Category {
        Category::from(self.category.as_str())
    }

    pub fn reasons(&self) -> Result<ReasonSet, AttestationError> {
        ReasonSet::from_codes(&self.reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form_strips_prefix() {
        let profile = Profile::from_form([
            ("field-firstname", "Jean"),
            ("field-lastname", "Dupont"),
            ("town", "Paris"),
        ]);
        assert_eq!(profile.firstname, "Jean");
        assert_eq!(profile.lastname, "Dupont");
        assert_eq!(profile.town, "Paris");
        assert_eq!(profile.country, "");
    }

    #[test]
    fn test_fields_round_trip_through_map() {
        let profile = Profile {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            birthday: "10/12/1915".into(),
            nationality: "British".into(),
            address: "12 St James's Square".into(),
            zipcode: "SW1Y".into(),
            town: "London".into(),
            country: "UK".into(),
        };
        let map: BTreeMap<String, String> = profile
            .fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(Profile::from_fields(&map), profile);
    }

    #[test]
    fn test_category_codes() {
        assert_eq!(Category::from("tiers"), Category::ForeignNational);
        assert_eq!(Category::from("eu"), Category::EuNational);
        assert_eq!(Category::from("fr"), Category::National);
        assert_eq!(
            Category::from("martian"),
            Category::Other("martian".to_string())
        );
        assert_eq!(Category::from("martian").code(), "martian");
    }

    #[test]
    fn test_category_serde_uses_code() {
        let json = serde_json::to_string(&Category::EuNational).unwrap();
        assert_eq!(json, "\"eu\"");
        let back: Category = serde_json::from_str("\"tiers\"").unwrap();
        assert_eq!(back, Category::ForeignNational);
    }

    #[test]
    fn test_reason_parse_rejects_unknown() {
        assert_eq!("prof._sante".parse::<Reason>().unwrap(), Reason::HealthProfessional);
        assert!(matches!(
            "holiday".parse::<Reason>(),
            Err(AttestationError::UnknownReason(code)) if code == "holiday"
        ));
    }

    #[test]
    fn test_reason_set_deduplicates_and_keeps_order() {
        let set = ReasonSet::from_codes(["transit", "diplomatique", "transit"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.joined(), "transit-diplomatique");
    }

    #[test]
    fn test_reason_set_storage_form() {
        let set: ReasonSet = "equipage-prof._sante".parse().unwrap();
        assert!(set.contains(Reason::Crew));
        assert!(set.contains(Reason::HealthProfessional));
        assert!("".parse::<ReasonSet>().unwrap().is_empty());
        assert!("N/A".parse::<ReasonSet>().unwrap().is_empty());
    }

    #[test]
    fn test_motif_for_national_is_placeholder() {
        let set = ReasonSet::from_codes(["transit"]).unwrap();
        assert_eq!(set.motif(&Category::National), "N/A");
        assert_eq!(set.motif(&Category::EuNational), "transit");
    }

    #[test]
    fn test_form_submission_deserializes() {
        let json = r#"{
            "fields": {"field-firstname": "Jean", "field-town": "Lyon"},
            "typeNationality": "tiers",
            "reasons": ["transit", "frontalier"]
        }"#;
        let form: FormSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(form.profile().town, "Lyon");
        assert_eq!(form.category(), Category::ForeignNational);
        assert_eq!(form.reasons().unwrap().joined(), "transit-frontalier");
    }
}
