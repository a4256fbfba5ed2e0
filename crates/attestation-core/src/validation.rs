//! Form input checks
//!
//! The same checks the form applies while typing: every field filled, the
//! birth date in `DD/MM/YYYY`, and a reason picked unless the traveler is a
//! national.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AttestationError;
use crate::profile::{strip_field_prefix, Category, Profile, ReasonSet};

lazy_static! {
    static ref BIRTHDAY: Regex =
        Regex::new(r"^(0[1-9]|[12][0-9]|30|31)/(0[1-9]|1[0-2])/(19[0-9]{2}|20[01][0-9]|2020)")
            .expect("birthday pattern is valid");
    static ref TWO_DIGITS: Regex = Regex::new(r"^(\d{2})$").expect("pattern is valid");
    static ref DAY_MONTH: Regex = Regex::new(r"^(\d{2})/(\d{2})$").expect("pattern is valid");
}

pub fn is_valid_birthday(value: &str) -> bool {
    BIRTHDAY.is_match(value)
}

/// Insert slashes as the user types a birth date: `DD` becomes `DD/`,
/// `DD/MM` becomes `DD/MM/`, and doubled slashes collapse.
pub fn format_birthday_input(value: &str) -> String {
    let value = TWO_DIGITS.replace(value, "$1/");
    let value = DAY_MONTH.replace(&value, "$1/$2/");
    value.replace("//", "/")
}

/// Live check for a single input, keyed by field name with or without the
/// `field-` prefix. Drives the `aria-invalid` state while typing.
pub fn is_field_valid(name: &str, value: &str) -> bool {
    match strip_field_prefix(name) {
        "birthday" => is_valid_birthday(value),
        _ => !value.is_empty(),
    }
}

pub fn validate_profile(profile: &Profile) -> Result<(), AttestationError> {
    let missing: Vec<&str> = profile
        .fields()
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
    if !missing.is_empty() {
        return Err(AttestationError::Validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }
    if !is_valid_birthday(&profile.birthday) {
        return Err(AttestationError::Validation(format!(
            "Birth date '{}' is not DD/MM/YYYY",
            profile.birthday
        )));
    }
    Ok(())
}

/// Non-national travelers must give at least one reason. Unknown
/// categories are let through and render without marks.
pub fn validate_selection(category: &Category, reasons: &ReasonSet) -> Result<(), AttestationError> {
    match category {
        Category::ForeignNational | Category::EuNational if reasons.is_empty() => {
            Err(AttestationError::Validation(format!(
                "At least one reason is required for category '{}'",
                category
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birthday_pattern() {
        assert!(is_valid_birthday("01/01/1990"));
        assert!(is_valid_birthday("31/12/2020"));
        assert!(!is_valid_birthday("32/01/1990"));
        assert!(!is_valid_birthday("01/13/1990"));
        assert!(!is_valid_birthday("01/01/2021"));
        assert!(!is_valid_birthday("1/1/1990"));
    }

    #[test]
    fn test_format_birthday_input() {
        assert_eq!(format_birthday_input("01"), "01/");
        assert_eq!(format_birthday_input("01/02"), "01/02/");
        assert_eq!(format_birthday_input("01//"), "01/");
        assert_eq!(format_birthday_input("01/02/19"), "01/02/19");
    }

    #[test]
    fn test_is_field_valid() {
        assert!(is_field_valid("field-birthday", "09/10/1999"));
        assert!(!is_field_valid("field-birthday", "9/10/1999"));
        assert!(is_field_valid("town", "Metz"));
        assert!(!is_field_valid("field-lastname", ""));
    }

    #[test]
    fn test_validate_profile_lists_missing_fields() {
        let profile = Profile {
            firstname: "Ana".into(),
            birthday: "01/01/1990".into(),
            ..Profile::default()
        };
        let err = validate_profile(&profile).unwrap_err().to_string();
        assert!(err.contains("lastname"));
        assert!(err.contains("country"));
        assert!(!err.contains("firstname"));
    }

    #[test]
    fn test_validate_selection() {
        assert!(validate_selection(&Category::National, &ReasonSet::new()).is_ok());
        assert!(validate_selection(&Category::EuNational, &ReasonSet::new()).is_err());
        assert!(validate_selection(&Category::Other("zz".into()), &ReasonSet::new()).is_ok());
        let reasons = ReasonSet::from_codes(["transit"]).unwrap();
        assert!(validate_selection(&Category::ForeignNational, &reasons).is_ok());
    }
}
