//! Template layout: every position the renderer writes to
//!
//! Positions are calibrated against one specific template asset, so the
//! layout is versioned data. The built-in table matches the English
//! international travel attestation; a JSON file with the same shape can
//! replace it when the template changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AttestationError;
use crate::profile::{Category, Reason};

/// Version tag of the built-in layout
pub const BUILTIN_LAYOUT_VERSION: &str = "international-en-1";

/// A4 in points, the size of the appended QR page
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Text positions of the identity block on page 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityLayout {
    pub full_name: Point,
    pub birthday: Point,
    pub nationality: Point,
    pub address: Point,
    pub town_country: Point,
}

/// Glyph drawn to tick a checkbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkStyle {
    pub glyph: String,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonMark {
    pub reason: Reason,
    pub at: Point,
}

/// How a category ticks its boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckboxRule {
    /// One mark per selected reason, in table order
    PerReason { marks: Vec<ReasonMark> },
    /// A single mark regardless of reasons
    Always { at: Point },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxBlock {
    pub category: Category,
    pub rule: CheckboxRule,
}

/// "Issued at ... on ..." block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedLayout {
    pub town: Point,
    pub date: Point,
    pub town_max_width: f32,
    pub town_min_size: u32,
    pub town_default_size: u32,
}

/// QR placement on the appended page, anchored to its top edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPageLayout {
    pub x: f32,
    pub top_offset: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrLayout {
    pub first_page: PdfRect,
    pub second_page: QrPageLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLayout {
    pub version: String,
    pub font_size: f32,
    pub identity: IdentityLayout,
    pub mark: MarkStyle,
    pub checkboxes: Vec<CheckboxBlock>,
    pub issued: IssuedLayout,
    pub qr: QrLayout,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self::builtin()
    }
}

fn per_reason(marks: &[(Reason, f32)]) -> CheckboxRule {
    CheckboxRule::PerReason {
        marks: marks
            .iter()
            .map(|&(reason, y)| ReasonMark {
                reason,
                at: Point::new(49.0, y),
            })
            .collect(),
    }
}

impl TemplateLayout {
    /// Layout calibrated for the `international-en-1` template
    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_LAYOUT_VERSION.to_string(),
            font_size: 11.0,
            identity: IdentityLayout {
                full_name: Point::new(125.0, 590.0),
                birthday: Point::new(125.0, 567.0),
                nationality: Point::new(125.0, 545.0),
                address: Point::new(127.0, 527.0),
                town_country: Point::new(127.0, 505.0),
            },
            mark: MarkStyle {
                glyph: "x".to_string(),
                size: 19.0,
            },
            checkboxes: vec![
                CheckboxBlock {
                    category: Category::ForeignNational,
                    rule: per_reason(&[
                        (Reason::Residence, 449.0),
                        (Reason::Transit, 412.0),
                        (Reason::HealthProfessional, 385.0),
                        (Reason::Goods, 370.0),
                        (Reason::Crew, 354.0),
                        (Reason::Diplomatic, 339.0),
                        (Reason::CrossBorder, 313.0),
                    ]),
                },
                CheckboxBlock {
                    category: Category::EuNational,
                    rule: per_reason(&[
                        (Reason::Resident, 276.0),
                        (Reason::Transit, 263.0),
                        (Reason::HealthProfessional, 250.0),
                        (Reason::Goods, 238.0),
                        (Reason::Crew, 225.0),
                        (Reason::Diplomatic, 212.0),
                        (Reason::CrossBorder, 189.0),
                    ]),
                },
                CheckboxBlock {
                    category: Category::National,
                    rule: CheckboxRule::Always {
                        at: Point::new(49.0, 162.0),
                    },
                },
            ],
            issued: IssuedLayout {
                town: Point::new(395.0, 142.0),
                date: Point::new(488.0, 142.0),
                town_max_width: 83.0,
                town_min_size: 7,
                town_default_size: 11,
            },
            qr: QrLayout {
                first_page: PdfRect {
                    x: 450.0,
                    y: 572.0,
                    width: 100.0,
                    height: 100.0,
                },
                second_page: QrPageLayout {
                    x: 50.0,
                    top_offset: 350.0,
                    size: 300.0,
                },
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AttestationError> {
        let layout: Self = serde_json::from_str(json)
            .map_err(|e| AttestationError::InvalidLayout(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: &Path) -> Result<Self, AttestationError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AttestationError::InvalidLayout(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, AttestationError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AttestationError::SerializationError(e.to_string()))
    }

    /// Checkbox rule for a category. Unknown categories have none.
    pub fn checkbox_rule(&self, category: &Category) -> Option<&CheckboxRule> {
        self.checkboxes
            .iter()
            .find(|block| &block.category == category)
            .map(|block| &block.rule)
    }

    fn validate(&self) -> Result<(), AttestationError> {
        let issued = &self.issued;
        if issued.town_min_size == 0 || issued.town_min_size > issued.town_default_size {
            return Err(AttestationError::InvalidLayout(format!(
                "Town font range {}..={} is empty",
                issued.town_min_size, issued.town_default_size
            )));
        }
        if issued.town_max_width <= 0.0 {
            return Err(AttestationError::InvalidLayout(
                "Town width limit must be positive".to_string(),
            ));
        }
        if self.font_size <= 0.0 || self.mark.size <= 0.0 {
            return Err(AttestationError::InvalidLayout(
                "Font sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_per_category() {
        let layout = TemplateLayout::builtin();
        assert!(matches!(
            layout.checkbox_rule(&Category::ForeignNational),
            Some(CheckboxRule::PerReason { marks }) if marks.len() == 7
        ));
        assert!(matches!(
            layout.checkbox_rule(&Category::National),
            Some(CheckboxRule::Always { .. })
        ));
        assert!(layout
            .checkbox_rule(&Category::Other("xx".to_string()))
            .is_none());
    }

    #[test]
    fn test_json_round_trip_preserves_table() {
        let layout = TemplateLayout::builtin();
        let json = layout.to_json().unwrap();
        assert!(json.contains("\"prof._sante\""));
        assert!(json.contains("\"per_reason\""));
        let back = TemplateLayout::from_json(&json).unwrap();
        assert_eq!(back, layout);
    }

    #[test]
    fn test_rejects_empty_font_range() {
        let mut layout = TemplateLayout::builtin();
        layout.issued.town_min_size = 12;
        let json = layout.to_json().unwrap();
        assert!(matches!(
            TemplateLayout::from_json(&json),
            Err(AttestationError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(TemplateLayout::from_json("{\"version\": 1}").is_err());
    }
}
