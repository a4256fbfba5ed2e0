//! Attestation renderer
//!
//! Lays the profile out on the template according to a [`TemplateLayout`],
//! stamps the QR code on page 1 and on page 2, appends one blank page, and
//! serializes the result.

use chrono::NaiveDateTime;
use lopdf::Document;
use tracing::{debug, info, warn};

use crate::error::AttestationError;
use crate::layout::{CheckboxRule, Point, TemplateLayout};
use crate::metrics::{ideal_font_size, unencodable_chars};
use crate::overlay::{apply_overlay, DrawOp, OverlayPlan, QrPlacement};
use crate::profile::{Category, Profile, ReasonSet};
use crate::qr;
use crate::summary::{build_summary, format_issue_day};
use crate::{output_file_name, PDF_MEDIA_TYPE};

/// Shown when the town name cannot be shrunk into its box
pub const TOWN_OVERFLOW_WARNING: &str =
    "The town name may not display correctly because of its length. \
     Try abbreviations where possible (\"Saint\" as \"St.\" for example).";

/// Shown when some characters have no glyph in the form's font
pub const UNENCODABLE_TEXT_WARNING: &str =
    "Some characters cannot be printed on the form and were replaced by \"?\".";

/// Non-fatal problems met while rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    /// Town still overflows at the minimum size; drawn at that size anyway
    TownTooLong { town: String, size: u32 },
    /// Characters outside WinAnsi, printed as `?`
    UnencodableText { text: String, chars: Vec<char> },
}

impl RenderWarning {
    pub fn message(&self) -> &'static str {
        match self {
            RenderWarning::TownTooLong { .. } => TOWN_OVERFLOW_WARNING,
            RenderWarning::UnencodableText { .. } => UNENCODABLE_TEXT_WARNING,
        }
    }
}

/// A finished attestation, ready for delivery
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub file_name: String,
    pub warnings: Vec<RenderWarning>,
}

/// Overlay plan plus everything derived while laying it out
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub plan: OverlayPlan,
    pub summary: String,
    pub town_size: u32,
    pub warnings: Vec<RenderWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    layout: TemplateLayout,
}

impl Renderer {
    pub fn new(layout: TemplateLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    /// Compute every draw operation without touching a PDF
    pub fn plan(
        &self,
        profile: &Profile,
        category: &Category,
        reasons: &ReasonSet,
        now: &NaiveDateTime,
    ) -> LayoutOutcome {
        let layout = &self.layout;
        let size = layout.font_size;
        let mut plan = OverlayPlan::new();
        let mut warnings = Vec::new();

        let identity = &layout.identity;
        plan.text(1, identity.full_name, size, profile.full_name());
        plan.text(1, identity.birthday, size, profile.birthday.as_str());
        plan.text(1, identity.nationality, size, profile.nationality.as_str());
        plan.text(
            1,
            identity.address,
            size,
            format!("{} {}", profile.address, profile.zipcode),
        );
        plan.text(
            1,
            identity.town_country,
            size,
            format!("{}, {}", profile.town, profile.country),
        );

        match layout.checkbox_rule(category) {
            Some(CheckboxRule::PerReason { marks }) => {
                for mark in marks.iter().filter(|mark| reasons.contains(mark.reason)) {
                    self.mark(&mut plan, mark.at);
                }
            }
            Some(CheckboxRule::Always { at }) => self.mark(&mut plan, *at),
            // Unknown categories get no mark at all
            None => debug!(category = %category, "no checkbox block for category"),
        }

        let issued = &layout.issued;
        let town_size = match ideal_font_size(
            &profile.town,
            issued.town_max_width,
            issued.town_min_size,
            issued.town_default_size,
        ) {
            Some(fitted) => fitted,
            None => {
                warn!(town = %profile.town, "town name overflows its box at the minimum size");
                warnings.push(RenderWarning::TownTooLong {
                    town: profile.town.clone(),
                    size: issued.town_min_size,
                });
                issued.town_min_size
            }
        };
        plan.text(1, issued.town, town_size as f32, profile.town.as_str());
        plan.text(1, issued.date, size, format_issue_day(now));

        let qr = &layout.qr;
        plan.append_page();
        plan.add(DrawOp::QrCode {
            page: 1,
            placement: QrPlacement::Fixed(qr.first_page),
        });
        plan.add(DrawOp::QrCode {
            page: 2,
            placement: QrPlacement::FromTop {
                x: qr.second_page.x,
                top_offset: qr.second_page.top_offset,
                size: qr.second_page.size,
            },
        });

        for op in plan.ops() {
            if let DrawOp::Text { text, .. } = op {
                let chars = unencodable_chars(text);
                if !chars.is_empty() {
                    warn!(text = %text, "text has characters outside WinAnsi");
                    warnings.push(RenderWarning::UnencodableText {
                        text: text.clone(),
                        chars,
                    });
                }
            }
        }

        LayoutOutcome {
            plan,
            summary: build_summary(profile, category, reasons, now),
            town_size,
            warnings,
        }
    }

    fn mark(&self, plan: &mut OverlayPlan, at: Point) {
        plan.add(DrawOp::Mark {
            page: 1,
            at,
            size: self.layout.mark.size,
            glyph: self.layout.mark.glyph.clone(),
        });
    }

    /// Render the attestation onto `template`.
    ///
    /// Template parsing, QR encoding and serialization failures abort the
    /// render; an overlong town name only adds a warning.
    pub fn render(
        &self,
        template: &[u8],
        profile: &Profile,
        category: &Category,
        reasons: &ReasonSet,
        now: &NaiveDateTime,
    ) -> Result<RenderedDocument, AttestationError> {
        let outcome = self.plan(profile, category, reasons, now);
        let qr = qr::encode(&outcome.summary)?;

        let mut doc = Document::load_mem(template)
            .map_err(|e| AttestationError::TemplateParse(e.to_string()))?;
        apply_overlay(&mut doc, &outcome.plan, &qr)?;

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| AttestationError::SerializationError(e.to_string()))?;

        let file_name = output_file_name(now);
        info!(
            file_name = %file_name,
            size = bytes.len(),
            marks = outcome.plan.marks().len(),
            layout = %self.layout.version,
            "rendered attestation"
        );

        Ok(RenderedDocument {
            bytes,
            media_type: PDF_MEDIA_TYPE,
            file_name,
            warnings: outcome.warnings,
        })
    }
}
