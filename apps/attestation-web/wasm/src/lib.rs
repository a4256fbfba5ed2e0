//! WASM bindings for the travel attestation form
//!
//! The page keeps only DOM wiring in JavaScript; the profile store, the
//! rendering and the download all happen here.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { AttestationApp, formatBirthdayInput } from './pkg/attestation_wasm.js';
//!
//! await init();
//!
//! const template = new Uint8Array(await (await fetch('certificate-en.pdf')).arrayBuffer());
//! const app = new AttestationApp(template);
//! prefill(app.savedFields());
//!
//! button.onclick = () => app.generate({
//!   fields: { 'field-firstname': 'Jean', ... },
//!   typeNationality: 'tiers',
//!   reasons: ['transit'],
//! });
//! ```

pub mod download;
pub mod storage;

use attestation_core::validation;
use attestation_core::{
    build_summary, qr, AttestationRequest, Category, FormSubmission, Generator, ProfileStore,
    ReasonSet, Renderer, TemplateLayout,
};
use chrono::{NaiveDate, NaiveDateTime};
use wasm_bindgen::prelude::*;

pub use storage::LocalStorageStore;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Build a local timestamp from calendar parts; `month` is 1-based
pub fn date_time_from_parts(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Current local time as seen by the browser
fn local_now() -> Result<NaiveDateTime, JsValue> {
    let now = js_sys::Date::new_0();
    date_time_from_parts(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
        now.get_hours(),
        now.get_minutes(),
        now.get_seconds(),
    )
    .ok_or_else(|| JsValue::from_str("Browser clock returned an invalid date"))
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        if window.alert_with_message(message).is_err() {
            web_sys::console::warn_1(&JsValue::from_str(message));
        }
    }
}

/// Attestation form state held in Rust
#[wasm_bindgen]
pub struct AttestationApp {
    generator: Generator,
    store: ProfileStore<LocalStorageStore>,
}

#[wasm_bindgen]
impl AttestationApp {
    /// Create the app around the template PDF bytes and the built-in layout
    #[wasm_bindgen(constructor)]
    pub fn new(template: Vec<u8>) -> Result<AttestationApp, JsValue> {
        Self::build(template, TemplateLayout::builtin())
    }

    /// Create the app with a layout JSON for a different template revision
    #[wasm_bindgen(js_name = withLayout)]
    pub fn with_layout(template: Vec<u8>, layout_json: &str) -> Result<AttestationApp, JsValue> {
        let layout = TemplateLayout::from_json(layout_json).map_err(to_js)?;
        Self::build(template, layout)
    }

    /// Stored entries, used to prefill the form on load
    #[wasm_bindgen(js_name = savedFields)]
    pub fn saved_fields(&self) -> Result<JsValue, JsValue> {
        let fields = self.store.load_fields().map_err(to_js)?;
        serde_wasm_bindgen::to_value(&fields)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.generator.is_busy()
    }

    /// Generate and download the attestation for a form submission.
    /// Returns the downloaded file name.
    pub fn generate(&mut self, form: JsValue) -> Result<String, JsValue> {
        let form: FormSubmission = serde_wasm_bindgen::from_value(form)
            .map_err(|e| JsValue::from_str(&format!("Invalid form: {}", e)))?;
        let request = AttestationRequest::try_from(&form).map_err(to_js)?;
        let now = local_now()?;

        let document = self
            .generator
            .generate(&mut self.store, &request, &now)
            .map_err(to_js)?;
        for warning in &document.warnings {
            alert(warning.message());
        }
        download::download(&document)?;
        Ok(document.file_name)
    }
}

impl AttestationApp {
    fn build(template: Vec<u8>, layout: TemplateLayout) -> Result<AttestationApp, JsValue> {
        Ok(AttestationApp {
            generator: Generator::new(Renderer::new(layout), template),
            store: ProfileStore::new(LocalStorageStore::open()?),
        })
    }
}

/// QR code for the summary of a form submission, as a PNG data URL
#[wasm_bindgen(js_name = qrPreview)]
pub fn qr_preview(form: JsValue) -> Result<String, JsValue> {
    let form: FormSubmission = serde_wasm_bindgen::from_value(form)
        .map_err(|e| JsValue::from_str(&format!("Invalid form: {}", e)))?;
    let category = form.category();
    let reasons = if category.is_national() {
        ReasonSet::new()
    } else {
        form.reasons().map_err(to_js)?
    };
    let summary = build_summary(&form.profile(), &category, &reasons, &local_now()?);
    qr::encode(&summary)
        .and_then(|image| image.to_data_url())
        .map_err(to_js)
}

/// Auto-slash a birth date while it is typed
#[wasm_bindgen(js_name = formatBirthdayInput)]
pub fn format_birthday_input(value: &str) -> String {
    validation::format_birthday_input(value)
}

/// Live validity of one input, for `aria-invalid`
#[wasm_bindgen(js_name = fieldIsValid)]
pub fn field_is_valid(id: &str, value: &str) -> bool {
    validation::is_field_valid(id, value)
}

/// Whether the category requires reasons to be picked
#[wasm_bindgen(js_name = needsReasons)]
pub fn needs_reasons(category: &str) -> bool {
    matches!(
        Category::from(category),
        Category::ForeignNational | Category::EuNational
    )
}
