//! End-to-end attestation generation
//!
//! Follows the submit sequence of the form: persist the inputs, read the
//! profile back from the store, render, then wipe the store once the
//! document exists. A [`GenerationGuard`] turns a second submission made
//! while one is in flight into [`AttestationError::Busy`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::AttestationError;
use crate::profile::{Category, FormSubmission, Profile, ReasonSet};
use crate::render::{RenderedDocument, Renderer};
use crate::store::{KeyValueStore, ProfileStore};
use crate::validation::validate_selection;

/// Single-flight guard for generation requests
#[derive(Debug, Default)]
pub struct GenerationGuard {
    busy: AtomicBool,
    next_token: AtomicU64,
}

/// Held for the duration of one generation; releases the guard on drop
#[derive(Debug)]
pub struct GenerationTicket<'a> {
    guard: &'a GenerationGuard,
    token: u64,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Result<GenerationTicket<'_>, AttestationError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AttestationError::Busy);
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(GenerationTicket { guard: self, token })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl GenerationTicket<'_> {
    /// Token of this generation, strictly increasing across tickets
    pub fn token(&self) -> u64 {
        self.token
    }
}

impl Drop for GenerationTicket<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

/// What the user asked for
#[derive(Debug, Clone)]
pub struct AttestationRequest {
    pub profile: Profile,
    pub category: Category,
    pub reasons: ReasonSet,
}

impl TryFrom<&FormSubmission> for AttestationRequest {
    type Error = AttestationError;

    fn try_from(form: &FormSubmission) -> Result<Self, Self::Error> {
        Ok(Self {
            profile: form.profile(),
            category: form.category(),
            reasons: form.reasons()?,
        })
    }
}

/// Renderer plus template, guarded against overlapping submissions
#[derive(Debug)]
pub struct Generator {
    renderer: Renderer,
    template: Vec<u8>,
    guard: GenerationGuard,
}

impl Generator {
    pub fn new(renderer: Renderer, template: Vec<u8>) -> Self {
        Self {
            renderer,
            template,
            guard: GenerationGuard::new(),
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Persist, reload, render and clear.
    ///
    /// The store is only cleared when rendering succeeds, so a failed run
    /// leaves the inputs in place for a retry.
    pub fn generate<S: KeyValueStore>(
        &self,
        store: &mut ProfileStore<S>,
        request: &AttestationRequest,
        now: &NaiveDateTime,
    ) -> Result<RenderedDocument, AttestationError> {
        let ticket = self.guard.try_begin()?;
        validate_selection(&request.category, &request.reasons)?;

        store.save(&request.profile)?;
        store.save_selection(&request.category, &request.reasons)?;

        let profile = store.load()?;
        let (_, reasons) = store.load_selection()?;
        let document = self
            .renderer
            .render(&self.template, &profile, &request.category, &reasons, now)?;
        store.clear()?;

        for warning in &document.warnings {
            warn!(token = ticket.token(), "{}", warning.message());
        }
        info!(
            token = ticket.token(),
            file_name = %document.file_name,
            "attestation generated"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_guard_rejects_overlap_and_releases_on_drop() {
        let guard = GenerationGuard::new();
        let first = guard.try_begin().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.try_begin(), Err(AttestationError::Busy)));
        let first_token = first.token();
        drop(first);

        assert!(!guard.is_busy());
        let second = guard.try_begin().unwrap();
        assert!(second.token() > first_token);
    }

    #[test]
    fn test_failed_render_keeps_store_contents() {
        let generator = Generator::new(Renderer::default(), b"broken".to_vec());
        let mut store = ProfileStore::new(MemoryStore::new());
        let request = AttestationRequest {
            profile: Profile {
                firstname: "Ines".into(),
                ..Profile::default()
            },
            category: Category::National,
            reasons: ReasonSet::new(),
        };
        let now = chrono::NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        let result = generator.generate(&mut store, &request, &now);
        assert!(matches!(result, Err(AttestationError::TemplateParse(_))));
        assert_eq!(store.load().unwrap().firstname, "Ines");
        assert!(!generator.is_busy());
    }

    #[test]
    fn test_qr_overflow_fails_generation_and_keeps_store() {
        let generator = Generator::new(Renderer::default(), b"broken".to_vec());
        let mut store = ProfileStore::new(MemoryStore::new());
        let address = "Résidence des Glycines, bâtiment B ".repeat(90);
        let request = AttestationRequest {
            profile: Profile {
                firstname: "Ines".into(),
                address: address.clone(),
                ..Profile::default()
            },
            category: Category::National,
            reasons: ReasonSet::new(),
        };
        let now = chrono::NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        let result = generator.generate(&mut store, &request, &now);
        assert!(matches!(result, Err(AttestationError::QrEncode(_))));
        assert_eq!(store.load().unwrap().address, address);
        assert!(!generator.is_busy());
    }

    #[test]
    fn test_missing_reason_is_rejected_before_saving() {
        let generator = Generator::new(Renderer::default(), Vec::new());
        let mut store = ProfileStore::new(MemoryStore::new());
        let request = AttestationRequest {
            profile: Profile::default(),
            category: Category::ForeignNational,
            reasons: ReasonSet::new(),
        };
        let now = chrono::NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        assert!(matches!(
            generator.generate(&mut store, &request, &now),
            Err(AttestationError::Validation(_))
        ));
        assert!(store.load_fields().unwrap().is_empty());
    }
}
