//! Command implementations, kept free of argument parsing so they can be
//! driven from tests

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use attestation_core::qr;
use attestation_core::validation::validate_profile;
use attestation_core::{
    build_summary, AttestationRequest, Category, FileStore, FormSubmission, Generator, Profile,
    ProfileStore, ReasonSet, Renderer, TemplateLayout,
};
use chrono::NaiveDateTime;
use clap::Args;

use crate::config::CliConfig;
use crate::delivery::deliver;

/// Profile fields given on the command line. Unset fields keep the
/// stored value.
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub firstname: Option<String>,
    #[arg(long)]
    pub lastname: Option<String>,
    /// Birth date as DD/MM/YYYY
    #[arg(long)]
    pub birthday: Option<String>,
    #[arg(long)]
    pub nationality: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub zipcode: Option<String>,
    #[arg(long)]
    pub town: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
}

impl ProfileArgs {
    pub fn apply(&self, profile: &mut Profile) {
        let slots = [
            (&self.firstname, &mut profile.firstname),
            (&self.lastname, &mut profile.lastname),
            (&self.birthday, &mut profile.birthday),
            (&self.nationality, &mut profile.nationality),
            (&self.address, &mut profile.address),
            (&self.zipcode, &mut profile.zipcode),
            (&self.town, &mut profile.town),
            (&self.country, &mut profile.country),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    }
}

/// Everything `generate` needs besides configuration
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// JSON form submission; replaces stored values and profile flags
    pub form: Option<PathBuf>,
    pub profile: ProfileArgs,
    /// Category code (`tiers`, `eu`, `fr`)
    pub category: Option<String>,
    /// Reason codes
    pub reasons: Vec<String>,
    /// Also write the QR code as a PNG here
    pub save_qr: Option<PathBuf>,
}

/// Result of a successful `generate`
#[derive(Debug, Clone)]
pub struct Generated {
    pub path: PathBuf,
    pub warnings: Vec<String>,
}

pub fn load_layout(config: &CliConfig) -> Result<TemplateLayout> {
    match &config.layout {
        Some(path) => TemplateLayout::from_file(path)
            .with_context(|| format!("Failed to load layout {}", path.display())),
        None => Ok(TemplateLayout::builtin()),
    }
}

fn open_store(config: &CliConfig) -> ProfileStore<FileStore> {
    ProfileStore::new(FileStore::new(&config.store))
}

/// Build the request from a form file, or from the stored profile with
/// command line overrides
fn build_request(
    store: &ProfileStore<FileStore>,
    options: &GenerateOptions,
) -> Result<AttestationRequest> {
    if let Some(path) = &options.form {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form {}", path.display()))?;
        let form: FormSubmission = serde_json::from_str(&json)
            .with_context(|| format!("Invalid form submission in {}", path.display()))?;
        return Ok(AttestationRequest::try_from(&form)?);
    }

    let mut profile = store.load()?;
    options.profile.apply(&mut profile);

    let (stored_category, stored_reasons) = store.load_selection()?;
    let category = match &options.category {
        Some(code) => Category::from(code.as_str()),
        None => stored_category
            .context("No category given: pass --category tiers|eu|fr")?,
    };
    let reasons = if options.reasons.is_empty() {
        stored_reasons
    } else {
        ReasonSet::from_codes(&options.reasons)?
    };

    Ok(AttestationRequest {
        profile,
        category,
        reasons,
    })
}

pub fn generate(
    config: &CliConfig,
    options: &GenerateOptions,
    now: &NaiveDateTime,
) -> Result<Generated> {
    let template_path = config.template_path()?;
    let template = fs::read(template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;
    let generator = Generator::new(Renderer::new(load_layout(config)?), template);

    let mut store = open_store(config);
    let request = build_request(&store, options)?;
    validate_profile(&request.profile)?;

    let document = generator.generate(&mut store, &request, now)?;
    let path = deliver(&config.output_dir, &document)?;

    if let Some(qr_path) = &options.save_qr {
        save_qr_png(qr_path, &request, now)?;
    }

    Ok(Generated {
        path,
        warnings: document
            .warnings
            .iter()
            .map(|w| w.message().to_string())
            .collect(),
    })
}

fn save_qr_png(path: &Path, request: &AttestationRequest, now: &NaiveDateTime) -> Result<()> {
    let summary = build_summary(&request.profile, &request.category, &request.reasons, now);
    let png = qr::encode(&summary)?.to_png()?;
    fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Store profile fields and, when given, the category and reasons
pub fn save_profile(
    config: &CliConfig,
    profile_args: &ProfileArgs,
    category: Option<&str>,
    reasons: &[String],
) -> Result<Profile> {
    let mut store = open_store(config);
    let mut profile = store.load()?;
    profile_args.apply(&mut profile);
    store.save(&profile)?;

    if let Some(code) = category {
        store.save_selection(&Category::from(code), &ReasonSet::from_codes(reasons)?)?;
    } else if !reasons.is_empty() {
        store.save_reasons(&ReasonSet::from_codes(reasons)?)?;
    }
    Ok(profile)
}

/// Stored entries as pretty JSON
pub fn show_profile(config: &CliConfig) -> Result<String> {
    let fields = open_store(config).load_fields()?;
    Ok(serde_json::to_string_pretty(&fields)?)
}

pub fn clear_profile(config: &CliConfig) -> Result<()> {
    open_store(config).clear()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_args_only_override_set_fields() {
        let mut profile = Profile {
            firstname: "Jeanne".into(),
            town: "Rouen".into(),
            ..Profile::default()
        };
        let args = ProfileArgs {
            town: Some("Caen".into()),
            ..ProfileArgs::default()
        };
        args.apply(&mut profile);
        assert_eq!(profile.firstname, "Jeanne");
        assert_eq!(profile.town, "Caen");
    }

    #[test]
    fn test_request_needs_a_category() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(FileStore::new(tmp.path().join("store.json")));
        let err = build_request(&store, &GenerateOptions::default()).unwrap_err();
        assert!(err.to_string().contains("--category"));
    }
}
