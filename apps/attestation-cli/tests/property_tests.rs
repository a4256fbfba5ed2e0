//! Property-based tests for the CLI's config layering and profile flags

use std::collections::HashMap;
use std::path::PathBuf;

use attestation_cli::config::{ENV_LAYOUT, ENV_OUTPUT_DIR, ENV_STORE, ENV_TEMPLATE};
use attestation_cli::{CliConfig, ProfileArgs};
use attestation_core::Profile;
use proptest::prelude::*;

// ============================================================
// Strategies
// ============================================================

fn path_value() -> impl Strategy<Value = String> {
    "/[a-z]{1,8}(/[a-z0-9_.-]{1,12}){0,3}"
}

fn blank() -> impl Strategy<Value = String> {
    "[ \t]{0,3}"
}

fn maybe_field() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[A-Za-z0-9 /-]{1,20}")
}

fn profile_args() -> impl Strategy<Value = ProfileArgs> {
    (
        maybe_field(),
        maybe_field(),
        maybe_field(),
        maybe_field(),
        maybe_field(),
        maybe_field(),
        maybe_field(),
        maybe_field(),
    )
        .prop_map(
            |(firstname, lastname, birthday, nationality, address, zipcode, town, country)| {
                ProfileArgs {
                    firstname,
                    lastname,
                    birthday,
                    nationality,
                    address,
                    zipcode,
                    town,
                    country,
                }
            },
        )
}

fn stored_profile() -> Profile {
    Profile {
        firstname: "Stored".into(),
        lastname: "Person".into(),
        birthday: "01/01/1970".into(),
        nationality: "Irish".into(),
        address: "1 rue Haute".into(),
        zipcode: "67000".into(),
        town: "Strasbourg".into(),
        country: "France".into(),
    }
}

fn lookup(pairs: Vec<(&'static str, String)>) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<&'static str, String> = pairs.into_iter().collect();
    move |key| map.get(key).cloned()
}

proptest! {
    // ============================================================
    // Profile flags
    // ============================================================

    #[test]
    fn flags_override_only_the_fields_they_set(args in profile_args()) {
        let before = stored_profile();
        let mut after = before.clone();
        args.apply(&mut after);

        let pairs = [
            (&args.firstname, &before.firstname, &after.firstname),
            (&args.lastname, &before.lastname, &after.lastname),
            (&args.birthday, &before.birthday, &after.birthday),
            (&args.nationality, &before.nationality, &after.nationality),
            (&args.address, &before.address, &after.address),
            (&args.zipcode, &before.zipcode, &after.zipcode),
            (&args.town, &before.town, &after.town),
            (&args.country, &before.country, &after.country),
        ];
        for (flag, old, new) in pairs {
            match flag {
                Some(value) => prop_assert_eq!(new, value),
                None => prop_assert_eq!(new, old),
            }
        }
    }

    // ============================================================
    // Config layering
    // ============================================================

    #[test]
    fn set_env_values_are_taken_verbatim(
        template in path_value(),
        output in path_value(),
        store in path_value(),
        layout in path_value(),
    ) {
        let config = CliConfig::from_lookup(lookup(vec![
            (ENV_TEMPLATE, template.clone()),
            (ENV_OUTPUT_DIR, output.clone()),
            (ENV_STORE, store.clone()),
            (ENV_LAYOUT, layout.clone()),
        ]));
        prop_assert_eq!(config.template, Some(PathBuf::from(template)));
        prop_assert_eq!(config.output_dir, PathBuf::from(output));
        prop_assert_eq!(config.store, PathBuf::from(store));
        prop_assert_eq!(config.layout, Some(PathBuf::from(layout)));
    }

    #[test]
    fn blank_env_values_count_as_unset(value in blank()) {
        let blank_config = CliConfig::from_lookup(lookup(vec![
            (ENV_TEMPLATE, value.clone()),
            (ENV_OUTPUT_DIR, value.clone()),
            (ENV_STORE, value.clone()),
            (ENV_LAYOUT, value),
        ]));
        let unset_config = CliConfig::from_lookup(lookup(vec![]));
        prop_assert_eq!(blank_config, unset_config);
    }

    #[test]
    fn flags_win_over_env(env_dir in path_value(), flag_dir in path_value()) {
        let config = CliConfig::from_lookup(lookup(vec![(ENV_OUTPUT_DIR, env_dir)]))
            .with_overrides(None, Some(PathBuf::from(&flag_dir)), None, None);
        prop_assert_eq!(config.output_dir, PathBuf::from(flag_dir));
        prop_assert!(config.template.is_none());
    }
}
