use locmerge::formats::FormatType;
use locmerge::{
    Catalog, EntryState, Fragment, Localization, ParseOptions, Plural, PluralCategory, Source,
    StringValue,
};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("valid key regex")
}

/// Quotes, backslashes, markup characters, specifiers and control characters
/// that every format has to escape. `/`, `*` and `;` are left out because
/// `.strings` comment stripping is layout dependent.
fn value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 _\\-\\.,!\\?\"'\\\\<>&%@#=:\\n\\téü日]{1,30}")
        .expect("valid value regex")
}

fn plural_strategy() -> impl Strategy<Value = Plural> {
    (
        prop::collection::btree_map(
            prop::sample::select(vec![
                PluralCategory::Zero,
                PluralCategory::One,
                PluralCategory::Two,
                PluralCategory::Few,
                PluralCategory::Many,
            ]),
            value_strategy(),
            0..4,
        ),
        value_strategy(),
    )
        .prop_map(|(mut forms, other)| {
            forms.insert(PluralCategory::Other, other);
            Plural::new(forms).expect("other is always present")
        })
}

fn string_value_strategy() -> impl Strategy<Value = StringValue> {
    prop_oneof![
        3 => value_strategy().prop_map(StringValue::Simple),
        1 => plural_strategy().prop_map(StringValue::Plural),
    ]
}

fn fragment_strategy() -> impl Strategy<Value = Fragment> {
    prop::collection::btree_map(key_strategy(), string_value_strategy(), 1..8)
}

fn file_name(format: FormatType) -> String {
    match format {
        FormatType::AndroidStrings => "values-en/strings.xml".to_string(),
        other => format!("en.lproj/Localizable.{}", other.extension()),
    }
}

fn representable(format: FormatType, fragment: &Fragment) -> Fragment {
    fragment
        .iter()
        .filter(|(_, value)| match format {
            FormatType::Strings | FormatType::Properties | FormatType::Csv => !value.is_plural(),
            FormatType::Stringsdict => value.is_plural(),
            _ => true,
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn reparse(format: FormatType, catalog: &Catalog) -> Result<Catalog, TestCaseError> {
    let text = catalog
        .export(format, "en")
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let parsed = Source::new(file_name(format), text)
        .parse(&ParseOptions::new())
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert!(parsed.dropped.is_empty());
    Ok(parsed.catalog)
}

const ALL_FORMATS: [FormatType; 7] = [
    FormatType::Strings,
    FormatType::Stringsdict,
    FormatType::Xcstrings,
    FormatType::AndroidStrings,
    FormatType::Json,
    FormatType::Properties,
    FormatType::Csv,
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_format_round_trips_its_language_slice(fragment in fragment_strategy()) {
        let seed = Catalog::from_fragment("en", fragment.clone());

        for format in ALL_FORMATS {
            let first = reparse(format, &seed)?;
            prop_assert_eq!(
                first.language_slice("en"),
                representable(format, &fragment),
                "first pass through {}", format
            );

            let second = reparse(format, &first)?;
            prop_assert_eq!(
                second.language_slice("en"),
                first.language_slice("en"),
                "second pass through {}", format
            );
        }
    }

    #[test]
    fn xcstrings_round_trip_keeps_every_language_and_state(
        values in prop::collection::btree_map(key_strategy(), (value_strategy(), value_strategy()), 1..8)
    ) {
        let mut seed = Catalog::new("en");
        for (key, (en, fr)) in &values {
            seed.insert(key.clone(), "en", Localization::new(StringValue::Simple(en.clone()), EntryState::Translated));
            seed.insert(key.clone(), "fr", Localization::new(StringValue::Simple(fr.clone()), EntryState::NeedsReview));
        }

        for entry in seed.entries.values_mut() {
            entry.extraction_state = Some("manual".to_string());
        }

        let first = reparse(FormatType::Xcstrings, &seed)?;
        prop_assert_eq!(&first, &seed);

        let second = reparse(FormatType::Xcstrings, &first)?;
        prop_assert_eq!(second, first);
    }

    #[test]
    fn parsed_plurals_always_have_other(fragment in fragment_strategy()) {
        let seed = Catalog::from_fragment("en", fragment);
        for format in ALL_FORMATS {
            let parsed = reparse(format, &seed)?;
            for entry in parsed.entries.values() {
                for localization in entry.localizations.values() {
                    if let StringValue::Plural(plural) = &localization.value {
                        prop_assert!(!plural.other().is_empty());
                    }
                }
            }
        }
    }
}
