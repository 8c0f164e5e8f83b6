//! Integration tests for the pipeline.
//!
//! These tests run the raw tables through the whole dataset construction
//! in a realistic scenario.

use data_loader::parser::{read_interactions, read_items, read_users};
use data_loader::{DataLoadError, RawInteractionRecord, RawItemRecord, RawUserRecord};
use pipeline::{DatasetBuilder, FeatureEncoder, FeatureName, UNKNOWN_AGE};

const USERS: &str = "chb;age;gender;chit_type\n\
                     100;30;м;1\n\
                     200;;ж;нет данных\n\
                     300;58;не указан;2\n\
                     400;19;ж;1\n";

const ITEMS: &str = "sys_numb;author;bbk;izd;title;year_izd\n\
                     A;Пушкин;84;Эксмо;Повести Белкина;2010\n\
                     B;Гоголь;84;АСТ;Мёртвые души;2012\n\
                     C;Чехов;84;АСТ;Рассказы;2015\n";

const INTERACTIONS: &str = "chb;sys_numb;date_1;is_printed;is_real;source;type\n\
                            100;A;15.01.2021;1;1;desk;loan\n\
                            100;B;16.01.2021;1;1;desk;loan\n\
                            200;A;2021-01-17;0;1;web;loan\n\
                            300;C;18/01/2021;1;0;desk;reading_room\n";

fn create_test_setup() -> (Vec<RawUserRecord>, Vec<RawItemRecord>, Vec<RawInteractionRecord>) {
    (
        read_users(USERS.as_bytes(), "users.csv").unwrap(),
        read_items(ITEMS.as_bytes(), "items.csv").unwrap(),
        read_interactions(INTERACTIONS.as_bytes(), "train_transactions_extended.csv").unwrap(),
    )
}

#[test]
fn test_full_pipeline_builds_dataset() {
    let (users, items, interactions) = create_test_setup();

    let dataset = DatasetBuilder::new()
        .build(&users, &items, &interactions)
        .unwrap();

    // 400 never borrowed anything, so it is not part of the user universe
    assert_eq!(dataset.user_ids(), &["100", "200", "300"]);
    assert_eq!(dataset.n_items(), 3);
    assert_eq!(dataset.interactions().len(), 4);

    let table = dataset.user_features();
    let id = |external: &str| dataset.user_id_map().to_internal(external).unwrap();

    assert_eq!(table.value(id("100"), FeatureName::Gender), Some("м"));
    assert_eq!(table.value(id("200"), FeatureName::AgeBucket), Some(UNKNOWN_AGE));
    assert_eq!(table.value(id("200"), FeatureName::MembershipType), None);
    // 58 falls in the gap between buckets
    assert_eq!(table.value(id("300"), FeatureName::AgeBucket), Some(UNKNOWN_AGE));
    assert_eq!(table.value(id("300"), FeatureName::Gender), None);
    assert_eq!(table.value(id("300"), FeatureName::MembershipType), Some("2"));
}

#[test]
fn test_user_without_interactions_has_no_features() {
    let (users, items, interactions) = create_test_setup();
    let dataset = DatasetBuilder::new()
        .build(&users, &items, &interactions)
        .unwrap();

    assert_eq!(dataset.user_id_map().to_internal("400"), None);
    // 100: gender, age, membership; 200: gender, age; 300: age, membership
    assert_eq!(dataset.user_features().len(), 7);
}

#[test]
fn test_custom_encoder_and_axes() {
    let (users, items, interactions) = create_test_setup();
    let dataset = DatasetBuilder::new()
        .with_encoder(FeatureEncoder::new().with_unusable_values(["м"]))
        .with_categorical_axes(&[FeatureName::AgeBucket])
        .build(&users, &items, &interactions)
        .unwrap();

    let table = dataset.user_features();
    let u100 = dataset.user_id_map().to_internal("100").unwrap();

    assert_eq!(table.value(u100, FeatureName::Gender), None);
    assert!(table.columns().iter().all(|c| c.feature == FeatureName::AgeBucket));
    // "нет данных" is no longer a sentinel, so 200 keeps it as a plain value
    let u200 = dataset.user_id_map().to_internal("200").unwrap();
    assert_eq!(table.value(u200, FeatureName::MembershipType), Some("нет данных"));
}

#[test]
fn test_malformed_date_reports_file_line() {
    let (users, items, _) = create_test_setup();
    let broken = "chb;sys_numb;date_1\n100;A;15.01.2021\n100;B;someday\n";
    let interactions = read_interactions(broken.as_bytes(), "tx.csv").unwrap();

    let result = DatasetBuilder::new().build(&users, &items, &interactions);
    match result {
        Err(DataLoadError::InvalidDate { value, line }) => {
            assert_eq!(value, "someday");
            assert_eq!(line, 3);
        }
        other => panic!("expected InvalidDate, got {:?}", other.map(|d| d.n_users())),
    }
}
