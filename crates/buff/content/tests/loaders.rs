use std::fs;
use std::path::Path;

use buff_content::{ContentFactory, ParameterCache, RecordWriter};
use buff_core::{BuffRecord, BuffValue, Engine, KeyGrammar};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A data directory with two units and a config override.
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "config.toml", "team_count_fallback = 1.0\n");
    write(
        root,
        "sources/amber.js",
        "const boost = greaterEq(input.asc, 1, dm.passive.critRate_)\n\
         export const data = sheet({ premod: { critRate_: boost, atk: dm.skill.flat } })\n",
    );
    write(root, "params/amber.json", r#"{ "passive": { "critRate_": 0.1 }, "skill": { "flat": [10, 20, 30] } }"#);
    write(
        root,
        "sources/bennett.js",
        "const b = prod(input.base.atk, dm.burst.atkBonus)\n\
         export const data = sheet({ teamBuff: { premod: { atk: b, critRate_: sum(tally.pyro, naught) } } })\n",
    );
    write(root, "params/bennett.ron", r#"{ "burst": { "atkBonus": [0.56, 0.6] } }"#);
    write(root, "sources/notes.txt", "not a unit");
    dir
}

#[test]
fn units_are_discovered_in_order() {
    let dir = data_dir();
    let factory = ContentFactory::new(dir.path());
    assert_eq!(factory.unit_ids().unwrap(), vec!["amber", "bennett"]);
}

#[test]
fn directory_to_records() {
    init_tracing();
    let dir = data_dir();
    let factory = ContentFactory::new(dir.path());
    let config = factory.load_config().unwrap();
    assert_eq!(config.team_count_fallback, 1.0);
    let engine = Engine::new(config).unwrap();

    let mut cache = ParameterCache::new();
    let mut produced = Vec::new();
    for id in factory.unit_ids().unwrap() {
        let unit = factory.load_unit(&mut cache, &id).unwrap();
        let records = engine.translate_unit(&unit);
        factory.write_records(&id, &records).unwrap();
        produced.push((id, records));
    }

    let (_, amber) = &produced[0];
    assert_eq!(amber.len(), 1);
    assert_eq!(
        amber[0].get("critRate"),
        Some(&BuffValue::Formula("(ascension >= 1 ? 0.1 : 0) * 100".into()))
    );
    assert_eq!(amber[0].get("atk"), Some(&BuffValue::Number(30.0)));

    let (_, bennett) = &produced[1];
    assert_eq!(bennett.len(), 1);
    assert_eq!(bennett[0].title(), "bennett (team)");
    assert_eq!(
        bennett[0].get("atk"),
        Some(&BuffValue::Formula("baseAtk * 0.6".into()))
    );
    assert_eq!(bennett[0].get("critRate"), Some(&BuffValue::Number(100.0)));

    for (id, records) in &produced {
        assert_eq!(&factory.load_records(id).unwrap(), records);
    }
}

#[test]
fn parameter_tables_are_cached_per_path() {
    let dir = data_dir();
    let factory = ContentFactory::new(dir.path());
    let mut cache = ParameterCache::new();

    factory.load_unit(&mut cache, "amber").unwrap();
    // Later edits are not seen until the entry is invalidated.
    write(dir.path(), "params/amber.json", r#"{ "skill": { "flat": 99 } }"#);
    let cached = factory.load_params(&mut cache, "amber").unwrap();
    assert_eq!(buff_core::resolve("skill.flat", &cached), Some(30.0));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    let path = factory.params_path("amber").unwrap();
    assert!(cache.invalidate(&path));
    let fresh = factory.load_params(&mut cache, "amber").unwrap();
    assert_eq!(buff_core::resolve("skill.flat", &fresh), Some(99.0));
}

#[test]
fn stored_records_can_be_repaired() {
    let dir = data_dir();
    let factory = ContentFactory::new(dir.path());
    let engine = Engine::new(factory.load_config().unwrap()).unwrap();

    let grammar = KeyGrammar::standard();
    let mut record = BuffRecord::new("Legacy");
    record
        .insert("dmg", BuffValue::Formula("talent.skill.dmgBonus_ * 100".into()), &grammar)
        .unwrap();
    factory.write_records("legacy", &[record]).unwrap();

    let repaired: Vec<_> = factory
        .load_records("legacy")
        .unwrap()
        .iter()
        .map(|record| engine.repairs().repair_record(record))
        .collect();
    assert_eq!(
        repaired[0].get("dmg"),
        Some(&BuffValue::Formula("talent.skill.dmgBonus_".into()))
    );
    let text = RecordWriter::to_string(&repaired).unwrap();
    assert!(text.contains("\"talent.skill.dmgBonus_\""));
}

#[test]
fn load_errors_carry_context() {
    let dir = data_dir();
    write(dir.path(), "config.toml", "max_depth = 0\n");
    write(dir.path(), "sources/empty.js", "   \n");
    let factory = ContentFactory::new(dir.path());

    let err = factory.load_config().unwrap_err();
    assert!(err.to_string().contains("config.toml"), "{err}");

    let err = factory.load_source("empty").unwrap_err();
    assert!(err.to_string().contains("empty.js"), "{err}");

    let mut cache = ParameterCache::new();
    let err = factory.load_unit(&mut cache, "missing").unwrap_err();
    assert!(err.to_string().contains("missing"), "{err}");
}
