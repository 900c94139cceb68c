use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use metabolite_integrator::config::ConfigLoader;
use metabolite_integrator::domain::{Field, SynonymSource};
use metabolite_integrator::error::IntegrateError;

#[test]
fn resolves_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metab-int.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "key": "HMDB",
            "input": "sources",
            "output_prefix": "out/DB",
            "synonyms": { "pc_compound": "pc.synonyms", "hmdb": "hmdb.synonyms" }
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.key, Field::Hmdb);
    assert_eq!(resolved.input, Some(Utf8PathBuf::from("sources")));
    assert_eq!(resolved.output_prefix, Utf8PathBuf::from("out/DB"));
    assert_eq!(
        resolved.synonyms,
        vec![
            (SynonymSource::Hmdb, Utf8PathBuf::from("hmdb.synonyms")),
            (SynonymSource::PcCompound, Utf8PathBuf::from("pc.synonyms")),
        ]
    );
}

#[test]
fn explicit_missing_file_is_a_read_error() {
    let err = ConfigLoader::resolve(Some("tests/fixtures/nope.json")).unwrap_err();
    assert_matches!(err, IntegrateError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metab-int.json");
    fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IntegrateError::ConfigParse(_));
}

#[test]
fn unknown_key_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metab-int.json");
    fs::write(&path, r#"{ "key": "SMILES" }"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IntegrateError::MissingKey(_));
}
