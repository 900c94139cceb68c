use std::cell::RefCell;
use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use metabolite_integrator::app::{App, IntegrateRequest, ProgressEvent, ProgressSink};
use metabolite_integrator::domain::Field;
use metabolite_integrator::error::IntegrateError;
use metabolite_integrator::table::read_compound_table;

#[derive(Default)]
struct CollectingSink {
    messages: RefCell<Vec<String>>,
}

impl ProgressSink for CollectingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.borrow_mut().push(event.message);
    }
}

fn temp_prefix(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("DATABASE")).unwrap()
}

#[test]
fn integrates_fixture_sources() {
    let dir = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from("tests/fixtures/sources"),
        output_prefix: temp_prefix(&dir),
        key: Field::InchiKey,
    };
    let sink = CollectingSink::default();

    let result = App::integrate(&request, &sink).unwrap();

    assert_eq!(result.key, "InChIKey");
    assert_eq!(result.files, 3);
    assert_eq!(result.records, 7);
    assert_eq!(result.discarded, 1);
    assert_eq!(result.entities, 3);
    assert_eq!(result.merged_groups, 2);
    assert_eq!(result.ambiguous_fields, 1);
    assert_eq!(result.nonstandard_inchikeys, 0);

    let written = fs::read_to_string(&result.output_path).unwrap();
    let expected = "InChIKey\tName\tHMDB\tLMID\tKegg\tCHEBI\tPC_compound\n\
        BSYNRYMUTXBXSQ-UHFFFAOYSA-N\t\t\t\tC01405\t\t2244\n\
        IPCSVZSSVZVIGE-UHFFFAOYSA-N\tPalmitic acid\tHMDB0000220\tLMFA01010001\tC00249\t15756\t985\n\
        WQZGKKKJIJFFOK-GASJEMHNSA-N\tGlucose\tHMDB0000122||HMDB0006564\t\tC00031||C00267\t4167\t5793\n";
    assert_eq!(written, expected);

    let messages = sink.messages.borrow();
    assert!(messages.iter().any(|m| m.contains("found 3 information files")));
    assert!(messages.iter().any(|m| m.starts_with("phase=Write")));
}

#[test]
fn integrated_output_reads_back_as_records() {
    let dir = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from("tests/fixtures/sources"),
        output_prefix: temp_prefix(&dir),
        key: Field::InchiKey,
    };
    let result = App::integrate(&request, &CollectingSink::default()).unwrap();

    let records = read_compound_table(std::path::Path::new(&result.output_path)).unwrap();
    assert_eq!(records.len(), 3);
    let glucose = records
        .iter()
        .find(|record| record.get(&Field::Name).and_then(|v| v.as_scalar()) == Some("Glucose"))
        .unwrap();
    assert!(glucose.get(&Field::Hmdb).unwrap().is_set());
    assert!(glucose.get(&Field::Lmid).is_none());
}

#[test]
fn integrates_by_alternative_key() {
    let dir = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from("tests/fixtures/sources"),
        output_prefix: temp_prefix(&dir),
        key: Field::Hmdb,
    };
    let result = App::integrate(&request, &CollectingSink::default()).unwrap();

    // Two KEGG rows carry no HMDB accession; the multi-valued glucose row
    // joins both HMDB0000122 and HMDB0006564.
    assert_eq!(result.discarded, 2);
    assert_eq!(result.entities, 4);
}

#[test]
fn missing_input_folder_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from("tests/fixtures/does-not-exist"),
        output_prefix: temp_prefix(&dir),
        key: Field::InchiKey,
    };
    let err = App::integrate(&request, &CollectingSink::default()).unwrap_err();
    assert_matches!(err, IntegrateError::MissingInput(_));
}

#[test]
fn malformed_row_aborts_the_run() {
    let input = tempfile::tempdir().unwrap();
    fs::write(
        input.path().join("broken.txt"),
        "InChIKey\tName\nWQZGKKKJIJFFOK-GASJEMHNSA-N\tGlucose\tstray\n",
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from_path_buf(input.path().to_path_buf()).unwrap(),
        output_prefix: temp_prefix(&out),
        key: Field::InchiKey,
    };
    let err = App::integrate(&request, &CollectingSink::default()).unwrap_err();
    assert_matches!(err, IntegrateError::MalformedRow { line: 2, .. });
    assert!(!out.path().join("DATABASE.txt").exists());
}

#[test]
fn gzip_sources_are_integrated() {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    let input = tempfile::tempdir().unwrap();
    let mut encoder = GzEncoder::new(
        fs::File::create(input.path().join("kegg.txt.gz")).unwrap(),
        Compression::default(),
    );
    encoder
        .write_all(b"InChIKey\tKegg\nWQZGKKKJIJFFOK-GASJEMHNSA-N\tC00031\n")
        .unwrap();
    encoder.finish().unwrap();
    fs::write(
        input.path().join("hmdb.txt"),
        "InChIKey\tHMDB\nWQZGKKKJIJFFOK-GASJEMHNSA-N\tHMDB0000122\n",
    )
    .unwrap();

    let out = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from_path_buf(input.path().to_path_buf()).unwrap(),
        output_prefix: temp_prefix(&out),
        key: Field::InchiKey,
    };
    let result = App::integrate(&request, &CollectingSink::default()).unwrap();

    assert_eq!(result.files, 2);
    assert_eq!(result.entities, 1);
    assert_eq!(result.merged_groups, 1);
    let written = fs::read_to_string(&result.output_path).unwrap();
    assert!(written.contains("WQZGKKKJIJFFOK-GASJEMHNSA-N\t\tHMDB0000122\t\tC00031\t\t\n"));
}

#[test]
fn nonstandard_inchikeys_are_kept_and_counted() {
    let input = tempfile::tempdir().unwrap();
    fs::write(
        input.path().join("mixed.txt"),
        "InChIKey\tName\n\
         WQZGKKKJIJFFOK-GASJEMHNSA-N\tD-Glucose\n\
         InChIKey=wqzgkkkjijffok\tbroken glucose\n",
    )
    .unwrap();

    let out = tempfile::tempdir().unwrap();
    let request = IntegrateRequest {
        input: Utf8PathBuf::from_path_buf(input.path().to_path_buf()).unwrap(),
        output_prefix: temp_prefix(&out),
        key: Field::InchiKey,
    };
    let result = App::integrate(&request, &CollectingSink::default()).unwrap();

    assert_eq!(result.entities, 2);
    assert_eq!(result.nonstandard_inchikeys, 1);
    let written = fs::read_to_string(&result.output_path).unwrap();
    assert!(written.contains("InChIKey=wqzgkkkjijffok\tbroken glucose\t"));
}
