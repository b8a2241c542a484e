use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;

use recon_ingest::{TAB, load_mapping, load_table, read_table, table_to_string, write_table};
use recon_model::{
    DuplicatePolicy, FieldRange, IdentifierRule, MappingLayout, ReconError, Table, ValueFields,
};

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn loads_and_rewrites_metadata_table() {
    let dir = TempDir::new().expect("temp dir");
    let input = write_file(
        &dir,
        "metadata.txt",
        "StudySampleId\tDisease\tRUN_CODE\nS1\tN\tNa\nS2\tCRC\tSRR9\n",
    );
    let table = load_table(&input, TAB).expect("load table");
    assert_eq!(table.columns(), ["StudySampleId", "Disease", "RUN_CODE"]);
    assert_eq!(table.height(), 2);

    let output = dir.path().join("out").with_extension("txt");
    write_table(&table, &output, TAB).expect("write table");
    let written = fs::read_to_string(&output).expect("read output");
    assert_eq!(
        written,
        "StudySampleId\tDisease\tRUN_CODE\nS1\tN\tNa\nS2\tCRC\tSRR9\n"
    );
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .expect("list dir")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn failed_write_keeps_existing_output() {
    let dir = TempDir::new().expect("temp dir");
    let output = write_file(&dir, "out.txt", "previous\n");
    let table = Table::from_rows(["id"], [["a\tb"]]).expect("table");
    let err = write_table(&table, &output, TAB).unwrap_err();
    assert!(matches!(err, ReconError::Format { .. }));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous\n");
}

#[test]
fn missing_input_is_io_error() {
    let dir = TempDir::new().expect("temp dir");
    let err = load_table(&dir.path().join("absent.txt"), TAB).unwrap_err();
    assert!(matches!(err, ReconError::Io { .. }));
}

#[test]
fn renders_comma_delimited_table() {
    let table = Table::from_rows(
        ["sampleID", "pregnant", "lactating"],
        [["MV_FEI1_t1Q14", "no", "no"], ["MV_MIM5_t2M14", "no", "yes"]],
    )
    .expect("table");
    let text = table_to_string(&table, b',').expect("render");
    insta::assert_snapshot!(text, @r"
    sampleID,pregnant,lactating
    MV_FEI1_t1Q14,no,no
    MV_MIM5_t2M14,no,yes
    ");
}

#[test]
fn loads_run_listing_with_longest_wins() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "mapping.txt",
        "P S1 SUB1 x R1 2014 ok\nP S2 SUB1 x R2 R3 2014 ok\nP S3 SUB1 x R4 2014 ok\n",
    );
    let layout = MappingLayout::new(
        2,
        ValueFields::Range(FieldRange::new(4, Some(-2))),
        DuplicatePolicy::LongestWins,
    );
    let mapping = load_mapping(&path, "runs", &layout).expect("load mapping");
    assert_eq!(mapping.render("SUB1").as_deref(), Some("R2,R3"));
}

#[test]
fn loads_run_listing_with_append() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "QinN_RUNS.txt",
        "P S1 HV1_a x ERR1 2014 ok\nP S2 HV1_b x ERR2 2014 ok\nP S3 LD2_a x ERR3 2014 ok\n",
    );
    let mut layout = MappingLayout::new(
        2,
        ValueFields::Range(FieldRange::new(4, Some(-2))),
        DuplicatePolicy::Append,
    );
    layout.key_rule = Some(IdentifierRule::SplitTake {
        separator: "_".to_string(),
        index: 0,
    });
    let mapping = load_mapping(&path, "runs", &layout).expect("load mapping");
    assert_eq!(mapping.render("HV1").as_deref(), Some("ERR1,ERR2"));
    assert_eq!(mapping.render("LD2").as_deref(), Some("ERR3"));
}

fn cell() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.;:-]{1,10}"
}

proptest! {
    #[test]
    fn written_tables_read_back_unchanged(
        width in 1usize..5,
        rows in prop::collection::vec(prop::collection::vec(cell(), 5), 0..12),
    ) {
        let columns: Vec<String> = (0..width).map(|idx| format!("col{idx}")).collect();
        let rows: Vec<Vec<String>> = rows.into_iter().map(|row| row[..width].to_vec()).collect();
        let table = Table::from_rows(columns, rows).unwrap();

        let text = table_to_string(&table, TAB).unwrap();
        let back = read_table(text.as_bytes(), TAB, "inline").unwrap();
        prop_assert_eq!(back, table);
    }
}
