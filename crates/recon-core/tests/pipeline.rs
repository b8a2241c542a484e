//! Integration tests for task loading and execution.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use recon_core::{RunOptions, check_task, discover_tasks, load_task, run_task, sha256_hex};
use recon_model::ReconError;

const NIELSEN_METADATA: &str = "\
StudySampleId\tDisease\tRUN_CODE
O2_UC_1\tIBD\tNa
V1_CD_2\tIBD\tNa
S3\tN\tSRR000
";

const NIELSEN_RUNS: &str = "\
PRJ SAMN1 O2.UC-1 x SRR001 SRR002 2014 ok
PRJ SAMN2 V1.CD-2 x SRR004 2014 ok
PRJ SAMN3 MH0001 x SRR005 2014 ok
PRJ SAMN4 X9 x SRR006 2014 ok
";

const NIELSEN_TASK: &str = r#"
[task]
name = "NielsenHB_2014"
input = "metadata.txt"
output = "out/metadata.txt"

[mappings.runs]
path = "mapping.txt"

[mappings.runs.layout]
key_field = 2
key_rule = { kind = "substitute", from = ".-", to = "_" }
skip_key_prefixes = ["M"]
values = { start = 4, end = -2 }
duplicates = "last_wins"

[[steps]]
op = "enrich"
key_column = "StudySampleId"
mapping = "runs"
target = "RUN_CODE"
on_miss = { policy = "fail" }
when = { target_equals = "Na" }
"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(&path, contents).expect("write file");
    path
}

fn nielsen_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    write_file(dir.path(), "metadata.txt", NIELSEN_METADATA);
    write_file(dir.path(), "mapping.txt", NIELSEN_RUNS);
    fs::create_dir_all(dir.path().join("out")).expect("create out dir");
    let task = write_file(dir.path(), "nielsen.toml", NIELSEN_TASK);
    (dir, task)
}

#[test]
fn fills_missing_run_codes() {
    let (dir, task) = nielsen_fixture();
    let config = load_task(&task).expect("load task");
    let outcome = run_task(&config, &RunOptions::default()).expect("run task");

    let written = fs::read_to_string(dir.path().join("out/metadata.txt")).expect("read output");
    assert_eq!(
        written,
        "StudySampleId\tDisease\tRUN_CODE\n\
         O2_UC_1\tIBD\tSRR001,SRR002\n\
         V1_CD_2\tIBD\tSRR004\n\
         S3\tN\tSRR000\n"
    );
    assert_eq!(outcome.rows_in, 3);
    assert_eq!(outcome.rows_out, 3);
    assert_eq!(outcome.output, Some(dir.path().join("out/metadata.txt")));
    assert_eq!(outcome.rows_changed(), 2);
    insta::assert_debug_snapshot!(outcome.steps, @r#"
    [
        StepReport {
            op: "enrich",
            column: "RUN_CODE",
            changed: 2,
            skipped: 1,
            misses: 0,
            unused_keys: [
                "X9",
            ],
        },
    ]
    "#);
}

#[test]
fn records_input_checksums() {
    let (dir, task) = nielsen_fixture();
    let config = load_task(&task).expect("load task");
    let outcome = run_task(&config, &RunOptions::default()).expect("run task");

    assert_eq!(outcome.inputs.len(), 2);
    assert_eq!(outcome.inputs[0].path, dir.path().join("metadata.txt"));
    assert_eq!(
        outcome.inputs[0].sha256,
        sha256_hex(NIELSEN_METADATA.as_bytes())
    );
    assert_eq!(outcome.inputs[1].sha256, sha256_hex(NIELSEN_RUNS.as_bytes()));
}

#[test]
fn lookup_failure_writes_nothing() {
    let (dir, task) = nielsen_fixture();
    write_file(
        dir.path(),
        "metadata.txt",
        "StudySampleId\tDisease\tRUN_CODE\nO2_UC_1\tIBD\tNa\nZZ_9\tIBD\tNa\n",
    );
    let config = load_task(&task).expect("load task");
    let err = run_task(&config, &RunOptions::default()).unwrap_err();

    match err {
        ReconError::Lookup {
            mapping, key, row, ..
        } => {
            assert_eq!(mapping, "runs");
            assert_eq!(key, "ZZ_9");
            assert_eq!(row, 2);
        }
        other => panic!("expected lookup error, got {other}"),
    }
    assert!(!dir.path().join("out/metadata.txt").exists());
}

#[test]
fn dry_run_and_output_override() {
    let (dir, task) = nielsen_fixture();
    let config = load_task(&task).expect("load task");

    let dry = RunOptions {
        dry_run: true,
        output_override: None,
    };
    let outcome = run_task(&config, &dry).expect("dry run");
    assert_eq!(outcome.output, None);
    assert!(!dir.path().join("out/metadata.txt").exists());

    let elsewhere = dir.path().join("elsewhere.txt");
    let redirected = RunOptions {
        dry_run: false,
        output_override: Some(elsewhere.clone()),
    };
    run_task(&config, &redirected).expect("run task");
    assert!(elsewhere.is_file());
    assert!(!dir.path().join("out/metadata.txt").exists());
}

#[test]
fn guarded_in_place_task_can_rerun() {
    let dir = TempDir::new().expect("temp dir");
    write_file(
        dir.path(),
        "metadata.txt",
        "StudySampleId\tSubj_Id\tDisease\nMH0001\tx\tN\nMH0002\tx\tIBD\n",
    );
    let task = write_file(
        dir.path(),
        "task.toml",
        r#"
        [task]
        name = "LeChatelierE_2013"
        input = "metadata.txt"
        output = "metadata.txt"

        [[steps]]
        op = "rewrite"
        column = "StudySampleId"
        rule = { kind = "prefix", value = "MetaHIT-" }
        guard = "skip_applied"

        [[steps]]
        op = "set"
        column = "Subj_Id"
        source = { from = "copy", column = "StudySampleId" }
        "#,
    );
    let config = load_task(&task).expect("load task");
    let expected = "StudySampleId\tSubj_Id\tDisease\n\
                    MetaHIT-MH0001\tMetaHIT-MH0001\tN\n\
                    MetaHIT-MH0002\tMetaHIT-MH0002\tIBD\n";

    run_task(&config, &RunOptions::default()).expect("first run");
    assert_eq!(
        fs::read_to_string(dir.path().join("metadata.txt")).unwrap(),
        expected
    );

    let second = run_task(&config, &RunOptions::default()).expect("second run");
    assert_eq!(
        fs::read_to_string(dir.path().join("metadata.txt")).unwrap(),
        expected
    );
    assert_eq!(second.steps[0].skipped, 2);
    assert_eq!(second.rows_changed(), 0);
}

#[test]
fn inserts_recodes_and_deletes_columns() {
    let dir = TempDir::new().expect("temp dir");
    write_file(
        dir.path(),
        "metadata.txt",
        "sampleID\tDisease\tRUN_CODE\nMV_FEI1_t1Q14\tN\tR1\nMV_FEM1_t1Q14\tCRC\tR2\n",
    );
    let task = write_file(
        dir.path(),
        "task.toml",
        r#"
        [task]
        name = "mixed"
        input = "metadata.txt"
        output = "out.txt"

        [[steps]]
        op = "insert"
        column = "lactating"
        position = 1
        source = { from = "char_flag", column = "sampleID", index = 5, expected = "M", matched = "yes", unmatched = "no" }

        [[steps]]
        op = "recode"
        column = "Disease"
        map = { N = "Na", CRC = "Carcinoma" }
        into = { column = "DiseaseLevel", position = 3 }

        [[steps]]
        op = "delete"
        column = "RUN_CODE"

        [[steps]]
        op = "rename"
        from = "sampleID"
        to = "SampleID"
        "#,
    );
    let config = load_task(&task).expect("load task");
    run_task(&config, &RunOptions::default()).expect("run task");

    assert_eq!(
        fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "SampleID\tlactating\tDisease\tDiseaseLevel\n\
         MV_FEI1_t1Q14\tno\tN\tNa\n\
         MV_FEM1_t1Q14\tyes\tCRC\tCarcinoma\n"
    );
}

#[test]
fn unmapped_recode_value_aborts() {
    let dir = TempDir::new().expect("temp dir");
    write_file(dir.path(), "metadata.txt", "Disease\nN\nUNKNOWN\n");
    let task = write_file(
        dir.path(),
        "task.toml",
        r#"
        [task]
        name = "YuJ_2015"
        input = "metadata.txt"
        output = "out.txt"

        [[steps]]
        op = "recode"
        column = "Disease"
        map = { N = "Na", CRC = "Carcinoma" }
        "#,
    );
    let config = load_task(&task).expect("load task");
    let err = run_task(&config, &RunOptions::default()).unwrap_err();
    assert!(matches!(err, ReconError::Validation { .. }));
    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn check_reports_missing_mapping_file() {
    let (dir, task) = nielsen_fixture();
    let config = load_task(&task).expect("load task");
    check_task(&config).expect("complete task checks");

    fs::remove_file(dir.path().join("mapping.txt")).expect("remove mapping");
    let err = check_task(&config).unwrap_err();
    match err {
        ReconError::Io { path, .. } => assert_eq!(path, dir.path().join("mapping.txt")),
        other => panic!("expected io error, got {other}"),
    }
}

#[test]
fn discovers_task_files_in_name_order() {
    let dir = TempDir::new().expect("temp dir");
    write_file(dir.path(), "b.toml", "");
    write_file(dir.path(), "a.toml", "");
    write_file(dir.path(), "notes.txt", "");
    fs::create_dir_all(dir.path().join("c.toml")).expect("create dir");

    let tasks = discover_tasks(dir.path()).expect("discover");
    let names: Vec<_> = tasks
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.toml", "b.toml"]);
}
