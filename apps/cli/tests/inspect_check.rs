//! `inspect` and `check` command tests.

mod common;

use pretty_assertions::assert_eq;

use deckhand_cli::cli::Command;
use deckhand_cli::error::CliError;
use deckhand_core::MismatchPolicy;

use common::fixtures;
use common::TestContext;

/// Test inspect prints the header summary.
#[test]
fn test_inspect_summary() {
    let ctx = TestContext::new();
    let path = ctx.write("vocab.txt", fixtures::VOCAB);

    let output = ctx
        .run(Command::Inspect {
            path: path.clone(),
            json: false,
        })
        .unwrap();

    let expected = format!(
        "{}\n  separator: tab\n  html: true\n  fields: Front, Back\n  tags column: 3\n  deck: Spanish\n  cards: 3\n  tags: greeting common animal\n  media: cat.png\n",
        path.display()
    );
    assert_eq!(output, expected);
}

/// Test inspect --json dumps the parsed deck.
#[test]
fn test_inspect_json() {
    let ctx = TestContext::new();
    let path = ctx.write("vocab.txt", fixtures::VOCAB);

    let output = ctx.run(Command::Inspect { path, json: true }).unwrap();
    let body: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(body["header"]["field_count"], 2);
    assert_eq!(body["cards"].as_array().unwrap().len(), 3);
    assert_eq!(body["cards"][1]["fields"][0], "adiós");
    assert_eq!(body["cards"][0]["origin_line"], 6);
}

/// Test inspect over a directory lists every deck file.
#[test]
fn test_inspect_directory() {
    let ctx = TestContext::new();
    ctx.write("a.txt", fixtures::VOCAB);
    ctx.write("b.csv", fixtures::PLAIN_CSV);
    ctx.write("notes.md", "not a deck");

    let output = ctx
        .run(Command::Inspect {
            path: ctx.root(),
            json: true,
        })
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["header"]["field_delimiter"], ",");
}

/// Test check reports canonical files as byte-identical.
#[test]
fn test_check_identical() {
    let ctx = TestContext::new();
    let path = ctx.write("vocab.txt", fixtures::VOCAB);

    let output = ctx.run(Command::Check { path: path.clone() }).unwrap();
    assert_eq!(
        output,
        format!("{}: ok, 3 cards, byte-identical\n", path.display())
    );
}

/// Test check reports normalization of CRLF input.
#[test]
fn test_check_normalized() {
    let ctx = TestContext::new();
    let path = ctx.write("crlf.txt", &fixtures::PLAIN_CSV.replace('\n', "\r\n"));

    let output = ctx.run(Command::Check { path }).unwrap();
    assert!(output.contains("ok, 2 cards, normalized"));
}

/// Test a ragged record fails by default and is skipped on request.
#[test]
fn test_mismatch_policy() {
    let mut ctx = TestContext::new();
    let path = ctx.write("ragged.txt", fixtures::RAGGED);

    let err = ctx.run(Command::Check { path: path.clone() }).unwrap_err();
    assert!(matches!(err, CliError::Parse { .. }));
    assert!(err.to_string().contains("record at line 3 has 1 columns, expected 2"));

    ctx.settings.parse.on_field_count_mismatch = MismatchPolicy::Skip;
    let output = ctx
        .run(Command::Inspect {
            path,
            json: false,
        })
        .unwrap();
    assert!(output.contains("  cards: 2\n"));
    assert!(output.contains("  skipped records: 1\n"));
}

/// Test a missing file surfaces as an I/O error.
#[test]
fn test_missing_file() {
    let ctx = TestContext::new();
    let err = ctx
        .run(Command::Check {
            path: ctx.path("nope.txt"),
        })
        .unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}
