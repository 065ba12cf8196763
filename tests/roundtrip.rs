//! Scenario tests over the invoice process fixture: the full translate,
//! serialize, edit and encode cycle a broker host would run.

use procscript::procscript::definitions::DefinitionTable;
use procscript::procscript::document::{from_document, to_document};
use procscript::procscript::encoding::encode;
use procscript::procscript::loader::{encode_to_file, parse_file};
use procscript::procscript::parsing::parse;
use procscript::procscript::testing::assert_forest;
use procscript::procscript::verb::Forest;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn definitions() -> DefinitionTable {
    DefinitionTable::load(&[fixture("bpm_definitions.json")]).unwrap()
}

fn fixture_source() -> String {
    std::fs::read_to_string(fixture("invoice_process.py")).unwrap()
}

fn fixture_forest() -> Forest {
    parse_file(fixture("invoice_process.py"), &definitions()).unwrap()
}

#[test]
fn test_identity_round_trip() {
    let source = fixture_source();
    let forest = parse(&source, &definitions()).unwrap();
    let encoded = encode(&forest, &definitions());

    assert_eq!(encoded.text, source);
    assert!(!encoded.has_warnings());
}

#[test]
fn test_identity_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("invoice_process_out.py");

    let forest = fixture_forest();
    encode_to_file(&forest, &definitions(), &out_path).unwrap();

    assert_eq!(
        std::fs::read_to_string(&out_path).unwrap(),
        fixture_source()
    );
}

#[test]
fn test_top_level_shape() {
    let forest = fixture_forest();
    assert_forest(&forest)
        .verb_count(12)
        .description("\nThis process watches the invoices inbox and files whatever arrives.\n")
        .verb(0, |v| {
            v.is_raw_verb().description("Collect the nightly batch");
        })
        .verb(1, |v| {
            v.is_raw_verb().description("Wait for the operator to confirm");
        })
        .verb(2, |v| {
            v.identifier("if")
                .parameter("condition", "batch_size > 0")
                .description("Is the batch worth filing?")
                .child_count(4);
        })
        .verb(3, |v| {
            v.identifier("else").child_count(2);
        })
        .verb(4, |v| {
            v.identifier("set_channel").parameter("value", "'accounting'");
        })
        .verb(5, |v| {
            v.identifier("try")
                .parameter_count(0)
                .description("\nSay hello to the far side\n");
        })
        .verb(6, |v| {
            v.identifier("except")
                .parameter("expression", "workflow.lib.confirmations.TimeoutError as e")
                .child_count(2);
        })
        .verb(7, |v| {
            v.identifier("for")
                .parameter("target", "a")
                .parameter("iterable", "range(0, 3)")
                .description("\nFor each reminder, nag a little\n");
        })
        .verb(9, |v| {
            v.identifier("while").parameter("condition", "counter < 6");
        })
        .verb(10, |v| {
            v.identifier("def")
                .parameter("name", "file_report")
                .parameter("signature", "label, copies = 1");
        })
        .verb(11, |v| {
            v.identifier("file_report")
                .parameter("label", "\"summary\"")
                .parameter("copies", "2");
        });
}

#[test]
fn test_nested_loop_conditional_print_spot_check() {
    // The §8 scenario shape: loop body -> conditional branch -> statement.
    let forest = fixture_forest();
    assert_forest(&forest).verb(7, |v| {
        v.identifier("for").child_count(2).child(1, |c| {
            c.identifier("if")
                .parameter("condition", "1 == 1")
                .child(0, |leaf| {
                    leaf.identifier("print").parameter(
                        "expression",
                        "\"This should always happen three times.\"",
                    );
                });
        });
    });
}

#[test]
fn test_branch_verbs_carry_their_blocks() {
    let forest = fixture_forest();
    assert_forest(&forest)
        .verb(2, |v| {
            v.child(2, |c| {
                c.identifier("if")
                    .description("Was anything skipped?")
                    .child(0, |leaf| {
                        leaf.identifier("send_message")
                            .description("Tell the accountant")
                            .parameter("message", "\"All invoices were filed\"")
                            .parameter("recipient", "accountant");
                    });
            })
            .child(3, |c| {
                c.identifier("else");
            });
        })
        .verb(3, |v| {
            v.child(1, |c| {
                c.identifier("print")
                    .no_description()
                    .parameter("expression", "\"Nothing to file.\"");
            });
        });
}

#[test]
fn test_document_round_trip_preserves_everything() {
    let forest = fixture_forest();
    let document = to_document(&forest).unwrap();
    let decoded = from_document(&document).unwrap();

    assert!(forest.structurally_equal(&decoded));

    // Raw caches cross the boundary, so the decoded forest still encodes
    // byte-identically.
    let encoded = encode(&decoded, &definitions());
    assert_eq!(encoded.text, fixture_source());
}

#[test]
fn test_resynthesis_reparses_to_equal_forest() {
    let mut forest = fixture_forest();
    forest.clear_raw();

    let encoded = encode(&forest, &definitions());
    let reparsed = parse(&encoded.text, &definitions()).unwrap();

    assert!(forest.structurally_equal(&reparsed));
    assert_eq!(reparsed.description, forest.description);
    assert_ne!(encoded.text, fixture_source());
}

#[test]
fn test_edited_parameter_resynthesizes_that_statement_only() {
    let mut forest = fixture_forest();
    let source = fixture_source();

    // The broker edits one verb: new recipient, raw cleared on that node.
    {
        let else_verb = &mut forest.verbs[3];
        let send = &mut else_verb.children[0];
        send.parameters
            .insert("recipient".to_string(), "supervisor".to_string());
        send.raw = None;
        else_verb.raw = None;
    }

    let encoded = encode(&forest, &definitions());
    assert!(encoded
        .text
        .contains("send_message(\"The batch was empty, please resend\", supervisor)"));
    // Statements outside the edited branch replay verbatim.
    assert!(encoded
        .text
        .contains("send_message(\"All invoices were filed\", accountant)"));

    let reparsed = parse(&encoded.text, &definitions()).unwrap();
    assert!(forest.structurally_equal(&reparsed));
    assert_ne!(encoded.text, source);
}

#[test]
fn test_inserted_verb_appears_in_output() {
    use procscript::procscript::verb::Verb;

    let mut forest = fixture_forest();
    forest.verbs.push(
        Verb::new("send_message")
            .with_parameter("message", "\"All done\"")
            .with_parameter("recipient", "operator"),
    );

    let encoded = encode(&forest, &definitions());
    assert!(encoded
        .text
        .ends_with("send_message(\"All done\", operator)\n"));

    let reparsed = parse(&encoded.text, &definitions()).unwrap();
    assert_eq!(reparsed.verbs.len(), 13);
}

#[test]
fn test_fallback_completeness() {
    // Every statement is represented by exactly one verb: the fixture has
    // 12 top-level statements and 17 nested ones.
    let forest = fixture_forest();
    assert_eq!(forest.verb_count(), 29);
}
