//! Command-line interface for procscript
//! Translates process scripts into interchange documents and back.
//!
//! Usage:
//!   procscript parse <script> -d <defs>... [-o <out.json>]   - Parse to an interchange document
//!   procscript encode <document> -d <defs>... -o <script>    - Encode a document back to source
//!   procscript roundtrip <script> -d <defs>...               - Verify byte-identical round trip

use clap::{Arg, ArgAction, Command};
use procscript::procscript::definitions::DefinitionTable;
use procscript::procscript::document::{from_document_str, to_document_string};
use procscript::procscript::encoding::encode;
use procscript::procscript::error::{format_source_context, TranslationError};
use procscript::procscript::loader::{encode_to_file, ScriptLoader};

fn main() {
    let definitions_arg = Arg::new("definitions")
        .long("definitions")
        .short('d')
        .action(ArgAction::Append)
        .required(true)
        .help("Definition source file (repeatable; later files override earlier ones)");

    let matches = Command::new("procscript")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate process scripts to verb documents and back")
        .subcommand_required(true)
        .subcommand(
            Command::new("parse")
                .about("Parse a process script into an interchange document")
                .arg(Arg::new("script").help("Path to the script").required(true).index(1))
                .arg(definitions_arg.clone())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the document here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("encode")
                .about("Encode an interchange document back to script source")
                .arg(Arg::new("document").help("Path to the document").required(true).index(1))
                .arg(definitions_arg.clone())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .help("Path of the script to write (overwritten)"),
                ),
        )
        .subcommand(
            Command::new("roundtrip")
                .about("Parse and re-encode a script, verifying byte identity")
                .arg(Arg::new("script").help("Path to the script").required(true).index(1))
                .arg(definitions_arg),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("parse", sub)) => handle_parse(
            sub.get_one::<String>("script").expect("script is required"),
            &collect_definitions(sub),
            sub.get_one::<String>("output"),
        ),
        Some(("encode", sub)) => handle_encode(
            sub.get_one::<String>("document").expect("document is required"),
            &collect_definitions(sub),
            sub.get_one::<String>("output").expect("output is required"),
        ),
        Some(("roundtrip", sub)) => handle_roundtrip(
            sub.get_one::<String>("script").expect("script is required"),
            &collect_definitions(sub),
        ),
        _ => unreachable!("subcommand is required"),
    }
}

fn collect_definitions(matches: &clap::ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("definitions")
        .expect("definitions are required")
        .cloned()
        .collect()
}

fn load_definitions(paths: &[String]) -> DefinitionTable {
    DefinitionTable::load(paths).unwrap_or_else(|err| {
        eprintln!("Definition load error: {}", err);
        std::process::exit(1);
    })
}

/// Report a translation failure with file, position and source context.
fn report_failure(path: &str, source: Option<&str>, err: &TranslationError) -> ! {
    eprintln!("{}: {}", path, err);
    if let (Some(source), TranslationError::Syntax(syntax)) = (source, err) {
        eprintln!();
        eprint!("{}", format_source_context(source, syntax.position()));
    }
    std::process::exit(1);
}

fn handle_parse(script: &str, definition_paths: &[String], output: Option<&String>) {
    let definitions = load_definitions(definition_paths);
    let loader = ScriptLoader::from_path(script)
        .unwrap_or_else(|err| report_failure(script, None, &err));
    let forest = loader
        .parse(&definitions)
        .unwrap_or_else(|err| report_failure(script, Some(loader.source()), &err));

    let document = to_document_string(&forest).unwrap_or_else(|err| {
        eprintln!("{}: {}", script, err);
        std::process::exit(1);
    });

    match output {
        Some(path) => {
            if let Err(err) = std::fs::write(path, document) {
                eprintln!("cannot write {}: {}", path, err);
                std::process::exit(1);
            }
        }
        None => println!("{}", document),
    }
}

fn handle_encode(document_path: &str, definition_paths: &[String], output: &str) {
    let definitions = load_definitions(definition_paths);
    let text = std::fs::read_to_string(document_path).unwrap_or_else(|err| {
        eprintln!("cannot read {}: {}", document_path, err);
        std::process::exit(1);
    });
    let forest = from_document_str(&text).unwrap_or_else(|err| {
        eprintln!("{}: {}", document_path, err);
        std::process::exit(1);
    });

    let encoded = encode_to_file(&forest, &definitions, output)
        .unwrap_or_else(|err| report_failure(output, None, &err));
    for warning in &encoded.warnings {
        eprintln!("warning: {}", warning);
    }
}

fn handle_roundtrip(script: &str, definition_paths: &[String]) {
    let definitions = load_definitions(definition_paths);
    let loader = ScriptLoader::from_path(script)
        .unwrap_or_else(|err| report_failure(script, None, &err));
    let forest = loader
        .parse(&definitions)
        .unwrap_or_else(|err| report_failure(script, Some(loader.source()), &err));

    let encoded = encode(&forest, &definitions);
    if encoded.text == loader.source() {
        println!("{}: round trip ok ({} verbs)", script, forest.verb_count());
        return;
    }

    let diverges_at = loader
        .source()
        .lines()
        .zip(encoded.text.lines())
        .position(|(a, b)| a != b)
        .map(|i| i + 1);
    match diverges_at {
        Some(line) => eprintln!("{}: round trip diverges at line {}", script, line),
        None => eprintln!("{}: round trip output differs in length", script),
    }
    std::process::exit(1);
}
