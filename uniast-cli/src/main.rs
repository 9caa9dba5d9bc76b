// Command-line interface for uniast
//
// This binary converts documents between the formats of the uniast library and runs the
// macro round trip on persisted JSON.
//
// Converting:
//
// The conversion needs a to and from pair. The from is auto-detected from the file extension, while being overwrittable by an explicit --from flag.
// Usage:
//  uniast <input> --to <format> [--from <format>] [--output <file>]          - Convert between formats (default)
//  uniast convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  uniast macros load <input> [--output <file>]  - Wrap every macro of a persisted document
//  uniast macros save <input> [--output <file>]  - Restore the macros of a wrapped document
//
// Extra Parameters:
//
// Configuration keys can be overridden for one run using --extra-<parameter-name> <value>.
// Example:
//  uniast page.json --to markdown --extra-link-serializer filesystem --extra-current-document Docs/Guide
//
// Logs go to stderr, filtered by RUST_LOG or, when unset, by `logging.level` from the configuration.

use clap::{Arg, ArgAction, Command, ValueHint};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uniast::formats::markdown::{
    FileSystemLinkSerializer, HttpMetadataClient, InternalLinkSerializer, MarkdownFormat,
    MarkdownParser, RemoteLinkSerializer, WikiLinkSerializer,
};
use uniast::ir::nodes::UniAst;
use uniast::reference::{EntityReference, EntityType, PathReferenceService};
use uniast::{transforms, FormatRegistry, ReferenceContext};
use uniast_config::{LinkSerializerKind, Loader, UniAstConfig};

const SUBCOMMANDS: &[&str] = &["convert", "macros", "help"];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(key) = arg.strip_prefix("--extra-") {
            let has_value = args
                .get(i + 1)
                .is_some_and(|next| !next.starts_with('-'));

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("uniast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert documents between Markdown, persisted JSON, HTML and the editor UI tree")
        .long_about(
            "uniast is a command-line tool for converting rich-text documents.\n\n\
            Commands:\n  \
            - convert: Transform between document formats (default)\n  \
            - macros:  Run the macro load/save round trip on persisted JSON\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to override configuration for one run:\n  \
            link-serializer, current-document, base-url, nested-links.\n\n\
            Examples:\n  \
            uniast page.md --to json                 # Markdown to persisted JSON (stdout)\n  \
            uniast page.json --to html -o page.html  # Render HTML to a file\n  \
            uniast macros load page.json             # Wrap macros for editing",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a uniast.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - markdown: Markdown with [[wiki links]] and {{macros}} (.md)\n  \
                    - json:     Persisted UniAst (.json)\n  \
                    - html:     HTML fragment, output only (.html)\n  \
                    - ui-tree:  Editor node tree as JSON, output only (.uitree)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("macros")
                .about("Run the macro round trip on persisted JSON")
                .subcommand_required(true)
                .subcommand(
                    Command::new("load")
                        .about("Replace every macro call with its wrapper")
                        .arg(
                            Arg::new("input")
                                .help("Persisted JSON document")
                                .required(true)
                                .index(1)
                                .value_hint(ValueHint::FilePath),
                        )
                        .arg(output_arg()),
                )
                .subcommand(
                    Command::new("save")
                        .about("Restore the calls carried by macro wrappers")
                        .arg(
                            Arg::new("input")
                                .help("JSON document with wrapped macros")
                                .required(true)
                                .index(1)
                                .value_hint(ValueHint::FilePath),
                        )
                        .arg(output_arg()),
                ),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    // If no subcommand is provided, inject "convert"
    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);
                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    let mut config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    apply_config_overrides(&mut config, &mut extra_params);
    init_tracing(&config);
    for key in extra_params.keys() {
        tracing::warn!(parameter = %key, "ignoring unknown extra parameter");
    }

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&config);
        return;
    }

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let input = required(sub_matches, "input");
            let to = required(sub_matches, "to");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            let registry = build_registry(&config).unwrap_or_else(|e| fail("Configuration error", e));

            // Auto-detect --from if not provided
            let from = match sub_matches.get_one::<String>("from") {
                Some(from) => from.to_string(),
                None => registry
                    .detect_format_from_filename(input)
                    .unwrap_or_else(|| {
                        eprintln!("Error: Could not detect format from filename '{input}'");
                        eprintln!("Please specify --from explicitly");
                        std::process::exit(1);
                    }),
            };
            handle_convert_command(&registry, input, &from, to, output);
        }
        Some(("macros", sub_matches)) => match sub_matches.subcommand() {
            Some((direction @ ("load" | "save"), args)) => {
                let input = required(args, "input");
                let output = args.get_one::<String>("output").map(|s| s.as_str());
                handle_macros_command(direction, input, output);
            }
            _ => {
                eprintln!("Unknown macros subcommand. Use --help for usage information.");
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn required<'a>(matches: &'a clap::ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(|s| s.as_str())
        .unwrap_or_else(|| fail("Missing argument", id))
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {err}");
    std::process::exit(1);
}

fn init_tracing(config: &UniAstConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Handle the convert command
fn handle_convert_command(
    registry: &FormatRegistry,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
) {
    // Validate formats exist
    if let Err(e) = registry.get(from) {
        fail("Error", e);
    }
    if let Err(e) = registry.get(to) {
        fail("Error", e);
    }

    let source = fs::read_to_string(input)
        .unwrap_or_else(|e| fail(&format!("Error reading file '{input}'"), e));

    tracing::debug!(%from, %to, "converting {input}");
    let doc = registry
        .parse(&source, from)
        .unwrap_or_else(|e| fail("Parse error", e));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail("Runtime error", e));
    let result = runtime
        .block_on(registry.serialize(&doc, to))
        .unwrap_or_else(|e| fail("Serialization error", e));

    write_output(output, &result);
}

/// Handle `macros load` and `macros save`
fn handle_macros_command(direction: &str, input: &str, output: Option<&str>) {
    let source = fs::read_to_string(input)
        .unwrap_or_else(|e| fail(&format!("Error reading file '{input}'"), e));

    let result = match direction {
        "load" => transforms::load(&source)
            .and_then(|ast| serde_json::to_string(&ast).map_err(Into::into)),
        _ => serde_json::from_str::<UniAst>(&source)
            .map_err(Into::into)
            .and_then(|ast| transforms::save(&ast)),
    }
    .unwrap_or_else(|e| fail(&format!("Macro {direction} failed"), e));

    write_output(output, &result);
}

fn write_output(output: Option<&str>, data: &str) {
    match output {
        Some(path) => {
            fs::write(path, data)
                .unwrap_or_else(|e| fail(&format!("Error writing file '{path}'"), e));
        }
        None => print!("{data}"),
    }
}

/// Handle the list-formats command
fn handle_list_formats_command(config: &UniAstConfig) {
    let registry = build_registry(config).unwrap_or_else(|e| fail("Configuration error", e));
    println!("Available formats:\n");
    for name in registry.list_formats() {
        if let Ok(format) = registry.get(&name) {
            let mut modes = Vec::new();
            if format.supports_parsing() {
                modes.push("read");
            }
            if format.supports_serialization() {
                modes.push("write");
            }
            println!(
                "  {name:<10} {:<12} {}",
                modes.join("/"),
                format.description()
            );
        }
    }
}

/// Formats wired with the reference context, parser options and link strategy from `config`.
fn build_registry(config: &UniAstConfig) -> Result<FormatRegistry, String> {
    let ctx = ReferenceContext::from_service(PathReferenceService::from(&config.references));
    let parser = MarkdownParser::with_options(ctx.clone(), (&config.parser).into());
    let links = link_serializer(config, &ctx)?;
    Ok(FormatRegistry::with_context(
        ctx,
        MarkdownFormat::new(parser, links),
    ))
}

fn link_serializer(
    config: &UniAstConfig,
    ctx: &ReferenceContext,
) -> Result<Arc<dyn InternalLinkSerializer>, String> {
    match config.markdown.link_serializer {
        LinkSerializerKind::Wiki => Ok(Arc::new(WikiLinkSerializer)),
        LinkSerializerKind::Filesystem => {
            let raw = config.markdown.current_document.as_deref().ok_or(
                "markdown.current_document is required by the filesystem link serializer",
            )?;
            match ctx.parse_reference(raw, Some(EntityType::Document)) {
                Some(EntityReference::Document(current)) => Ok(Arc::new(
                    FileSystemLinkSerializer::new(ctx.clone(), current),
                )),
                _ => Err(format!("'{raw}' is not a document reference")),
            }
        }
        LinkSerializerKind::Remote => {
            let remote = &config.remote;
            let (Some(api_url), Some(web_url)) = (&remote.api_url, &remote.web_url) else {
                return Err(
                    "remote.api_url and remote.web_url are required by the remote link serializer"
                        .to_string(),
                );
            };
            let client =
                HttpMetadataClient::new(api_url, remote.timeout()).map_err(|e| e.to_string())?;
            Ok(Arc::new(RemoteLinkSerializer::new(
                ctx.clone(),
                client,
                web_url.as_str(),
            )))
        }
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> UniAstConfig {
    let loader = Loader::new().with_optional_file("uniast.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader
        .build()
        .unwrap_or_else(|err| fail("Failed to load configuration", err))
}

fn apply_config_overrides(config: &mut UniAstConfig, extra_params: &mut HashMap<String, String>) {
    if let Some(raw) = extra_params.remove("link-serializer") {
        config.markdown.link_serializer = match raw.as_str() {
            "wiki" => LinkSerializerKind::Wiki,
            "filesystem" => LinkSerializerKind::Filesystem,
            "remote" => LinkSerializerKind::Remote,
            other => fail("Invalid value for --extra-link-serializer", other),
        };
    }
    if let Some(raw) = extra_params.remove("current-document") {
        config.markdown.current_document = Some(raw);
    }
    if let Some(raw) = extra_params.remove("base-url") {
        config.references.base_url = raw;
    }
    if let Some(raw) = take_override(extra_params, &["nested-links", "nested-internal-links"]) {
        config.parser.nested_internal_links = parse_bool_arg("nested-links", &raw);
    }
}

fn take_override(map: &mut HashMap<String, String>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = map.remove(*key) {
            return Some(value);
        }
    }
    None
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => fail(&format!("Invalid boolean value for --extra-{flag}"), other),
    }
}
