use clap::{Arg, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the command tree from src/main.rs
// We need to duplicate this here since build scripts can't access src/ modules
fn input_arg() -> Arg {
    Arg::new("input")
        .help("Input file path")
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("uniast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert documents between Markdown, persisted JSON, HTML and the editor UI tree")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a uniast.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .arg(input_arg())
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format")
                        .value_parser(["markdown", "json"]),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format")
                        .value_parser(["markdown", "json", "html", "ui-tree"]),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("macros")
                .about("Run the macro round trip on persisted JSON")
                .subcommand(Command::new("load").arg(input_arg()).arg(output_arg()))
                .subcommand(Command::new("save").arg(input_arg()).arg(output_arg())),
        );

    generate_to(Bash, &mut cmd, "uniast", &outdir)?;
    generate_to(Zsh, &mut cmd, "uniast", &outdir)?;
    generate_to(Fish, &mut cmd, "uniast", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
