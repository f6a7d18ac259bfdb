//! Punto de entrada ("driver").
//!
//! Este módulo lee el programa fuente, invoca la traducción y persiste
//! el resultado. Expone una CLI.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, Arg, Command};
use glc::{
    error::Diagnostics,
    lex::Lexer,
    output::{self, OutputOptions},
    source::Source,
};

use std::{
    fs,
    io::{self, Read},
};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("glc")
        .version(crate_version!())
        .about("Translates a program into equivalent Python source")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .default_value("code.gl")
                .help("Source program ('-' for stdin)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("out.py")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("echo")
                .long("echo")
                .help("Also print the generated code to stdout"),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .help("Prepend the generated header to the output"),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Dump the token stream and exit"),
        )
        .get_matches();

    // Se extraen argumentos necesarios
    let input = args.value_of("input").unwrap_or("code.gl");
    let output = args.value_of("output").unwrap_or("out.py");

    let mut options = OutputOptions::empty();
    if args.is_present("echo") {
        options |= OutputOptions::ECHO;
    }

    if args.is_present("header") {
        options |= OutputOptions::WITH_HEADER;
    }

    let text = read_source(input)?;
    let source = Source::new(input, text);

    if args.is_present("tokens") {
        match Lexer::new(source).try_exhaustive() {
            Ok(tokens) => {
                for token in tokens {
                    println!("{}: {}", token.location(), token.val());
                }

                return Ok(());
            }

            Err(error) => {
                eprint!("{}", Diagnostics::from(error).kind("Lexical error"));
                bail!("Failed to tokenize: {}", input);
            }
        }
    }

    let emitter = match glc::translate(source) {
        Ok(emitter) => emitter,
        Err(failure) => {
            eprint!("{}", Diagnostics::from(failure));
            bail!("Failed to translate {}, nothing was written", input);
        }
    };

    output::write(&emitter, output, options)
        .with_context(|| format!("Failed to write output: {}", output))?;

    Ok(())
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read from stdin")?;

        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to open for reading: {}", path))
    }
}
