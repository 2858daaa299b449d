// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! LeanDoc translator command-line interface.
//!
//! This is the entry point for the `leandoc` command. The core pipeline
//! (lex → parse → generate) does no I/O; everything file- and
//! process-shaped lives here.
//!
//! Exit codes: 0 success, 1 parse or generation error, 2 usage or I/O
//! error.

use std::fmt::Write as _;
use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use leandoc_core::dump::dump_document;
use leandoc_core::parse::{parse, LineLexer};
use leandoc_core::typst::{generate, Options};

mod diagnostic;

use diagnostic::{GenDiagnostic, ParseDiagnostic};

/// LeanDoc: translate LeanDoc documents to Typst
#[derive(Debug, Parser)]
#[command(name = "leandoc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print the line-token stream and exit
    #[arg(long, conflicts_with_all = ["ast", "typst"])]
    tokens: bool,

    /// Print the document tree and exit
    #[arg(long, conflicts_with = "typst")]
    ast: bool,

    /// Generate Typst source (the default mode)
    #[arg(long)]
    typst: bool,

    /// Input file
    input: Utf8PathBuf,

    /// Output path for the generated Typst source
    #[arg(short, long, default_value = "output.typ")]
    output: Utf8PathBuf,

    /// Built-in template name: plain or report
    #[arg(long, default_value = "plain")]
    template: String,

    /// Import this Typst file instead of a built-in template
    #[arg(long)]
    template_file: Option<Utf8PathBuf>,

    /// Disable raw passthrough output (stem blocks, +...+ spans)
    #[arg(long)]
    no_raw: bool,
}

fn main() -> ExitCode {
    // Initialize the tracing subscriber only if RUST_LOG is explicitly
    // set, keeping stderr clean for diagnostics otherwise.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }));

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> ExitCode {
    let source = match fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Cannot open file: {} ({err})", cli.input);
            return ExitCode::from(2);
        }
    };

    if cli.tokens {
        print!("{}", dump_tokens(&source));
        return ExitCode::SUCCESS;
    }

    let doc = match parse(&source) {
        Ok(doc) => doc,
        Err(err) => {
            let report =
                miette::Report::new(ParseDiagnostic::new(&err, cli.input.as_str(), &source));
            eprintln!("{report:?}");
            return ExitCode::from(1);
        }
    };

    if cli.ast {
        print!("{}", dump_document(&doc));
        return ExitCode::SUCCESS;
    }

    let options = Options {
        template: cli.template.as_str().into(),
        template_file: cli.template_file.as_ref().map(|p| p.as_str().into()),
        allow_raw_passthrough: !cli.no_raw,
    };

    let typst = match generate(&doc, &options) {
        Ok(output) => output,
        Err(err) => {
            let report = miette::Report::new(GenDiagnostic::new(&err, cli.input.as_str(), &source));
            eprintln!("{report:?}");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = fs::write(&cli.output, typst) {
        eprintln!("Cannot write file: {} ({err})", cli.output);
        return ExitCode::from(2);
    }

    tracing::debug!(input = %cli.input, output = %cli.output, "translation finished");
    println!("Wrote {}", cli.output);
    ExitCode::SUCCESS
}

/// Renders the line-token stream, one token per line, EOF included.
fn dump_tokens(source: &str) -> String {
    let mut lexer = LineLexer::new(source);
    let mut out = String::new();
    loop {
        let at_end = lexer.at_end();
        let tok = lexer.take();
        let _ = write!(out, "{}: {}", tok.line_no, tok.kind.name());
        if tok.level != 0 {
            let _ = write!(out, " level={}", tok.level);
        }
        if !tok.head.is_empty() {
            let _ = write!(out, " head=\"{}\"", tok.head);
        }
        if !tok.rest.is_empty() {
            let _ = write!(out, " rest=\"{}\"", tok.rest);
        }
        out.push('\n');
        if at_end {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn typst_mode_arguments() {
        let cli = Cli::parse_from([
            "leandoc",
            "--typst",
            "in.adoc",
            "-o",
            "out.typ",
            "--template",
            "report",
            "--no-raw",
        ]);
        assert!(cli.typst && !cli.ast && !cli.tokens);
        assert_eq!(cli.input, "in.adoc");
        assert_eq!(cli.output, "out.typ");
        assert_eq!(cli.template, "report");
        assert!(cli.no_raw);
    }

    #[test]
    fn typst_is_the_default_mode() {
        let cli = Cli::parse_from(["leandoc", "in.adoc"]);
        assert!(!cli.tokens && !cli.ast);
        assert_eq!(cli.output, "output.typ");
        assert_eq!(cli.template, "plain");
    }

    #[test]
    fn ast_and_typst_modes_conflict() {
        let result = Cli::try_parse_from(["leandoc", "--ast", "--typst", "in.adoc"]);
        assert!(result.is_err());
    }

    #[test]
    fn token_dump_format() {
        let out = dump_tokens("== Title\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "1: SECTION level=2 rest=\"Title\"");
        assert_eq!(lines[1], "2: BLANK");
        assert_eq!(lines[2], "3: EOF");
    }
}
