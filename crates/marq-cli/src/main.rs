use clap::{Args, Parser, Subcommand};
use marq_parser::{Diagnostic, Parse, ParserConfig};

#[derive(Parser)]
#[command(name = "marq")]
#[command(about = "Error-tolerant parser for HTML-like markup")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a file
    Tokens {
        /// Input markup file
        path: String,
    },

    /// Print the parse tree of a file
    Tree {
        /// Input markup file
        path: String,

        /// Emit the tree and diagnostics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        limits: Limits,
    },

    /// Report diagnostics without printing the tree
    Check {
        /// Input markup file
        path: String,

        #[command(flatten)]
        limits: Limits,
    },
}

#[derive(Args)]
struct Limits {
    /// Tokens one recovery attempt may skip before giving up
    #[arg(long, default_value_t = ParserConfig::default().max_skip)]
    max_skip: usize,

    /// Deepest element nesting accepted
    #[arg(long, default_value_t = ParserConfig::default().max_depth)]
    max_depth: usize,
}

impl Limits {
    fn config(&self) -> ParserConfig {
        ParserConfig::new()
            .with_max_skip(self.max_skip)
            .with_max_depth(self.max_depth)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Tokens { path } => cmd_tokens(&path),
        Command::Tree { path, json, limits } => cmd_tree(&path, json, &limits),
        Command::Check { path, limits } => cmd_check(&path, &limits),
    }
}

fn read_source(path: &str) -> String {
    match load_source(path) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

fn load_source(path: &str) -> Result<String, String> {
    match std::fs::read_to_string(path) {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("Error: file not found: {path}"))
        }
        Err(e) => Err(format!("Error reading {path}: {e}")),
    }
}

fn parse_source(path: &str, limits: &Limits) -> Parse {
    let source = read_source(path);
    log::info!("parsing {path} ({} bytes)", source.len());

    match marq_parser::parse_with(&source, limits.config()) {
        Ok(parse) => parse,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}

fn print_diagnostics(path: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{path}:{diagnostic}");
    }
}

fn cmd_tokens(path: &str) {
    let source = read_source(path);

    let tokens = match marq_lexer::Scanner::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    };

    for token in &tokens {
        println!("{} {} {:?}", token.span, token.kind, token.text);
    }
}

fn cmd_tree(path: &str, json: bool, limits: &Limits) {
    let parse = parse_source(path, limits);

    if json {
        let value = serde_json::json!({
            "tree": parse.tree(),
            "diagnostics": parse.diagnostics(),
        });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing tree: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    print!("{}", marq_parser::dump(parse.tree()));
    print_diagnostics(path, parse.diagnostics());
}

fn cmd_check(path: &str, limits: &Limits) {
    let parse = parse_source(path, limits);

    if parse.diagnostics().is_empty() {
        eprintln!("OK: {path}");
        return;
    }

    print_diagnostics(path, parse.diagnostics());
    eprintln!(
        "{path}: {} problem(s){}",
        parse.diagnostics().len(),
        if parse.is_complete() { "" } else { ", parse abandoned" }
    );
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_source_reads_file() {
        let path = std::env::temp_dir().join(format!("marq-cli-{}.html", std::process::id()));
        std::fs::write(&path, "<p>hi</p>").unwrap();
        let path = path.to_str().unwrap();
        assert_eq!(load_source(path), Ok("<p>hi</p>".to_string()));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_source_missing_file() {
        let path = std::env::temp_dir().join("marq-cli-does-not-exist.html");
        let path = path.to_str().unwrap();
        assert_eq!(
            load_source(path),
            Err(format!("Error: file not found: {path}"))
        );
    }

    #[test]
    fn test_load_source_directory_is_a_read_error() {
        let dir = std::env::temp_dir();
        let path = dir.to_str().unwrap();
        let message = load_source(path).unwrap_err();
        assert!(message.starts_with(&format!("Error reading {path}: ")), "{message}");
    }
}
