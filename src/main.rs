//! docsync - Command-line entry point
//!
//! Parses a markup file and prints its tree, outline, tokens or HTML.
//!
//! ```text
//! docsync <file> [--html|--outline|--tokens]
//! ```

use std::path::Path;
use std::process::ExitCode;

use docsync::config::load_config;
use docsync::export::html;
use docsync::markup::{
    extract_outline, parse_document_with_options, tokenize, Child, Node, TokenKind,
};
use log::{error, info};

/// Application name constant.
const APP_NAME: &str = "docsync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Tree,
    Html,
    Outline,
    Tokens,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((path, mode)) = parse_args(&args) else {
        eprintln!("Usage: {} <file> [--html|--outline|--tokens]", APP_NAME);
        return ExitCode::from(2);
    };

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to read {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let settings = load_config();
    let options = settings.parse_options();
    info!("Parsing {} ({:?} close matching)", path, options.match_mode);

    if mode == OutputMode::Tokens {
        for token in tokenize(&text) {
            let label = match token.kind {
                TokenKind::Open => "open",
                TokenKind::Close => "close",
                TokenKind::SelfClosing => "self-closing",
                TokenKind::Text => "text",
                TokenKind::Comment => "comment",
            };
            println!(
                "{:>6}..{:<6} {:<12} {}",
                token.start,
                token.end,
                label,
                token
                    .tag_name
                    .as_deref()
                    .or(token.content.as_deref())
                    .unwrap_or_default()
                    .escape_debug()
            );
        }
        return ExitCode::SUCCESS;
    }

    let document = match parse_document_with_options(&text, &options) {
        Ok(document) => document,
        Err(e) => {
            error!("{}", e);
            if mode == OutputMode::Html {
                let title = Path::new(path).file_stem().and_then(|s| s.to_str());
                println!("{}", html::render_failure_page(&e.to_string(), title));
            }
            return ExitCode::FAILURE;
        }
    };

    match mode {
        OutputMode::Tree => {
            let mut out = String::new();
            dump_node(&document.root, 0, &mut out);
            print!("{}", out);
        }
        OutputMode::Outline => {
            for item in extract_outline(&document, &text) {
                println!(
                    "{}{} (line {})",
                    "  ".repeat(item.indent_level()),
                    item.title,
                    item.line
                );
            }
        }
        OutputMode::Html => {
            let title = Path::new(path).file_stem().and_then(|s| s.to_str());
            println!("{}", html::render_document(&document, title));
        }
        OutputMode::Tokens => {}
    }

    ExitCode::SUCCESS
}

fn parse_args(args: &[String]) -> Option<(&str, OutputMode)> {
    let mut path = None;
    let mut mode = OutputMode::Tree;
    for arg in args {
        match arg.as_str() {
            "--html" => mode = OutputMode::Html,
            "--outline" => mode = OutputMode::Outline,
            "--tokens" => mode = OutputMode::Tokens,
            flag if flag.starts_with("--") => return None,
            file if path.is_none() => path = Some(file),
            _ => return None,
        }
    }
    path.map(|p| (p, mode))
}

fn dump_node(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!(
        "{}#{} <{}> {} [{}..{}]\n",
        indent,
        node.id,
        node.tag_name,
        node.variant.label(),
        node.start,
        node.end
    ));
    for child in &node.children {
        match child {
            Child::Node(inner) => dump_node(inner, depth + 1, out),
            Child::Run(run) => out.push_str(&format!(
                "{}  #{} \"{}\" [{}..{}]\n",
                indent,
                run.id,
                run.content.escape_debug(),
                run.start,
                run.end
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync::markup::parse_document;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(
            parse_args(&args(&["doc.xml"])),
            Some(("doc.xml", OutputMode::Tree))
        );
        assert_eq!(
            parse_args(&args(&["--html", "doc.xml"])),
            Some(("doc.xml", OutputMode::Html))
        );
        assert_eq!(
            parse_args(&args(&["doc.xml", "--outline"])),
            Some(("doc.xml", OutputMode::Outline))
        );
        assert_eq!(parse_args(&args(&[])), None);
        assert_eq!(parse_args(&args(&["a", "b"])), None);
        assert_eq!(parse_args(&args(&["a", "--bogus"])), None);
    }

    #[test]
    fn test_dump_node() {
        let doc = parse_document("<para>Hi <emphasis>you</emphasis></para>").unwrap();
        let mut out = String::new();
        dump_node(&doc.root, 0, &mut out);
        assert_eq!(
            out,
            "#0 <para> paragraph [0..40]\n  #1 \"Hi \" [6..9]\n  #2 <emphasis> emphasis [9..33]\n    #3 \"you\" [19..22]\n"
        );
    }
}
