use anyhow::Context;
use humaniser_lib::services::{
    load_config, normalize_text, split_sentences, HumaniserPipeline, ParaphraseService,
};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin failed")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("read file failed: {}", path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin humanise_text -- <path|-> [--rules-only] [--model <id>] [--verbose] [--json]\n\nNotes:\n  - `-` reads the text from stdin.\n  - `--rules-only` skips the paraphrase model entirely.\n  - Model settings come from the same config file / env vars as the server."
        );
        return Ok(());
    }

    dotenvy::dotenv().ok();
    humaniser_lib::init_console_logging();

    let text = read_input(&args[1])?;
    let rules_only = has_flag(&args, "--rules-only");
    let verbose = has_flag(&args, "--verbose");
    let as_json = has_flag(&args, "--json");

    let mut config = load_config()?;
    if let Some(model) = parse_arg_value(&args, "--model") {
        config.paraphrase.model = model;
    }

    let service = if rules_only {
        ParaphraseService::disabled()
    } else {
        ParaphraseService::from_config(&config.paraphrase)
    };
    let pipeline = HumaniserPipeline::new(Arc::new(service));

    if verbose {
        let clean = normalize_text(&text);
        let chunks = split_sentences(&clean);
        eprintln!("Input: {} chars", text.chars().count());
        eprintln!("Model: {}", if rules_only { "(rules only)" } else { config.paraphrase.model.as_str() });
        eprintln!("Chunks: {}", chunks.len());
        for (i, c) in chunks.iter().enumerate() {
            eprintln!("[C{:03}] {}", i, preview(c, 120));
        }
        eprintln!();
    }

    let result = pipeline.humanise_detailed(&text).await;

    if as_json {
        #[derive(Serialize)]
        struct Output<'a> {
            original: &'a str,
            humanised: &'a str,
            method: humaniser_lib::services::HumaniseMethod,
            model: serde_json::Value,
        }

        let status = pipeline.paraphraser().status().await;
        let out = Output {
            original: &text,
            humanised: &result.text,
            method: result.method,
            model: serde_json::to_value(status)?,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", result.text);
        if verbose {
            eprintln!();
            eprintln!("Method: {:?}", result.method);
        }
    }

    Ok(())
}
