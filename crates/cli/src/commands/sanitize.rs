//! Sanitize command - run the report sanitizer over arbitrary text

use anyhow::{Context, Result};
use digest_bots_domain::{Sanitizer, SanitizerConfig};
use std::io::{self, Read};

use crate::args::SanitizeArgs;

pub fn execute(args: SanitizeArgs) -> Result<()> {
    let input = read_input(&args)?;

    let sanitizer = Sanitizer::new(SanitizerConfig {
        strip_brackets: args.strip_brackets,
    });

    println!("{}", sanitizer.sanitize(&input));
    Ok(())
}

fn read_input(args: &SanitizeArgs) -> Result<String> {
    match &args.file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            Ok(text)
        }
    }
}
