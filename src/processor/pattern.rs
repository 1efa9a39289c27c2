use anyhow::{Context, Result, bail};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunClass {
    Digit,
    Latin,
    Hangul,
    Other,
}

fn run_class(character: char) -> RunClass {
    if character.is_ascii_digit() {
        RunClass::Digit
    } else if character.is_ascii_alphabetic() {
        RunClass::Latin
    } else if ('\u{AC00}'..='\u{D7A3}').contains(&character) {
        RunClass::Hangul
    } else {
        RunClass::Other
    }
}

pub fn heading_runs(heading: &str) -> Vec<String> {
    let mut runs = Vec::<String>::new();
    let mut current = String::new();
    let mut current_class: Option<RunClass> = None;

    for character in heading.chars() {
        if character.is_whitespace() {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            current_class = None;
            continue;
        }

        let class = run_class(character);
        let continues_run = class != RunClass::Other && current_class == Some(class);
        if !continues_run && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }

        current.push(character);
        current_class = Some(class);
    }

    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

pub fn flexible_pattern(heading: &str) -> String {
    heading_runs(heading)
        .iter()
        .map(|run| regex::escape(run))
        .collect::<Vec<String>>()
        .join(r"\s*")
}

pub fn compile_flexible_pattern(heading: &str) -> Result<Regex> {
    let pattern = flexible_pattern(heading);
    if pattern.is_empty() {
        bail!("cannot build a heading pattern from blank heading {heading:?}");
    }

    Regex::new(&pattern)
        .with_context(|| format!("failed to compile heading pattern for {heading:?}"))
}
