use std::env;
use std::process::ExitCode;

use colored::Colorize;
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use fname::{write_name_map, CaseMode, Name, NameTableConfig, WireVersion};

const USAGE: &str = "usage: fname [--case-preserving] [--dump-map] <text>...";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let sliced: Vec<&str> = args.iter().map(|s| &s[..]).collect();

    match launch(&sliced[1..]) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

struct Options<'a> {
    config: NameTableConfig,
    dump_map: bool,
    texts: Vec<&'a str>,
}

/// `Err` carries the first flag that was not understood.
fn parse_args<'a>(args: &[&'a str]) -> Result<Options<'a>, &'a str> {
    let (flags, texts): (Vec<&str>, Vec<&str>) =
        args.iter().copied().partition(|a| a.starts_with("--"));

    let mut options = Options {
        config: NameTableConfig::default(),
        dump_map: false,
        texts,
    };

    for flag in flags {
        match flag {
            "--case-preserving" => options.config = options.config.case_preserving(true),
            "--dump-map" => options.dump_map = true,
            other => return Err(other),
        }
    }

    Ok(options)
}

fn launch(args: &[&str]) -> fname::Result<ExitCode> {
    let Options {
        config,
        dump_map,
        texts,
    } = match parse_args(args) {
        Ok(options) => options,
        Err(flag) => {
            eprintln!("unknown flag {}\n{USAGE}", flag.yellow());
            return Ok(ExitCode::FAILURE);
        }
    };

    if texts.is_empty() {
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    }

    let table = fname::init_names(config)?;
    let interned: Vec<Name> = texts.iter().map(|t| table.name(t)).collect();

    for (text, name) in texts.iter().zip(&interned) {
        let number = match name.external_number() {
            Some(n) => n.to_string(),
            None => "-".to_owned(),
        };
        println!(
            "{:>24} -> cmp {} disp {} num {} => {}",
            text.bold(),
            name.comparison_id().to_string().cyan(),
            name.display_id().to_string().cyan(),
            number.cyan(),
            table.to_text(*name).green(),
        );
    }

    let stats = table.stats();
    println!(
        "{} entries ({} narrow, {} wide), {} payload bytes in {} slabs, {} chunks",
        stats.entries,
        stats.narrow_entries,
        stats.wide_entries,
        stats.payload_bytes,
        stats.slabs,
        stats.allocated_chunks,
    );

    for mode in [CaseMode::Insensitive, CaseMode::Sensitive] {
        if let Some(report) = table.bucket_report(mode) {
            println!(
                "{mode}: {} of {} buckets used, longest chain {}",
                report.used_buckets, report.bucket_count, report.longest_chain
            );
        }
    }

    if dump_map {
        let mut bytes = Vec::new();
        write_name_map(table, &interned, &mut bytes, WireVersion::Hashed)?;
        for line in bytes.chunks(16) {
            println!("{}", line.iter().map(|b| format!("{b:02x}")).join(" "));
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_and_texts_are_separated() {
        let options = parse_args(&["Rocket_17", "--case-preserving", "Door"]).unwrap();
        assert!(options.config.case_preserving);
        assert!(!options.dump_map);
        assert_eq!(options.texts, ["Rocket_17", "Door"]);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert_eq!(parse_args(&["--dump-map", "--bogus", "Foo"]).err(), Some("--bogus"));
    }

    #[test]
    fn bad_invocations_fail() {
        assert_eq!(launch(&["--bogus", "Foo"]).unwrap(), ExitCode::FAILURE);
        assert_eq!(launch(&[]).unwrap(), ExitCode::FAILURE);
    }
}
