use std::{env, fs, path::PathBuf, process::ExitCode};

use tracing_subscriber::EnvFilter;
use yaml_errors::{emit, load, ConstructError, Error, FieldKind, Schema, TypeError};

#[derive(Debug, Default)]
struct CheckOptions {
    schema: Schema,
    emit_yaml: bool,
    legacy: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    if args.len() < 2 {
        print_usage();
        return Err("not enough arguments".to_string());
    }
    if matches!(args[1].as_str(), "-h" | "--help") {
        print_usage();
        return Ok(());
    }

    let file = PathBuf::from(&args[1]);
    let options = parse_options(&args[2..])?;
    let input = fs::read(&file).map_err(|e| format!("failed to read '{}': {e}", file.display()))?;

    match load(&input, &options.schema) {
        Ok(value) => {
            let output = if options.emit_yaml {
                emit(&value).map_err(|e| e.to_string())?
            } else {
                serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?
            };
            println!("{}", output.trim_end());
            Ok(())
        }
        Err(err) if options.legacy => Err(legacy_report(&err)),
        Err(err) => Err(err.to_string()),
    }
}

/// Formats `err` the way callers of the older error shapes expect.
fn legacy_report(err: &Error) -> String {
    if let Some(type_error) = err.view_as::<TypeError>() {
        return type_error.to_string();
    }
    if let Some(construct_error) = err.view_as::<ConstructError>() {
        return construct_error.to_string();
    }
    err.to_string()
}

fn parse_options(args: &[String]) -> Result<CheckOptions, String> {
    let mut options = CheckOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--schema" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| "--schema requires a file".to_string())?;
                let text = fs::read_to_string(path)
                    .map_err(|e| format!("failed to read '{path}': {e}"))?;
                let loaded = Schema::from_json(&text)
                    .map_err(|e| format!("invalid schema '{path}': {e}"))?;
                options.schema.fields.extend(loaded.fields);
                options.schema.strict |= loaded.strict;
                i += 2;
            }
            "--field" => {
                let spec = args
                    .get(i + 1)
                    .ok_or_else(|| "--field requires <path>:<kind>".to_string())?;
                let (path, kind, required) = parse_field(spec)?;
                options.schema = if required {
                    options.schema.required(path, kind)
                } else {
                    options.schema.field(path, kind)
                };
                i += 2;
            }
            "--strict" => {
                options.schema.strict = true;
                i += 1;
            }
            "--yaml" => {
                options.emit_yaml = true;
                i += 1;
            }
            "--legacy" => {
                options.legacy = true;
                i += 1;
            }
            other => return Err(format!("unknown option '{other}'")),
        }
    }

    Ok(options)
}

/// Parses `<path>:<kind>`, with a trailing `!` marking the field required.
fn parse_field(spec: &str) -> Result<(String, FieldKind, bool), String> {
    let (path, kind) = spec
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid field '{spec}', expected <path>:<kind>"))?;
    let (kind, required) = match kind.strip_suffix('!') {
        Some(kind) => (kind, true),
        None => (kind, false),
    };
    if path.is_empty() {
        return Err(format!("invalid field '{spec}', path is empty"));
    }
    Ok((path.to_string(), kind.parse::<FieldKind>()?, required))
}

fn print_usage() {
    eprintln!(
        "usage: yaml-check <file> [--schema <schema.json>] [--field <path>:<kind>[!]]... \
         [--strict] [--yaml] [--legacy]"
    );
    eprintln!("kinds: any, null, bool, int, float, str, map, seq");
}

#[cfg(test)]
mod tests {
    use yaml_errors::FieldKind;

    use super::parse_field;

    #[test]
    fn parses_field_specs() {
        assert_eq!(
            parse_field("server.port:int!").unwrap(),
            ("server.port".to_string(), FieldKind::Int, true)
        );
        assert_eq!(
            parse_field("name:str").unwrap(),
            ("name".to_string(), FieldKind::Str, false)
        );
        assert!(parse_field("name").is_err());
        assert!(parse_field("name:text").is_err());
    }
}
