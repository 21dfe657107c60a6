use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use tracker_core::config::{ConfigOverrides, canonical_key};
use tracker_core::error::AppError;

/// Suggested name of an exported snapshot.
pub const DEFAULT_EXPORT_FILE: &str = "todo_data.json";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new service request
    ///
    /// Example: tracker add "Alice" --service cleaning
    /// Example: tracker add "Bob" --service other --description "Fix the fence"
    Add {
        name: Option<String>,
        #[arg(short = 's', long = "service", value_name = "TYPE")]
        service: String,
        /// Required when the service type is Other
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// Mark a pending request as completed
    ///
    /// Example: tracker done 3f2c...
    Done { id: String },
    /// Replace the remarks of a pending request
    ///
    /// Example: tracker remarks 3f2c... "Call before arriving"
    /// Example: tracker remarks 3f2c... (clears the remarks)
    Remarks { id: String, text: Option<String> },
    /// Remove a request, pending or completed
    ///
    /// Example: tracker remove 3f2c...
    Remove { id: String },
    /// Show details of a request
    ///
    /// Example: tracker show 3f2c...
    Show { id: String },
    /// List requests
    ///
    /// Example: tracker list
    /// Example: tracker list pending
    List {
        #[arg(value_enum, default_value_t = ListScope::All)]
        scope: ListScope,
    },
    /// Export every request to a JSON file
    ///
    /// Example: tracker export
    /// Example: tracker export --output backup.json
    /// Example: tracker export --output - (writes to stdout)
    Export {
        #[arg(short = 'o', long, value_name = "PATH", default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
    /// Replace every request with the contents of an exported file
    ///
    /// Example: tracker import todo_data.json
    Import { path: PathBuf },
    /// List the available service types
    Services,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Pending,
    Completed,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
    StorePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonical_key(field);
    if canonical_field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    match (canonical_field.as_str(), remainder) {
        ("theme", None) => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::Theme,
            value,
        }),
        ("store_path", None) => {
            if value.is_empty() {
                Err("store_path override cannot be empty".to_string())
            } else {
                Ok(ParsedConfigOverride {
                    target: ConfigOverrideTarget::StorePath,
                    value,
                })
            }
        }
        ("theme" | "store_path", Some(_)) => {
            Err(format!("{canonical_field} override cannot have subfields"))
        }
        ("aliases" | "alias", _) => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            })
        }
        (other, _) => Err(format!("unknown config field '{other}'")),
    }
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value));
            }
        }
    }
    Ok(overrides)
}

/// Replaces a leading alias with the words it stands for. Expansion is not
/// repeated on the result.
pub fn expand_alias(
    args: Vec<String>,
    aliases: &HashMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let Some(expansion) = args.first().and_then(|first| aliases.get(first)) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(expansion)?;
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}

/// Splits a command line on whitespace, honouring double quotes and `\"`
/// escapes inside them.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}
