use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tracker_cli::cli::{
    Cli, Command, ListScope, collect_overrides, expand_alias, split_command_line,
};
use tracker_cli::render::{self, Output};
use tracker_core::config::{self, Config, merge_overrides, palette_for_theme};
use tracker_core::error::AppError;
use tracker_core::model::ServiceType;
use tracker_core::storage::json_store;
use tracker_core::store::TaskStore;

const LOG_ENV_VAR: &str = "TRACKER_LOG";

/// The open store and the file it was opened from.
///
/// Interactive mode keeps one session for its whole run and only reopens
/// when a command points at a different store file.
struct Session {
    path: PathBuf,
    store: TaskStore,
}

impl Session {
    fn open(path: PathBuf) -> Result<Self, AppError> {
        let store = TaskStore::open_file(&path)?;
        tracing::debug!(path = %path.display(), tasks = store.len(), "opened store");
        Ok(Self { path, store })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn load_base_config() -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: config ignored: {}", err);
    }
    loaded.config
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn resolve(cli: &Cli, base: &Config) -> Result<(Config, PathBuf), AppError> {
    let overrides = collect_overrides(&cli.config_override)?;
    let config = merge_overrides(base, &overrides);
    let path = json_store::store_path(config.store_path.as_deref())?;
    Ok((config, path))
}

fn execute(store: &mut TaskStore, command: Command, output: &Output) -> Result<(), AppError> {
    match command {
        Command::Add {
            name,
            service,
            description,
        } => {
            let service_type = ServiceType::parse(&service)?;
            let task = store.create(
                name.as_deref().unwrap_or_default(),
                service_type,
                description.as_deref().unwrap_or_default(),
            )?;
            if output.json {
                println!("{}", render::task_json(&task)?);
            } else {
                println!("Added task: {} ({})", task.name, task.id);
            }
        }
        Command::Done { id } => match store.complete(&id)? {
            Some(task) if output.json => println!("{}", render::task_json(&task)?),
            Some(task) => println!("Completed task: {} ({})", task.name, task.id),
            None => println!("No pending task with id {}", id.trim()),
        },
        Command::Remarks { id, text } => {
            match store.update_remarks(&id, text.as_deref().unwrap_or_default())? {
                Some(task) if output.json => println!("{}", render::task_json(&task)?),
                Some(task) => println!("Updated remarks: {} ({})", task.name, task.id),
                None => println!("No pending task with id {}", id.trim()),
            }
        }
        Command::Remove { id } => match store.remove(&id)? {
            Some(task) if output.json => println!("{}", render::task_json(&task)?),
            Some(task) => println!("Removed task: {} ({})", task.name, task.id),
            None => println!("No task with id {}", id.trim()),
        },
        Command::Show { id } => {
            let task = store.get(&id)?;
            if output.json {
                println!("{}", render::task_json(task)?);
            } else {
                println!("{}", output.task_detail(task));
            }
        }
        Command::List { scope } => {
            let pending = match scope {
                ListScope::Completed => Vec::new(),
                _ => store.pending(),
            };
            let completed = match scope {
                ListScope::Pending => Vec::new(),
                _ => store.completed(),
            };

            if output.json {
                println!("{}", render::tasks_json(&pending, &completed)?);
            } else {
                let mut sections = Vec::new();
                if scope != ListScope::Completed {
                    sections.push(output.task_table("Pending", &pending, false));
                }
                if scope != ListScope::Pending {
                    sections.push(output.task_table("Completed", &completed, true));
                }
                println!("{}", sections.join("\n\n"));
            }
        }
        Command::Export { output: target } => {
            let document = store.export_snapshot()?;
            if target.as_os_str() == "-" {
                println!("{document}");
            } else {
                std::fs::write(&target, document)
                    .map_err(|err| AppError::io(format!("{}: {}", target.display(), err)))?;
                if output.json {
                    println!("{}", render::export_json(&target, store.len())?);
                } else {
                    println!("Exported {} tasks to {}", store.len(), target.display());
                }
            }
        }
        Command::Import { path } => {
            let document = std::fs::read_to_string(&path)
                .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
            store.import_snapshot(&document)?;
            if output.json {
                println!("{}", render::tasks_json(&store.pending(), &store.completed())?);
            } else {
                println!("Data imported successfully.");
            }
        }
        Command::Services => {
            if output.json {
                let names: Vec<String> = ServiceType::KNOWN
                    .iter()
                    .map(ServiceType::to_string)
                    .collect();
                println!("{}", serde_json::Value::from(names));
            } else {
                for service_type in ServiceType::KNOWN.iter() {
                    if service_type.requires_description() {
                        let note = output.palette.mutedize("(requires --description)");
                        println!("{service_type} {note}");
                    } else {
                        println!("{service_type}");
                    }
                }
            }
        }
    }

    Ok(())
}

fn run_command(cli: Cli, base: &Config) -> Result<(), AppError> {
    let (config, path) = resolve(&cli, base)?;
    let output = Output::new(cli.json, palette_for_theme(config.theme.as_deref()));
    let mut session = Session::open(path)?;
    execute(&mut session.store, cli.command, &output)
}

/// Runs one interactive line. Overrides given on a line stay in effect for
/// the rest of the session.
fn run_line(
    line: &str,
    config: &mut Config,
    session: &mut Option<Session>,
) -> Result<(), AppError> {
    let args = expand_alias(split_command_line(line)?, &config.aliases)?;
    if args.is_empty() {
        return Ok(());
    }

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("tracker".to_string());
    argv.extend(args);

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => {
            err.print().map_err(|err| AppError::io(err.to_string()))?;
            return Ok(());
        }
        Err(err) => return Err(normalize_parse_error(err)),
    };
    let (merged, path) = resolve(&cli, config)?;
    let output = Output::new(cli.json, palette_for_theme(merged.theme.as_deref()));
    *config = merged;

    let current = match session.take() {
        Some(open) if open.path == path => open,
        _ => Session::open(path)?,
    };
    let current = session.insert(current);
    execute(&mut current.store, cli.command, &output)
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    let mut config = base.clone();
    let mut session = None;

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        if let Err(err) = run_line(line, &mut config, &mut session) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();
    let base = load_base_config();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        if let Err(err) = run_interactive(&base) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let args = match expand_alias(args, &base.aliases) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    let cli = match Cli::try_parse_from(std::iter::once("tracker".to_string()).chain(args)) {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli, &base) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
