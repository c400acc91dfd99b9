use directories::ProjectDirs;
use log::{info, warn};
use reckon_rs::engine::{FunctionEntry, FunctionKind};
use reckon_rs::session::{History, HistoryEntry, KeyOutcome, Session};
use reckon_rs::{Calculator, Config};
use std::io::{self, BufRead, Write};

fn open_memory(config: &Config) -> History {
    let Some(path) = &config.memory_path else {
        return History::in_memory();
    };

    match History::open(path) {
        Ok(memory) => {
            info!("Loaded {} saved results from {}", memory.len(), path.display());
            memory
        }
        Err(err) => {
            warn!("Cannot open memory at {}: {}", path.display(), err);
            History::in_memory()
        }
    }
}

fn describe_function(entry: &FunctionEntry) -> String {
    match entry.kind() {
        FunctionKind::Builtin { arity, .. } => format!("{}/{}", entry.name(), arity),
        FunctionKind::UserDefined { parameters, body } => format!(
            "{}({}) = {}",
            entry.name(),
            parameters.join(" "),
            body.join()
        ),
    }
}

fn list_entries<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> String {
    entries
        .map(|entry| format!("{}  {} = {}", entry.id, entry.input, entry.result))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `:def name p1 p2 = body...`
fn define(session: &Session, args: &[&str]) -> Result<String, String> {
    let Some(split) = args.iter().position(|arg| *arg == "=") else {
        return Err("usage: :def name params... = body...".to_string());
    };
    let (head, body) = (&args[..split], &args[split + 1..]);
    let Some((name, parameters)) = head.split_first() else {
        return Err("missing function name".to_string());
    };
    if body.is_empty() {
        return Err("missing function body".to_string());
    }

    let entry = session
        .calculator()
        .define(name, parameters.iter().copied(), body);
    Ok(format!("defined {}", describe_function(&entry)))
}

fn command(session: &mut Session, line: &str) -> Result<String, String> {
    let mut atoms = line.split_whitespace();
    let name = atoms.next().unwrap_or_default();
    let args: Vec<&str> = atoms.collect();

    match name {
        ":def" => define(session, &args),
        ":fns" => {
            let registry = session.calculator().registry();
            let registry = registry.read();
            Ok(registry
                .names()
                .iter()
                .filter_map(|name| registry.lookup(name))
                .map(describe_function)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        ":rpn" => Ok(session.calculator().convert(args.as_slice()).join(" ")),
        ":hist" => Ok(list_entries(session.history().iter())),
        ":mem" => Ok(list_entries(session.memory().iter())),
        ":save" => {
            let id = args.first().ok_or("usage: :save id")?;
            match session.save_to_memory(id) {
                Ok(true) => Ok(format!("saved {}", id)),
                Ok(false) => Err(format!("nothing to save for {}", id)),
                Err(err) => Err(err.to_string()),
            }
        }
        ":del" => {
            let removed = match args.first() {
                Some(id) => session.remove(id),
                None => session.remove_last(),
            };
            match removed {
                Ok(Some(entry)) => Ok(format!("deleted {}  {}", entry.id, entry.input)),
                Ok(None) => Err("no such entry".to_string()),
                Err(err) => Err(err.to_string()),
            }
        }
        ":recall" => {
            let id = args.first().ok_or("usage: :recall id")?;
            session
                .recall(id)
                .map(|result| format!("{} = {}", session.input().display(), result))
                .ok_or_else(|| format!("no entry {}", id))
        }
        _ => Err(format!("unknown command {}", name)),
    }
}

fn describe(session: &Session, outcome: KeyOutcome) -> Option<String> {
    match outcome {
        KeyOutcome::Preview(value) => Some(format!("{}  ({})", session.input().display(), value)),
        KeyOutcome::Evaluated(value) => Some(format!("= {}", value)),
        KeyOutcome::Failed(err) => Some(format!("Error! {}", err)),
        KeyOutcome::Idle if session.input().is_empty() => None,
        KeyOutcome::Idle => Some(session.input().display()),
    }
}

fn main() -> io::Result<()> {
    pretty_env_logger::init();

    let mut config = Config::from_env();
    if config.memory_path.is_none() {
        if let Some(dirs) = ProjectDirs::from("", "", "reckon") {
            config = config.with_memory_path(dirs.data_dir().join("memory.json"));
        }
    }

    let calculator = Calculator::with_config(&config);
    let mut session = Session::new(calculator, open_memory(&config));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(':') {
            match command(&mut session, line) {
                Ok(output) if output.is_empty() => {}
                Ok(output) => writeln!(stdout, "{}", output)?,
                Err(err) => writeln!(stdout, "Error! {}", err)?,
            }
            continue;
        }

        let mut last = KeyOutcome::Idle;
        for atom in line.split_whitespace() {
            match session.press(atom) {
                Ok(outcome) => last = outcome,
                Err(err) => {
                    warn!("History not saved: {}", err);
                    last = KeyOutcome::Idle;
                }
            }
        }
        if let Some(output) = describe(&session, last) {
            writeln!(stdout, "{}", output)?;
        }
    }

    Ok(())
}
