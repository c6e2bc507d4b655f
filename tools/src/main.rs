//! purse-runner: headless driver for a currency purse.
//!
//! Usage:
//!   purse-runner --db purse.db --purse hero --save-ticks 5
//!   purse-runner --json hero.json --config purse.json
//!
//! Reads one JSON command per line on stdin and answers each with the
//! purse state as one JSON line on stdout.

use anyhow::Result;
use purse_core::{
    file_store::JsonFileAdapter, store::SqliteAdapter, CurrencyPurse, Level, PersistenceAdapter,
    PurseConfig,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Add { amount: f64, level: Level },
    Subtract { amount: f64, level: Level },
    ForceSave,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    amount:        f64,
    level:         Level,
    display:       String,
    pending_ticks: u32,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let purse_id = flag_value(&args, "--purse").unwrap_or("default");
    let json_path = flag_value(&args, "--json");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => PurseConfig::load(path)?,
        None => PurseConfig::default(),
    };
    config.save_ticks = parse_arg(&args, "--save-ticks", config.save_ticks);

    let adapter: Box<dyn PersistenceAdapter> = match json_path {
        Some(path) => {
            log::info!("purse-runner: json file {path}");
            Box::new(JsonFileAdapter::new(path))
        }
        None => {
            log::info!("purse-runner: sqlite {db}, purse {purse_id}");
            let store = SqliteAdapter::open(db, purse_id)?;
            store.migrate()?;
            Box::new(store)
        }
    };

    let purse = CurrencyPurse::new(adapter, config)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(purse, stdin.lock(), &mut stdout.lock())?;
    Ok(())
}

/// Drive `purse` until `quit` or end of input, then close it so
/// pending ticks are flushed. Returns the adapter.
fn run_session<A: PersistenceAdapter>(
    mut purse: CurrencyPurse<A>,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<A> {
    run_ipc_loop(&mut purse, input, output)?;
    Ok(purse.close()?)
}

fn run_ipc_loop<A: PersistenceAdapter>(
    purse: &mut CurrencyPurse<A>,
    mut input: impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = input.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(output, &e.to_string())?;
                continue;
            }
        };

        let outcome = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Ok(()),
            IpcCommand::Add { amount, level } => purse.add(amount, level),
            IpcCommand::Subtract { amount, level } => purse.subtract(amount, level),
            IpcCommand::ForceSave => purse.force_save(),
        };

        match outcome {
            Ok(()) => writeln!(output, "{}", serde_json::to_string(&build_ui_state(purse)?)?)?,
            Err(e) => {
                log::warn!("purse-runner: {e}");
                write_error(output, &e.to_string())?;
                continue;
            }
        }
        output.flush()?;
    }
    Ok(())
}

fn build_ui_state<A: PersistenceAdapter>(purse: &CurrencyPurse<A>) -> Result<UiState> {
    let snapshot = purse.snapshot()?;
    Ok(UiState {
        amount:        snapshot.amount,
        level:         snapshot.level,
        display:       purse.to_string(),
        pending_ticks: purse.pending_ticks(),
    })
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{err_json}")?;
    out.flush()?;
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use purse_core::MemoryAdapter;
    use serde_json::Value;

    fn run_script(script: &str, save_ticks: u32) -> (Vec<Value>, MemoryAdapter) {
        let config = PurseConfig::default().with_save_ticks(save_ticks);
        let purse = CurrencyPurse::new(MemoryAdapter::new(), config).unwrap();
        let mut output = Vec::new();
        let adapter = run_session(purse, script.as_bytes(), &mut output).unwrap();

        let lines = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).expect("every output line is JSON"))
            .collect();
        (lines, adapter)
    }

    #[test]
    fn script_reports_errors_and_keeps_going() {
        let script = r#"this is not json
{"type":"add","amount":5,"level":"K"}
{"type":"subtract","amount":-1,"level":"none"}
{"type":"force_save"}
{"type":"add","amount":1,"level":"none"}
{"type":"quit"}
{"type":"add","amount":100,"level":"K"}
"#;
        let (lines, adapter) = run_script(script, 10);
        assert_eq!(lines.len(), 5, "unexpected output: {lines:?}");

        assert!(lines[0]["error"].is_string());

        assert_eq!(lines[1]["amount"], 5.0);
        assert_eq!(lines[1]["level"], "K");
        assert_eq!(lines[1]["display"], "5.00K");
        assert_eq!(lines[1]["pending_ticks"], 1);

        let rejected = lines[2]["error"].as_str().unwrap();
        assert!(rejected.contains("Invalid transaction amount"), "got {rejected}");

        assert_eq!(lines[3]["pending_ticks"], 0);

        assert!((lines[4]["amount"].as_f64().unwrap() - 5.001).abs() < 1e-9);
        assert_eq!(lines[4]["pending_ticks"], 1);

        // force_save, then the flush on close; the line after quit never ran.
        assert_eq!(adapter.save_count(), 2);
        assert_eq!(adapter.state.level, Level::K);
        assert!((adapter.state.amount - 5.001).abs() < 1e-9);
    }

    #[test]
    fn end_of_input_closes_the_purse() {
        let script = "{\"type\":\"add\",\"amount\":3,\"level\":\"M\"}\n\n{\"type\":\"get_state\"}\n";
        let (lines, adapter) = run_script(script, 10);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["level"], "M");
        assert_eq!(lines[1]["pending_ticks"], 1);
        assert_eq!(adapter.save_count(), 1);
        assert_eq!(adapter.last_save().unwrap().amount, 3.0);
    }

    #[test]
    fn flag_values_are_read_from_pairs() {
        let args: Vec<String> = ["purse-runner", "--purse", "hero", "--save-ticks", "4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(flag_value(&args, "--purse"), Some("hero"));
        assert_eq!(flag_value(&args, "--db"), None);
        assert_eq!(parse_arg(&args, "--save-ticks", 1u32), 4);
        assert_eq!(parse_arg(&args, "--missing", 7u32), 7);
    }
}
