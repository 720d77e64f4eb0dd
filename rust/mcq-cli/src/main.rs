//! mcq: CLI for the choice shuffling and masking engine.
//!
//! Subcommands:
//! - render   build (or restore) a question instance and print its display order
//! - resolve  translate submitted tokens back to original choice ids
//! - inspect  dump the token -> id table of a stored instance

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use mcq_core::{ChoiceGroup, EngineConfig, GroupDefinition, LookupError, Seed};
use mcq_logging::{
    hash_config_bytes, now_ms, read_json, write_json_atomic, EventLog, PartitionSizesV1,
    RenderEventV1, ResolveEventV1, VersionInfoV1,
};

/// Exit code for a submission that does not resolve (bad or stale tokens).
const EXIT_LOOKUP: i32 = 2;

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn take_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => fail(format!("Missing value for {flag}")),
    }
}

/// Config plus the hash stamped on every event.
struct Loaded {
    cfg: EngineConfig,
    config_hash: Option<String>,
}

fn load_config(path: Option<&str>) -> Loaded {
    match path {
        None => Loaded {
            cfg: EngineConfig::default(),
            config_hash: None,
        },
        Some(p) => {
            let bytes = std::fs::read(p)
                .unwrap_or_else(|e| fail(format!("Failed to read config {p}: {e}")));
            let cfg = EngineConfig::from_yaml_bytes(&bytes)
                .unwrap_or_else(|e| fail(format!("Invalid config {p}: {e}")));
            Loaded {
                cfg,
                config_hash: Some(hash_config_bytes(&bytes)),
            }
        }
    }
}

fn open_events(explicit: Option<&str>, cfg: &EngineConfig) -> EventLog {
    let path = explicit
        .map(PathBuf::from)
        .or_else(|| cfg.logging.events_path.as_ref().map(PathBuf::from));
    EventLog::open(path.as_deref(), cfg.logging.flush_every_lines)
        .unwrap_or_else(|e| fail(format!("Failed to open event log: {e}")))
}

fn emit<T: serde::Serialize>(log: &mut EventLog, event: &T) {
    // Event logging never changes the command's outcome.
    if let Err(e) = log.emit(event) {
        eprintln!("warning: failed to write event: {e}");
    }
}

fn load_state(path: &Path) -> ChoiceGroup {
    read_json::<ChoiceGroup>(path)
        .unwrap_or_else(|e| fail(format!("Failed to load state {}: {e}", path.display())))
}

fn cmd_render(args: &[String]) {
    let mut question: Option<String> = None;
    let mut seed: Option<Seed> = None;
    let mut config_path: Option<String> = None;
    let mut state_path: Option<String> = None;
    let mut events_path: Option<String> = None;
    let mut json = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"mcq render

USAGE:
    mcq render --question q.yaml --seed S [--state state.json] [--config cfg.yaml] [--events events.ndjson] [--json]

OPTIONS:
    --question PATH   Question definition (YAML or JSON); not needed when --state exists
    --seed S          Per-attempt seed; 64-bit integers are numeric seeds, non-numeric input a text seed
    --state PATH      Instance state file: restored if present, written after rendering
    --config PATH     Engine config (YAML)
    --events PATH     Append NDJSON events here (overrides logging.events_path)
    --json            Print a JSON document instead of tab-separated lines
"#
                );
                return;
            }
            "--question" => {
                question = Some(take_value(args, i, "--question"));
                i += 2;
            }
            "--seed" => {
                let raw = take_value(args, i, "--seed");
                seed = Some(Seed::parse_lossless(&raw).unwrap_or_else(|e| fail(e)));
                i += 2;
            }
            "--config" => {
                config_path = Some(take_value(args, i, "--config"));
                i += 2;
            }
            "--state" => {
                state_path = Some(take_value(args, i, "--state"));
                i += 2;
            }
            "--events" => {
                events_path = Some(take_value(args, i, "--events"));
                i += 2;
            }
            "--json" => {
                json = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown option for `mcq render`: {other}");
                eprintln!("Run `mcq render --help` for usage.");
                process::exit(1);
            }
        }
    }

    let loaded = load_config(config_path.as_deref());
    let mut log = open_events(events_path.as_deref(), &loaded.cfg);

    let state_file = state_path.as_deref().map(Path::new);
    let group = match state_file {
        Some(p) if p.exists() => {
            let g = load_state(p);
            if let Some(s) = &seed {
                if s != g.seed() {
                    fail(format!(
                        "State {} belongs to seed {}, not {s}",
                        p.display(),
                        g.seed()
                    ));
                }
            }
            g
        }
        _ => {
            let Some(q) = question else {
                fail("--question is required (no existing --state to restore)");
            };
            let Some(s) = seed else {
                fail("--seed is required (no existing --state to restore)");
            };
            let text = std::fs::read_to_string(&q)
                .unwrap_or_else(|e| fail(format!("Failed to read question {q}: {e}")));
            let def = GroupDefinition::from_yaml(&text)
                .unwrap_or_else(|e| fail(format!("Invalid question {q}: {e}")));
            ChoiceGroup::from_definition(&def, s, &loaded.cfg)
                .unwrap_or_else(|e| fail(format!("Invalid question {q}: {e}")))
        }
    };

    let cached = group.rendered().is_some();
    let state = group.render();
    let p = group.partition();
    emit(
        &mut log,
        &RenderEventV1 {
            event: "render",
            ts_ms: now_ms(),
            v: VersionInfoV1::new(mcq_core::VERSION, loaded.config_hash.clone()),
            seed: group.seed().to_string(),
            n_choices: group.len() as u32,
            partition: PartitionSizesV1 {
                head: p.head.len() as u32,
                eligible: p.eligible.len() as u32,
                islands: p.islands.len() as u32,
                tail: p.tail.len() as u32,
            },
            cached,
            masked: state.mask().is_some(),
        },
    );

    let shown = group.display();
    if json {
        let doc = serde_json::json!({
            "seed": group.seed(),
            "masked": state.mask().is_some(),
            "choices": shown
                .iter()
                .map(|d| serde_json::json!({
                    "slot": d.slot,
                    "id": d.visible_id,
                    "content": d.choice.content(),
                }))
                .collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(s) => println!("{s}"),
            Err(e) => fail(format!("Failed to encode output: {e}")),
        }
    } else {
        for d in &shown {
            println!(
                "{}\t{}\t{}",
                d.slot,
                d.visible_id,
                d.choice.content().to_display_string()
            );
        }
    }

    if let Some(p) = state_file {
        write_json_atomic(p, &group)
            .unwrap_or_else(|e| fail(format!("Failed to write state {}: {e}", p.display())));
    }
    if let Err(e) = log.flush() {
        eprintln!("warning: failed to flush events: {e}");
    }
}

fn cmd_resolve(args: &[String]) {
    let mut state_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut events_path: Option<String> = None;
    let mut tokens: Vec<String> = Vec::new();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"mcq resolve

USAGE:
    mcq resolve --state state.json [--config cfg.yaml] [--events events.ndjson] TOKEN...

Prints one original choice id per submitted token. Exits with status 2 if any
token is unknown to the stored instance.
"#
                );
                return;
            }
            "--state" => {
                state_path = Some(take_value(args, i, "--state"));
                i += 2;
            }
            "--config" => {
                config_path = Some(take_value(args, i, "--config"));
                i += 2;
            }
            "--events" => {
                events_path = Some(take_value(args, i, "--events"));
                i += 2;
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown option for `mcq resolve`: {other}");
                eprintln!("Run `mcq resolve --help` for usage.");
                process::exit(1);
            }
            token => {
                tokens.push(token.to_string());
                i += 1;
            }
        }
    }

    let Some(state_path) = state_path else {
        fail("--state is required");
    };
    let loaded = load_config(config_path.as_deref());
    let mut log = open_events(events_path.as_deref(), &loaded.cfg);
    let group = load_state(Path::new(&state_path));

    let result = group.resolve_submission(&tokens);
    emit(
        &mut log,
        &ResolveEventV1 {
            event: "resolve",
            ts_ms: now_ms(),
            v: VersionInfoV1::new(mcq_core::VERSION, loaded.config_hash.clone()),
            n_tokens: tokens.len() as u32,
            ok: result.is_ok(),
            error: result.as_ref().err().map(|e| match e {
                LookupError::UnknownToken { .. } => "unknown_token",
                LookupError::UnknownId { .. } => "unknown_id",
            }),
        },
    );
    if let Err(e) = log.flush() {
        eprintln!("warning: failed to flush events: {e}");
    }

    match result {
        Ok(ids) => {
            for id in ids {
                println!("{id}");
            }
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(EXIT_LOOKUP);
        }
    }
}

fn cmd_inspect(args: &[String]) {
    let mut state_path: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"mcq inspect

USAGE:
    mcq inspect --state state.json

Prints the mask table (token, original id) of a stored instance. Debugging aid:
never feed this output into a student-facing document.
"#
                );
                return;
            }
            "--state" => {
                state_path = Some(take_value(args, i, "--state"));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `mcq inspect`: {other}");
                eprintln!("Run `mcq inspect --help` for usage.");
                process::exit(1);
            }
        }
    }

    let Some(state_path) = state_path else {
        fail("--state is required");
    };
    let group = load_state(Path::new(&state_path));
    println!("seed: {}", group.seed());
    println!("shuffle_done: {}", group.is_shuffle_done());
    match group.render().mask() {
        Some(m) => {
            for e in m.entries() {
                println!("{}\t{}", e.token, e.original_id);
            }
        }
        None => println!("(shuffle disabled; original ids are used directly)"),
    }
}

fn print_help() {
    eprintln!(
        r#"mcq - multiple-choice shuffling and masking

USAGE:
    mcq <COMMAND> [OPTIONS]

COMMANDS:
    render      Render a question instance (display order + visible ids)
    resolve     Resolve submitted tokens to original choice ids
    inspect     Print the mask table of a stored instance

OPTIONS:
    -h, --help          Print this help message
    -V, --version       Print version

Run `mcq <COMMAND> --help` for command options.
Set MCQ_DEBUG_LOG=1 to echo events to stderr.
"#
    );
}

fn print_version() {
    println!("mcq {}", env!("CARGO_PKG_VERSION"));
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        process::exit(0);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_help();
        }
        "-V" | "--version" => {
            print_version();
        }
        "render" => {
            cmd_render(&args[2..]);
        }
        "resolve" => {
            cmd_resolve(&args[2..]);
        }
        "inspect" => {
            cmd_inspect(&args[2..]);
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            process::exit(1);
        }
    }
}
