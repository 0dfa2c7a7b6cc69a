//! Purpose: Execute conformance manifests against the `Nullable` document and storage bindings.
//! Exports: None (binary entry point).
//! Role: Reference runner for JSON conformance manifests.
//! Invariants: Manifests are JSON-only; cases execute in order; fail-fast on the first mismatch.
//! Invariants: Cases target `Nullable<serde_json::Map<String, Value>>` (object records).
//! Invariants: `--sqlite` round-trips store/scan cases through an in-memory SQLite table.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use nullable::api::{Error, ErrorKind, Nullable, StorageBinding, StorageValue};
use rusqlite::Connection;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

type Doc = Nullable<Map<String, Value>>;

#[derive(Parser, Debug)]
#[command(name = "nullable-conformance", about = "Run nullable conformance manifests")]
struct Cli {
    /// Path to a conformance manifest (JSON).
    manifest: PathBuf,
    /// Also round-trip store/scan cases through an in-memory SQLite table.
    #[arg(long)]
    sqlite: bool,
    /// Suppress the per-run summary line.
    #[arg(long, short)]
    quiet: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(count) => {
            if !cli.quiet {
                println!("ok: {count} cases");
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<usize, String> {
    let content = fs::read_to_string(&cli.manifest)
        .map_err(|err| format!("failed to read manifest: {err}"))?;
    let manifest: Value = serde_json::from_str(&content)
        .map_err(|err| format!("failed to parse manifest json: {err}"))?;

    let version = manifest
        .get("conformance_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| "missing conformance_version".to_string())?;
    if version != 0 {
        return Err(format!("unsupported conformance_version: {version}"));
    }

    let cases = manifest
        .get("cases")
        .and_then(Value::as_array)
        .ok_or_else(|| "manifest cases must be an array".to_string())?;

    let db = if cli.sqlite {
        Some(open_db().map_err(|err| format!("failed to open sqlite: {err}"))?)
    } else {
        None
    };

    for (index, case) in cases.iter().enumerate() {
        let case_id = case.get("id").and_then(Value::as_str).map(str::to_string);
        let op = case
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| case_err(index, &case_id, "missing op"))?;
        tracing::debug!(index, op, "running case");
        let result = match op {
            "decode" => run_decode(case),
            "encode" => run_encode(case),
            "store" => run_store(case, db.as_ref()),
            "scan" => run_scan(case, db.as_ref()),
            _ => Err(format!("unknown op: {op}")),
        };
        result.map_err(|err| case_err(index, &case_id, &err))?;
    }

    Ok(cases.len())
}

fn open_db() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute("CREATE TABLE slots (id INTEGER PRIMARY KEY, doc)", [])?;
    Ok(conn)
}

fn run_decode(case: &Value) -> Result<(), String> {
    let document = input(case)?
        .get("document")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing input.document".to_string())?;
    let mut doc = Doc::null();
    let result = doc.unmarshal_json(document.as_bytes());
    expect_outcome(expect(case)?, &doc, result.map_err(|err| err.kind()))
}

fn run_encode(case: &Value) -> Result<(), String> {
    let doc = doc_from_input(input(case)?)?;
    let output = doc
        .marshal_json()
        .map_err(|err| format!("encode failed: {err}"))?;
    let expected = expect(case)?
        .get("output")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing expect.output".to_string())?;
    if output != expected.as_bytes() {
        return Err(format!(
            "expected output {expected}, got {}",
            String::from_utf8_lossy(&output)
        ));
    }
    Ok(())
}

fn run_store(case: &Value, db: Option<&Connection>) -> Result<(), String> {
    let doc = doc_from_input(input(case)?)?;
    let stored = doc
        .to_storage_value()
        .map_err(|err| format!("store failed: {err}"))?;
    let expected = expect(case)?
        .get("storage")
        .ok_or_else(|| "missing expect.storage".to_string())
        .and_then(storage_from_value)?;
    if stored != expected {
        return Err(format!("expected storage {expected:?}, got {stored:?}"));
    }

    if let Some(conn) = db {
        let read_back = sqlite_round_trip(conn, &doc).map_err(|err| format!("sqlite: {err}"))?;
        if read_back != doc {
            return Err(format!("sqlite round trip mismatch: {read_back:?} vs {doc:?}"));
        }
    }
    Ok(())
}

fn run_scan(case: &Value, db: Option<&Connection>) -> Result<(), String> {
    let storage = input(case)?
        .get("storage")
        .ok_or_else(|| "missing input.storage".to_string())
        .and_then(storage_from_value)?;
    let expect = expect(case)?;

    let mut doc = Doc::from_value(Map::new());
    let result = doc.scan_storage_value(&storage);
    expect_outcome(expect, &doc, result.map_err(|err| err.kind()))?;

    if let Some(conn) = db {
        let (doc, outcome) = sqlite_scan(conn, &storage).map_err(|err| format!("sqlite: {err}"))?;
        expect_outcome(expect, &doc, outcome).map_err(|err| format!("sqlite: {err}"))?;
    }
    Ok(())
}

fn sqlite_round_trip(conn: &Connection, doc: &Doc) -> rusqlite::Result<Doc> {
    conn.execute("DELETE FROM slots", [])?;
    conn.execute("INSERT INTO slots (id, doc) VALUES (1, ?1)", [doc])?;
    conn.query_row("SELECT doc FROM slots WHERE id = 1", [], |row| row.get(0))
}

fn sqlite_scan(
    conn: &Connection,
    storage: &StorageValue,
) -> rusqlite::Result<(Doc, Result<(), ErrorKind>)> {
    conn.execute("DELETE FROM slots", [])?;
    conn.execute("INSERT INTO slots (id, doc) VALUES (1, ?1)", [storage])?;
    let read = conn.query_row("SELECT doc FROM slots WHERE id = 1", [], |row| {
        row.get::<_, Doc>(0)
    });
    match read {
        Ok(doc) => Ok((doc, Ok(()))),
        Err(err) => match scan_error_kind(&err) {
            Some(kind) => Ok((Doc::null(), Err(kind))),
            None => Err(err),
        },
    }
}

fn scan_error_kind(err: &rusqlite::Error) -> Option<ErrorKind> {
    match err {
        rusqlite::Error::InvalidColumnType(..) => Some(ErrorKind::StorageType),
        rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
            source.downcast_ref::<Error>().map(Error::kind)
        }
        _ => None,
    }
}

fn expect_outcome(
    expect: &Value,
    doc: &Doc,
    outcome: Result<(), ErrorKind>,
) -> Result<(), String> {
    let expected_error = match expect.get("error").and_then(Value::as_str) {
        Some(label) => Some(
            ErrorKind::from_label(label).ok_or_else(|| format!("unknown error label: {label}"))?,
        ),
        None => None,
    };
    match (expected_error, outcome) {
        (None, Ok(())) => {}
        (Some(expected), Err(actual)) if expected == actual => {}
        (expected, actual) => {
            return Err(format!("expected error {expected:?}, got {actual:?}"));
        }
    }

    if let Some(valid) = expect.get("valid").and_then(Value::as_bool) {
        if doc.is_valid() != valid {
            return Err(format!("expected valid={valid}, got valid={}", doc.is_valid()));
        }
    }
    if let Some(value) = expect.get("value") {
        let actual = Value::Object(doc.value_or_zero());
        if &actual != value {
            return Err(format!("expected value {value}, got {actual}"));
        }
    }
    Ok(())
}

fn doc_from_input(input: &Value) -> Result<Doc, String> {
    let valid = input
        .get("valid")
        .and_then(Value::as_bool)
        .ok_or_else(|| "missing input.valid".to_string())?;
    let value = match input.get("value") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err("input.value must be an object".to_string()),
    };
    Ok(Doc::new(value, valid))
}

fn storage_from_value(value: &Value) -> Result<StorageValue, String> {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| "storage.kind must be a string".to_string())?;
    let field = |name: &str| {
        value
            .get(name)
            .ok_or_else(|| format!("storage.{name} missing for kind {kind}"))
    };
    match kind {
        "null" => Ok(StorageValue::Null),
        "text" => field("text")?
            .as_str()
            .map(|text| StorageValue::Text(text.to_string()))
            .ok_or_else(|| "storage.text must be a string".to_string()),
        "blob" => field("text")?
            .as_str()
            .map(|text| StorageValue::Blob(text.as_bytes().to_vec()))
            .ok_or_else(|| "storage.text must be a string".to_string()),
        "integer" => field("integer")?
            .as_i64()
            .map(StorageValue::Integer)
            .ok_or_else(|| "storage.integer must be an i64".to_string()),
        "real" => field("real")?
            .as_f64()
            .map(StorageValue::Real)
            .ok_or_else(|| "storage.real must be a number".to_string()),
        _ => Err(format!("unknown storage kind: {kind}")),
    }
}

fn input(case: &Value) -> Result<&Value, String> {
    case.get("input").ok_or_else(|| "missing input".to_string())
}

fn expect(case: &Value) -> Result<&Value, String> {
    case.get("expect").ok_or_else(|| "missing expect".to_string())
}

fn case_err(index: usize, case_id: &Option<String>, message: &str) -> String {
    match case_id {
        Some(id) => format!("case {index} ({id}): {message}"),
        None => format!("case {index}: {message}"),
    }
}
