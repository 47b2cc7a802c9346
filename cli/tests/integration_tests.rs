use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_bookstore-schema");

const LANGUAGE_SEED: &str = r#"
tables:
  - table: book_language
    key: language_code
    columns: [language_code, language_name]
    rows:
      - [en, English]
      - [de, German]
  - table: shipping_method
    key: method_name
    columns: [method_name, cost]
    rows:
      - [Standard, 5.00]
"#;

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("failed to run bookstore-schema")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn migrate(op: &str, db: &Path, extra: &[&str]) -> Output {
    let mut args = vec!["migrate", op, "--db", db.to_str().unwrap()];
    args.extend_from_slice(extra);
    run(&args)
}

fn write_seed(dir: &Path) -> PathBuf {
    let path = dir.join("lookups.yaml");
    fs::write(&path, LANGUAGE_SEED).expect("failed to write seed");
    path
}

// ---------------------------------------------------------------------------
// migrate
// ---------------------------------------------------------------------------

#[test]
fn migrate_up_creates_tables() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");

    let out = migrate("up", &db, &[]);
    assert!(out.status.success(), "migrate up failed: {}", stderr(&out));

    let out = migrate("status", &db, &[]);
    let text = stdout(&out);
    assert!(text.contains("Tables exist: yes"), "stdout: {text}");
    assert!(text.contains("book: 0 rows"), "stdout: {text}");
    assert!(text.contains("Lookup seed: out of sync"), "stdout: {text}");
}

#[test]
fn migrate_seed_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    assert!(migrate("up", &db, &[]).status.success());

    let out = migrate("seed", &db, &[]);
    assert!(out.status.success(), "seed failed: {}", stderr(&out));
    assert!(stdout(&out).contains("Rows inserted: 20"));

    let out = migrate("seed", &db, &[]);
    let text = stdout(&out);
    assert!(text.contains("Rows inserted: 0"), "stdout: {text}");
    assert!(text.contains("Rows updated: 20"), "stdout: {text}");

    let text = stdout(&migrate("status", &db, &[]));
    assert!(text.contains("order_status: 6 rows"), "stdout: {text}");
    assert!(text.contains("Lookup seed: in sync"), "stdout: {text}");
}

#[test]
fn migrate_seed_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let seed = write_seed(dir.path());
    let seed = seed.to_str().unwrap();

    assert!(migrate("up", &db, &[]).status.success());
    let out = migrate("seed", &db, &["--seed", seed]);
    assert!(out.status.success(), "seed failed: {}", stderr(&out));
    assert!(stdout(&out).contains("book_language: 2 inserted, 0 updated"));

    let text = stdout(&migrate("status", &db, &["--seed", seed]));
    assert!(text.contains("book_language: 2 rows"), "stdout: {text}");
    assert!(text.contains("Lookup seed: in sync"), "stdout: {text}");
}

#[test]
fn migrate_seed_with_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    assert!(migrate("up", &db, &[]).status.success());

    let missing = dir.path().join("missing.yaml");
    let out = migrate("seed", &db, &["--seed", missing.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Seed failed"), "stderr: {}", stderr(&out));
}

#[test]
fn migrate_seed_before_up_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");

    let out = migrate("seed", &db, &[]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("run `up` first"), "stderr: {}", stderr(&out));
}

#[test]
fn migrate_refresh_clears_and_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    assert!(migrate("up", &db, &[]).status.success());
    assert!(migrate("seed", &db, &[]).status.success());

    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute("INSERT INTO publisher (publisher_name) VALUES ('Ace Books')", [])
            .unwrap();
    }
    assert!(stdout(&migrate("status", &db, &[])).contains("publisher: 1 rows"));

    let out = migrate("refresh", &db, &[]);
    assert!(out.status.success(), "refresh failed: {}", stderr(&out));
    assert!(stdout(&out).contains("Rows inserted: 20"));

    let text = stdout(&migrate("status", &db, &[]));
    assert!(text.contains("publisher: 0 rows"), "stdout: {text}");
    assert!(text.contains("Lookup seed: in sync"), "stdout: {text}");
}

#[test]
fn migrate_down_removes_tables() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    assert!(migrate("up", &db, &["--prefix", "bk_"]).status.success());

    let out = migrate("down", &db, &["--prefix", "bk_"]);
    assert!(out.status.success());

    let text = stdout(&migrate("status", &db, &["--prefix", "bk_"]));
    assert!(text.contains("Tables exist: no"), "stdout: {text}");
    assert!(text.contains("book: missing"), "stdout: {text}");
}

#[test]
fn migrate_rejects_invalid_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    let out = migrate("up", &db, &["--prefix", "x;--"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid prefix"), "stderr: {}", stderr(&out));
}

// ---------------------------------------------------------------------------
// setup
// ---------------------------------------------------------------------------

#[test]
fn setup_creates_and_seeds_from_config() {
    let dir = tempfile::tempdir().unwrap();
    write_seed(dir.path());
    let config = dir.path().join("bookstore.yml");
    fs::write(
        &config,
        "version: \"1.0\"\ndatabase: shop.db\nprefix: shop_\nseed: lookups.yaml\n",
    )
    .unwrap();

    let out = run(&["setup", "--config", config.to_str().unwrap()]);
    assert!(out.status.success(), "setup failed: {}", stderr(&out));
    assert!(stdout(&out).contains("lookups.yaml"));

    let db = dir.path().join("shop.db");
    let text = stdout(&migrate("status", &db, &["--prefix", "shop_"]));
    assert!(text.contains("Tables exist: yes"), "stdout: {text}");
    assert!(text.contains("book_language: 2 rows"), "stdout: {text}");
}

#[test]
fn setup_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bookstore.yml");
    fs::write(
        &config,
        "version: \"1.0\"\ndatabase: shop.db\nseed: nowhere.yaml\n",
    )
    .unwrap();

    let out = run(&["setup", "--config", config.to_str().unwrap()]);
    assert!(out.status.success(), "setup failed: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("built-in defaults"), "stdout: {text}");
    assert!(text.contains("Rows inserted: 20"), "stdout: {text}");
}

// ---------------------------------------------------------------------------
// ddl / grants / roles / check
// ---------------------------------------------------------------------------

#[test]
fn ddl_prints_every_table() {
    let out = run(&["ddl", "--prefix", "shop_"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert_eq!(text.matches("CREATE TABLE IF NOT EXISTS").count(), 15);
    assert!(text.contains("CREATE TABLE IF NOT EXISTS shop_cust_order ("));
}

#[test]
fn grants_prints_postgres_script() {
    let out = run(&["grants", "--dialect", "postgres"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("GRANT SELECT, INSERT ON TABLE order_history TO staff;"));
    assert!(text.contains("GRANT SELECT ON TABLE customer TO readonly;"));

    let out = run(&["grants", "--dialect", "oracle"]);
    assert!(!out.status.success());
}

#[test]
fn roles_json_lists_every_table() {
    let out = run(&["roles", "--json"]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    for role in ["admin", "staff", "readonly"] {
        assert_eq!(value[role].as_array().unwrap().len(), 15, "{role}");
    }

    let text = stdout(&run(&["roles", "--role", "staff"]));
    assert!(text.contains("(update: street_number, street_name, city, region, postal_code)"));
}

#[test]
fn check_accepts_defaults_and_rejects_bad_seed() {
    let out = run(&["check"]);
    assert!(out.status.success(), "check failed: {}", stderr(&out));
    assert!(stdout(&out).contains("Seed (built-in defaults): 20 rows OK"));

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(
        &bad,
        r#"{"tables": [{"table": "customer", "key": "email", "columns": ["email"], "rows": [["a@b.c"]]}]}"#,
    )
    .unwrap();
    let out = run(&["check", "--seed", bad.to_str().unwrap()]);
    assert!(!out.status.success());
}
