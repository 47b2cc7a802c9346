use std::path::{Path, PathBuf};

use bookstore_schema_core::{Role, bookstore_catalog, validate_catalog, validate_seed};
use bookstore_schema_db::{SeedLoader, SetupConfig, load_seed_file, seed_fingerprint};
use bookstore_schema_sqlite::{
    GrantDialect, Migration, SeedReport, generate_grant_sql, generate_schema_sql,
};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// CLI-specific dialect enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliDialect {
    Mysql,
    Postgres,
}

impl From<CliDialect> for GrantDialect {
    fn from(dialect: CliDialect) -> Self {
        match dialect {
            CliDialect::Mysql => Self::MySql,
            CliDialect::Postgres => Self::Postgres,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bookstore-schema")]
#[command(about = "Bookstore schema setup, seeding, and access-control scripts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// SQLite database migration and seeding operations.
    Migrate(MigrateArgs),
    /// Create and seed a database described by a YAML setup file.
    Setup(SetupArgs),
    /// Print the CREATE TABLE script.
    Ddl(DdlArgs),
    /// Print CREATE ROLE and GRANT statements for a server database.
    Grants(GrantsArgs),
    /// Print each role's table privileges.
    Roles(RolesArgs),
    /// Validate the catalog and a seed file without touching a database.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(subcommand)]
    operation: MigrateOperation,
}

#[derive(Debug, Subcommand)]
enum MigrateOperation {
    /// Create schema tables in the database.
    Up(DbArgs),
    /// Drop schema tables from the database.
    Down(DbArgs),
    /// Upsert lookup rows from a seed file or the built-in defaults.
    Seed(SeededDbArgs),
    /// Drop tables, recreate, and reseed.
    Refresh(SeededDbArgs),
    /// Show table and seed status.
    Status(SeededDbArgs),
}

#[derive(Debug, Args)]
struct DbArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table prefix.
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Debug, Args)]
struct SeededDbArgs {
    #[command(flatten)]
    target: DbArgs,
    /// YAML or JSON seed file; the built-in rows are used when omitted.
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SetupArgs {
    /// Setup configuration file.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct DdlArgs {
    /// Table prefix.
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Debug, Args)]
struct GrantsArgs {
    /// Target server dialect.
    #[arg(long, value_enum)]
    dialect: CliDialect,
    /// Table prefix.
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Debug, Args)]
struct RolesArgs {
    /// Only show this role.
    #[arg(long)]
    role: Option<Role>,
    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Seed file to validate; the built-in rows are checked when omitted.
    #[arg(long)]
    seed: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate(args) => run_migrate(args),
        Command::Setup(args) => run_setup(args),
        Command::Ddl(args) => run_ddl(args),
        Command::Grants(args) => run_grants(args),
        Command::Roles(args) => run_roles(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// migrate command
// ---------------------------------------------------------------------------

fn run_migrate(args: MigrateArgs) -> Result<(), String> {
    match args.operation {
        MigrateOperation::Up(a) => run_migrate_up(a),
        MigrateOperation::Down(a) => run_migrate_down(a),
        MigrateOperation::Seed(a) => run_migrate_seed(a),
        MigrateOperation::Refresh(a) => run_migrate_refresh(a),
        MigrateOperation::Status(a) => run_migrate_status(a),
    }
}

fn open_migration(db: &Path, prefix: &str) -> Result<Migration, String> {
    let conn = Connection::open(db)
        .map_err(|e| format!("Failed to open database '{}': {e}", db.display()))?;
    Migration::new(conn, prefix).map_err(|e| format!("Failed to initialize migration: {e}"))
}

/// An explicit seed file must load; only the implicit source is the defaults.
fn seed_loader(seed: Option<&Path>) -> SeedLoader {
    match seed {
        Some(path) => SeedLoader::new().from_file(path),
        None => SeedLoader::new().with_defaults(),
    }
}

fn print_seed_report(report: &SeedReport) {
    for table in &report.tables {
        println!(
            "  {}: {} inserted, {} updated",
            table.table, table.inserted, table.updated
        );
    }
    println!("  Rows inserted: {}", report.inserted());
    println!("  Rows updated: {}", report.updated());
}

fn run_migrate_up(args: DbArgs) -> Result<(), String> {
    let mut migration = open_migration(&args.db, &args.prefix)?;
    migration
        .up()
        .map_err(|e| format!("Migration up failed: {e}"))?;
    println!(
        "Migration up complete. Tables created with prefix '{}' in '{}'.",
        args.prefix,
        args.db.display()
    );
    Ok(())
}

fn run_migrate_down(args: DbArgs) -> Result<(), String> {
    let mut migration = open_migration(&args.db, &args.prefix)?;
    migration
        .down()
        .map_err(|e| format!("Migration down failed: {e}"))?;
    println!(
        "Migration down complete. Tables with prefix '{}' dropped from '{}'.",
        args.prefix,
        args.db.display()
    );
    Ok(())
}

fn run_migrate_seed(args: SeededDbArgs) -> Result<(), String> {
    let mut migration = open_migration(&args.target.db, &args.target.prefix)?;
    let report = migration
        .seed_from(seed_loader(args.seed.as_deref()))
        .map_err(|e| format!("Seed failed: {e}"))?;
    println!("Seed complete:");
    print_seed_report(&report);
    Ok(())
}

fn run_migrate_refresh(args: SeededDbArgs) -> Result<(), String> {
    let loaded = seed_loader(args.seed.as_deref())
        .load()
        .map_err(|e| format!("Failed to load seed: {e}"))?;
    let mut migration = open_migration(&args.target.db, &args.target.prefix)?;
    let report = migration
        .refresh(&loaded.seed)
        .map_err(|e| format!("Refresh failed: {e}"))?;
    println!("Refresh complete (tables dropped, recreated, and reseeded):");
    print_seed_report(&report);
    Ok(())
}

fn run_migrate_status(args: SeededDbArgs) -> Result<(), String> {
    let migration = open_migration(&args.target.db, &args.target.prefix)?;
    let status = migration
        .status()
        .map_err(|e| format!("Failed to get migration status: {e}"))?;
    println!("Migration Status:");
    println!(
        "  Tables exist: {}",
        if status.tables_exist { "yes" } else { "no" }
    );
    for table in &status.tables {
        if table.exists {
            println!("  {}: {} rows", table.name, table.rows);
        } else {
            println!("  {}: missing", table.name);
        }
    }

    if status.tables_exist {
        let loaded = seed_loader(args.seed.as_deref())
            .load()
            .map_err(|e| format!("Failed to load seed: {e}"))?;
        let in_sync = migration
            .seed_in_sync(&loaded.seed)
            .map_err(|e| format!("Failed to fingerprint lookup tables: {e}"))?;
        println!(
            "  Lookup seed: {}",
            if in_sync { "in sync" } else { "out of sync" }
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// setup command
// ---------------------------------------------------------------------------

fn run_setup(args: SetupArgs) -> Result<(), String> {
    let config = SetupConfig::load(&args.config)
        .map_err(|e| format!("Failed to load config '{}': {e}", args.config.display()))?;
    let mut migration = open_migration(&config.database, &config.prefix)?;
    migration
        .up()
        .map_err(|e| format!("Migration up failed: {e}"))?;
    let report = migration
        .seed_from(config.seed_loader())
        .map_err(|e| format!("Seed failed: {e}"))?;

    let source = match &report.source {
        Some(bookstore_schema_db::SeedSource::File(path)) => path.display().to_string(),
        _ => "built-in defaults".to_string(),
    };
    println!(
        "Setup complete for '{}' (prefix '{}', seed from {source}):",
        config.database.display(),
        config.prefix
    );
    print_seed_report(&report);
    Ok(())
}

// ---------------------------------------------------------------------------
// ddl / grants / roles commands
// ---------------------------------------------------------------------------

fn run_ddl(args: DdlArgs) -> Result<(), String> {
    let sql = generate_schema_sql(&bookstore_catalog(), &args.prefix).map_err(|e| e.to_string())?;
    print!("{sql}");
    Ok(())
}

fn run_grants(args: GrantsArgs) -> Result<(), String> {
    let sql = generate_grant_sql(&bookstore_catalog(), &args.prefix, args.dialect.into())
        .map_err(|e| e.to_string())?;
    print!("{sql}");
    Ok(())
}

fn run_roles(args: RolesArgs) -> Result<(), String> {
    let catalog = bookstore_catalog();
    let roles: Vec<Role> = match args.role {
        Some(role) => vec![role],
        None => Role::ALL.to_vec(),
    };

    if args.json {
        let out: serde_json::Map<String, serde_json::Value> = roles
            .iter()
            .map(|role| {
                serde_json::to_value(role.grants(&catalog)).map(|grants| (role.to_string(), grants))
            })
            .collect::<Result<_, _>>()
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    for role in roles {
        println!("{role}:");
        for grant in role.grants(&catalog) {
            let privileges: Vec<&str> = grant.privileges.iter().map(|p| p.as_sql()).collect();
            let columns = grant
                .update_columns
                .as_ref()
                .map(|cols| format!(" (update: {})", cols.join(", ")))
                .unwrap_or_default();
            println!("  {:<18} {}{columns}", grant.table, privileges.join(", "));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// check command
// ---------------------------------------------------------------------------

fn run_check(args: CheckArgs) -> Result<(), String> {
    let catalog = bookstore_catalog();
    let catalog_errors = validate_catalog(&catalog);
    for err in &catalog_errors {
        eprintln!("catalog: {err}");
    }

    let (seed, label) = match &args.seed {
        Some(path) => {
            let seed = load_seed_file(path)
                .map_err(|e| format!("Failed to load seed '{}': {e}", path.display()))?;
            (seed, path.display().to_string())
        }
        None => (
            bookstore_schema_core::SeedSet::bookstore_defaults(),
            "built-in defaults".to_string(),
        ),
    };
    let seed_errors = validate_seed(&catalog, &seed);
    for err in &seed_errors {
        eprintln!("seed: {err}");
    }

    if !catalog_errors.is_empty() || !seed_errors.is_empty() {
        return Err(format!(
            "{} catalog and {} seed problem(s) found",
            catalog_errors.len(),
            seed_errors.len()
        ));
    }

    println!("Catalog: {} tables OK", catalog.tables.len());
    println!("Seed ({label}): {} rows OK", seed.row_count());
    println!("Seed fingerprint: {}", seed_fingerprint(&seed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dialect_conversion() {
        assert_eq!(GrantDialect::from(CliDialect::Mysql), GrantDialect::MySql);
        assert_eq!(GrantDialect::from(CliDialect::Postgres), GrantDialect::Postgres);
    }

    #[test]
    fn test_prefix_defaults_to_empty() {
        let cli = Cli::try_parse_from(["bookstore-schema", "migrate", "up", "--db", "x.db"]).unwrap();
        let Command::Migrate(MigrateArgs {
            operation: MigrateOperation::Up(args),
        }) = cli.command
        else {
            panic!("expected migrate up");
        };
        assert_eq!(args.prefix, "");
    }

    #[test]
    fn test_role_argument_parses_names() {
        let cli = Cli::try_parse_from(["bookstore-schema", "roles", "--role", "readonly"]).unwrap();
        let Command::Roles(args) = cli.command else {
            panic!("expected roles");
        };
        assert_eq!(args.role, Some(Role::ReadOnly));
    }
}
