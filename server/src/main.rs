mod config;
mod graphql;
mod http;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{DbPool, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{EmployeeDirectory, seed_demo};
use serde_json::json;
use tracing::info;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "hr-suite", version, about = "HR employee directory and payroll analytics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert the demo roster (existing ids are left alone).
    Seed,
    /// Print payroll figures as JSON.
    Stats,
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Roll back the most recent migration.
    Down,
    /// Roll back everything, then re-apply.
    Reset,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, env = "HR_HOST", default_value = "127.0.0.1")]
    host: std::net::IpAddr,
    #[arg(long, env = "HR_PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::from_env())?;
    let cli = Cli::parse();
    if let Command::SchemaPrint { output } = &cli.command {
        return schema_print(output.as_deref());
    }

    let config = Arc::new(AppConfig::load()?);
    let pool = connect(&config.database)
        .await
        .context("could not open database pool")?;
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, pool, config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&pool).await,
            MigrateCommand::Down => migrate_down(&pool).await,
            MigrateCommand::Reset => migrate_reset(&pool).await,
        },
        Command::Seed => run_seed(pool).await,
        Command::Stats => print_stats(pool).await,
        Command::SchemaPrint { .. } => Ok(()),
    }
}

fn schema_print(path: Option<&std::path::Path>) -> Result<()> {
    let sdl = graphql::schema_sdl();
    match path {
        Some(target) => {
            std::fs::write(target, sdl)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema snapshot written");
        }
        None => println!("{sdl}"),
    }
    Ok(())
}

async fn run_seed(pool: DbPool) -> Result<()> {
    let directory = EmployeeDirectory::new(pool);
    let created = seed_demo(&directory).await?;
    info!(inserted = created.len(), "seed complete");
    Ok(())
}

async fn print_stats(pool: DbPool) -> Result<()> {
    let directory = EmployeeDirectory::new(pool);
    let overview = directory.payroll_overview().await?;
    let departments = directory.department_salary_summary().await?;
    let report = json!({
        "overview": overview,
        "departments": departments,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_server(cmd: ServeCommand, pool: DbPool, config: Arc<AppConfig>) -> Result<()> {
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let schema = graphql::build_schema(EmployeeDirectory::new(pool.clone()));
    let state = AppState {
        pool,
        schema,
        config,
    };
    http::serve(ServeConfig::from(&cmd), state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `hr-suite migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up(pool: &DbPool) -> Result<()> {
    Migrator::up(pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(pool: &DbPool) -> Result<()> {
    Migrator::down(pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn migrate_reset(pool: &DbPool) -> Result<()> {
    Migrator::reset(pool).await?;
    Migrator::up(pool, None).await?;
    info!("database reset and migrations re-applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_serve_flags() {
        let cli = Cli::try_parse_from(["hr-suite", "serve", "--port", "9000", "--allow-dirty"])
            .unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.port, 9000);
                assert!(cmd.allow_dirty);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_migrate_and_schema_commands() {
        let cli = Cli::try_parse_from(["hr-suite", "migrate", "reset"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate(MigrateCommand::Reset)));

        let cli = Cli::try_parse_from(["hr-suite", "schema:print", "--output", "out.graphql"])
            .unwrap();
        assert!(matches!(cli.command, Command::SchemaPrint { output: Some(_) }));
    }
}
