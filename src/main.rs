use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use nonna::config::Config;
use nonna::parser::OpenAiParser;
use nonna::{backend, cli, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nonna=info")),
        )
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "server" {
        let pool = database::db::connection::get_db_pool(&config.database_url).await?;
        database::db::migrate::run_migrations(&pool).await?;
        database::db::queries::seed_default_categories(&pool).await?;

        let parser = Arc::new(OpenAiParser::new(&config.openai)?);
        backend::run_server(pool, parser, &config).await?;
    } else {
        cli::run(&config).await?;
    }
    Ok(())
}
