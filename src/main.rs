use {
    std::{
        path::PathBuf,
        time::Duration,
    },
    clap::Parser as _,
    log::LevelFilter,
    sqlx::{
        ConnectOptions as _,
        postgres::{
            PgConnectOptions,
            PgPoolOptions,
        },
    },
    crate::prelude::*,
};

mod auth;
mod bracket;
mod competition;
mod config;
mod http;
mod id;
mod matches;
mod prelude;
mod registration;
mod standings;
mod team;
mod user;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)] Base64(#[from] base64::DecodeError),
    #[error(transparent)] Config(#[from] config::Error),
    #[error(transparent)] Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)] Rocket(#[from] rocket::Error),
    #[error(transparent)] Sql(#[from] sqlx::Error),
}

#[derive(clap::Parser)]
#[clap(version)]
struct Args {
    #[clap(long, default_value_t = 24814)]
    port: u16,
    #[clap(long, default_value = "cfg/podium.json")]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::init();
    let config = Config::load(&args.config).await?;
    let mut db_options = PgConnectOptions::new()
        .username("podium")
        .database("podium")
        .application_name("podium")
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(1));
    if let Some(database) = &config.database {
        if let Some(host) = &database.host { db_options = db_options.host(host) }
        if let Some(port) = database.port { db_options = db_options.port(port) }
        if let Some(username) = &database.username { db_options = db_options.username(username) }
        if let Some(password) = &database.password { db_options = db_options.password(password) }
        if let Some(database) = &database.database { db_options = db_options.database(database) }
    }
    let pool = PgPoolOptions::default()
        .max_connections(16)
        .connect_with(db_options)
        .await?;
    sqlx::migrate!().run(&pool).await?;
    let rocket = http::rocket(pool, config, args.port).await?;
    rocket.launch().await?;
    Ok(())
}
