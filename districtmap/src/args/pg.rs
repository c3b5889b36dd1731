use log::info;

use crate::config::{POOL_SIZE_DEFAULT, PostgresConfig};

#[derive(clap::Args, Debug, PartialEq, Default)]
#[command(about, version)]
pub struct PostgresArgs {
    #[arg(help = format!("Maximum Postgres connections pool size. [DEFAULT: {POOL_SIZE_DEFAULT}]"), short, long)]
    pub pool_size: Option<usize>,
}

impl PostgresArgs {
    /// `env_connection` is the `DATABASE_URL` environment variable, used when
    /// no connection string was given on the command line.
    pub(crate) fn merge_into_config(
        self,
        connection: Option<String>,
        env_connection: Option<String>,
        pg_config: &mut Option<PostgresConfig>,
    ) {
        let connection = connection.or_else(|| {
            let url = env_connection?;
            info!("Using DATABASE_URL environment variable as the connection string");
            Some(url)
        });

        if connection.is_none() && self.pool_size.is_none() {
            return;
        }
        let config = pg_config.get_or_insert_with(PostgresConfig::default);
        if connection.is_some() {
            config.connection_string = connection;
        }
        if self.pool_size.is_some() {
            config.pool_size = self.pool_size;
        }
    }
}
