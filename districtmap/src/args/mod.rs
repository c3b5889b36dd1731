use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

mod pg;
pub use pg::PostgresArgs;

mod srv;
pub use srv::SrvArgs;

#[derive(Parser, Debug, PartialEq, Default)]
#[command(
    about,
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=districtmap=debug."
)]
pub struct Args {
    #[command(flatten)]
    pub meta: MetaArgs,
    #[command(flatten)]
    pub srv: SrvArgs,
    #[command(flatten)]
    pub pg: PostgresArgs,
}

// None of these params will be transferred to the config
#[derive(Parser, Debug, Clone, PartialEq, Default)]
#[command(about, version)]
pub struct MetaArgs {
    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Database connection string, e.g. `postgres://...`
    pub connection: Option<String>,
}

impl Args {
    /// `env_connection` is the `DATABASE_URL` environment variable; it loses
    /// to a connection string given on the command line.
    pub fn merge_into_config(self, config: &mut Config, env_connection: Option<String>) {
        // Override config values with the ones from the command line
        self.srv.merge_into_config(&mut config.srv);
        self.pg
            .merge_into_config(self.meta.connection, env_connection, &mut config.postgres);
    }
}
