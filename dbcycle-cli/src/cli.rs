use clap::{Parser, Subcommand, ValueEnum};

/// dbcycle - rebuild a managed PostgreSQL database and redeploy its services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete the current database, create a new one and redeploy web services
    Rebuild {
        /// Output format for the final report
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Show the database the rebuild would replace
    Database {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// Also print connection strings (use with caution)
        #[arg(long)]
        show_secrets: bool,
    },

    /// List the web services that would be redeployed
    Services {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Show the account that owns the resources
    Owner {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Show current configuration
    Config,
}
