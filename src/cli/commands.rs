use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Issue an API token for an existing user
    Token {
        /// Data directory holding store.json
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the user the token speaks for
        #[arg(long)]
        email: String,

        /// Grant admin privileges through this token
        #[arg(long)]
        admin: bool,

        /// Expire the token after this many seconds
        #[arg(long)]
        expires_in_seconds: Option<i64>,
    },

    /// Check the entity store for dangling references
    Check {
        /// Data directory holding store.json
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}
