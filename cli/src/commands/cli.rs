use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mediaq", version, about = "Media task supervisor: MCP stdio server and HTTP gateway")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Explicit config file path (default: ~/.mediaq/config.toml, then ./config.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the MCP JSON-RPC protocol over stdin/stdout (the default).
    Serve,
    /// Serve the HTTP gateway instead of stdio.
    Http(HttpServerArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct HttpServerArgs {
    /// Bind address; overrides the config file.
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port; overrides the config file.
    #[arg(long)]
    pub port: Option<u16>,
}
