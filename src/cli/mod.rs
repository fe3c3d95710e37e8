use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "toolsmith")]
#[command(author, version, about = "Register scripting functions and expose them as MCP tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve registered functions over JSON-RPC on stdin/stdout
    Serve,

    /// Register a function from a JSON spec file
    Register {
        /// Path to a JSON file containing the function spec
        spec: String,
    },

    /// List registered functions
    List,

    /// Remove a registered function
    Remove { name: String },

    /// Invoke a registered function with a JSON argument object
    Invoke {
        name: String,

        /// JSON object passed as the function's arguments
        #[arg(default_value = "{}")]
        args: String,
    },
}
