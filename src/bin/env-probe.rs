use clap::{Parser, Subcommand};
use graceful_server::env::{get_env, get_env_as_bool, get_env_as_int};

#[derive(Parser)]
#[command(name = "env-probe")]
#[command(about = "Read environment variables the way the service does", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a string variable
    Str {
        name: String,
        #[arg(short, long)]
        default: Option<String>,
    },
    /// Read an integer variable
    Int {
        name: String,
        #[arg(short, long, allow_hyphen_values = true)]
        default: Option<i64>,
    },
    /// Read a boolean variable (1/t/T/TRUE/true/True, 0/f/F/FALSE/false/False)
    Bool {
        name: String,
        #[arg(short, long)]
        default: Option<bool>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let rendered = match cli.command {
        Commands::Str { name, default } => get_env(&name, default.as_deref())?,
        Commands::Int { name, default } => get_env_as_int(&name, default)?.to_string(),
        Commands::Bool { name, default } => get_env_as_bool(&name, default)?.to_string(),
    };
    println!("{}", rendered);

    Ok(())
}
