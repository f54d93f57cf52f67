//! hybridlab - hybrid RSA + AES document encryption
//!
//! Usage:
//!   hybridlab generate     - Generate a wrapped AES key (and the RSA pair on first use)
//!   hybridlab rotate       - Replace the RSA pair and re-wrap stored AES keys
//!   hybridlab encrypt      - Encrypt a UTF-8 text file
//!   hybridlab decrypt      - Decrypt a ciphertext file
//!   hybridlab init-config  - Write a settings file with the defaults

use anyhow::Result;
use clap::{Parser, Subcommand};
use hybridlab_cli::{Settings, commands};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hybridlab")]
#[command(about = "Hybrid RSA-OAEP + AES-CBC document encryption", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON settings file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a wrapped symmetric key, creating the RSA key pair if needed
    Generate {
        /// Symmetric key size in bits (128, 192 or 256)
        #[arg(long)]
        key_bits: Option<usize>,

        /// RSA modulus size in bits (at least 2048)
        #[arg(long)]
        modulus_bits: Option<usize>,
    },

    /// Replace the RSA key pair and re-wrap every stored symmetric key
    Rotate {
        /// RSA modulus size in bits for the new pair
        #[arg(long)]
        modulus_bits: Option<usize>,
    },

    /// Encrypt a UTF-8 text file
    Encrypt {
        /// Plaintext file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Ciphertext output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Symmetric key size in bits
        #[arg(long)]
        key_bits: Option<usize>,
    },

    /// Decrypt a ciphertext file
    Decrypt {
        /// Ciphertext file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Plaintext output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Symmetric key size in bits
        #[arg(long)]
        key_bits: Option<usize>,
    },

    /// Write a settings file containing the defaults
    InitConfig {
        /// Destination of the settings file
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(format!(
                        "hybridlab={log_level},hybridlab_cli={log_level},hybridlab_crypto={log_level}"
                    ))
                }),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error [{}]: {err:#}", commands::error_kind(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            key_bits,
            modulus_bits,
        } => {
            override_with(&mut settings.key_bits, key_bits);
            override_with(&mut settings.modulus_bits, modulus_bits);
            let info = commands::generate(&settings)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Rotate { modulus_bits } => {
            override_with(&mut settings.modulus_bits, modulus_bits);
            let rotation = commands::rotate(&settings)?;
            println!("{}", serde_json::to_string_pretty(&rotation)?);
        }
        Commands::Encrypt {
            input,
            output,
            key_bits,
        } => {
            override_with(&mut settings.plaintext_path, input);
            override_with(&mut settings.encrypted_path, output);
            override_with(&mut settings.key_bits, key_bits);
            let written = commands::encrypt(&settings)?;
            println!(
                "wrote {written} bytes to {}",
                settings.encrypted_path.display()
            );
        }
        Commands::Decrypt {
            input,
            output,
            key_bits,
        } => {
            override_with(&mut settings.encrypted_path, input);
            override_with(&mut settings.decrypted_path, output);
            override_with(&mut settings.key_bits, key_bits);
            let written = commands::decrypt(&settings)?;
            println!(
                "wrote {written} bytes to {}",
                settings.decrypted_path.display()
            );
        }
        Commands::InitConfig { path } => {
            settings.save(&path)?;
            println!("settings written to {}", path.display());
        }
    }

    Ok(())
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}
