use std::net::SocketAddr;

use clap::{Parser, Subcommand, ValueEnum};

/// Who answers the review screens
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoMode {
    /// Scroll through the screens and confirm
    Accept,

    /// Scroll through the screens and reject
    Reject,

    /// Ask on the terminal
    Manual,
}

/// Kadena hardware wallet application: derive keys and review addresses as the device does.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// BIP39 mnemonic the keys are derived from
    #[arg(long, env = "KDA_MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Characters of the address shown on each page of the review
    #[arg(long, default_value_t = kda_app::consts::CHARS_PER_PAGE)]
    pub chars_per_page: usize,

    /// The sub command
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Return the public key at a derivation path, without any review
    GetPublicKey {
        /// Derivation path such as 44'/626'/0
        path: String,
    },

    /// Review the address at a derivation path and return its public key once confirmed
    VerifyAddress {
        /// Derivation path such as 44'/626'/0
        path: String,

        #[arg(long, value_enum, default_value_t = AutoMode::Manual)]
        auto: AutoMode,
    },

    /// Return the application version
    Version,

    /// Listen for APDUs on TCP, as the speculos emulator does
    Serve {
        #[arg(long, env = "KDA_ADDR", default_value = "127.0.0.1:9999")]
        addr: SocketAddr,

        /// How reviews are answered, `manual` is not supported
        #[arg(long, value_enum, default_value_t = AutoMode::Accept)]
        auto: AutoMode,
    },

    /// Send a command to a running emulator or device
    Send {
        /// Derivation path such as 44'/626'/0
        path: String,

        /// Ask for an address review instead of returning the key directly
        #[arg(long)]
        verify: bool,

        #[arg(long, env = "KDA_ADDR", default_value = "127.0.0.1:9999")]
        addr: SocketAddr,
    },
}

impl CliCommand {
    pub(crate) fn requires_mnemonic(&self) -> bool {
        !matches!(self, CliCommand::Version | CliCommand::Send { .. })
    }
}
