#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Command line interface to the Kadena device application.
//!
//! Commands run the processor in-process (`get-public-key`, `verify-address`, `version`), expose
//! it as a speculos compatible emulator (`serve`) or talk to a running one (`send`). Every result
//! is printed as JSON.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, ensure, Context};
use kda_app::{
    AutomatedScreen, Automation, CommandRequest, CommandResponse, Config, Dispatcher, Emulator,
    EventLog, Screen, TransportTcp,
};
use kda_signer::SwSigner;
use serde_json::{json, Value};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

use crate::args::{AutoMode, CliCommand};
use crate::console::ConsoleScreen;
pub use args::Cli;

mod args;
mod console;

pub fn inner_main(args: args::Cli) -> anyhow::Result<Value> {
    let directive = if let CliCommand::Serve { .. } = args.command {
        LevelFilter::INFO.into()
    } else {
        LevelFilter::WARN.into()
    };

    let (appender, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(appender)
        .finish();
    match tracing::subscriber::set_global_default(subscriber) {
        Ok(_) => tracing::info!("logging initialized"),
        Err(_) => tracing::debug!("logging already initialized"),
    }

    tracing::info!("CLI initialized with command: {:?}", args.command);

    let chars_per_page = NonZeroUsize::new(args.chars_per_page)
        .ok_or_else(|| anyhow!("--chars-per-page must be greater than 0"))?;
    let config = Config::builder().with_chars_per_page(chars_per_page);

    let signer = if args.command.requires_mnemonic() {
        let mnemonic = args
            .mnemonic
            .as_deref()
            .ok_or_else(|| anyhow!("a mnemonic is required, use --mnemonic or KDA_MNEMONIC"))?;
        Some(SwSigner::new(mnemonic).context("invalid mnemonic")?)
    } else {
        None
    };

    Ok(match args.command {
        CliCommand::GetPublicKey { path } => {
            let dispatcher = dispatcher(signer, config.build())?;
            let mut screen = AutomatedScreen::new(Automation::RejectAll, EventLog::default());
            let response = dispatcher.handle(&CommandRequest::get_public_key(path), &mut screen);
            response_json(&response)
        }
        CliCommand::VerifyAddress { path, auto } => {
            let dispatcher = dispatcher(signer, config.build())?;
            let log = EventLog::default();
            let mut screen = make_screen(auto, log.clone());
            let response = dispatcher.handle(&CommandRequest::verify_address(path), &mut screen);
            let mut value = response_json(&response);
            value["screens"] = log.to_json();
            value
        }
        CliCommand::Version => {
            json!({ "version": kda_app::Version::current().to_string() })
        }
        CliCommand::Serve { addr, auto } => {
            ensure!(
                auto != AutoMode::Manual,
                "serve answers reviews on its own, use --auto accept or --auto reject"
            );
            let dispatcher = dispatcher(signer, config.with_addr(addr).build())?;

            let running = Arc::new(AtomicBool::new(true));
            let handler = running.clone();
            let _ = ctrlc::try_set_handler(move || handler.store(false, Ordering::Relaxed));

            let mut emulator = Emulator::bind(dispatcher, make_screen(auto, EventLog::default()))
                .with_context(|| {
                    format!("Cannot listen on \"{addr}\". Is another emulator running?")
                })?;
            emulator.run(&running)?;
            tracing::debug!("Received ctrl-c signal");
            json!({})
        }
        CliCommand::Send { path, verify, addr } => {
            let client = TransportTcp::connect(addr)
                .with_context(|| format!("Is the emulator at {addr} running?"))?;
            let request = if verify {
                CommandRequest::verify_address(path)
            } else {
                CommandRequest::get_public_key(path)
            };
            let response = client.send(&request)?;
            response_json(&response)
        }
    })
}

fn dispatcher(signer: Option<SwSigner>, config: Config) -> anyhow::Result<Dispatcher<SwSigner>> {
    let signer = signer.ok_or_else(|| anyhow!("no signer available"))?;
    Ok(Dispatcher::new(signer, config))
}

fn make_screen(auto: AutoMode, log: EventLog) -> Box<dyn Screen> {
    match auto {
        AutoMode::Accept => Box::new(AutomatedScreen::new(Automation::AcceptAll, log)),
        AutoMode::Reject => Box::new(AutomatedScreen::new(Automation::RejectAll, log)),
        AutoMode::Manual => Box::new(ConsoleScreen::new(
            std::io::stdin().lock(),
            std::io::stderr(),
            log,
        )),
    }
}

fn response_json(response: &CommandResponse) -> Value {
    let mut value = json!({ "status": response.status });
    if let Some(public_key) = response.public_key() {
        value["public_key"] = json!(public_key.to_hex());
        value["address"] = json!(public_key.address());
    }
    value
}
