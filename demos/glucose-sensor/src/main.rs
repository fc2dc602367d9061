mod cli;
mod records;

use anyhow::Context;
use clap::Parser;
use racp::service::{Outgoing, RacpService, ServiceEvent};
use racp::{ArrayRecordStore, ConnectionHandle, RacpConfig, RacpEngine, RecordStatus, RecordStore, Response};
use racp_util::TransferFormatTryFrom;
use std::time::Duration;
use tokio::sync::mpsc;

const CLIENT: ConnectionHandle = ConnectionHandle::new(0x40);

fn print_outgoing(outgoing: &Outgoing) {
    match outgoing {
        Outgoing::Record {
            measurement, context, ..
        } => {
            let sequence_number = u16::from_le_bytes([measurement[1], measurement[2]]);

            println!("  record {sequence_number:>5}: {measurement:02x?}");

            if let Some(context) = context {
                println!("  context {sequence_number:>4}: {context:02x?}");
            }
        }
        Outgoing::Response { pdu, .. } => match <Response as TransferFormatTryFrom>::try_from(pdu) {
            Ok(response) => println!("  response: {response} {pdu:02x?}"),
            Err(e) => println!("  invalid response {pdu:02x?}: {e}"),
        },
    }
}

fn create_store(cli: &cli::Cli) -> anyhow::Result<ArrayRecordStore> {
    let mut store = match &cli.records_file {
        Some(path) => records::load(path)?,
        None => ArrayRecordStore::simulated(cli.records).context("cannot create the simulated records")?,
    };

    for index in cli.deleted.iter().copied() {
        if index >= store.len() {
            anyhow::bail!("cannot delete record {index}, there are {} records", store.len())
        }

        store.set_status(index, RecordStatus::Deleted);
    }

    Ok(store)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    {
        use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

        TermLogger::init(cli.log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;
    }

    if cli.capacity == 0 {
        anyhow::bail!("the capacity must be at least one")
    }

    let store = create_store(&cli)?;

    println!("{} records, {} active", store.len(), store.active_count());

    let config = RacpConfig::new().set_busy_policy(cli.busy_policy.into());

    let (service, mut outgoing) = RacpService::new(RacpEngine::with_config(store, config), cli.capacity);

    let (events, receiver) = mpsc::channel(1);

    let service = tokio::spawn(service.run(receiver));

    let timeout = Duration::from_millis(cli.timeout);

    for cli::HexCommand(data) in cli.commands {
        println!("write {data:02x?}");

        events.send(ServiceEvent::Write { connection: CLIENT, data }).await?;

        loop {
            match tokio::time::timeout(timeout, outgoing.recv()).await {
                Ok(Some(message)) => {
                    print_outgoing(&message);

                    if let Outgoing::Response { .. } = message {
                        break;
                    }
                }
                Ok(None) => anyhow::bail!("service stopped"),
                Err(_) => {
                    println!("  no response");
                    break;
                }
            }
        }
    }

    drop(events);

    let engine = service.await?;

    let store = engine.get_store();

    println!("{} records, {} active", store.len(), store.active_count());

    Ok(())
}
