// ABOUTME: Command-line TPDU inspector decoding hex strings into their fields
// ABOUTME: Feeds concatenated parts through a reassembler and prints completed texts

//! # TPDU Dump
//!
//! Decodes one or more hex-encoded TPDUs and prints every field. Parts of a
//! concatenated message are handed to a [`Reassembler`] and the joined text
//! is printed once the last part arrives.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example dump_tpdu -- 200B916407281553F80000908070605040000AE8329BFD4697D9EC37
//!
//! # Keep reserved message types as raw octets
//! cargo run --example dump_tpdu -- --passthrough 03AABB
//! ```

use argh::FromArgs;
use sms_tpdu::{DecodeOptions, Message, Reassembler, ReassemblyConfig, Tpdu};
use std::error::Error;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Decode GSM 03.40 TPDUs given as hex strings
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// keep reserved message types instead of rejecting them
    #[argh(switch)]
    passthrough: bool,

    /// seconds a partial message waits for its missing parts (default: 300)
    #[argh(option)]
    timeout: Option<u64>,

    /// hex-encoded TPDUs
    #[argh(positional)]
    tpdus: Vec<String>,
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {s:?}"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex at position {i}"))
        })
        .collect()
}

fn print_message(message: &Message) {
    println!("type:      {:?}", message.message_type());
    if let Some(address) = message.address() {
        println!(
            "address:   {} (TON {:?}, NPI {:?})",
            address,
            address.type_of_number(),
            address.numbering_plan()
        );
    }

    match message.tpdu() {
        Tpdu::Deliver(deliver) => {
            println!("pid:       0x{:02X}", deliver.protocol_identifier);
            println!("dcs:       {}", deliver.data_coding);
            println!("scts:      {}", deliver.service_centre_timestamp);
        }
        Tpdu::Submit(submit) => {
            println!("mr:        {}", submit.message_reference);
            println!("pid:       0x{:02X}", submit.protocol_identifier);
            println!("dcs:       {}", submit.data_coding);
            if let Some(vp) = &submit.validity_period {
                println!("validity:  {:?}", vp);
            }
        }
        Tpdu::StatusReport(report) => {
            println!("mr:        {}", report.message_reference);
            println!("scts:      {}", report.service_centre_timestamp);
            println!("discharge: {}", report.discharge_time);
            println!("status:    {:?}", report.delivery_status());
        }
        Tpdu::Reserved(raw) => {
            println!("raw:       {} octets", raw.len());
        }
    }

    if let Some(header) = message.header() {
        for element in header.elements() {
            println!("iei:       0x{:02X} {:02X?}", element.id, element.data.as_ref());
        }
    }
    println!("text:      {:?}", message.text());
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let options = DecodeOptions::new().with_passthrough_reserved(cli_args.passthrough);
    let config = ReassemblyConfig::new(Duration::from_secs(cli_args.timeout.unwrap_or(300)));
    let reassembler = Reassembler::new(config);

    for input in &cli_args.tpdus {
        let bytes = parse_hex(input)?;
        let message = match Message::decode_with(&bytes, options) {
            Ok(message) => message,
            Err(e) => {
                if e.is_structural() {
                    error!("{input}: not a usable TPDU: {e}");
                } else {
                    error!("{input}: {e}");
                }
                continue;
            }
        };

        print_message(&message);
        println!();

        if message.concatenation().is_some() {
            if let Some(complete) = reassembler.submit(message) {
                info!("reassembled {} parts", complete.parts.len());
                println!("complete:  {:?}", complete.text);
                println!();
            }
        }
    }

    if reassembler.pending() > 0 {
        info!("{} messages still missing parts", reassembler.pending());
    }

    Ok(())
}
