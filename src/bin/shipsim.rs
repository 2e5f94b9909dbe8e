use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use shipsim::bus::{Envelope, ShipTopics};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_SHIP_ID: &str = "1";
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("shipsim")
        .version("0.1.0")
        .author("Harbor Systems Engineering Team")
        .about("Container ship stability simulator - operator console")
        .arg(
            Arg::with_name("host")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("ship")
                .long("ship")
                .value_name("SHIP_ID")
                .help("Ship identity the topics are namespaced under")
                .takes_value(true)
                .default_value(DEFAULT_SHIP_ID)
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("add")
                .about("Place a container on the loading grid")
                .arg(Arg::with_name("weight").long("weight").value_name("KG").required(true).takes_value(true))
                .arg(Arg::with_name("id").long("id").value_name("CONTAINER_ID").required(true).takes_value(true))
                .arg(Arg::with_name("x").short("x").value_name("SLOT").required(true).takes_value(true))
                .arg(Arg::with_name("y").short("y").value_name("SLOT").required(true).takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("remove")
                .about("Remove the container at a grid position")
                .arg(Arg::with_name("x").short("x").value_name("SLOT").required(true).takes_value(true))
                .arg(Arg::with_name("y").short("y").value_name("SLOT").required(true).takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("init")
                .about("Reinitialize the ship, optionally with new parameters")
                .arg(Arg::with_name("params").long("params").value_name("JSON").takes_value(true)),
        )
        .subcommand(SubCommand::with_name("dump").about("Dump the full simulation state"))
        .subcommand(SubCommand::with_name("emergency").about("Activate emergency mode"))
        .subcommand(SubCommand::with_name("clear-emergency").about("Clear emergency mode"))
        .subcommand(
            SubCommand::with_name("fault")
                .about("Toggle fault injection")
                .arg(Arg::with_name("state").help("on or off").required(true).possible_values(&["on", "off"])),
        )
        .subcommand(SubCommand::with_name("watch").about("Stream telemetry and status updates"))
        .get_matches();

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT);
    let ship_id = matches.value_of("ship").unwrap_or(DEFAULT_SHIP_ID);
    let topics = ShipTopics::new(ship_id);

    let stream = TcpStream::connect(format!("{host}:{port}")).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    match matches.subcommand() {
        ("add", Some(sub)) => {
            let payload = serde_json::json!({
                "container": {
                    "weight": parse_f64(sub, "weight")?,
                    "container_id": sub.value_of("id").unwrap_or_default(),
                },
                "position": { "x": parse_usize(sub, "x")?, "y": parse_usize(sub, "y")? },
            });
            send(&mut writer, &topics.container_incoming, payload).await?;
            print_until_topic(&mut lines, &topics.telemetry).await?;
        }
        ("remove", Some(sub)) => {
            let payload = serde_json::json!({
                "position": { "x": parse_usize(sub, "x")?, "y": parse_usize(sub, "y")? },
            });
            send(&mut writer, &topics.container_outgoing, payload).await?;
            print_until_topic(&mut lines, &topics.telemetry).await?;
        }
        ("init", Some(sub)) => {
            let mut payload = serde_json::json!({ "command": "INITIALIZE" });
            if let Some(params) = sub.value_of("params") {
                payload["params"] = serde_json::from_str(params)?;
            }
            send(&mut writer, &topics.commands, payload).await?;
            print_until_topic(&mut lines, &topics.command_response).await?;
        }
        ("dump", _) => {
            send(&mut writer, &topics.commands, serde_json::json!({ "command": "DUMP_STATE" })).await?;
            print_until_topic(&mut lines, &topics.state).await?;
        }
        ("emergency", _) => {
            send(&mut writer, &topics.commands, serde_json::json!({ "command": "EMERGENCY" })).await?;
            print_until_topic(&mut lines, &topics.command_response).await?;
        }
        ("clear-emergency", _) => {
            send(&mut writer, &topics.commands, serde_json::json!({ "command": "CLEAR_EMERGENCY" })).await?;
            print_until_topic(&mut lines, &topics.command_response).await?;
        }
        ("fault", Some(sub)) => {
            let command = if sub.value_of("state") == Some("on") {
                "ENABLE_FAULT_INJECTION"
            } else {
                "DISABLE_FAULT_INJECTION"
            };
            send(&mut writer, &topics.commands, serde_json::json!({ "command": command })).await?;
            print_until_topic(&mut lines, &topics.command_response).await?;
        }
        ("watch", _) => {
            println!("{}", "Streaming telemetry and status (ctrl-c to stop)...".bold());
            while let Some(line) = lines.next_line().await? {
                print_envelope(&line);
            }
        }
        _ => {
            eprintln!("{}", "No subcommand given; try --help".yellow());
        }
    }

    Ok(())
}

fn parse_f64(matches: &ArgMatches<'_>, name: &str) -> Result<f64, Box<dyn std::error::Error>> {
    Ok(matches.value_of(name).unwrap_or_default().parse::<f64>()?)
}

fn parse_usize(matches: &ArgMatches<'_>, name: &str) -> Result<usize, Box<dyn std::error::Error>> {
    Ok(matches.value_of(name).unwrap_or_default().parse::<usize>()?)
}

async fn send(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    topic: &str,
    payload: serde_json::Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let envelope = Envelope {
        topic: topic.to_string(),
        payload,
    };
    let line = serde_json::to_string(&envelope)?;
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

/// Print everything the node publishes until the given topic arrives (or
/// the timeout expires).
async fn print_until_topic(
    lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    stop_topic: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let line = match tokio::time::timeout(RESPONSE_TIMEOUT, lines.next_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => break,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                eprintln!("{}", "Timed out waiting for simulator output".red());
                break;
            }
        };
        let done = serde_json::from_str::<Envelope>(&line)
            .map(|envelope| envelope.topic == stop_topic)
            .unwrap_or(false);
        print_envelope(&line);
        if done {
            break;
        }
    }
    Ok(())
}

fn print_envelope(line: &str) {
    match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => {
            let body = envelope.payload.to_string();
            let status = envelope.payload.get("status").and_then(|s| s.as_str());
            let rendered = match status {
                Some("success") => body.green(),
                Some("error") | Some("ERROR") => body.red(),
                _ => body.normal(),
            };
            println!("{} {}", envelope.topic.cyan().bold(), rendered);
        }
        Err(_) => println!("{line}"),
    }
}
