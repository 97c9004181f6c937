use std::{env, path::PathBuf, process::ExitCode};

use log::error;

use streamer::transmit::{TransmitConfig, Transmitter};

use server::ListenServer;

mod server;

const DEFAULT_PORT: u16 = 12345;

const USAGE: &str = "Usage: streamer-server [--serve] [--port PORT] [--host NAME] \
[--drop N] [--root-name NAME] [INPUT OUTPUT]";

#[derive(Debug)]
struct Args {
    serve: bool,
    port: u16,
    host: Option<String>,
    drop: Option<u32>,
    root_name: Option<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        serve: false,
        port: DEFAULT_PORT,
        host: None,
        drop: None,
        root_name: None,
        input: None,
        output: None,
    };
    let mut positional = Vec::new();
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--serve" => args.serve = true,
            "--port" => {
                let value = iter.next().ok_or("--port needs a value")?;
                args.port = value
                    .parse()
                    .map_err(|_| format!("Invalid port: {}", value))?;
            }
            "--host" => args.host = Some(iter.next().ok_or("--host needs a value")?),
            "--drop" => {
                let value = iter.next().ok_or("--drop needs a value")?;
                let drop: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid drop threshold: {}", value))?;
                if drop > 9 {
                    return Err(String::from("Drop threshold must be between 0 and 9"));
                }
                args.drop = Some(drop);
            }
            "--root-name" => {
                args.root_name = Some(iter.next().ok_or("--root-name needs a value")?)
            }
            _ if arg.starts_with("--") => return Err(format!("Unknown option: {}", arg)),
            _ => positional.push(arg),
        }
    }
    match positional.len() {
        0 => {}
        2 => {
            args.input = Some(PathBuf::from(&positional[0]));
            args.output = Some(PathBuf::from(&positional[1]));
        }
        _ => return Err(String::from("Expected INPUT and OUTPUT paths")),
    }
    if !args.serve && args.input.is_none() {
        return Err(String::from("Nothing to do: no input file and no --serve"));
    }
    Ok(args)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let mut config = TransmitConfig::default();
    if let Some(drop) = args.drop {
        config.drop_threshold = drop;
    }
    if let Some(host) = args.host {
        config.client_host = host;
    }
    config.receiver_root = args.root_name;
    let mut transmitter = Transmitter::new(config);

    if args.serve {
        transmitter.enable_server_mode();
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("Failed to create runtime: {}", err);
                return ExitCode::FAILURE;
            }
        };
        if let Err(err) = runtime.block_on(ListenServer::new(args.port).run()) {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    }

    if let (Some(input), Some(output)) = (args.input, args.output) {
        if let Err(err) = transmitter.transmit(&input, &output) {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
