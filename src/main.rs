use std::fs;
use std::io;
use std::path::Path;

use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_gateway::config::load_config;
use osm_gateway::data::osm::{ChangesetId, OsmId};
use osm_gateway::errors::Result;
use osm_gateway::OsmApiClient;

const DEFAULT_CONFIG_PATH: &str = "config/osm.json";

const USAGE: &str = "usage: osm-gateway <config.json> <command> [args]

commands:
  whoami                  print the authenticated user
  traces                  list the user's traces as JSON
  way <id>                print a complete way as JSON
  close-changeset <id>    close an open changeset
  upload <file>           upload a file as a private trace
  delete-trace <id>       delete a trace";

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn argument<'a>(args: &'a [String], index: usize) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| USAGE.into())
}

fn run(client: &OsmApiClient, command: &str, args: &[String]) -> Result<()> {
    match command {
        "whoami" => match client.get_user_details()? {
            Some(user) => println!("{} ({})", user.display_name, user.id),
            None => println!("not logged in"),
        },
        "traces" => {
            let traces = client.get_traces()?;
            println!("{}", serde_json::to_string_pretty(&traces)?);
        }
        "way" => {
            let way_id: OsmId = argument(args, 0)?.parse()?;
            match client.get_complete_way(way_id)? {
                Some(way) => println!("{}", serde_json::to_string_pretty(&way)?),
                None => println!("way {} not found", way_id),
            }
        }
        "close-changeset" => {
            let changeset_id: ChangesetId = argument(args, 0)?.parse()?;
            client.close_changeset(changeset_id)?;
            println!("closed changeset {}", changeset_id);
        }
        "upload" => {
            let path = Path::new(argument(args, 0)?);
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or("Could not get input file name")?;
            let content = fs::read(path)?;
            client.create_trace(file_name, content)?;
            println!("uploaded {}", file_name);
        }
        "delete-trace" => {
            let trace_id = argument(args, 0)?;
            client.delete_trace(trace_id)?;
            println!("deleted trace {}", trace_id);
        }
        _ => return Err(USAGE.into()),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args.first().map(String::as_str).unwrap_or(DEFAULT_CONFIG_PATH);
    let command = argument(&args, 1)?;

    let config = load_config(Path::new(config_path))?;
    setup_logging(&config.log_level);
    info!(base_address = config.osm.base_address.as_str(), command = command; "Starting");

    let client = OsmApiClient::new(&config.osm, &config.session);
    run(&client, command, &args[2..])
}
