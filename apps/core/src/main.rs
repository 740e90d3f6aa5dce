use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use appctl_core::config::{self, Config};
use appctl_core::contract::{AppRequest, CoreRequest, CoreResponse, ListRunningRequest};
use appctl_core::engine::AppEngine;
use appctl_core::logging;
use appctl_core::transport::{self, ErrorCode, TransportResponse};
use appctl_core::worker::EngineWorker;
use clap::{Parser, Subcommand};
use log::LevelFilter;

const EXIT_NEGATIVE: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// Find, launch and stop installed applications by name.
#[derive(Parser, Debug)]
#[command(name = "appctl", version)]
struct Cli {
    /// Engine config file (.toml, .json or .json5)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print transport JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the executable an application name resolves to
    Resolve {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Launch an application
    Open {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Force-kill every running process of an application
    Close {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Close, wait, then launch again
    Restart {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// List running applications
    Ps {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Answer JSON requests read line by line from stdin
    Serve,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(error) = logging::init(level) {
        eprintln!("[appctl] file logging unavailable: {error}");
    }

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("[appctl] {error}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let engine = match AppEngine::new(config) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("[appctl] {error}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let code = match cli.command {
        Command::Serve => serve(engine),
        command => run_once(&engine, command, cli.json),
    };
    log::logger().flush();
    std::process::exit(code);
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    match path {
        Some(path) => config::load(path),
        None => Ok(Config::default()),
    }
}

fn run_once(engine: &AppEngine, command: Command, json: bool) -> i32 {
    let request = match command {
        Command::Resolve { name } => CoreRequest::Resolve(app_request(name)),
        Command::Open { name } => CoreRequest::Launch(app_request(name)),
        Command::Close { name } => CoreRequest::Terminate(app_request(name)),
        Command::Restart { name } => CoreRequest::Restart(app_request(name)),
        Command::Ps { limit } => CoreRequest::ListRunning(ListRunningRequest { limit }),
        Command::Serve => return EXIT_USAGE,
    };

    let response = transport::handle_request(engine, request);
    if json {
        println!("{}", transport::encode(&response));
    } else {
        print_plain(&response);
    }
    exit_code(&response)
}

fn app_request(words: Vec<String>) -> AppRequest {
    AppRequest {
        name: words.join(" "),
    }
}

fn print_plain(response: &TransportResponse) {
    match response {
        TransportResponse::Ok { response } => match response {
            CoreResponse::Resolve(resolved) => {
                println!("{}", resolved.target.path);
                for skipped in &resolved.skipped {
                    eprintln!("[appctl] {} skipped: {}", skipped.source, skipped.reason);
                }
            }
            CoreResponse::Launch(launched) | CoreResponse::Restart(launched) => {
                match &launched.target {
                    Some(target) if launched.launched => println!("launched {target}"),
                    _ => println!("could not launch"),
                }
            }
            CoreResponse::Terminate(terminated) => {
                if terminated.killed.is_empty() {
                    println!("nothing was running");
                }
                for name in &terminated.killed {
                    println!("killed {name}");
                }
            }
            CoreResponse::ListRunning(running) => {
                for name in &running.applications {
                    println!("{name}");
                }
            }
        },
        TransportResponse::Err { error } => eprintln!("[appctl] {}", error.message),
    }
}

fn exit_code(response: &TransportResponse) -> i32 {
    match response {
        TransportResponse::Ok { response } if response.succeeded() => 0,
        TransportResponse::Ok { .. } => EXIT_NEGATIVE,
        TransportResponse::Err { error } => match error.code {
            ErrorCode::InvalidJson | ErrorCode::InvalidRequest | ErrorCode::Config => EXIT_USAGE,
            ErrorCode::NotFound | ErrorCode::Launch => EXIT_NEGATIVE,
        },
    }
}

fn serve(engine: AppEngine) -> i32 {
    let worker = match EngineWorker::spawn(Arc::new(engine)) {
        Ok(worker) => worker,
        Err(error) => {
            eprintln!("[appctl] {error}");
            return EXIT_NEGATIVE;
        }
    };
    log::info!("serving JSON requests on stdin");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                log::error!("stdin read failed: {error}");
                return EXIT_NEGATIVE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match transport::decode(&line) {
            Ok(request) => match worker.call(request) {
                Ok(response) => response,
                Err(error) => {
                    eprintln!("[appctl] {error}");
                    return EXIT_NEGATIVE;
                }
            },
            Err(rejected) => rejected,
        };

        if writeln!(stdout, "{}", transport::encode(&response))
            .and_then(|()| stdout.flush())
            .is_err()
        {
            return EXIT_NEGATIVE;
        }
    }
    0
}
