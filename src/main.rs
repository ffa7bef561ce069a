//! Dispatch Tree CLI
//!
//! Runs the built-in catalog of dispatch tools from the command line and
//! prints every answer as a pretty JSON envelope on stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use dispatch_tree::catalog::builtin_service;
use dispatch_tree::config::{load_config, ServiceConfig};
use dispatch_tree::observability::logging;
use dispatch_tree::service::{Response, Service};

#[derive(Parser)]
#[command(name = "dispatch-tree")]
#[command(about = "Evaluate dispatch-tree tools from the command line", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server name, version and status
    Info,
    /// List registered tools with their input schemas
    Tools,
    /// List registered resources
    Resources,
    /// Read one resource by URL
    Resource { url: String },
    /// List registered prompts
    Prompts,
    /// Print the dispatch tree behind a tool
    Tree { tool: String },
    /// Execute a tool
    Run {
        tool: String,
        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// Render a prompt
    Prompt {
        name: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    logging::init(&config.observability)?;

    let service = builtin_service(config);
    tracing::info!(
        tools = service.tools().len(),
        resources = service.resources().len(),
        prompts = service.prompts().len(),
        "Service ready"
    );

    let response = match cli.command {
        Commands::Info => Response::success("Server info", service.server_info()),
        Commands::Tools => Response::success("Tools retrieved", service.tools().infos()),
        Commands::Resources => {
            Response::success("Resources retrieved", service.resources().infos())
        }
        Commands::Resource { url } => match service.read_resource(&url) {
            Ok(contents) => Response::success("Resource retrieved", contents),
            Err(e) => Response::error(e.to_string()),
        },
        Commands::Prompts => Response::success("Prompts retrieved", service.prompts().infos()),
        Commands::Tree { tool } => render_tree(&service, &tool),
        Commands::Run { tool, params } => {
            let params = parse_object("params", &params)?;
            Response::from_execution(service.execute_tool(&tool, params).await)
        }
        Commands::Prompt { name, args } => {
            let args = parse_object("args", &args)?;
            match service.execute_prompt(&name, &args) {
                Ok(text) => Response::success(
                    "Prompt executed successfully",
                    serde_json::json!({ "promptName": name, "text": text }),
                ),
                Err(e) => Response::error(e.to_string()),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

fn render_tree(service: &Service, name: &str) -> Response {
    let Some(tool) = service.tools().get(name) else {
        return Response::error(format!("tool '{name}' not found"));
    };
    match tool.tree() {
        Some(tree) => Response::success("Tree rendered", tree.to_string()),
        None => Response::error(format!("tool '{name}' is not backed by a dispatch tree")),
    }
}

fn parse_object(what: &str, raw: &str) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(format!("--{what} must be a JSON object").into()),
    }
}
