use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use ui_control_plane::resilience::RetryPolicy;

#[derive(Parser)]
#[command(name = "uicp-cli")]
#[command(about = "Operator CLI for the UI configuration control plane", long_about = None)]
struct Cli {
    #[arg(short, long, env = "UICP_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Recorded as `activated_by` on publish and rollback.
    #[arg(long, env = "USER", default_value = "uicp-cli")]
    by: String,

    /// Attempts for publish and rollback when the environment is busy.
    #[arg(long, default_value_t = 5)]
    attempts: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service status and counts
    Status,
    /// List documents, newest first
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one document
    Show { version: String },
    /// Create a draft from a JSON file
    Create { file: PathBuf },
    /// Validate a JSON file without storing it
    Validate { file: PathBuf },
    /// Move a document to draft, preview or archived
    Promote { version: String, status: String },
    /// Copy a version into a new draft
    Fork {
        source: String,
        version: String,
        #[arg(long)]
        author: Option<String>,
    },
    /// Delete a draft or archived version
    Purge { version: String },
    /// Issue a preview code
    Preview {
        version: String,
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Revoke a preview code
    Revoke { code: String },
    /// Publish a version to an environment
    Publish { version: String, environment: String },
    /// Roll an environment back
    Rollback {
        environment: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Publish history of an environment
    History { environment: String },
    /// The config an environment currently serves
    Current { environment: String },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server returned {status}: {body}")]
    Api { status: StatusCode, body: Value },
}

impl CliError {
    fn is_conflict(&self) -> bool {
        matches!(self, CliError::Api { status, body }
            if *status == StatusCode::CONFLICT && body["error"] == "conflict")
    }
}

struct AdminClient {
    http: reqwest::Client,
    base: Url,
}

impl AdminClient {
    fn new(base: &str) -> Result<Self, CliError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(base)?,
        })
    }

    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, CliError> {
        let url = self.base.join(path)?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let res = request.send().await?;
        let status = res.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(json!({ "status": "ok" }));
        }
        let text = res.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        if status.is_success() {
            Ok(body)
        } else {
            Err(CliError::Api { status, body })
        }
    }

    async fn get(&self, path: &str) -> Result<Value, CliError> {
        self.call(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, CliError> {
        self.call(Method::POST, path, Some(body)).await
    }
}

fn read_json(file: &PathBuf) -> Result<Value, CliError> {
    let text = std::fs::read_to_string(file)?;
    Ok(serde_json::from_str(&text)?)
}

async fn execute(cli: Cli) -> Result<Value, CliError> {
    let client = AdminClient::new(&cli.url)?;
    let retry = RetryPolicy {
        max_attempts: cli.attempts.max(1),
        ..RetryPolicy::default()
    };

    match cli.command {
        Commands::Status => client.get("/admin/status").await,
        Commands::List { status } => match status {
            Some(status) => client.get(&format!("/admin/documents?status={status}")).await,
            None => client.get("/admin/documents").await,
        },
        Commands::Show { version } => client.get(&format!("/admin/documents/{version}")).await,
        Commands::Create { file } => client.post("/admin/documents", &read_json(&file)?).await,
        Commands::Validate { file } => client.post("/admin/validate", &read_json(&file)?).await,
        Commands::Promote { version, status } => {
            client
                .post(&format!("/admin/documents/{version}/status"), &json!({ "status": status }))
                .await
        }
        Commands::Fork { source, version, author } => {
            client
                .post(
                    &format!("/admin/documents/{source}/fork"),
                    &json!({ "version": version, "author": author }),
                )
                .await
        }
        Commands::Purge { version } => {
            client
                .call(Method::DELETE, &format!("/admin/documents/{version}"), None)
                .await
        }
        Commands::Preview { version, ttl } => {
            client
                .post("/admin/previews", &json!({ "version": version, "ttl_secs": ttl }))
                .await
        }
        Commands::Revoke { code } => {
            client
                .call(Method::DELETE, &format!("/admin/previews/{code}"), None)
                .await
        }
        Commands::Publish { version, environment } => {
            let path = format!("/admin/environments/{environment}/publish");
            let body = json!({ "version": version, "activated_by": cli.by });
            retry
                .run(|| client.post(&path, &body), CliError::is_conflict)
                .await
        }
        Commands::Rollback { environment, to } => {
            let path = format!("/admin/environments/{environment}/rollback");
            let body = json!({ "target_version": to, "activated_by": cli.by });
            retry
                .run(|| client.post(&path, &body), CliError::is_conflict)
                .await
        }
        Commands::History { environment } => {
            client
                .get(&format!("/admin/environments/{environment}/history"))
                .await
        }
        Commands::Current { environment } => client.get(&format!("/v1/config/{environment}")).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{value}"),
        },
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
