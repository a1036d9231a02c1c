use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_PAYMENT_API_URL: &str = "https://api.stripe.com";

/// ParkEase management console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the ParkEase API
    #[arg(long, env = "PARKEASE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Payment processor publishable key
    #[arg(long, env = "STRIPE_PUBLISHABLE_KEY", hide_env_values = true)]
    pub publishable_key: Option<String>,

    /// Payment processor API base URL
    #[arg(long, env = "STRIPE_API_URL", default_value = DEFAULT_PAYMENT_API_URL)]
    pub payment_api_url: String,

    /// Path to the local database (session token and parts inventory)
    #[arg(long, env = "PARKEASE_SESSION_DB")]
    pub session_db: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log output format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show session state and admin flag
    Status,
    /// Parking space grid
    #[command(subcommand)]
    Spaces(SpacesCommand),
    /// Book a space for a customer (terms, details, payment)
    Book {
        /// Space number as shown on the grid
        space: i64,
    },
    /// Garage vehicles
    #[command(subcommand)]
    Vehicles(VehiclesCommand),
    /// Garage service transactions
    #[command(subcommand)]
    Transactions(TransactionsCommand),
    /// User management
    #[command(subcommand)]
    Users(UsersCommand),
    /// Parts inventory
    #[command(subcommand)]
    Inventory(InventoryCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SpacesCommand {
    /// List spaces with their status
    List,
    /// Set a space's status by space number
    SetStatus { space: i64, status: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum VehiclesCommand {
    List,
    Get { id: String },
    /// Add a vehicle from a JSON record
    Add(JsonRecord),
    /// Patch a vehicle with a JSON record
    Update {
        id: String,
        #[command(flatten)]
        record: JsonRecord,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum TransactionsCommand {
    List,
    /// Add a transaction from a JSON record
    Add(JsonRecord),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum UsersCommand {
    Search { email: String },
    /// Add a user with payment details and vehicles (prompts for each field)
    Add,
    /// Edit a user (prompts for each field)
    Edit {
        id: i64,
        /// Prefill the prompts from the user with this email
        #[arg(long)]
        email: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum InventoryCommand {
    /// List items with item count and stock value
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        quantity: u32,
        /// Cost per unit
        #[arg(long)]
        cost: f64,
    },
    /// Change the given fields of an item
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        cost: Option<f64>,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct JsonRecord {
    /// Record as a JSON object
    #[arg(long)]
    pub json: String,
}

impl JsonRecord {
    pub fn parse(&self) -> Result<serde_json::Value> {
        let value: serde_json::Value =
            serde_json::from_str(&self.json).context("--json is not valid JSON")?;
        if !value.is_object() {
            anyhow::bail!("--json must be a JSON object");
        }
        Ok(value)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Remote endpoints
    pub api_url: String,
    pub payment_api_url: String,
    pub publishable_key: Option<String>,

    // Session
    pub session_db: PathBuf,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration with priority: CLI > ENV (.env included) > defaults
    pub fn load() -> Result<(Self, Command)> {
        dotenvy::dotenv().ok();
        let args = CliArgs::parse();
        let command = args.command.clone();
        Ok((Self::from_args(args)?, command))
    }

    pub fn from_args(args: CliArgs) -> Result<Self> {
        let session_db = match args.session_db {
            Some(path) => expand_tilde(&path),
            None => default_session_db()?,
        };

        Ok(Config {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            payment_api_url: args.payment_api_url,
            publishable_key: args.publishable_key.filter(|k| !k.trim().is_empty()),
            session_db,
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level,
            log_format: parse_log_format(&args.log_format),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!("PARKEASE_API_URL must be an http(s) URL: {}", self.api_url);
        }
        Ok(())
    }

    /// Publishable key, required only for card payments
    pub fn require_publishable_key(&self) -> Result<&str> {
        self.publishable_key
            .as_deref()
            .context("STRIPE_PUBLISHABLE_KEY is required for payments (use --publishable-key or set the env var)")
    }
}

fn default_session_db() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("Cannot determine a data directory; set PARKEASE_SESSION_DB")?;
    Ok(base.join("parkease").join("session.sqlite3"))
}

fn parse_log_format(s: &str) -> LogFormat {
    match s.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("parkease").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/file.txt");
        assert!(path.to_string_lossy().contains("test/file.txt"));
        assert!(!path.to_string_lossy().starts_with("~"));

        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
        assert_eq!(expand_tilde("~"), PathBuf::from("~"));
    }

    #[test]
    fn test_from_args() {
        let args = parse(&[
            "--api-url",
            "https://parkease.example/api/",
            "--session-db",
            "/tmp/s.sqlite3",
            "--publishable-key",
            "  ",
            "status",
        ]);
        assert_eq!(args.command, Command::Status);

        let config = Config::from_args(args).unwrap();
        assert_eq!(config.api_url, "https://parkease.example/api");
        assert_eq!(config.session_db, PathBuf::from("/tmp/s.sqlite3"));
        assert_eq!(config.publishable_key, None);
        assert!(config.require_publishable_key().is_err());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let args = parse(&["--api-url", "localhost:8080", "--session-db", "x", "logout"]);
        let config = Config::from_args(args).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(
            parse(&["spaces", "set-status", "4", "Booked"]).command,
            Command::Spaces(SpacesCommand::SetStatus {
                space: 4,
                status: "Booked".to_string()
            })
        );
        assert_eq!(parse(&["book", "12"]).command, Command::Book { space: 12 });
        assert_eq!(
            parse(&["login", "-e", "a@b.c"]).command,
            Command::Login {
                email: Some("a@b.c".to_string()),
                password: None
            }
        );
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("json"), LogFormat::Json);
        assert_eq!(parse_log_format("JSON"), LogFormat::Json);
        assert_eq!(parse_log_format("text"), LogFormat::Text);
        assert_eq!(parse_log_format("pretty"), LogFormat::Text);

        let args = parse(&["--log-format", "json", "--session-db", "x", "status"]);
        assert_eq!(Config::from_args(args).unwrap().log_format, LogFormat::Json);
    }

    #[test]
    fn test_user_and_inventory_subcommands() {
        assert_eq!(parse(&["users", "add"]).command, Command::Users(UsersCommand::Add));
        assert_eq!(
            parse(&["users", "edit", "7", "--email", "g@h.io"]).command,
            Command::Users(UsersCommand::Edit {
                id: 7,
                email: Some("g@h.io".to_string())
            })
        );
        assert_eq!(
            parse(&["inventory", "add", "--name", "Brake Pads", "--quantity", "30", "--cost", "40.5"])
                .command,
            Command::Inventory(InventoryCommand::Add {
                name: "Brake Pads".to_string(),
                quantity: 30,
                cost: 40.5
            })
        );
        assert_eq!(
            parse(&["inventory", "edit", "3", "--quantity", "12"]).command,
            Command::Inventory(InventoryCommand::Edit {
                id: 3,
                name: None,
                quantity: Some(12),
                cost: None
            })
        );
        assert!(CliArgs::try_parse_from(["parkease", "inventory", "add", "--name", "x", "--quantity", "-1", "--cost", "1"]).is_err());
    }

    #[test]
    fn test_json_record() {
        let record = JsonRecord {
            json: r#"{"plateNumber":"ABC123"}"#.to_string(),
        };
        assert_eq!(record.parse().unwrap()["plateNumber"], "ABC123");

        let record = JsonRecord {
            json: "[1,2]".to_string(),
        };
        assert!(record.parse().is_err());
    }
}
