mod config;

use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, Subcommand};
use config::{Config, Context, Target};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

const AGENCY_HEADER: &str = "x-agency-id";

#[derive(Parser)]
#[command(name = "tripdesk")]
#[command(version, about = "Tripdesk operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tripdesk server URL (overrides the current context)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Agency id sent as X-Agency-Id (overrides the current context)
    #[arg(long, global = true)]
    agency: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Context management
    Context {
        #[command(subcommand)]
        command: ContextCommand,
    },
    /// Check server and database health
    Health,
    /// Database administration
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    /// Trips of the current agency
    Trips {
        #[command(subcommand)]
        command: TripsCommand,
    },
    /// Contacts of the current agency
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
    /// Price one activity
    /// Examples:
    ///     tripdesk quote --cost 100000 --markup-bps 1500
    ///     tripdesk quote --model commissionable --cost 90000 --commission-bps 1000 --tax 4500
    #[command(verbatim_doc_comment)]
    Quote(QuoteArgs),
}

#[derive(Subcommand)]
enum ContextCommand {
    /// Add a new context
    /// Examples:
    ///     tripdesk context add local --server-url=http://localhost:8080 --agency=1
    ///     tripdesk context add prod --server-url=https://api.tripdesk.io --set-current
    #[command(verbatim_doc_comment)]
    Add {
        /// Context name
        name: String,
        #[arg(long)]
        server_url: String,
        #[arg(long)]
        agency: Option<i64>,
        /// Set as current context
        #[arg(long)]
        set_current: bool,
    },
    /// List all configured contexts
    List,
    /// Switch to a different context
    Use {
        /// Context name to switch to
        name: String,
    },
    /// Delete a context
    Delete {
        name: String,
    },
    /// Show current active context
    Current,
}

#[derive(Subcommand)]
enum DbCommand {
    /// Apply the schema (idempotent)
    Init,
    /// Report missing tables
    Validate,
}

#[derive(Subcommand)]
enum TripsCommand {
    /// List trips
    List {
        /// planning, quoted, booked, in_progress, completed or cancelled
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Money summary of one trip
    Summary {
        id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ContactsCommand {
    /// List contacts alphabetically
    List {
        /// Case-insensitive search on name, email or phone
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Serialize, Debug, Clone, PartialEq)]
struct QuoteArgs {
    /// Net cost or gross supplier rate, in cents
    #[arg(long = "cost")]
    #[serde(rename = "cost_cents")]
    cost: i64,
    /// net or commissionable
    #[arg(long, default_value = "net")]
    model: String,
    #[arg(long, default_value_t = 0)]
    markup_bps: i32,
    /// Explicit client price in cents
    #[arg(long = "sell-price")]
    #[serde(rename = "sell_price_cents", skip_serializing_if = "Option::is_none")]
    sell_price: Option<i64>,
    #[arg(long, default_value_t = 0)]
    commission_bps: i32,
    #[arg(long = "tax", default_value_t = 0)]
    #[serde(rename = "tax_cents")]
    tax: i64,
    #[arg(long = "fee", default_value_t = 0)]
    #[serde(rename = "service_fee_cents")]
    fee: i64,
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    advisor_share_bps: Option<i32>,
    /// Currency for formatted amounts
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[arg(long)]
    #[serde(skip)]
    json: bool,
}

/// HTTP client bound to one server and agency.
struct Api {
    client: Client,
    target: Target,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.target.server_url, path)
    }

    fn tenant(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let agency = self
            .target
            .agency
            .context("No agency set: pass --agency or add one to the current context")?;
        Ok(request.header(AGENCY_HEADER, agency.to_string()))
    }

    /// Send and decode JSON; HTTP failures print `status - body` and exit 1.
    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Value> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", action))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%status, action, "Request succeeded");
            let text = response
                .text()
                .await
                .with_context(|| format!("Failed to read {} response", action))?;
            return decode_body(&text)
                .with_context(|| format!("Failed to decode {} response", action));
        }
        let text = response.text().await?;
        eprintln!("Failed to {}: {} - {}", action, status, text);
        std::process::exit(1);
    }
}

/// JSON body of a successful response; an empty body (204) is `null`.
fn decode_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TRIPDESK_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    if let Commands::Context { command } = cli.command {
        return handle_context_command(&mut config, command);
    }

    let api = Api {
        client: Client::new(),
        target: config.resolve(cli.server_url, cli.agency),
    };
    tracing::debug!(server_url = %api.target.server_url, agency = ?api.target.agency, "Target resolved");

    match cli.command {
        Commands::Context { .. } => {}
        Commands::Health => {
            let result = api.send(api.client.get(api.url("/api/health")), "check health").await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Db { command } => {
            let result = match command {
                DbCommand::Init => {
                    api.send(api.client.post(api.url("/api/v1/admin/db/init")), "initialize database")
                        .await?
                }
                DbCommand::Validate => {
                    api.send(
                        api.client.get(api.url("/api/v1/admin/db/validate")),
                        "validate database",
                    )
                    .await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Trips { command } => match command {
            TripsCommand::List { status, json } => {
                let mut request = api.client.get(api.url("/api/v1/trips"));
                if let Some(status) = &status {
                    request = request.query(&[("status", status)]);
                }
                let result = api.send(api.tenant(request)?, "list trips").await?;
                print_result(&result, json, render_trips);
            }
            TripsCommand::Summary { id, json } => {
                let request = api.client.get(api.url(&format!("/api/v1/trips/{}/summary", id)));
                let result = api.send(api.tenant(request)?, "get trip summary").await?;
                print_result(&result, json, render_summary);
            }
        },
        Commands::Contacts { command } => match command {
            ContactsCommand::List { q, json } => {
                let mut request = api.client.get(api.url("/api/v1/contacts"));
                if let Some(q) = &q {
                    request = request.query(&[("q", q)]);
                }
                let result = api.send(api.tenant(request)?, "list contacts").await?;
                print_result(&result, json, render_contacts);
            }
        },
        Commands::Quote(args) => {
            let request = api.client.post(api.url("/api/v1/pricing/quote")).json(&args);
            let result = api.send(request, "quote").await?;
            print_result(&result, args.json, render_quote);
        }
    }

    Ok(())
}

fn handle_context_command(config: &mut Config, command: ContextCommand) -> Result<()> {
    match command {
        ContextCommand::Add {
            name,
            server_url,
            agency,
            set_current,
        } => {
            config
                .contexts
                .insert(name.clone(), Context { server_url, agency });
            if set_current || config.current_context.is_none() {
                config.current_context = Some(name.clone());
            }
            config.save()?;
            println!("Context '{}' added.", name);
            if config.current_context.as_ref() == Some(&name) {
                println!("Context '{}' is now the current context.", name);
            }
        }
        ContextCommand::List => {
            println!("  {:<20} {:<40} {:<8}", "NAME", "SERVER URL", "AGENCY");
            for (name, ctx) in &config.contexts {
                let current_mark = if config.current_context.as_ref() == Some(name) {
                    "*"
                } else {
                    " "
                };
                let agency = ctx.agency.map(|a| a.to_string()).unwrap_or_default();
                println!("{} {:<20} {:<40} {:<8}", current_mark, name, ctx.server_url, agency);
            }
        }
        ContextCommand::Use { name } => {
            if config.contexts.contains_key(&name) {
                config.current_context = Some(name.clone());
                config.save()?;
                println!("Switched to context '{}'.", name);
            } else {
                eprintln!("Context '{}' not found.", name);
                std::process::exit(1);
            }
        }
        ContextCommand::Delete { name } => {
            if config.contexts.remove(&name).is_some() {
                if config.current_context.as_ref() == Some(&name) {
                    config.current_context = None;
                }
                config.save()?;
                println!("Context '{}' deleted.", name);
            } else {
                eprintln!("Context '{}' not found.", name);
                std::process::exit(1);
            }
        }
        ContextCommand::Current => {
            if let Some((name, ctx)) = config.get_current_context() {
                println!("Current context: {} ({})", name, ctx.server_url);
            } else {
                println!("No current context set.");
            }
        }
    }
    Ok(())
}

fn print_result(result: &Value, json_only: bool, render: fn(&Value) -> String) {
    if json_only {
        println!("{}", result);
    } else {
        print!("{}", render(result));
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn cents(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// `123456` -> `1234.56`
fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn render_trips(result: &Value) -> String {
    let mut out = format!(
        "{:<8} {:<32} {:<12} {:<12} {:<12}\n",
        "ID", "NAME", "STATUS", "START", "END"
    );
    for trip in result.as_array().into_iter().flatten() {
        out.push_str(&format!(
            "{:<8} {:<32} {:<12} {:<12} {:<12}\n",
            trip.get("id").and_then(Value::as_i64).unwrap_or_default(),
            text(trip, "name"),
            text(trip, "status"),
            text(trip, "start_date"),
            text(trip, "end_date"),
        ));
    }
    out
}

fn render_contacts(result: &Value) -> String {
    let mut out = format!("{:<8} {:<32} {:<32} {:<16}\n", "ID", "NAME", "EMAIL", "PHONE");
    for contact in result.as_array().into_iter().flatten() {
        out.push_str(&format!(
            "{:<8} {:<32} {:<32} {:<16}\n",
            contact.get("id").and_then(Value::as_i64).unwrap_or_default(),
            text(contact, "display_name"),
            text(contact, "email"),
            text(contact, "phone"),
        ));
    }
    out
}

fn render_summary(result: &Value) -> String {
    let currency = text(result, "currency");
    let totals = &result["totals"];
    let mut out = String::new();
    for (label, key) in [
        ("Client total", "client_total_cents"),
        ("Paid", "paid_cents"),
        ("Balance due", "balance_due_cents"),
        ("Agency revenue", "agency_revenue_cents"),
        ("Advisor payout", "advisor_payout_cents"),
    ] {
        out.push_str(&format!("{:<16} {:>14} {}\n", label, format_cents(cents(totals, key)), currency));
    }
    let unallocated = cents(result, "unallocated_cents");
    if unallocated != 0 {
        out.push_str(&format!("{:<16} {:>14} {}\n", "Unallocated", format_cents(unallocated), currency));
    }
    let travelers = result["travelers"].as_array().cloned().unwrap_or_default();
    if !travelers.is_empty() {
        out.push_str("\nPer traveler:\n");
        for traveler in &travelers {
            out.push_str(&format!(
                "  {:<30} {:>14} {}\n",
                text(traveler, "display_name"),
                format_cents(cents(traveler, "amount_cents")),
                currency
            ));
        }
    }
    out
}

fn render_quote(result: &Value) -> String {
    let mut out = String::new();
    for (label, key) in [
        ("Cost", "cost_cents"),
        ("Sell price", "sell_price_cents"),
        ("Commission", "commission_cents"),
        ("Client total", "client_total_cents"),
        ("Agency revenue", "agency_revenue_cents"),
        ("Advisor payout", "advisor_payout_cents"),
        ("Agency net", "agency_net_cents"),
    ] {
        out.push_str(&format!("{:<16} {:>14}\n", label, format_cents(cents(result, key))));
    }
    let margin = result.get("margin_bps").and_then(Value::as_i64).unwrap_or(0);
    out.push_str(&format!("{:<16} {:>13}%\n", "Margin", format_cents(margin)));
    out
}
