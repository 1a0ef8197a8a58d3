use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mock-cli")]
#[command(about = "Operator CLI for the mock server admin API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "MOCK_ADMIN_URL", default_value = "http://127.0.0.1:3001")]
    url: String,

    /// Bearer token, when the admin API requires one
    #[arg(short, long, env = "MOCK_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server status and dials
    Status,
    /// Show the simulation dials
    Simulation,
    /// Step a dial up or down
    Step {
        #[arg(value_enum)]
        knob: Knob,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Set dials to absolute values
    Set {
        #[arg(long)]
        delay_factor: Option<f64>,
        #[arg(long)]
        fail_probability: Option<f64>,
        #[arg(long)]
        view_index: Option<u64>,
    },
    /// Show rolling request rates
    Rates,
    /// Gracefully stop the server
    Shutdown,
}

#[derive(Clone, Copy, ValueEnum)]
enum Knob {
    DelayFactor,
    FailProbability,
    View,
}

impl Knob {
    fn as_path(self) -> &'static str {
        match self {
            Knob::DelayFactor => "delay-factor",
            Knob::FailProbability => "fail-probability",
            Knob::View => "view",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn as_path(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Simulation => client.get(format!("{}/admin/simulation", base)),
        Commands::Step { knob, direction } => client.post(format!(
            "{}/admin/simulation/{}/{}",
            base,
            knob.as_path(),
            direction.as_path()
        )),
        Commands::Set {
            delay_factor,
            fail_probability,
            view_index,
        } => client.put(format!("{}/admin/simulation", base)).json(&serde_json::json!({
            "delay_factor": delay_factor,
            "fail_probability": fail_probability,
            "view_index": view_index,
        })),
        Commands::Rates => client.get(format!("{}/admin/rates", base)),
        Commands::Shutdown => client.post(format!("{}/admin/shutdown", base)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
