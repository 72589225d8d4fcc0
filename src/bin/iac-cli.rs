use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "iac-cli")]
#[command(about = "Command-line client for the infrastructure dashboard API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "IAC_DASHBOARD_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Ec2,
    Alb,
    Rds,
    S3,
    Cloudfront,
    Vpc,
}

impl Resource {
    fn path(self) -> &'static str {
        match self {
            Resource::Ec2 => "ec2",
            Resource::Alb => "alb",
            Resource::Rds => "rds",
            Resource::S3 => "s3",
            Resource::Cloudfront => "cloudfront",
            Resource::Vpc => "vpc",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full infrastructure status
    Status,
    /// A single resource descriptor
    Resources {
        #[arg(value_enum)]
        resource: Resource,
    },
    /// Per-component health rollup
    Health,
    /// Simulated deployment progress
    Progress,
    /// List polls
    Polls {
        /// Only polls still accepting votes
        #[arg(long)]
        active: bool,
    },
    /// Create a poll
    CreatePoll {
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Repeat once per option
        #[arg(short = 'o', long = "option", required = true)]
        options: Vec<String>,
    },
    /// Cast a vote
    Vote { poll: u64, option: u64 },
    /// Stop a poll from accepting votes
    Deactivate { poll: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/api/resources/status")),
        Commands::Resources { resource } => {
            client.get(format!("{base}/api/resources/{}", resource.path()))
        }
        Commands::Health => client.get(format!("{base}/api/resources/health")),
        Commands::Progress => client.get(format!("{base}/api/resources/deployment-progress")),
        Commands::Polls { active } => {
            let path = if active { "/api/votes/active" } else { "/api/votes" };
            client.get(format!("{base}{path}"))
        }
        Commands::CreatePoll {
            question,
            description,
            options,
        } => client.post(format!("{base}/api/votes")).json(&json!({
            "question": question,
            "description": description,
            "options": options,
        })),
        Commands::Vote { poll, option } => {
            client.post(format!("{base}/api/votes/{poll}/options/{option}"))
        }
        Commands::Deactivate { poll } => client.put(format!("{base}/api/votes/{poll}/deactivate")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    if json.get("status").and_then(Value::as_str) == Some("error") {
        eprintln!(
            "Error: {}",
            json.get("message").and_then(Value::as_str).unwrap_or("request failed")
        );
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
