use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "grant-cli")]
#[command(about = "Command-line client for the grant coordinator API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GRANT_COORDINATOR_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a grant with its off-chain record
    Grant { id: String },
    /// Show a milestone with labelled approvers
    Milestone { grant_id: String, milestone_id: String },
    /// Build a create_grant envelope
    Create {
        #[arg(long)]
        funder: String,
        #[arg(long)]
        manager: String,
        #[arg(long)]
        supervisor: String,
        #[arg(long)]
        researcher: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        total_amount: String,
        #[arg(long)]
        total_milestones: u32,
        #[arg(long)]
        institution: String,
        #[arg(long)]
        manager_email: String,
        #[arg(long)]
        manager_name: String,
        #[arg(long)]
        supervisor_email: String,
        #[arg(long)]
        supervisor_name: String,
        #[arg(long)]
        researcher_email: String,
        #[arg(long)]
        researcher_name: String,
    },
    /// Build a register_milestone envelope
    RegisterMilestone {
        #[arg(long)]
        manager: String,
        #[arg(long)]
        grant_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
    },
    /// Build an approve_milestone envelope
    Approve {
        #[arg(long)]
        signer: String,
        #[arg(long)]
        grant_id: String,
        #[arg(long)]
        milestone_id: String,
    },
    /// Build a claim_payment envelope
    Claim {
        #[arg(long)]
        claimer: String,
        #[arg(long)]
        grant_id: String,
        #[arg(long)]
        milestone_id: String,
    },
    /// Link a submitted grant to its on-chain id
    Confirm {
        local_id: i64,
        on_chain_id: u64,
        /// Hash returned by `create`, checked against the issued envelope
        #[arg(long)]
        tx_hash: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Grant { id } => client.get(format!("{}/grants/{}", base, id)),
        Commands::Milestone {
            grant_id,
            milestone_id,
        } => client.get(format!("{}/grants/{}/milestones/{}", base, grant_id, milestone_id)),
        Commands::Create {
            funder,
            manager,
            supervisor,
            researcher,
            name,
            total_amount,
            total_milestones,
            institution,
            manager_email,
            manager_name,
            supervisor_email,
            supervisor_name,
            researcher_email,
            researcher_name,
        } => client
            .post(format!("{}/grants/build/create", base))
            .json(&json!({
                "funder": funder,
                "manager": manager,
                "supervisor": supervisor,
                "researcher": researcher,
                "name": name,
                "total_amount": total_amount,
                "total_milestones": total_milestones,
                "funderInstitutionName": institution,
                "managerEmail": manager_email,
                "managerName": manager_name,
                "supervisorEmail": supervisor_email,
                "supervisorName": supervisor_name,
                "researcherEmail": researcher_email,
                "researcherName": researcher_name,
            })),
        Commands::RegisterMilestone {
            manager,
            grant_id,
            name,
            description,
        } => client
            .post(format!("{}/grants/build/register-milestone", base))
            .json(&json!({
                "manager": manager,
                "grant_id": grant_id,
                "name": name,
                "description": description,
            })),
        Commands::Approve {
            signer,
            grant_id,
            milestone_id,
        } => client
            .post(format!("{}/grants/build/approve-milestone", base))
            .json(&json!({
                "signer": signer,
                "grant_id": grant_id,
                "milestone_id": milestone_id,
            })),
        Commands::Claim {
            claimer,
            grant_id,
            milestone_id,
        } => client
            .post(format!("{}/grants/build/claim-payment", base))
            .json(&json!({
                "claimer": claimer,
                "grant_id": grant_id,
                "milestone_id": milestone_id,
            })),
        Commands::Confirm {
            local_id,
            on_chain_id,
            tx_hash,
        } => client
            .post(format!("{}/grants/{}/confirm", base, local_id))
            .json(&json!({ "onChainId": on_chain_id, "txHash": tx_hash })),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: coordinator returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
