use anyhow::{anyhow, Result};
use clap::Parser;
use session_core::GameClient;
use shared::{
    domain::{Difficulty, Phase},
    protocol::PolicyPatch,
};

/// Plays one full policy-simulation session against a running
/// backend, printing per-turn metrics and narrative events.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "POLICY_SIM_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server_url: String,
    #[arg(long, value_enum, default_value_t = Difficulty::Normal)]
    difficulty: Difficulty,
    /// Seed for a deterministic run.
    #[arg(long)]
    seed: Option<i64>,
    #[arg(long)]
    enable_tax: bool,
    #[arg(long)]
    enable_ubi: bool,
    #[arg(long)]
    enable_education: bool,
    #[arg(long)]
    base_income: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let client = GameClient::connect(args.server_url);
    client.start_game(args.difficulty, args.seed).await;

    let state = client.state();
    if let Some(error) = &state.error {
        return Err(anyhow!("failed to start session: {error}"));
    }
    let session_id = state
        .session_id
        .clone()
        .ok_or_else(|| anyhow!("backend returned no session"))?;
    println!("Session {session_id} started ({} turns)", state.max_turns);

    client
        .edit_policy(PolicyPatch {
            tax_enabled: args.enable_tax.then_some(true),
            ubi_enabled: args.enable_ubi.then_some(true),
            education_enabled: args.enable_education.then_some(true),
            base_income: args.base_income,
            ..PolicyPatch::default()
        })
        .await;

    while client.state().phase == Phase::Playing {
        client.advance_turn().await;
        let state = client.state();
        if let Some(error) = &state.error {
            return Err(anyhow!("turn failed: {error}"));
        }
        if let Some(snapshot) = &state.snapshot {
            println!(
                "turn {:>2}/{}  gini={:.3}  wealth={:.1}  happiness={:.2}  poverty={}/{}",
                state.turn,
                state.max_turns,
                snapshot.gini,
                snapshot.mean_wealth,
                snapshot.mean_happiness,
                snapshot.agents_in_poverty,
                snapshot.population,
            );
        }
        for event in &state.latest_events {
            println!("         [{:?}] {}: {}", event.category, event.name, event.description);
        }
    }

    let state = client.state();
    println!("Session finished after {} turns.", state.turn);
    if let Some(scores) = state.scores {
        println!(
            "prosperity={} equality={} happiness={} stability={}",
            scores.prosperity, scores.equality, scores.happiness, scores.stability
        );
        println!(
            "composite={} grade={:?} ({})",
            scores.composite,
            scores.grade,
            scores.grade.title()
        );
    }
    Ok(())
}
