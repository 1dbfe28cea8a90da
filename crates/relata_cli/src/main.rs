use anyhow::Context;
use clap::{Parser, Subcommand};
use relata_core::{Agent, EngineConfig, RelataConfig};
use relata_social::{DynamicsReport, ScriptedGenerator, SocialEngine};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lines the scripted speaker cycles through during `simulate`.
const SCRIPT: &[&str] = &[
    "I appreciate your perspective on this",
    "I feel uncertain about this direction",
    "That makes sense, I agree with the balanced approach",
    "I disagree with your interpretation, but I see why",
    "Your insight helped me see this differently",
    "This approach is ignoring important constraints",
    "I understand your concerns and I trust your judgment",
    "However, the results are still inconclusive",
];

#[derive(Parser, Debug)]
#[command(name = "relata", author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted conversation, letting the top recommendation speak each turn
    Simulate {
        /// Path to the config file
        #[arg(short, long, default_value = "relata.toml")]
        config: PathBuf,

        /// Comma-separated agent ids (overrides config)
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,

        /// Number of turns (overrides config)
        #[arg(long)]
        turns: Option<usize>,

        /// Seed for the random source (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the final snapshot JSON here
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Import a snapshot and print its dynamics report
    Inspect {
        /// Snapshot JSON file
        file: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Simulate {
            config,
            agents,
            turns,
            seed,
            export,
        } => {
            let mut cfg = RelataConfig::load_or_default(&config);
            if !agents.is_empty() {
                cfg.simulation.agents = agents;
            }
            if let Some(turns) = turns {
                cfg.simulation.turns = turns;
            }
            if seed.is_some() {
                cfg.engine.seed = seed;
            }
            simulate(&cfg, export).await
        }
        Command::Inspect { file } => inspect(file),
    }
}

async fn simulate(cfg: &RelataConfig, export: Option<PathBuf>) -> anyhow::Result<()> {
    let agents: Vec<Agent> = cfg.simulation.agents.iter().map(Agent::new).collect();
    let generator = ScriptedGenerator::new(SCRIPT.iter().copied());
    let mut engine = SocialEngine::new(agents, &cfg.engine, Box::new(generator))
        .context("Failed to build social engine")?;

    info!(
        "Simulating {} turns over {} agents",
        cfg.simulation.turns,
        engine.agents().len()
    );

    for turn in 1..=cfg.simulation.turns {
        let recommendations = engine.speaking_recommendations();
        let Some(top) = recommendations.first() else {
            anyhow::bail!("No agents to speak");
        };
        let speaker = top.agent_id.clone();
        let engagement = top.engagement_score;

        let context = serde_json::json!({ "turn": turn });
        let outcome = engine
            .process_turn(&speaker, &format!("Turn {}", turn), context)
            .await
            .with_context(|| format!("Turn {} by {} failed", turn, speaker))?;

        info!(
            "Turn {}: {} (engagement {:.3}) \"{}\" -> {} personalized",
            turn,
            speaker,
            engagement,
            outcome.base_response.text,
            outcome.personalized_responses.len()
        );
        for response in &outcome.personalized_responses {
            tracing::debug!("  to {}: \"{}\"", response.target, response.text);
        }
    }

    print_report(&engine.social_dynamics_report());
    print_edges(&engine)?;

    let diagnostics = engine.diagnostics();
    println!(
        "\nDiagnostics: {} agents, {} interactions, {} turns logged, ~{:.3} MB, health {:.2}",
        diagnostics.agent_count,
        diagnostics.interaction_count,
        diagnostics.history_size,
        diagnostics.memory_usage,
        diagnostics.health
    );

    if let Some(path) = export {
        let json = engine.export_json().context("Failed to serialize snapshot")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        info!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn inspect(file: PathBuf) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read snapshot: {}", file.display()))?;
    let mut engine = SocialEngine::new(
        Vec::new(),
        &EngineConfig::default(),
        Box::new(ScriptedGenerator::echo()),
    )?;
    let report = engine
        .import_json(&json)
        .with_context(|| format!("Invalid snapshot: {}", file.display()))?;
    print_report(&report);
    print_edges(&engine)
}

fn print_report(report: &DynamicsReport) {
    let d = &report.dynamics;
    println!("\nSocial dynamics");
    println!("  Network cohesion:     {:.3}", d.network_cohesion);
    println!(
        "  Trust distribution:   mean {:.3}, min {:.3}, max {:.3}, var {:.4}",
        d.trust_distribution.mean, d.trust_distribution.min, d.trust_distribution.max, d.trust_distribution.variance
    );
    println!("  Social energy:        {:.3}", d.social_energy);
    println!("  Conflict level:       {:.3}", d.conflict_level);
    println!("  Network health:       {:.3}", report.network_health);
    println!("  Active relationships: {}", report.active_relationships);

    let m = &report.conversation_metrics;
    println!("\nConversation");
    println!("  Total turns:          {}", m.total_turns);
    println!("  Personalization rate: {:.1}%", m.personalization_rate * 100.0);
    println!("  Average engagement:   {:.3}", m.average_engagement);
    println!("  Engagement trend:     {:?}", report.analytics.trend);
}

fn print_edges(engine: &SocialEngine) -> anyhow::Result<()> {
    for agent in engine.agents() {
        println!("\n{} interactions:", agent.display_name());
        for view in engine.agent_interaction_views(&agent.id)? {
            println!(
                "  -> {:<10} trust {:.3}  comfort {:.3}  stance {:<13} willingness {:.3}",
                view.target,
                view.state.values.trust,
                view.state.values.comfort,
                view.context.stance.as_str(),
                view.context.engagement_willingness
            );
        }
    }
    Ok(())
}
