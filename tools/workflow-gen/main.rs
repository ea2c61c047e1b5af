use clap::Parser;
use clinic_flow::graph::{layout_by_bfs, LayoutConfig};
use clinic_flow::model::{
    derive_ports, Connection, NodeContent, NodeType, Port, Workflow, WorkflowNode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A CLI tool to generate random but valid workflow documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// The minimum number of nodes between START and END
    #[arg(long, default_value_t = 2)]
    min: usize,

    /// The maximum number of nodes between START and END
    #[arg(long, default_value_t = 12)]
    max: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Node types the generator places between START and END.
const BODY_TYPES: [NodeType; 6] = [
    NodeType::Message,
    NodeType::Condition,
    NodeType::GptResponse,
    NodeType::DataCollection,
    NodeType::Delay,
    NodeType::ApiCall,
];

const MESSAGES: [&str; 4] = [
    "Hi! How can we help you today?",
    "Please tell us your full name.",
    "Thanks, one moment while we check availability.",
    "Our team will contact you shortly.",
];

const CONDITIONS: [&str; 4] = [
    "yes|no",
    "continue|end",
    "morning|afternoon|evening",
    "clinic_selection",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_flow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let count = rng.random_range(cli.min..=cli.max);
    println!("Generating a workflow with {} body node(s)...", count);

    let workflow = generate_workflow(&mut rng, count);
    let json = serde_json::to_string_pretty(&workflow.to_document())?;
    fs::write(&cli.output, json)?;

    println!(
        "Successfully generated and saved workflow to '{}'",
        cli.output
    );
    Ok(())
}

/// Builds START -> body nodes -> END where every output port of every body
/// node leads somewhere further down, so the result always validates.
fn generate_workflow(rng: &mut StdRng, count: usize) -> Workflow {
    let mut workflow = Workflow::starter("Generated workflow");
    workflow.description = format!("Random workflow with {} body nodes", count);
    let end_id = "end".to_string();

    let body: Vec<WorkflowNode> = (1..=count)
        .map(|n| random_node(rng, &format!("node-{}", n)))
        .collect();
    let ids: Vec<String> = body.iter().map(|n| n.id.clone()).collect();

    if let Some(start) = workflow.node_mut("start") {
        start.connections.clear();
        let first = ids.first().unwrap_or(&end_id);
        start.connections.push(Connection::to(first));
    }

    let mut nodes = Vec::with_capacity(count);
    for (i, mut node) in body.into_iter().enumerate() {
        let later = &ids[i + 1..];
        for port in output_ports(&node.content) {
            // Mostly chain forward, sometimes skip ahead or finish early.
            let target = if later.is_empty() || rng.random_bool(0.15) {
                &end_id
            } else {
                &later[rng.random_range(0..later.len().min(3))]
            };
            node.connections.push(Connection::to(target).via(port));
        }
        nodes.push(node);
    }

    let end = workflow.nodes.pop();
    workflow.nodes.extend(nodes);
    workflow.nodes.extend(end);
    layout_by_bfs(&mut workflow.nodes, &LayoutConfig::default());
    workflow
}

fn random_node(rng: &mut StdRng, id: &str) -> WorkflowNode {
    let node_type = BODY_TYPES[rng.random_range(0..BODY_TYPES.len())].clone();
    let mut node = WorkflowNode::with_type(id, node_type);
    match &mut node.content {
        NodeContent::Message(c) => {
            c.text = Some(MESSAGES[rng.random_range(0..MESSAGES.len())].to_string());
        }
        NodeContent::Condition(c) => {
            c.condition = Some(CONDITIONS[rng.random_range(0..CONDITIONS.len())].to_string());
        }
        NodeContent::DataCollection(c) => {
            c.field = Some("patientName".to_string());
            c.prompt = Some("What is your name?".to_string());
        }
        NodeContent::Delay(c) => c.delay = Some(rng.random_range(1..=30) as f64),
        NodeContent::ApiCall(c) => c.endpoint = Some("/api/appointments".to_string()),
        _ => {}
    }
    node
}

fn output_ports(content: &NodeContent) -> Vec<String> {
    derive_ports(content)
        .into_iter()
        .filter(Port::is_output)
        .map(|p| p.id)
        .collect()
}
