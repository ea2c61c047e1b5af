use clap::{Parser, Subcommand};
use clinic_flow::graph::assign_levels;
use clinic_flow::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inspect, lay out, and validate conversational workflow files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional editor config JSON (layout spacing, zoom bounds, strict links)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the ports a node of the given type would expose
    Ports {
        /// Node type, e.g. CONDITION or GPT_RESPONSE
        node_type: String,
        /// Branch expression for a CONDITION node
        #[arg(long)]
        condition: Option<String>,
    },
    /// Print the canvas projection (nodes with ports, flat edges) as JSON
    Canvas { workflow: String },
    /// Apply the BFS auto-layout and write the workflow back out
    Layout {
        workflow: String,
        /// Where to write the laid-out workflow; prints to stdout if omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check the structural rules a workflow must pass before it is saved
    Validate { workflow: String },
    /// Convert to the canvas graph and back, and report whether anything changed
    Roundtrip { workflow: String },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_flow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::Ports {
            node_type,
            condition,
        } => print_ports(&node_type, condition),
        Command::Canvas { workflow } => {
            let workflow = load(&workflow, &config);
            print_json(&to_canvas_graph(&workflow.nodes, None));
        }
        Command::Layout { workflow, output } => {
            let mut workflow = load(&workflow, &config);
            layout_by_bfs(&mut workflow.nodes, &config.layout);
            let json = serde_json::to_string_pretty(&workflow.to_document())
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode workflow: {}", e)));
            match output {
                Some(path) => {
                    fs::write(&path, json).unwrap_or_else(|e| {
                        exit_with_error(&format!("Failed to write '{}': {}", path, e))
                    });
                    println!("Wrote laid-out workflow to '{}'", path);
                }
                None => println!("{}", json),
            }
        }
        Command::Validate { workflow } => run_validate(&load(&workflow, &config)),
        Command::Roundtrip { workflow } => run_roundtrip(&load(&workflow, &config), &config),
    }
}

fn load(path: &str, config: &EditorConfig) -> Workflow {
    let start = Instant::now();
    let document = WorkflowDocument::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow: {}", e)));
    let workflow = config
        .converter()
        .load(document)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to resolve workflow: {}", e)));
    tracing::info!(
        path,
        nodes = workflow.nodes.len(),
        elapsed = ?start.elapsed(),
        "loaded workflow"
    );
    workflow
}

fn print_ports(node_type: &str, condition: Option<String>) {
    let node_type = NodeType::from(node_type);
    if let NodeType::Other(name) = &node_type {
        tracing::warn!(node_type = %name, "unknown node type, showing generic ports");
    }
    let mut content = NodeContent::default_for(&node_type);
    if let (NodeContent::Condition(c), Some(condition)) = (&mut content, condition) {
        c.condition = Some(condition);
    }
    for port in derive_ports(&content) {
        println!("{:<8} {:<12} {:?}", format!("{:?}", port.direction), port.id, port.label);
    }
}

fn run_validate(workflow: &Workflow) {
    let levels = assign_levels(&workflow.nodes);
    for (node, level) in workflow.nodes.iter().zip(levels) {
        println!(
            "[{}] {} ({}) {}",
            level,
            node.id,
            node.node_type(),
            node.content.summary()
        );
    }
    match validate(&workflow.nodes) {
        Ok(()) => println!("'{}' is valid ({} nodes)", workflow.name, workflow.nodes.len()),
        Err(issues) => {
            let blocking = issues.iter().filter(|i| i.is_blocking()).count();
            for issue in &issues {
                let marker = if issue.is_blocking() { "error" } else { "warning" };
                println!("{}: {}", marker, issue);
            }
            if blocking > 0 {
                exit_with_error(&format!("{} blocking issue(s) found", blocking));
            }
        }
    }
}

fn run_roundtrip(workflow: &Workflow, config: &EditorConfig) {
    let converter = config.converter();
    let canvas = to_canvas_graph(&workflow.nodes, None);
    let rebuilt = converter
        .to_persisted_graph(&canvas.nodes, &canvas.edges)
        .unwrap_or_else(|e| exit_with_error(&format!("Round trip failed: {}", e)));

    if rebuilt == workflow.nodes {
        println!(
            "Round trip preserved {} nodes and {} edges",
            rebuilt.len(),
            canvas.edges.len()
        );
    } else {
        exit_with_error("Round trip changed the workflow");
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode JSON: {}", e)));
    println!("{}", json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
