//! CLI binary for running and validating orderflow pipelines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use orderflow_pipeline::{
    EventEmitter, OrderEvent, PipelineDefinition, PipelineExecutor, RoundingPolicy, RunSummary,
    Severity, Strategy, TaxRate, TracingNotifier,
};
use orderflow_types::Order;

#[derive(Parser)]
#[command(name = "orderflow", version, about = "Status-gated order-processing pipeline runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run orders through a pipeline definition
    Run {
        /// Path to the pipeline definition (.json)
        pipeline: PathBuf,

        /// Path to a JSON array of orders
        orders: PathBuf,

        /// Override the definition's strategy (chain or composed)
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Write processed orders to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a pipeline definition
    Validate {
        /// Path to the pipeline definition (.json)
        pipeline: PathBuf,
    },

    /// Show information about a pipeline definition
    Info {
        /// Path to the pipeline definition (.json)
        pipeline: PathBuf,
    },

    /// Run the reference orders 1001 and 1002 through the standard workflow
    Demo {
        /// Tax rate in percent applied after aggregation
        #[arg(long)]
        tax: Option<rust_decimal::Decimal>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            pipeline,
            orders,
            strategy,
            output,
        } => {
            cmd_run(&pipeline, &orders, strategy, output.as_deref()).await?;
        }
        Commands::Validate { pipeline } => {
            cmd_validate(&pipeline)?;
        }
        Commands::Info { pipeline } => {
            cmd_info(&pipeline)?;
        }
        Commands::Demo { tax } => {
            cmd_demo(tax).await?;
        }
    }

    Ok(())
}

/// Report run timing from the event channel until the channel closes.
///
/// Per-order events may be skipped when the relay lags; `RunCompleted` is the
/// last event sent and is always retained.
fn spawn_progress_relay(events: &EventEmitter) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match rx.recv().await {
                Ok(OrderEvent::RunCompleted {
                    run_id,
                    processed,
                    errored,
                    duration_ms,
                }) => {
                    tracing::info!(run_id = %run_id, processed, errored, duration_ms, "Run timing");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress relay skipped per-order events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Run `orders` on a fresh executor. Step alerts are logged directly so none
/// are lost to a lagging channel subscriber.
async fn execute(definition: &PipelineDefinition, orders: Vec<Order>) -> anyhow::Result<RunSummary> {
    let events = EventEmitter::default();
    let relay = spawn_progress_relay(&events);

    let executor = PipelineExecutor::with_notifier(definition, events, Arc::new(TracingNotifier))?;
    let summary = executor.run(orders);
    // Dropping the executor closes the channel and lets the relay finish.
    drop(executor);
    relay.await?;

    Ok(summary)
}

async fn cmd_run(
    pipeline: &Path,
    orders: &Path,
    strategy: Option<Strategy>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut definition = PipelineDefinition::load(pipeline)?;
    if let Some(strategy) = strategy {
        definition = definition.with_strategy(strategy);
    }
    let orders = Order::load_all(orders)?;

    let summary = execute(&definition, orders).await?;

    match output {
        Some(path) => {
            Order::save_all(&summary.orders, path)?;
            println!("Wrote {} orders to {}", summary.orders.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&summary.orders)?),
    }
    print_summary(&summary);
    Ok(())
}

fn cmd_validate(path: &Path) -> anyhow::Result<()> {
    let definition = PipelineDefinition::load(path)?;
    let diagnostics = orderflow_pipeline::validate(&definition);

    if diagnostics.is_empty() {
        println!("Pipeline is valid");
        return Ok(());
    }

    let mut has_error = false;
    for diag in &diagnostics {
        let severity = match diag.severity {
            Severity::Error => {
                has_error = true;
                "ERROR"
            }
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        match diag.step_index {
            Some(i) => println!("[{}] {} (step {}): {}", severity, diag.rule, i + 1, diag.message),
            None => println!("[{}] {}: {}", severity, diag.rule, diag.message),
        }
        if let Some(ref fix) = diag.fix {
            println!("    fix: {}", fix);
        }
    }

    if has_error {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let definition = PipelineDefinition::load(path)?;

    println!("Pipeline: {}", definition.name);
    println!("Strategy: {}", definition.strategy);
    println!("Steps: {}", definition.steps.len());

    println!("\nSteps:");
    for (i, step) in definition.steps.iter().enumerate() {
        println!("  {}. {} [guard={}]", i + 1, step.name(), step.guard());
    }
    Ok(())
}

async fn cmd_demo(tax: Option<rust_decimal::Decimal>) -> anyhow::Result<()> {
    let steps = match tax {
        Some(rate) => orderflow_pipeline::taxed_workflow(TaxRate::percent(rate), RoundingPolicy::exact()),
        None => orderflow_pipeline::standard_workflow(),
    };

    for strategy in [Strategy::Chain, Strategy::Composed] {
        let definition = PipelineDefinition::new("demo", strategy, steps.clone());
        let orders = vec![
            Order::new(1001).with_lines([1000, 2000]),
            Order::new(1002).with_lines([1000, -2000]),
        ];

        println!("--- {} ---", strategy);
        let summary = execute(&definition, orders).await?;
        for order in &summary.orders {
            println!("order {}: status={} amount={}", order.id, order.status, order.amount);
        }
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "Run {} ({}, {}): {} processed, {} errored, {} unfinished",
        summary.run_id,
        summary.pipeline,
        summary.strategy,
        summary.processed,
        summary.errored,
        summary.unfinished
    );
}
