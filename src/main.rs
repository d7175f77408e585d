//! chainrunner - Main CLI Entry Point

use anyhow::{Context, Result};
use chainrunner::{
    chain::{ExecutionOutcome, TenantContext, ToolChainExecutor},
    cli::{Args, Commands, Config, Verbosity},
    planning::{DependencyResolver, ResolutionPolicy},
    telemetry::{init_logging, TelemetryDisplay},
    tools::{ExecutionContext, SimulatedInvoker, ToolName},
    ChainError,
};
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.clone()).context("Failed to load configuration")?;

    let verbosity = if args.quiet || args.verbose > 0 {
        args.verbosity()
    } else {
        config.default_verbosity()
    };
    init_logging(verbosity.log_level())?;

    if !config.logging.color_output {
        colored::control::set_override(false);
    }

    match &args.command {
        Commands::Run {
            tools,
            context,
            requester,
            tenant,
            strict,
            timeout_ms,
        } => {
            let mut config = config.clone();
            if *strict {
                config.executor.resolution_policy = ResolutionPolicy::Strict;
            }
            if let Some(ms) = timeout_ms {
                config.executor.tool_timeout_ms = *ms;
            }
            let context = parse_context(context.as_deref())?;
            let tenant = tenant.as_deref().map(TenantContext::new);
            run_chain(config, tools, &context, requester, tenant, verbosity).await?;
        }
        Commands::Resolve { tools } => {
            show_resolution(&config, tools);
        }
        Commands::Config => {
            show_config(&args, &config, verbosity)?;
        }
    }

    Ok(())
}

fn parse_context(raw: Option<&str>) -> Result<ExecutionContext> {
    let Some(raw) = raw else {
        return Ok(ExecutionContext::new());
    };
    match serde_json::from_str::<serde_json::Value>(raw).context("Invalid --context JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(anyhow::anyhow!(
            "--context must be a JSON object, got {}",
            other
        )),
    }
}

async fn run_chain(
    config: Config,
    tools: &[ToolName],
    context: &ExecutionContext,
    requester: &str,
    tenant: Option<TenantContext>,
    verbosity: Verbosity,
) -> Result<()> {
    let executor = ToolChainExecutor::new(config.catalog, config.executor);
    executor.set_tenant_context(tenant);
    let invoker = SimulatedInvoker::new();
    let display = TelemetryDisplay::new(executor.telemetry().clone(), verbosity);

    if verbosity.show_progress() {
        println!("{} {}", "▶ Running chain:".cyan().bold(), tools.join(" → "));
    }

    let outcome = executor
        .execute_tool_chain(tools, context, &invoker, requester)
        .await;

    match outcome {
        Ok(outcome) => {
            print_outcome(&outcome, &display, verbosity)?;
            display.display_summary();
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Err(e @ ChainError::CriticalToolFailed { .. }) => {
            eprintln!("{} {}", "✗ Chain aborted:".red().bold(), e);
            display.display_summary();
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("{} {}", "✗ Chain rejected:".red().bold(), e);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_outcome(
    outcome: &ExecutionOutcome,
    display: &TelemetryDisplay,
    verbosity: Verbosity,
) -> Result<()> {
    if verbosity.show_progress() {
        let record = &outcome.execution_record;
        let status = if outcome.success {
            "✓ Chain succeeded".green().bold()
        } else {
            "⚠ Chain completed with failures".yellow().bold()
        };
        println!(
            "{} ({} of {} tools, {})",
            status, record.successful_tools, record.total_tools, outcome.execution_id
        );
        for error in &record.errors {
            println!("  {} {}", "•".yellow(), error);
        }
    }

    let json = if display.should_show_details() {
        serde_json::to_string_pretty(outcome)?
    } else {
        serde_json::to_string_pretty(&outcome.results)?
    };
    println!("{}", json);
    Ok(())
}

fn show_resolution(config: &Config, tools: &[ToolName]) {
    let resolver = DependencyResolver::new(
        config.catalog.dependencies.clone(),
        ResolutionPolicy::BestEffort,
    );

    let resolution = resolver.resolve(tools);
    println!("{}", "Execution order:".bold());
    for (i, tool) in resolution.order().iter().enumerate() {
        let role = config.catalog.role_for(tool);
        let marker = if config.catalog.is_critical(tool) {
            " [critical]".red().to_string()
        } else {
            String::new()
        };
        println!("  {:>2}. {} ({}){}", i + 1, tool, role, marker);
    }

    println!("\n{}", "Waves:".bold());
    for (i, wave) in resolver.waves(tools).iter().enumerate() {
        println!("  {}: {}", i, wave.join(", "));
    }

    if !resolution.is_ordered() {
        println!();
        println!("{} {}", "⚠".yellow(), resolution.into_error());
    }
}

fn show_config(args: &Args, config: &Config, verbosity: Verbosity) -> Result<()> {
    println!("\n{}\n", "chainrunner Configuration".bold());

    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => Config::default_path()
            .filter(|p| p.exists())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string()),
    };
    println!("Source:             {}", source);
    println!("Verbosity:          {}", verbosity.as_str());
    println!();

    println!("Executor:");
    println!("  Tool timeout:     {}ms", config.executor.tool_timeout_ms);
    println!("  History capacity: {}", config.executor.history_capacity);
    println!("  Resolution:       {:?}", config.executor.resolution_policy);
    println!();

    let mut critical: Vec<&String> = config.catalog.critical_tools.iter().collect();
    critical.sort();
    println!("Catalog:");
    println!("  Roles:            {}", config.catalog.roles.len());
    println!("  Default role:     {}", config.catalog.default_role);
    println!("  Critical tools:   {}", critical.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "));
    println!("  Dependencies:     {}", config.catalog.dependencies.len());
    println!();

    if verbosity.show_events() {
        let toml = toml::to_string_pretty(config).context("Failed to render configuration")?;
        println!("{}", toml);
    }

    Ok(())
}
