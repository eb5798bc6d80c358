use clap::Parser;
use flowscript::prelude::*;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Compiles a workflow graph JSON file into a single runnable script
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow graph JSON file
    graph_path: PathBuf,

    /// Write the generated files into this directory instead of printing the script
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Path to a JSON file with compile options
    #[arg(long)]
    options: Option<String>,

    /// Name of the generated entry function (overrides the options file)
    #[arg(short, long)]
    entry: Option<String>,

    /// Fail when the graph contains a cycle instead of appending cyclic nodes
    #[arg(long)]
    strict: bool,

    /// Print the execution plan to stderr
    #[arg(long)]
    plan: bool,

    /// Print the full compile result as JSON instead of the script
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let start = Instant::now();

    let mut options = match &cli.options {
        Some(path) => CompileOptions::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load options: {}", e))),
        None => CompileOptions::default(),
    };
    if let Some(entry) = cli.entry {
        options.entry_function = entry;
    }
    if cli.strict {
        options.strict_cycles = true;
    }

    let graph_json = fs::read_to_string(&cli.graph_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workflow file '{}': {}",
            cli.graph_path.display(),
            e
        ))
    });

    let compiler = Compiler::from_json(&graph_json)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()))
        .with_options(options)
        .build();

    let result = compiler
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));

    for diagnostic in &result.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    if cli.plan {
        eprintln!("{}", result.plan);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&result)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize result: {}", e)));
        println!("{}", json);
    } else if let Some(dir) = &cli.out_dir {
        result
            .write_to(dir)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        for file in &result.files {
            eprintln!("wrote {}", dir.join(&file.path).display());
        }
    } else {
        print!("{}", result.script());
    }

    eprintln!(
        "Compiled '{}': {} nodes ({} triggers, {} actions, {} transforms, {} conditions) in {:?}",
        result.workflow_id,
        result.stats.nodes,
        result.stats.triggers,
        result.stats.actions,
        result.stats.transforms,
        result.stats.conditions,
        start.elapsed()
    );
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
