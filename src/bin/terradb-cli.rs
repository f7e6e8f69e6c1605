//! TerraDB interactive shell
//!
//! Default mode is a SQL REPL over an in-memory table registry; the
//! `benchmark` subcommand runs the standard policy/comparator/partition
//! evaluation matrix instead.

use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use terradb::catalog::TableRegistry;
use terradb::sql::{execute_sql, QueryResult};
use terradb::workload::{format_results, standard_configs, BenchmarkRunner, DatasetGenerator};
use terradb::Result;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None => interactive_mode(),
        Some("benchmark") => benchmark_mode(),
        Some("--version") | Some("-v") => {
            println!("terradb v{}", VERSION);
            Ok(())
        }
        Some("--help") | Some("-h") | Some(_) => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"terradb v{} - spatial LSM storage engine

Usage:
  terradb-cli              start the interactive SQL shell
  terradb-cli benchmark    run the standard evaluation matrix
  terradb-cli --version    print version
"#,
        VERSION
    );
}

fn interactive_mode() -> Result<()> {
    println!("terradb v{} - spatial SQL shell", VERSION);
    println!("Type 'help' for commands, 'exit' to quit.");

    let registry = Arc::new(TableRegistry::new());
    let stdin = io::stdin();

    loop {
        print!("\nterradb> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        if stdin.lock().read_line(&mut input).unwrap_or(0) == 0 {
            break; // EOF
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_ascii_lowercase().as_str() {
            "exit" | "quit" => {
                println!("Goodbye!");
                break;
            }
            "help" => {
                print_repl_help();
                continue;
            }
            "tables" => {
                for name in registry.table_names() {
                    println!("{}", name);
                }
                continue;
            }
            "metrics" => {
                print_metrics(&registry);
                continue;
            }
            "flush" => {
                for name in registry.table_names() {
                    registry.get(&name)?.engine.flush()?;
                }
                println!("OK");
                continue;
            }
            _ => {}
        }

        match execute_sql(&registry, input) {
            Ok(result) => display_result(result),
            Err(e) => println!("Error: {}", e),
        }
    }

    Ok(())
}

fn print_repl_help() {
    println!(
        r#"SQL statements:
  CREATE TABLE name (col TYPE, ...)      one POINT/GEOMETRY column required
  INSERT INTO name VALUES (x, y [, p])
  SELECT COUNT(*)|* FROM name [WHERE spatial_intersect(col, x1, y1, x2, y2)]

Commands:
  tables      list tables
  metrics     per-table engine metrics
  flush       flush all memtables
  help        this message
  exit        quit"#
    );
}

fn print_metrics(registry: &Arc<TableRegistry>) {
    for name in registry.table_names() {
        if let Ok(table) = registry.get(&name) {
            let m = table.engine.metrics();
            println!(
                "{}: writes={} reads={} WA={} RA={} merges={} avg_latency={:.3}ms runs={}",
                name,
                m.total_writes,
                m.total_reads,
                m.write_amplification,
                m.read_amplification,
                m.total_merges,
                m.avg_query_latency_ms,
                table.engine.component_count(),
            );
        }
    }
}

fn display_result(result: QueryResult) {
    match result {
        QueryResult::Created { table } => println!("Table '{}' created", table),
        QueryResult::Inserted { count } => println!("{} row(s) inserted", count),
        QueryResult::Count(count) => println!("COUNT(*) = {}", count),
        QueryResult::Rows { columns, rows } => {
            println!("{}", columns.join(" | "));
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|v| format!("{}", v)).collect();
                println!("{}", cells.join(" | "));
            }
            println!("({} row(s))", rows.len());
        }
    }
}

fn benchmark_mode() -> Result<()> {
    println!("Running benchmark mode...");
    let mut generator = DatasetGenerator::new(42);

    let uniform = generator.uniform(10_000);
    println!("Generated {} uniform points", uniform.len());
    let clustered = generator.clustered(10_000, 20, 0.05);
    println!("Generated {} clustered points", clustered.len());

    let high_selectivity = generator.query_set(10, 1e-3);
    let low_selectivity = generator.query_set(10, 1e-5);

    let runner = BenchmarkRunner::new();
    let configs = standard_configs();

    println!("\n=== Uniform dataset, selectivity 1e-3 ===");
    let reports = runner.run_comparison(&configs, &uniform, &high_selectivity)?;
    print!("{}", format_results(&reports));

    println!("\n=== Clustered dataset, selectivity 1e-5 ===");
    let reports = runner.run_comparison(&configs, &clustered, &low_selectivity)?;
    print!("{}", format_results(&reports));

    Ok(())
}
