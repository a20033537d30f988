mod plan;


use std::path::Path;

use clap::Parser;

use crate::app::{export_report, print_summary, run_load};
use crate::args::{LoadlineArgs, RewriteFieldArgs};
use crate::config::load_environments;
use crate::error::AppResult;
use crate::rewrite::{FieldRewrite, rewrite_field};

use plan::{LoadPlan, RunPlan, build_plan};

/// Parses the command line and runs it to completion.
///
/// # Errors
///
/// Returns the first fatal error; it has already been logged.
pub fn run() -> AppResult<()> {
    let args = LoadlineArgs::parse();
    crate::logger::init_logging(args.verbose, args.no_color);

    let result = build_plan(args).and_then(execute_plan);
    if let Err(err) = result.as_ref() {
        tracing::error!("{}", err);
    }
    result
}

fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Rewrite(rewrite_args) => run_rewrite(&rewrite_args),
        RunPlan::ListEnvs(config) => list_envs(&config),
        RunPlan::Load(load) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_async(*load))
        }
    }
}

async fn run_async(plan: LoadPlan) -> AppResult<()> {
    let outcome = run_load(&plan.args, &plan.environment).await?;
    print_summary(&outcome);
    if let Some(path) = plan.args.report_json.as_deref() {
        export_report(&outcome, path).await?;
    }
    Ok(())
}

fn run_rewrite(args: &RewriteFieldArgs) -> AppResult<()> {
    let rewrite = FieldRewrite {
        field: args.field.clone(),
        value: serde_json::Value::String(args.value.clone()),
        range: args.range()?,
    };
    let counts = rewrite_field(&args.input, &args.output, &rewrite)?;
    println!(
        "Rewrote {} record(s): {} modified, {} added",
        counts.processed, counts.modified, counts.added
    );
    Ok(())
}

fn list_envs(config: &Path) -> AppResult<()> {
    let environments = load_environments(config)?;
    println!("Environments in {}:", config.display());
    for line in environments.describe() {
        println!("  {}", line);
    }
    Ok(())
}
