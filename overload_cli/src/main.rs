use clap::{Parser, Subcommand};
use overload_core::composer::GoalComposer;
use overload_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "overload")]
#[command(about = "Progressive overload planning for coached clients", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import performance history from CSV into the snapshot store
    Import {
        /// CSV with columns client_id,date,exercise,set,weight,reps
        csv: PathBuf,
    },

    /// Compose next-period goals for a client against a workout catalog
    Plan {
        /// Client whose latest snapshot is used
        #[arg(long)]
        client: String,

        /// Workout catalog JSON
        #[arg(long)]
        catalog: PathBuf,

        /// Set count for exercises without history or catalog hint
        #[arg(long)]
        sets: Option<u32>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Append goals to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the plan JSON to this file
        #[arg(long)]
        plan_out: Option<PathBuf>,
    },

    /// Resolve one exercise name against a workout catalog
    Resolve {
        name: String,

        #[arg(long)]
        catalog: PathBuf,
    },

    /// Progress a single set one step up the rep ladder
    Progress {
        #[arg(long)]
        exercise: String,

        #[arg(long)]
        weight: f64,

        /// Reps performed (free text such as "8" or "AMRAP" is accepted)
        #[arg(long)]
        reps: String,
    },

    /// Quantize a weight for an equipment class
    Quantize {
        /// dumbbell, barbell, cable, machine or bodyweight
        #[arg(long)]
        class: EquipmentClass,

        #[arg(long, allow_negative_numbers = true)]
        weight: f64,

        /// Step up to the next settable weight
        #[arg(long)]
        increase: bool,
    },

    /// Validate the effective configuration
    Check,
}

fn main() -> Result<()> {
    // Initialize logging
    overload_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Import { csv } => cmd_import(&data_dir, &csv),
        Commands::Plan {
            client,
            catalog,
            sets,
            json,
            export,
            plan_out,
        } => cmd_plan(
            &data_dir,
            &config,
            &client,
            &catalog,
            sets,
            json,
            export.as_deref(),
            plan_out.as_deref(),
        ),
        Commands::Resolve { name, catalog } => cmd_resolve(&config, &name, &catalog),
        Commands::Progress {
            exercise,
            weight,
            reps,
        } => cmd_progress(&config, &exercise, weight, &reps),
        Commands::Quantize {
            class,
            weight,
            increase,
        } => cmd_quantize(&config, class, weight, increase),
        Commands::Check => cmd_check(&config, cli.config.as_deref()),
    }
}

fn cmd_import(data_dir: &Path, csv: &Path) -> Result<()> {
    let report = import_history_csv(csv)?;
    let mut store = SnapshotStore::new(data_dir);
    let written = report.append_to(&mut store)?;
    tracing::info!(csv = %csv.display(), snapshots = written, "Import complete");

    println!("✓ Imported {} client snapshots", written);
    println!("  Rows: {} ({} skipped)", report.rows, report.skipped);
    for snapshot in &report.snapshots {
        println!(
            "  {}: {} exercises as of {}",
            snapshot.client_id,
            snapshot.exercises.len(),
            snapshot.as_of_date
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_plan(
    data_dir: &Path,
    config: &Config,
    client: &str,
    catalog_path: &Path,
    sets: Option<u32>,
    json: bool,
    export: Option<&Path>,
    plan_out: Option<&Path>,
) -> Result<()> {
    let store = SnapshotStore::new(data_dir);
    let snapshot = store.latest(client)?;
    let catalog = WorkoutCatalog::load(catalog_path)?;

    let composer = GoalComposer::new(config);
    let plan = composer.compose(&snapshot, &catalog.entries(), &catalog.set_hints(sets));
    for item in &plan.unresolved {
        tracing::warn!(client, reason = %item.reason, "Exercise '{}' needs review", item.catalog_name);
    }

    if let Some(path) = export {
        append_goals_csv(&plan, path)?;
    }
    if let Some(path) = plan_out {
        write_plan_json(&plan, path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        display_plan(&plan, catalog.workout.as_deref());
    }
    Ok(())
}

fn cmd_resolve(config: &Config, name: &str, catalog_path: &Path) -> Result<()> {
    let catalog = WorkoutCatalog::load(catalog_path)?;
    let resolver = ExerciseResolver::new(&config.resolver);

    match resolver.resolve(name, &catalog.entries()) {
        Resolution::Resolved(m) => {
            let kind = if m.exact { "exact" } else { "fuzzy" };
            println!("{} -> {} ({}, score {:.3})", name, m.name, kind, m.score);
        }
        Resolution::Unresolved {
            best_rejected: Some(rejection),
        } => {
            println!(
                "{} -> unresolved (best: {}, score {:.3}, {})",
                name, rejection.name, rejection.score, rejection.reason
            );
        }
        Resolution::Unresolved {
            best_rejected: None,
        } => {
            println!("{} -> unresolved (no candidates)", name);
        }
    }
    Ok(())
}

fn cmd_progress(config: &Config, exercise: &str, weight: f64, reps: &str) -> Result<()> {
    let machine = ProgressionStateMachine::new(&config.quantizer);
    let reps = overload_core::parse_number(reps).and_then(overload_core::reps_from_number);
    let next = machine.progress_set(exercise, weight, reps);

    let class = classify_equipment(exercise);
    println!(
        "{} [{}]: {} kg x {}{}",
        exercise,
        class,
        next.weight,
        next.reps,
        if next.increased_weight { " (weight up)" } else { "" }
    );
    for flag in &next.flags {
        println!("  ! {}", flag);
    }
    Ok(())
}

fn cmd_quantize(config: &Config, class: EquipmentClass, weight: f64, increase: bool) -> Result<()> {
    let quantizer = WeightQuantizer::new(&config.quantizer);
    let next = quantizer.quantize(class, weight, increase)?;
    println!("{}", next);
    Ok(())
}

fn cmd_check(config: &Config, path: Option<&Path>) -> Result<()> {
    let source = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_config_path);
    println!("Config: {}", source.display());
    println!("Data dir: {}", config.data.data_dir.display());

    let errors = config.validate();
    if errors.is_empty() {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    eprintln!("Configuration errors:");
    for error in &errors {
        eprintln!("  - {}", error);
    }
    Err(Error::Config(format!("{} invalid setting(s)", errors.len())))
}

fn display_plan(plan: &ProgressionPlan, workout: Option<&str>) {
    println!();
    match workout {
        Some(w) => println!("Plan for {} ({}) as of {}", plan.client_id, w, plan.as_of_date),
        None => println!("Plan for {} as of {}", plan.client_id, plan.as_of_date),
    }

    for goal in &plan.goals {
        println!();
        println!("  {}  [{}, {}]", goal.resolved_name, goal.outcome, goal.equipment);
        for (i, set) in goal.sets.iter().enumerate() {
            println!(
                "    set {}: {} kg x {}{}",
                i + 1,
                set.weight,
                set.reps,
                if set.increased_weight { "  ↑" } else { "" }
            );
        }
        println!("    {}", goal.rationale);
    }

    if plan.needs_review() {
        println!();
        println!("Needs review:");
        for item in &plan.unresolved {
            let candidate = item.candidate_history_name.as_deref().unwrap_or("?");
            match item.best_score {
                Some(score) => println!(
                    "  - {}: history '{}' ({}, score {:.3})",
                    item.catalog_name, candidate, item.reason, score
                ),
                None => println!(
                    "  - {}: history '{}' ({})",
                    item.catalog_name, candidate, item.reason
                ),
            }
        }
    }

    if !plan.unmatched_history.is_empty() {
        println!();
        println!("Unmatched history:");
        for name in &plan.unmatched_history {
            println!("  - {}", name);
        }
    }
    println!();
}
