//! Meal planner command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto core services over one SQLite connection.
//! - Print results as JSON for scripting.

use anyhow::Context;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use log::info;
use mealplan_core::repo::grocery_repo::SqliteGroceryRepository;
use mealplan_core::repo::item_repo::SqliteItemRepository;
use mealplan_core::repo::pantry_repo::SqlitePantryRepository;
use mealplan_core::repo::recipe_repo::SqliteRecipeRepository;
use mealplan_core::repo::schedule_repo::SqliteScheduleRepository;
use mealplan_core::service::snapshot_service::{from_json, to_json};
use mealplan_core::{
    export_snapshot, import_snapshot, init_logging, local_today, month_grid, open_db, CoreConfig,
    GroceryService, ItemId, MealType, PantryService, RecipeId, ScheduleMealRequest,
    ScheduleService, ScheduledMealId,
};
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mealplan", version, about = "Local meal planner")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file; overrides the configured path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Checks core linkage.
    Ping,
    /// Prints the 6x7 month grid.
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Assigns a recipe to a day and meal slot.
    Schedule {
        #[arg(long)]
        date: String,
        #[arg(long, value_parser = parse_meal_type)]
        meal_type: MealType,
        #[arg(long)]
        recipe: RecipeId,
        #[arg(long)]
        portion: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Removes a scheduled meal; unknown ids are ignored.
    Unschedule {
        #[arg(long)]
        id: ScheduledMealId,
    },
    /// Lists meals in an inclusive date range.
    Meals {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, value_parser = parse_meal_type)]
        meal_type: Option<MealType>,
    },
    /// Generates (or previews) the grocery list for a date range.
    Grocery {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Compute without storing.
        #[arg(long)]
        preview: bool,
    },
    /// Restocks (positive delta) or consumes (negative delta) pantry stock.
    PantryAdjust {
        #[arg(long)]
        item: ItemId,
        #[arg(long, allow_negative_numbers = true)]
        delta: f64,
        #[arg(long)]
        unit: String,
    },
    /// Lists pantry rows expiring within the configured horizon.
    PantryExpiring {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Writes a JSON snapshot of every entity.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replaces all data with a JSON snapshot.
    Import {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_ref() {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("loading config `{}`", path.display()))?,
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir)?;
    }

    if let Command::Ping = cli.command {
        println!("mealplan_core ping={}", mealplan_core::ping());
        println!("mealplan_core version={}", mealplan_core::core_version());
        return Ok(());
    }
    if let Command::Calendar { year, month } = cli.command {
        let today = local_today();
        let grid = month_grid(
            year.unwrap_or_else(|| today.year()),
            month.unwrap_or_else(|| today.month()),
        )?;
        print_json(&grid)?;
        return Ok(());
    }

    let mut conn = open_db(&config.database_path)
        .with_context(|| format!("opening `{}`", config.database_path.display()))?;
    run(cli.command, &config, &mut conn)
}

fn run(command: Command, config: &CoreConfig, conn: &mut Connection) -> anyhow::Result<()> {
    match command {
        Command::Ping | Command::Calendar { .. } => {}
        Command::Schedule {
            date,
            meal_type,
            recipe,
            portion,
            notes,
        } => {
            let meal = schedule_service(conn, config)?.schedule_meal(ScheduleMealRequest {
                date,
                meal_type,
                recipe_id: recipe,
                portion_multiplier: portion,
                notes,
            })?;
            print_json(&meal)?;
        }
        Command::Unschedule { id } => {
            let removed = schedule_service(conn, config)?.unschedule_meal(id)?;
            print_json(&json!({ "id": id, "removed": removed }))?;
        }
        Command::Meals {
            start,
            end,
            meal_type,
        } => {
            let meals = schedule_service(conn, config)?.meals_in_range(&start, &end, meal_type)?;
            print_json(&meals)?;
        }
        Command::Grocery {
            start,
            end,
            preview,
        } => {
            let grocery = grocery_service(conn)?;
            if preview {
                print_json(&grocery.preview(&start, &end)?)?;
            } else {
                let report = grocery.generate_grocery_list(&start, &end)?;
                print_json(&json!({
                    "list": report.list,
                    "covered": report.covered,
                    "warnings": report.warnings,
                    "estimated_total": report.estimated_total,
                }))?;
            }
        }
        Command::PantryAdjust { item, delta, unit } => {
            let row = pantry_service(conn)?.adjust_quantity(item, delta, &unit)?;
            print_json(&row)?;
        }
        Command::PantryExpiring { days } => {
            let days = days.unwrap_or(config.expiring_soon_days);
            let rows = pantry_service(conn)?.expiring_soon(local_today(), days)?;
            print_json(&rows)?;
        }
        Command::Export { out } => {
            let json = to_json(&export_snapshot(conn)?)?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing `{}`", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Import { input } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("reading `{}`", input.display()))?;
            let snapshot = from_json(&content)?;
            let summary = import_snapshot(conn, &snapshot)?;
            info!(
                "event=cli_import module=cli status=ok records={}",
                snapshot.record_count()
            );
            print_json(&json!({
                "items": summary.items,
                "recipes": summary.recipes,
                "scheduled_meals": summary.scheduled_meals,
                "pantry": summary.pantry,
                "grocery_lists": summary.grocery_lists,
                "dangling_references": summary.dangling_references,
            }))?;
        }
    }
    Ok(())
}

fn schedule_service<'c>(
    conn: &'c Connection,
    config: &CoreConfig,
) -> anyhow::Result<ScheduleService<SqliteScheduleRepository<'c>, SqliteRecipeRepository<'c>>> {
    Ok(ScheduleService::new(
        SqliteScheduleRepository::try_new(conn)?,
        SqliteRecipeRepository::try_new(conn)?,
    )
    .with_slot_limit(config.max_meals_per_slot))
}

type SqliteGroceryService<'c> = GroceryService<
    SqliteScheduleRepository<'c>,
    SqliteRecipeRepository<'c>,
    SqliteItemRepository<'c>,
    SqlitePantryRepository<'c>,
    SqliteGroceryRepository<'c>,
>;

fn grocery_service(conn: &Connection) -> anyhow::Result<SqliteGroceryService<'_>> {
    Ok(GroceryService::new(
        SqliteScheduleRepository::try_new(conn)?,
        SqliteRecipeRepository::try_new(conn)?,
        SqliteItemRepository::try_new(conn)?,
        SqlitePantryRepository::try_new(conn)?,
        SqliteGroceryRepository::try_new(conn)?,
    ))
}

fn pantry_service(
    conn: &Connection,
) -> anyhow::Result<PantryService<SqlitePantryRepository<'_>, SqliteItemRepository<'_>>> {
    Ok(PantryService::new(
        SqlitePantryRepository::try_new(conn)?,
        SqliteItemRepository::try_new(conn)?,
    ))
}

fn parse_meal_type(value: &str) -> Result<MealType, String> {
    MealType::parse(value)
        .ok_or_else(|| format!("unknown meal type `{value}`; expected breakfast|lunch|dinner"))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
