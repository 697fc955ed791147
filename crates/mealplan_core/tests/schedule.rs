use mealplan_core::db::open_db_in_memory;
use mealplan_core::repo::recipe_repo::{RecipeRepository, SqliteRecipeRepository};
use mealplan_core::repo::schedule_repo::SqliteScheduleRepository;
use mealplan_core::{
    month_grid, MealType, Recipe, RecipeId, ScheduleError, ScheduleMealRequest, ScheduleService,
};
use chrono::NaiveDate;
use rusqlite::Connection;

type Schedule<'c> = ScheduleService<SqliteScheduleRepository<'c>, SqliteRecipeRepository<'c>>;

fn schedule(conn: &Connection) -> Schedule<'_> {
    ScheduleService::new(
        SqliteScheduleRepository::try_new(conn).unwrap(),
        SqliteRecipeRepository::try_new(conn).unwrap(),
    )
}

fn seed_recipe(conn: &Connection, title: &str) -> RecipeId {
    let repo = SqliteRecipeRepository::try_new(conn).unwrap();
    let recipe = Recipe::basic(title, MealType::Dinner, 2);
    repo.create_recipe(&recipe).unwrap()
}

fn book(service: &Schedule<'_>, date: &str, meal_type: MealType, recipe_id: RecipeId) {
    service
        .schedule_meal(ScheduleMealRequest::new(date, meal_type, recipe_id))
        .unwrap();
}

#[test]
fn unknown_recipe_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let missing = uuid::Uuid::new_v4();
    let err = schedule(&conn)
        .schedule_meal(ScheduleMealRequest::new("2026-10-18", MealType::Dinner, missing))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::UnknownRecipe(id) if id == missing));
}

#[test]
fn range_query_is_inclusive_and_never_leaks() {
    let conn = open_db_in_memory().unwrap();
    let recipe = seed_recipe(&conn, "Pasta");
    let service = schedule(&conn);

    for date in [
        "2026-09-30",
        "2026-10-01",
        "2026-10-04",
        "2026-10-07",
        "2026-10-08",
    ] {
        book(&service, date, MealType::Dinner, recipe);
    }

    let meals = service
        .meals_in_range("2026-10-01", "2026-10-07", None)
        .unwrap();
    assert_eq!(meals.len(), 3);

    let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 10, 7).unwrap();
    assert!(meals.iter().all(|meal| meal.is_within(start, end)));
}

#[test]
fn inverted_range_is_empty_and_bad_input_is_invalid_date() {
    let conn = open_db_in_memory().unwrap();
    let recipe = seed_recipe(&conn, "Pasta");
    let service = schedule(&conn);
    book(&service, "2026-10-05", MealType::Lunch, recipe);

    assert!(service
        .meals_in_range("2026-10-07", "2026-10-01", None)
        .unwrap()
        .is_empty());
    assert!(matches!(
        service.meals_in_range("2026-10-01", "2026/10/07", None),
        Err(ScheduleError::InvalidDate(_))
    ));
}

#[test]
fn results_are_ordered_by_date_meal_type_then_insertion() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_recipe(&conn, "First");
    let second = seed_recipe(&conn, "Second");
    let service = schedule(&conn);

    book(&service, "2026-10-02", MealType::Breakfast, first);
    book(&service, "2026-10-01", MealType::Dinner, first);
    book(&service, "2026-10-01", MealType::Breakfast, second);
    book(&service, "2026-10-01", MealType::Dinner, second);
    book(&service, "2026-10-01", MealType::Lunch, first);

    let meals = service
        .meals_in_range("2026-10-01", "2026-10-02", None)
        .unwrap();
    let order: Vec<_> = meals
        .iter()
        .map(|meal| (meal.date.to_string(), meal.meal_type, meal.recipe_id))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2026-10-01".to_string(), MealType::Breakfast, second),
            ("2026-10-01".to_string(), MealType::Lunch, first),
            ("2026-10-01".to_string(), MealType::Dinner, first),
            ("2026-10-01".to_string(), MealType::Dinner, second),
            ("2026-10-02".to_string(), MealType::Breakfast, first),
        ]
    );

    let dinners = service
        .meals_in_range("2026-10-01", "2026-10-02", Some(MealType::Dinner))
        .unwrap();
    assert_eq!(dinners.len(), 2);
}

#[test]
fn unscheduling_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let recipe = seed_recipe(&conn, "Curry");
    let service = schedule(&conn);

    let meal = service
        .schedule_meal(ScheduleMealRequest::new("2026-10-18", MealType::Dinner, recipe))
        .unwrap();

    assert!(service.unschedule_meal(meal.id).unwrap());
    assert!(!service.unschedule_meal(meal.id).unwrap());
    assert!(!service.unschedule_meal(uuid::Uuid::new_v4()).unwrap());
    assert!(service.meals_on_date("2026-10-18").unwrap().is_empty());
}

#[test]
fn update_meal_changes_portion_and_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let recipe = seed_recipe(&conn, "Stew");
    let service = schedule(&conn);
    let meal = service
        .schedule_meal(ScheduleMealRequest::new("2026-10-18", MealType::Dinner, recipe))
        .unwrap();

    let updated = service
        .update_meal(meal.id, Some("double batch".to_string()), Some(2.0))
        .unwrap();
    assert_eq!(updated.portion_multiplier, 2.0);

    let stored = service.get_meal(meal.id).unwrap().unwrap();
    assert_eq!(stored.notes.as_deref(), Some("double batch"));
    assert_eq!(stored.portion_multiplier, 2.0);

    assert!(matches!(
        service.update_meal(meal.id, None, Some(-1.0)),
        Err(ScheduleError::NegativeQuantity(_))
    ));
    let ghost = uuid::Uuid::new_v4();
    assert!(matches!(
        service.update_meal(ghost, None, None),
        Err(ScheduleError::MealNotFound(id)) if id == ghost
    ));
}

#[test]
fn clear_schedule_removes_everything() {
    let conn = open_db_in_memory().unwrap();
    let recipe = seed_recipe(&conn, "Tacos");
    let service = schedule(&conn);
    book(&service, "2026-10-18", MealType::Lunch, recipe);
    book(&service, "2026-10-19", MealType::Dinner, recipe);

    assert_eq!(service.clear_schedule().unwrap(), 2);
    assert!(service
        .meals_in_range("2026-10-01", "2026-10-31", None)
        .unwrap()
        .is_empty());
}

#[test]
fn month_grid_covers_scheduled_days() {
    let grid = month_grid(2026, 10).unwrap();
    assert_eq!(grid.cells.len(), 42);
    assert_eq!(grid.weeks().count(), 6);

    let in_month = grid.cells.iter().filter(|cell| cell.in_month).count();
    assert_eq!(in_month, 31);
    assert!(month_grid(2026, 13).is_err());
}
