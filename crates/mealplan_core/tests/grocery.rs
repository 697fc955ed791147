use mealplan_core::db::open_db_in_memory;
use mealplan_core::repo::grocery_repo::SqliteGroceryRepository;
use mealplan_core::repo::item_repo::{ItemRepository, SqliteItemRepository};
use mealplan_core::repo::pantry_repo::{PantryRepository, SqlitePantryRepository};
use mealplan_core::repo::recipe_repo::{RecipeRepository, SqliteRecipeRepository};
use mealplan_core::repo::schedule_repo::SqliteScheduleRepository;
use mealplan_core::{
    AggregationWarning, CatalogService, GroceryError, GroceryService, Item, ItemCategory, ItemId,
    MealType, PantryItem, Recipe, RecipeDeletePolicy, RecipeId, ScheduleMealRequest,
    ScheduleService,
};
use rusqlite::Connection;

type Grocery<'c> = GroceryService<
    SqliteScheduleRepository<'c>,
    SqliteRecipeRepository<'c>,
    SqliteItemRepository<'c>,
    SqlitePantryRepository<'c>,
    SqliteGroceryRepository<'c>,
>;

fn grocery(conn: &Connection) -> Grocery<'_> {
    GroceryService::new(
        SqliteScheduleRepository::try_new(conn).unwrap(),
        SqliteRecipeRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
        SqlitePantryRepository::try_new(conn).unwrap(),
        SqliteGroceryRepository::try_new(conn).unwrap(),
    )
}

fn add_item(conn: &Connection, name: &str, category: ItemCategory, unit: &str) -> ItemId {
    SqliteItemRepository::try_new(conn)
        .unwrap()
        .create_item(&Item::new(name, category, unit).unwrap())
        .unwrap()
}

fn add_recipe(conn: &Connection, recipe: Recipe) -> RecipeId {
    SqliteRecipeRepository::try_new(conn)
        .unwrap()
        .create_recipe(&recipe)
        .unwrap()
}

fn plan(conn: &Connection, date: &str, meal_type: MealType, recipe_id: RecipeId, portion: f64) {
    let service = ScheduleService::new(
        SqliteScheduleRepository::try_new(conn).unwrap(),
        SqliteRecipeRepository::try_new(conn).unwrap(),
    );
    let mut request = ScheduleMealRequest::new(date, meal_type, recipe_id);
    request.portion_multiplier = Some(portion);
    service.schedule_meal(request).unwrap();
}

fn stock(conn: &Connection, item_id: ItemId, quantity: f64, unit: &str) {
    SqlitePantryRepository::try_new(conn)
        .unwrap()
        .upsert_stock(&PantryItem {
            item_id,
            quantity,
            unit: unit.to_string(),
            expiration_date: None,
        })
        .unwrap();
}

#[test]
fn same_item_and_unit_is_summed_into_one_line() {
    let conn = open_db_in_memory().unwrap();
    let rice = add_item(&conn, "Rice", ItemCategory::Grains, "cup");
    let bowl = add_recipe(
        &conn,
        Recipe::basic("Rice bowl", MealType::Dinner, 1).with_ingredient(rice, 1.0, "cup"),
    );
    plan(&conn, "2026-10-19", MealType::Dinner, bowl, 1.0);
    plan(&conn, "2026-10-20", MealType::Dinner, bowl, 1.0);

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-25")
        .unwrap();
    assert_eq!(report.list.items.len(), 1);
    let line = &report.list.items[0];
    assert_eq!(line.item_name, "Rice");
    assert_eq!(line.quantity, 2.0);
    assert_eq!(line.unit, "cup");
    assert!(!line.purchased);
    assert!(report.warnings.is_empty());
}

#[test]
fn different_units_stay_separate_lines() {
    let conn = open_db_in_memory().unwrap();
    let flour = add_item(&conn, "Flour", ItemCategory::Pantry, "cup");
    let pancakes = add_recipe(
        &conn,
        Recipe::basic("Pancakes", MealType::Breakfast, 2).with_ingredient(flour, 2.0, "Cups"),
    );
    let bread = add_recipe(
        &conn,
        Recipe::basic("Bread", MealType::Dinner, 4).with_ingredient(flour, 500.0, "g"),
    );
    plan(&conn, "2026-10-19", MealType::Breakfast, pancakes, 1.0);
    plan(&conn, "2026-10-19", MealType::Dinner, bread, 1.0);

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-19")
        .unwrap();
    let lines: Vec<_> = report
        .list
        .items
        .iter()
        .map(|line| (line.unit.as_str(), line.quantity))
        .collect();
    assert_eq!(lines, vec![("cups", 2.0), ("g", 500.0)]);
}

#[test]
fn pantry_stock_is_netted_against_requirements() {
    let conn = open_db_in_memory().unwrap();
    let rice = add_item(&conn, "Rice", ItemCategory::Grains, "cup");
    let dinner = add_recipe(
        &conn,
        Recipe::basic("Fried rice", MealType::Dinner, 2).with_ingredient(rice, 1.5, "cup"),
    );
    plan(&conn, "2026-10-19", MealType::Dinner, dinner, 1.0);
    plan(&conn, "2026-10-20", MealType::Dinner, dinner, 1.0);
    stock(&conn, rice, 2.0, "cup");

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-20")
        .unwrap();
    assert_eq!(report.list.items.len(), 1);
    assert_eq!(report.list.items[0].quantity, 1.0);
    assert!(report.covered.is_empty());
}

#[test]
fn fully_covered_lines_are_reported_separately() {
    let conn = open_db_in_memory().unwrap();
    let salt = add_item(&conn, "Salt", ItemCategory::Spices, "g");
    let soup = add_recipe(
        &conn,
        Recipe::basic("Soup", MealType::Lunch, 2).with_ingredient(salt, 5.0, "g"),
    );
    plan(&conn, "2026-10-19", MealType::Lunch, soup, 2.0);
    stock(&conn, salt, 50.0, "g");

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-19")
        .unwrap();
    assert!(report.list.items.is_empty());
    assert_eq!(report.covered.len(), 1);
    assert_eq!(report.covered[0].required, 10.0);
    assert_eq!(report.covered[0].pantry_available, 50.0);
}

#[test]
fn pantry_in_other_unit_is_not_netted_and_warns() {
    let conn = open_db_in_memory().unwrap();
    let milk = add_item(&conn, "Milk", ItemCategory::Dairy, "cup");
    let oats = add_recipe(
        &conn,
        Recipe::basic("Oats", MealType::Breakfast, 1).with_ingredient(milk, 1.0, "cup"),
    );
    plan(&conn, "2026-10-19", MealType::Breakfast, oats, 1.0);
    stock(&conn, milk, 1.0, "l");

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-19")
        .unwrap();
    assert_eq!(report.list.items[0].quantity, 1.0);
    assert!(matches!(
        report.warnings.as_slice(),
        [AggregationWarning::IncompatibleUnit { pantry_unit, .. }] if pantry_unit == "l"
    ));
}

#[test]
fn combo_components_and_portions_multiply() {
    let conn = open_db_in_memory().unwrap();
    let tortilla = add_item(&conn, "Tortilla", ItemCategory::Bakery, "count");
    let beans = add_item(&conn, "Beans", ItemCategory::Pantry, "can");
    let taco = add_recipe(
        &conn,
        Recipe::basic("Taco", MealType::Dinner, 1).with_ingredient(tortilla, 2.0, "count"),
    );
    let side = add_recipe(
        &conn,
        Recipe::basic("Beans", MealType::Dinner, 2).with_ingredient(beans, 1.0, "can"),
    );
    let night = add_recipe(
        &conn,
        Recipe::combo("Taco night", MealType::Dinner, 4)
            .with_component(taco, 3.0)
            .with_component(side, 0.5),
    );
    plan(&conn, "2026-10-23", MealType::Dinner, night, 2.0);

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-23", "2026-10-23")
        .unwrap();
    let tortillas = report.list.line(tortilla, "count").unwrap();
    assert_eq!(tortillas.quantity, 12.0);
    let cans = report.list.line(beans, "can").unwrap();
    assert_eq!(cans.quantity, 1.0);
}

#[test]
fn lines_are_sorted_by_category_then_name() {
    let conn = open_db_in_memory().unwrap();
    let zucchini = add_item(&conn, "zucchini", ItemCategory::Produce, "count");
    let apple = add_item(&conn, "Apple", ItemCategory::Produce, "count");
    let butter = add_item(&conn, "Butter", ItemCategory::Dairy, "g");
    let lard = add_item(&conn, "Lard", ItemCategory::Meat, "g");
    let pie = add_recipe(
        &conn,
        Recipe::basic("Pie", MealType::Dinner, 8)
            .with_ingredient(butter, 100.0, "g")
            .with_ingredient(lard, 20.0, "g")
            .with_ingredient(zucchini, 1.0, "count")
            .with_ingredient(apple, 6.0, "count"),
    );
    plan(&conn, "2026-10-19", MealType::Dinner, pie, 1.0);

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-19")
        .unwrap();
    let names: Vec<_> = report
        .list
        .items
        .iter()
        .map(|line| line.item_name.as_str())
        .collect();
    assert_eq!(names, vec!["Apple", "zucchini", "Lard", "Butter"]);
}

#[test]
fn regeneration_is_idempotent_and_keeps_purchased_flags() {
    let conn = open_db_in_memory().unwrap();
    let eggs = add_item(&conn, "Eggs", ItemCategory::Dairy, "count");
    let bacon = add_item(&conn, "Bacon", ItemCategory::Meat, "slice");
    let breakfast = add_recipe(
        &conn,
        Recipe::basic("Breakfast", MealType::Breakfast, 1)
            .with_ingredient(eggs, 2.0, "count")
            .with_ingredient(bacon, 3.0, "slice"),
    );
    plan(&conn, "2026-10-19", MealType::Breakfast, breakfast, 1.0);
    let service = grocery(&conn);

    let first = service
        .generate_grocery_list("2026-10-19", "2026-10-25")
        .unwrap();
    let second = service
        .generate_grocery_list("2026-10-19", "2026-10-25")
        .unwrap();
    assert_eq!(first.list.id, second.list.id);
    assert_eq!(first.list.items, second.list.items);
    assert_eq!(service.list_lists().unwrap().len(), 1);

    let marked = service
        .set_purchased(first.list.id, eggs, "COUNT", true)
        .unwrap();
    assert!(marked.line(eggs, "count").unwrap().purchased);
    assert_eq!(marked.remaining(), 1);

    plan(&conn, "2026-10-20", MealType::Breakfast, breakfast, 1.0);
    let third = service
        .generate_grocery_list("2026-10-19", "2026-10-25")
        .unwrap();
    assert_eq!(third.list.id, first.list.id);
    let eggs_line = third.list.line(eggs, "count").unwrap();
    assert!(eggs_line.purchased);
    assert_eq!(eggs_line.quantity, 4.0);
    assert!(!third.list.line(bacon, "slice").unwrap().purchased);
}

#[test]
fn missing_references_degrade_to_warnings() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(
        SqliteItemRepository::try_new(&conn).unwrap(),
        SqliteRecipeRepository::try_new(&conn).unwrap(),
    );
    let basil = add_item(&conn, "Basil", ItemCategory::Produce, "bunch");
    let pasta = add_item(&conn, "Pasta", ItemCategory::Grains, "g");
    let pesto = add_recipe(
        &conn,
        Recipe::basic("Pesto pasta", MealType::Dinner, 2)
            .with_ingredient(basil, 1.0, "bunch")
            .with_ingredient(pasta, 200.0, "g"),
    );
    let salad = add_recipe(&conn, Recipe::basic("Salad", MealType::Lunch, 1));
    plan(&conn, "2026-10-19", MealType::Dinner, pesto, 1.0);
    plan(&conn, "2026-10-19", MealType::Lunch, salad, 1.0);

    catalog.delete_item(basil).unwrap();
    catalog
        .delete_recipe(salad, RecipeDeletePolicy::KeepSchedule)
        .unwrap();

    let report = grocery(&conn)
        .generate_grocery_list("2026-10-19", "2026-10-19")
        .unwrap();
    assert_eq!(report.list.items.len(), 1);
    assert_eq!(report.list.items[0].item_id, pasta);
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings.iter().any(|warning| matches!(
        warning,
        AggregationWarning::UnknownRecipe { recipe_id, .. } if *recipe_id == salad
    )));
    assert!(report.warnings.iter().any(|warning| matches!(
        warning,
        AggregationWarning::UnknownItem { item_id, .. } if *item_id == basil
    )));
}

#[test]
fn stored_list_ignores_later_catalog_edits() {
    let conn = open_db_in_memory().unwrap();
    let tomato = add_item(&conn, "Tomato", ItemCategory::Produce, "count");
    let sauce = add_recipe(
        &conn,
        Recipe::basic("Sauce", MealType::Dinner, 4).with_ingredient(tomato, 6.0, "count"),
    );
    plan(&conn, "2026-10-19", MealType::Dinner, sauce, 1.0);
    let service = grocery(&conn);
    let report = service
        .generate_grocery_list("2026-10-19", "2026-10-19")
        .unwrap();

    let items = SqliteItemRepository::try_new(&conn).unwrap();
    let mut renamed = items.get_item(tomato).unwrap().unwrap();
    renamed.name = "Roma tomato".to_string();
    renamed.category = ItemCategory::Other;
    items.update_item(&renamed).unwrap();

    let stored = service.get_list(report.list.id).unwrap().unwrap();
    assert_eq!(stored.items[0].item_name, "Tomato");
    assert_eq!(stored.items[0].category, ItemCategory::Produce);
}

#[test]
fn invalid_ranges_and_missing_lists_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let service = grocery(&conn);

    assert!(matches!(
        service.generate_grocery_list("2026-10-25", "2026-10-19"),
        Err(GroceryError::InvalidDateRange { .. })
    ));
    assert!(matches!(
        service.generate_grocery_list("2026-13-01", "2026-10-19"),
        Err(GroceryError::InvalidDate(_))
    ));
    let preview = service.preview("2026-10-25", "2026-10-19").unwrap();
    assert!(preview.lines.is_empty());

    let ghost = uuid::Uuid::new_v4();
    assert!(matches!(
        service.set_purchased(ghost, ghost, "g", true),
        Err(GroceryError::ListNotFound(id)) if id == ghost
    ));

    let empty = service
        .generate_grocery_list("2026-10-19", "2026-10-25")
        .unwrap();
    assert!(empty.list.items.is_empty());
    assert!(matches!(
        service.set_purchased(empty.list.id, ghost, "g", true),
        Err(GroceryError::LineNotFound { .. })
    ));

    assert!(service.delete_list(empty.list.id).unwrap());
    assert!(!service.delete_list(empty.list.id).unwrap());
}

#[test]
fn preview_does_not_store_a_list() {
    let conn = open_db_in_memory().unwrap();
    let rice = add_item(&conn, "Rice", ItemCategory::Grains, "cup");
    let bowl = add_recipe(
        &conn,
        Recipe::basic("Rice bowl", MealType::Lunch, 1).with_ingredient(rice, 1.0, "cup"),
    );
    plan(&conn, "2026-10-19", MealType::Lunch, bowl, 0.5);
    let service = grocery(&conn);

    let preview = service.preview("2026-10-19", "2026-10-19").unwrap();
    assert_eq!(preview.lines.len(), 1);
    assert_eq!(preview.lines[0].quantity, 0.5);
    assert!(service.list_lists().unwrap().is_empty());
}

#[test]
fn report_estimates_cost_from_item_prices() {
    let conn = open_db_in_memory().unwrap();
    let items = SqliteItemRepository::try_new(&conn).unwrap();
    let mut rice = Item::new("Rice", ItemCategory::Grains, "cup").unwrap();
    rice.cost_per_unit = Some(0.25);
    let rice = items.create_item(&rice).unwrap();
    let bowl = add_recipe(
        &conn,
        Recipe::basic("Rice bowl", MealType::Dinner, 1).with_ingredient(rice, 1.0, "cup"),
    );
    plan(&conn, "2026-10-19", MealType::Dinner, bowl, 1.0);
    plan(&conn, "2026-10-20", MealType::Dinner, bowl, 1.0);
    let service = grocery(&conn);

    let priced = service
        .generate_grocery_list("2026-10-19", "2026-10-20")
        .unwrap();
    assert_eq!(priced.estimated_total, Some(0.5));

    let herbs = add_item(&conn, "Herbs", ItemCategory::Produce, "bunch");
    let garnished = add_recipe(
        &conn,
        Recipe::basic("Garnish", MealType::Lunch, 1).with_ingredient(herbs, 1.0, "bunch"),
    );
    plan(&conn, "2026-10-20", MealType::Lunch, garnished, 1.0);

    let preview = service.preview("2026-10-19", "2026-10-20").unwrap();
    let rice_line = preview.lines.iter().find(|line| line.item_id == rice).unwrap();
    assert_eq!(rice_line.estimated_cost, Some(0.5));
    assert_eq!(preview.estimated_total, None);
}
