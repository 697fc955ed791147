use mealplan_core::db::open_db_in_memory;
use mealplan_core::repo::grocery_repo::SqliteGroceryRepository;
use mealplan_core::repo::item_repo::{ItemRepository, SqliteItemRepository};
use mealplan_core::repo::pantry_repo::{PantryRepository, SqlitePantryRepository};
use mealplan_core::repo::recipe_repo::{RecipeRepository, SqliteRecipeRepository};
use mealplan_core::repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
use mealplan_core::service::snapshot_service::{from_json, to_json};
use mealplan_core::{
    export_snapshot, import_snapshot, DateRange, GroceryList, GroceryListItem, GroceryService,
    Item, ItemCategory, MealType, PantryItem, PantryService, Recipe, ScheduledMeal,
    SnapshotError, SNAPSHOT_FORMAT_VERSION,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn seed(conn: &Connection) {
    let items = SqliteItemRepository::try_new(conn).unwrap();
    let recipes = SqliteRecipeRepository::try_new(conn).unwrap();
    let schedule = SqliteScheduleRepository::try_new(conn).unwrap();
    let pantry = SqlitePantryRepository::try_new(conn).unwrap();

    let mut rice = Item::new("Rice", ItemCategory::Grains, "cup").unwrap();
    rice.labels = vec!["staple".to_string()];
    rice.cost_per_unit = Some(0.35);
    let rice = items.create_item(&rice).unwrap();
    let beans = items
        .create_item(&Item::new("Black beans", ItemCategory::Pantry, "can").unwrap())
        .unwrap();

    let bowl = recipes
        .create_recipe(
            &Recipe::basic("Rice and beans", MealType::Dinner, 2)
                .with_ingredient(rice, 1.5, "cup")
                .with_ingredient(beans, 1.0, "can"),
        )
        .unwrap();
    let combo = recipes
        .create_recipe(&Recipe::combo("Big dinner", MealType::Dinner, 4).with_component(bowl, 2.0))
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let mut meal = ScheduledMeal::new(combo, day, MealType::Dinner);
    meal.notes = Some("guests".to_string());
    schedule.insert_meal(&meal).unwrap();
    schedule
        .insert_meal(&ScheduledMeal::new(bowl, day.succ_opt().unwrap(), MealType::Lunch))
        .unwrap();

    pantry
        .upsert_stock(&PantryItem {
            item_id: rice,
            quantity: 2.0,
            unit: "cup".to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2027, 1, 1),
        })
        .unwrap();
}

#[test]
fn export_then_import_reproduces_data() {
    let source = open_db_in_memory().unwrap();
    seed(&source);
    let exported = export_snapshot(&source).unwrap();
    assert_eq!(exported.format_version, SNAPSHOT_FORMAT_VERSION);
    assert_eq!(exported.items.len(), 2);
    assert_eq!(exported.recipes.len(), 2);
    assert_eq!(exported.scheduled_meals.len(), 2);

    let mut target = open_db_in_memory().unwrap();
    let summary = import_snapshot(&mut target, &exported).unwrap();
    assert_eq!(summary.items, 2);
    assert_eq!(summary.pantry, 1);
    assert_eq!(summary.dangling_references, 0);

    let reimported = export_snapshot(&target).unwrap();
    assert_eq!(reimported.items, exported.items);
    assert_eq!(reimported.recipes, exported.recipes);
    assert_eq!(reimported.scheduled_meals, exported.scheduled_meals);
    assert_eq!(reimported.pantry, exported.pantry);
    assert_eq!(reimported.grocery_lists, exported.grocery_lists);
}

#[test]
fn import_replaces_existing_rows() {
    let source = open_db_in_memory().unwrap();
    seed(&source);
    let exported = export_snapshot(&source).unwrap();

    let mut target = open_db_in_memory().unwrap();
    SqliteItemRepository::try_new(&target)
        .unwrap()
        .create_item(&Item::new("Leftover", ItemCategory::Other, "unit").unwrap())
        .unwrap();
    import_snapshot(&mut target, &exported).unwrap();

    let items = SqliteItemRepository::try_new(&target).unwrap();
    assert!(items.find_item_by_name("Leftover").unwrap().is_none());
    assert!(items.find_item_by_name("rice").unwrap().is_some());
}

#[test]
fn rejected_import_leaves_data_untouched() {
    let source = open_db_in_memory().unwrap();
    seed(&source);
    let before = export_snapshot(&source).unwrap();

    let mut broken = before.clone();
    broken.pantry.push(PantryItem {
        item_id: uuid::Uuid::new_v4(),
        quantity: 1.0,
        unit: "g".to_string(),
        expiration_date: None,
    });
    broken.items.clear();

    let mut conn = source;
    assert!(matches!(
        import_snapshot(&mut conn, &broken),
        Err(SnapshotError::UnknownItem(_))
    ));

    let mut newer = before.clone();
    newer.format_version = SNAPSHOT_FORMAT_VERSION + 1;
    assert!(matches!(
        import_snapshot(&mut conn, &newer),
        Err(SnapshotError::UnsupportedVersion(_))
    ));

    let after = export_snapshot(&conn).unwrap();
    assert_eq!(after.items, before.items);
    assert_eq!(after.recipes, before.recipes);
    assert_eq!(after.pantry, before.pantry);
}

#[test]
fn dangling_meal_references_are_counted() {
    let source = open_db_in_memory().unwrap();
    seed(&source);
    let mut snapshot = export_snapshot(&source).unwrap();
    snapshot.scheduled_meals.push(ScheduledMeal::new(
        uuid::Uuid::new_v4(),
        NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
        MealType::Breakfast,
    ));

    let mut target = open_db_in_memory().unwrap();
    let summary = import_snapshot(&mut target, &snapshot).unwrap();
    assert_eq!(summary.scheduled_meals, 3);
    assert_eq!(summary.dangling_references, 1);
}

#[test]
fn json_round_trip_is_lossless() {
    let source = open_db_in_memory().unwrap();
    seed(&source);
    let exported = export_snapshot(&source).unwrap();

    let json = to_json(&exported).unwrap();
    assert!(json.contains("\"format_version\": 1"));
    let parsed = from_json(&json).unwrap();
    assert_eq!(parsed, exported);

    assert!(matches!(from_json("{ not json"), Err(SnapshotError::Json(_))));
}

#[test]
fn imported_units_are_normalized_before_storage() {
    let source = open_db_in_memory().unwrap();
    seed(&source);
    let mut snapshot = export_snapshot(&source).unwrap();
    let rice = snapshot
        .items
        .iter()
        .find(|item| item.name == "Rice")
        .unwrap()
        .clone();
    for item in &mut snapshot.items {
        if item.name == "Black beans" {
            item.name = "  Black   BEANS ".to_string();
        }
    }
    snapshot.pantry[0].unit = "  Cups ".to_string();
    let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    snapshot.grocery_lists.push(GroceryList {
        id: uuid::Uuid::new_v4(),
        date_range: DateRange::new(day, day),
        generated_at: 0,
        items: vec![GroceryListItem {
            item_id: rice.id,
            item_name: rice.name.clone(),
            category: rice.category,
            quantity: 1.0,
            unit: " Cup ".to_string(),
            purchased: false,
        }],
    });

    let mut conn = open_db_in_memory().unwrap();
    import_snapshot(&mut conn, &snapshot).unwrap();

    let items = SqliteItemRepository::try_new(&conn).unwrap();
    let beans = items.find_item_by_name("black beans").unwrap().unwrap();
    assert_eq!(beans.name, "Black BEANS");

    let pantry = PantryService::new(
        SqlitePantryRepository::try_new(&conn).unwrap(),
        SqliteItemRepository::try_new(&conn).unwrap(),
    );
    let stocked_id = snapshot.pantry[0].item_id;
    let row = pantry.adjust_quantity(stocked_id, 1.0, "cups").unwrap();
    assert_eq!(row.unit, "cups");
    assert_eq!(row.quantity, 3.0);

    let grocery = GroceryService::new(
        SqliteScheduleRepository::try_new(&conn).unwrap(),
        SqliteRecipeRepository::try_new(&conn).unwrap(),
        SqliteItemRepository::try_new(&conn).unwrap(),
        SqlitePantryRepository::try_new(&conn).unwrap(),
        SqliteGroceryRepository::try_new(&conn).unwrap(),
    );
    let list_id = snapshot.grocery_lists[0].id;
    let updated = grocery.set_purchased(list_id, rice.id, "cup", true).unwrap();
    assert!(updated.items[0].purchased);
    assert_eq!(updated.items[0].unit, "cup");
}
