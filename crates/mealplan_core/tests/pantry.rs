use mealplan_core::db::open_db_in_memory;
use mealplan_core::repo::item_repo::{ItemRepository, SqliteItemRepository};
use mealplan_core::repo::pantry_repo::SqlitePantryRepository;
use mealplan_core::{Item, ItemCategory, ItemId, PantryError, PantryService};
use chrono::NaiveDate;
use rusqlite::Connection;

type Pantry<'c> = PantryService<SqlitePantryRepository<'c>, SqliteItemRepository<'c>>;

fn pantry(conn: &Connection) -> Pantry<'_> {
    PantryService::new(
        SqlitePantryRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
    )
}

fn seed_item(conn: &Connection, name: &str, unit: &str) -> ItemId {
    let repo = SqliteItemRepository::try_new(conn).unwrap();
    repo.create_item(&Item::new(name, ItemCategory::Pantry, unit).unwrap())
        .unwrap()
}

#[test]
fn adjust_creates_row_and_accumulates() {
    let conn = open_db_in_memory().unwrap();
    let rice = seed_item(&conn, "Rice", "cup");
    let service = pantry(&conn);

    assert!(service.get(rice).unwrap().is_none());
    service.adjust_quantity(rice, 2.0, "cup").unwrap();
    let row = service.adjust_quantity(rice, 1.5, "cup").unwrap();
    assert_eq!(row.quantity, 3.5);
    assert_eq!(service.get(rice).unwrap().unwrap().quantity, 3.5);
}

#[test]
fn over_consumption_clamps_at_zero() {
    let conn = open_db_in_memory().unwrap();
    let flour = seed_item(&conn, "Flour", "g");
    let service = pantry(&conn);

    service.adjust_quantity(flour, 500.0, "g").unwrap();
    for delta in [-500.5, -10_000.0, -0.1] {
        let row = service.adjust_quantity(flour, delta, "g").unwrap();
        assert_eq!(row.quantity, 0.0);
    }

    // Consuming from a missing row creates an empty one.
    let sugar = seed_item(&conn, "Sugar", "g");
    let row = service.adjust_quantity(sugar, -3.0, "g").unwrap();
    assert_eq!(row.quantity, 0.0);
}

#[test]
fn unknown_item_and_unit_mismatch_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let oil = seed_item(&conn, "Oil", "tbsp");
    let service = pantry(&conn);

    let ghost = uuid::Uuid::new_v4();
    assert!(matches!(
        service.adjust_quantity(ghost, 1.0, "tbsp"),
        Err(PantryError::UnknownItem(id)) if id == ghost
    ));

    service.adjust_quantity(oil, 4.0, "tbsp").unwrap();
    match service.adjust_quantity(oil, 100.0, "ml").unwrap_err() {
        PantryError::IncompatibleUnit {
            stocked_unit,
            requested_unit,
            ..
        } => {
            assert_eq!(stocked_unit, "tbsp");
            assert_eq!(requested_unit, "ml");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.get(oil).unwrap().unwrap().quantity, 4.0);
}

#[test]
fn set_stock_replaces_unit_and_remove_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let milk = seed_item(&conn, "Milk", "cup");
    let service = pantry(&conn);

    service.adjust_quantity(milk, 2.0, "cup").unwrap();
    let expiry = NaiveDate::from_ymd_opt(2026, 10, 20);
    let row = service.set_stock(milk, 1.0, "L", expiry).unwrap();
    assert_eq!(row.unit, "l");

    let stored = service.get(milk).unwrap().unwrap();
    assert_eq!(stored.quantity, 1.0);
    assert_eq!(stored.expiration_date, expiry);

    assert!(matches!(
        service.set_stock(milk, -1.0, "l", None),
        Err(PantryError::NegativeQuantity(_))
    ));

    assert!(service.remove(milk).unwrap());
    assert!(!service.remove(milk).unwrap());
    assert!(service.list().unwrap().is_empty());
}
