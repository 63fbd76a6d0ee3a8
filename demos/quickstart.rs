//! Record CRUD walkthrough against an in-memory store.
//!
//! Declares a record, creates its table, then inserts, queries, updates
//! and deletes rows through both the record-level API and the statement
//! builders.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=lightrow_sqlite=debug cargo run -p lightrow-demos --example quickstart
//! ```

use lightrow_core::{Conditional, ID_COLUMN, Record, RecordDef, field, to_row};
use lightrow_sqlite::{Persist, Result, Store};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Person {
    id: Option<i64>,
    name: String,
    age: i32,
    nickname: Option<String>,
}

impl Record for Person {
    fn define() -> RecordDef<Self> {
        RecordDef::new()
            .field(field!(Person, id).column(ID_COLUMN))
            .field(field!(Person, name).index())
            .field(field!(Person, age))
            .field(field!(Person, nickname))
    }

    fn blank() -> Self {
        Self::default()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Store::open_in_memory()?;
    store.create_table::<Person>()?;

    // === Insert ===
    println!("=== Insert ===");
    let mut alice = Person {
        id: None,
        name: "Alice".into(),
        age: 30,
        nickname: Some("Al".into()),
    };
    let id = store.insert_record(&mut alice)?;
    println!("Inserted {} as {:?}", to_row(&alice)?, id);

    for (name, age) in [("Bob", 25), ("Carol", 41), ("Dave", 17)] {
        let mut person = Person {
            name: name.into(),
            age,
            ..Person::default()
        };
        person.save(&store)?;
    }
    println!("Total rows: {}", store.select::<Person>()?.count()?);

    // === Query ===
    println!("\n=== Query ===");
    let adults = store
        .select::<Person>()?
        .where_greater_than_or_equals("age", 18)
        .order_by(["age DESC"])
        .all()?;
    for person in &adults {
        println!("  {} ({})", person.name, person.age);
    }

    let names = store
        .select_columns::<Person, _, _>(["name", "nickname"])?
        .where_not_equals("nickname", None::<String>)
        .rows()?;
    for row in &names {
        println!("  with nickname: {row}");
    }

    // === Update ===
    println!("\n=== Update ===");
    let affected = store
        .update::<Person>()?
        .set("age", 31)
        .where_equals("name", ["Alice"])
        .update_all()?;
    println!("Updated {affected} row(s)");

    alice.reload(&store)?;
    println!("Alice is now {}", alice.age);

    // === Delete ===
    println!("\n=== Delete ===");
    let removed = store
        .delete::<Person>()?
        .where_less_than("age", 18)
        .perform_delete()?;
    println!("Removed {removed} minor(s)");
    println!("Deleted Alice: {}", alice.remove(&store)?);
    println!("Remaining rows: {}", store.select::<Person>()?.count()?);

    Ok(())
}
