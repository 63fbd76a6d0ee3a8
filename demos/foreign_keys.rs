//! Foreign-key references between records.
//!
//! A `UserConnection` row points at two `User` rows through
//! `ForeignKey<User>` fields. Only the ids are stored; resolving a key is a
//! fresh lookup, so a resolved copy does not follow later updates.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p lightrow-demos --example foreign_keys
//! ```

use lightrow_core::{Conditional, ForeignKey, ID_COLUMN, Record, RecordDef, field};
use lightrow_sqlite::{Bootstrap, Result, StoreConfig, TableSet};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct User {
    id: Option<i64>,
    username: String,
}

impl Record for User {
    fn define() -> RecordDef<Self> {
        RecordDef::new()
            .field(field!(User, id).column(ID_COLUMN))
            .field(field!(User, username).index())
    }

    fn blank() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
struct UserConnection {
    id: Option<i64>,
    follower: ForeignKey<User>,
    followee: ForeignKey<User>,
}

impl Record for UserConnection {
    fn define() -> RecordDef<Self> {
        RecordDef::new()
            .table("connections")
            .field(field!(UserConnection, id).column(ID_COLUMN))
            .field(field!(UserConnection, follower).index())
            .field(field!(UserConnection, followee).index())
    }

    fn blank() -> Self {
        Self::default()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let tables = TableSet::new().with::<User>()?.with::<UserConnection>()?;
    let (store, _) = Bootstrap::open(&StoreConfig::in_memory(1), &tables)?;

    let mut users = Vec::new();
    for name in ["ann", "bob", "cid"] {
        let mut user = User {
            id: None,
            username: name.into(),
        };
        store.insert_record(&mut user)?;
        users.push(user);
    }

    // ann follows bob and cid, bob follows cid
    for (from, to) in [(0, 1), (0, 2), (1, 2)] {
        let mut link = UserConnection {
            id: None,
            follower: ForeignKey::to(&users[from])?,
            followee: ForeignKey::to(&users[to])?,
        };
        store.insert_record(&mut link)?;
    }

    println!("=== Followers of cid ===");
    let cid = ForeignKey::<User>::to(&users[2])?;
    let links = store
        .select::<UserConnection>()?
        .where_equals("followee", [&cid])
        .all()?;
    for link in &links {
        if let Some(follower) = store.resolve(&link.follower)? {
            println!("  {}", follower.username);
        }
    }

    println!("\n=== Stale copies ===");
    let before = store.resolve(&cid)?;
    store
        .update::<User>()?
        .set("username", "cid2")
        .where_equals(ID_COLUMN, [cid.id()])
        .update_all()?;
    let after = store.resolve(&cid)?;
    println!(
        "  resolved before update: {:?}",
        before.map(|u| u.username)
    );
    println!("  resolved after update:  {:?}", after.map(|u| u.username));

    Ok(())
}
