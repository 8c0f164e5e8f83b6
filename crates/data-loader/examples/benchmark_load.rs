//! Load the three library tables and summarize the checkout log.
//!
//! Run with: cargo run --release --example benchmark_load -p data-loader [DATA_DIR]

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

use data_loader::{RawTables, TablePaths};

fn main() -> data_loader::Result<()> {
    let data_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/train"));

    let start = Instant::now();
    let tables = RawTables::load(&TablePaths::in_dir(&data_dir))?;
    let elapsed = start.elapsed();

    let mut per_borrower: HashMap<&str, usize> = HashMap::new();
    let mut borrowed: HashSet<&str> = HashSet::new();
    for checkout in &tables.interactions {
        *per_borrower.entry(checkout.user_id.as_str()).or_default() += 1;
        borrowed.insert(checkout.item_id.as_str());
    }

    let registered: HashSet<&str> = tables.users.iter().map(|u| u.user_id.as_str()).collect();
    let unregistered = per_borrower.keys().filter(|id| !registered.contains(*id)).count();
    let mut counts: Vec<usize> = per_borrower.values().copied().collect();
    counts.sort_unstable();
    let median = counts.get(counts.len() / 2).copied().unwrap_or(0);
    // likely cold users at predict time
    let single_checkout = counts.iter().filter(|&&n| n == 1).count();

    println!("Loaded {} in {:?}", data_dir.display(), elapsed);
    println!("Patrons: {} registered, {} borrowing, {} borrowing without a profile",
             tables.users.len(), per_borrower.len(), unregistered);
    println!("Books: {} catalogued, {} ever borrowed", tables.items.len(), borrowed.len());
    println!("Checkouts: {} total, median {} per borrower, max {}",
             tables.interactions.len(), median, counts.last().copied().unwrap_or(0));
    println!("Borrowers with a single checkout: {}", single_checkout);

    Ok(())
}
