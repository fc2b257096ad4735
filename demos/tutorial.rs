//! A tour of Rivulet pipelines.
//!
//! Run with: cargo run --example tutorial
//! Set `RUST_LOG=rivulet=debug` to see lane splits and barrier merges.

use rivulet::collector::{grouping_by, joining, partitioning_by};
use rivulet::prelude::*;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Rivulet Tutorial ===\n");

    println!("1. Filter, sort, map");
    let names = vec!["ddd2", "aaa2", "bbb1", "aaa1", "bbb3", "ccc", "bbb2", "ddd1"];
    let a_names = rivulet::of(names.clone())
        .sorted()
        .filter(|s| s.starts_with('a'))
        .map(|s| s.to_uppercase())
        .to_vec()?;
    println!("   sorted a-names, upper-cased: {a_names:?}");

    println!("\n2. Matching and counting");
    let any_a = rivulet::of(names.clone()).any_match(|s| s.starts_with('a'))?;
    let all_a = rivulet::of(names.clone()).all_match(|s| s.starts_with('a'))?;
    let none_z = rivulet::of(names.clone()).none_match(|s| s.starts_with('z'))?;
    let b_count = rivulet::of(names.clone()).filter(|s| s.starts_with('b')).count()?;
    println!("   any a: {any_a}, all a: {all_a}, none z: {none_z}, b count: {b_count}");

    println!("\n3. Reduce");
    let smallest = rivulet::of(names.clone())
        .sorted()
        .reduce_opt(|a, b| if a < b { a } else { b })?;
    println!("   smallest: {smallest:?}");
    let csv = rivulet::of(names.clone()).collect_with(joining(", ").with_affixes("[", "]"))?;
    println!("   joined: {csv}");

    println!("\n4. Grouping and partitioning");
    let groups = rivulet::of(names.clone()).collect_with(grouping_by(|s: &&str| s.as_bytes()[0] as char))?;
    let groups: BTreeMap<_, _> = groups.into_iter().collect();
    println!("   by first letter: {groups:?}");
    let (short, long) =
        rivulet::of(names.clone()).collect_with(partitioning_by(|s: &&str| s.len() < 4))?;
    println!("   short: {short:?}, long: {long:?}");

    println!("\n5. Infinite sources need a limit");
    let evens = rivulet::iterate(0u64, |n| n + 2).skip(3).limit(5).to_vec()?;
    println!("   evens: {evens:?}");
    match rivulet::iterate(0u64, |n| n + 2).count() {
        Ok(n) => println!("   unexpected count {n}"),
        Err(e) => println!("   count without limit: {e}"),
    }

    println!("\n6. Numeric pipelines");
    let stats = rivulet::of(vec![3i32, 2, 2, 3, 7, 3, 5])
        .map_to_numeric(|n| n)
        .summary()?;
    println!("   summary: {stats}");
    let squares = NumericPipeline::of(vec![3i32, 2, 2, 3, 7, 3, 5])
        .map(|n| n * n)
        .distinct()
        .to_vec()?;
    println!("   distinct squares: {squares:?}");

    println!("\n7. Parallel evaluation");
    let pool = std::sync::Arc::new(ThreadPool::with_workers(4));
    let total = rivulet::range(0u64, 1_000_000).parallel_with(pool.clone()).sum()?;
    let first = rivulet::range(0u64, 1_000_000)
        .parallel_with(pool)
        .filter(|n| n % 7919 == 7918)
        .find_first()?;
    println!("   sum: {total}, first match: {first:?}");

    println!("\n8. Stage errors");
    let parsed = rivulet::of(vec!["1", "2", "x"]).try_map(|s| s.parse::<i32>()).to_vec();
    if let Err(e) = parsed {
        println!("   {e}");
    }

    Ok(())
}
