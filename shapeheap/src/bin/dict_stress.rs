use std::{process, time::Instant};

use clap::Parser as ClapParser;
use shapeheap::{Heap, HeapSettings, MapKind, PropertyKey, Value};

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Fill one object with keys and check it", long_about = None)]
struct Cli {
    /// Number of keys to insert
    #[arg(long, default_value_t = 100_000)]
    keys: u32,

    /// Start from dense storage
    #[arg(long, help = "Start with a dense object")]
    dense: bool,

    /// Use interned names instead of integer keys
    #[arg(long, help = "Insert name keys (forces keyed storage)")]
    names: bool,

    #[arg(long, default_value_t = 8, help = "Initial linear probe budget")]
    max_probes: usize,

    #[arg(long, default_value_t = 65_536, help = "Largest dense index")]
    dense_index_limit: usize,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let settings = HeapSettings {
        max_probes: cli.max_probes,
        dense_index_limit: cli.dense_index_limit,
        ..Default::default()
    };
    let mut heap = match Heap::try_new(settings) {
        Ok(heap) => heap,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };

    let object = if cli.dense {
        heap.new_dense_object(None)
    } else {
        heap.new_object(None)
    };
    let keys: Vec<PropertyKey> = (0..cli.keys)
        .map(|n| {
            if cli.names {
                PropertyKey::Name(heap.intern(&format!("key{n}")))
            } else {
                PropertyKey::from(n)
            }
        })
        .collect();

    let start = Instant::now();
    for (n, &key) in keys.iter().enumerate() {
        object.set(&mut heap, key, Value::from_i64(n as i64));
    }
    let inserted = start.elapsed();

    let start = Instant::now();
    let mismatches = keys
        .iter()
        .enumerate()
        .filter(|&(n, &key)| object.get(&mut heap, key) != Value::from_i64(n as i64))
        .count();
    let looked_up = start.elapsed();

    let header = *heap.object(object);
    let kind: MapKind = heap.map(header.map()).kind();
    let stats = heap.stats();
    println!("keys:        {}", keys.len());
    println!("storage:     {}", if header.is_dense() { "dense" } else { "keyed" });
    println!("map kind:    {kind:?}");
    println!("capacity:    {}", object.capacity(&heap));
    println!("probes:      {}", header.probe_budget());
    println!("grows:       {}", stats.grows);
    println!("dense→keyed: {}", stats.dense_to_keyed);
    println!("transitions: {}", stats.shape_transitions);
    println!("insert:      {inserted:?}");
    println!("lookup:      {looked_up:?}");

    if mismatches > 0 {
        eprintln!("Error: {mismatches} keys read back wrong");
        process::exit(1);
    }
}
