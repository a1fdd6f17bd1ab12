use std::env::Args;
use terramap::{Catalog, WorldMap};

use super::print_err;

pub fn main(args: Args) {
    let mut catalog = None;
    for curr in args {
        if let Some(path) = curr.strip_prefix("--catalog=") {
            match std::fs::File::open(path)
                .map_err(Into::into)
                .and_then(Catalog::from_reader)
            {
                Ok(c) => catalog = Some(c),
                Err(e) => print_err!(e, "could not load catalog {path}"),
            }
            continue;
        }
        let Ok(s) = std::fs::read(&curr) else {
            eprintln!("could not read {curr}");
            continue;
        };
        match WorldMap::read(&s) {
            Err(e) => print_err!(e, "fail"),
            Ok(m) => describe(&m, catalog.as_ref()),
        }
    }
}

fn describe(m: &WorldMap, catalog: Option<&Catalog>) {
    println!("{} ({})", m.name, m.id);
    print!("  release {}", m.release);
    if let Some(c) = catalog {
        print!(" ({})", m.version(c));
        if !m.is_release_safe(c) {
            print!(" (newer than the catalog)");
        }
    }
    println!(
        ", revision {}{}",
        m.revision,
        if m.chinese { ", chinese" } else { "" }
    );
    let estimated = |e| if e { " (estimated)" } else { "" };
    println!(
        "  {}x{}, surface {}{}, rock {}{}, underworld {}",
        m.width(),
        m.height(),
        m.world_surface,
        estimated(m.world_surface_estimated),
        m.rock_layer,
        estimated(m.rock_layer_estimated),
        m.underworld_layer()
    );
    let explored = m.cells().iter().filter(|c| !c.is_empty()).count();
    println!("  explored {explored}/{}", m.cells().len());
}
