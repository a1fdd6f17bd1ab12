use std::process::ExitCode;
use terramap::{Catalog, WorldMap};

macro_rules! fail {
    () => {
        fail!("{bold_red}<input.map>{reset} [<catalog.json>] [<output>]")
    };
    ($usage:literal) => {{
        eprintln!(concat!("usage: m2s ", comat::comat!($usage)));
        return ExitCode::FAILURE;
    }};
}

fn main() -> ExitCode {
    terramap::logger::init();
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        fail!();
    };
    let catalog = match args.next() {
        Some(path) => {
            let Ok(f) = std::fs::File::open(&path) else {
                fail!(".. {bold_red}<catalog.json: readable file>{reset} ..")
            };
            match Catalog::from_reader(std::io::BufReader::new(f)) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("bad catalog {path}: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            log::warn!("no catalog given, every tile is exported as unknown");
            Catalog::default()
        }
    };
    let Ok(data) = std::fs::read(&input) else {
        fail!("{bold_red}<input.map: readable file>{reset} ..")
    };
    let map = match WorldMap::read(&data) {
        Ok(m) => m,
        Err(e) => {
            log::error!("could not read {input}: {e}");
            return ExitCode::FAILURE;
        }
    };
    if !map.is_release_safe(&catalog) {
        log::warn!(
            "map is from release {}, the catalog only knows up to {}",
            map.release,
            catalog.latest_release()
        );
    }
    let output = args.next().unwrap_or_else(|| {
        let name = map.name.replace(['/', '\\'], "_");
        format!("{name}.TEditSch")
    });
    let schematic = map.write_schematic(&catalog);
    if let Err(e) = std::fs::write(&output, &schematic) {
        log::error!("could not write {output}: {e}");
        return ExitCode::FAILURE;
    }
    log::info!("wrote {output} ({} bytes)", schematic.len());
    ExitCode::SUCCESS
}
