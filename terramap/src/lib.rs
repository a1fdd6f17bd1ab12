//! crate for dealing with terraria minimaps
//!
//! reads `.map` files (every release) into a [`WorldMap`] and writes them back out as TEdit schematics.
//! ```no_run
//! # use terramap::{Catalog, WorldMap};
//! let catalog = Catalog::from_reader(std::fs::File::open("catalog.json").unwrap()).unwrap();
//! let map = WorldMap::read(&std::fs::read("world.map").unwrap()).unwrap();
//! std::fs::write("world.TEditSch", map.write_schematic(&catalog)).unwrap();
//! ```
#![warn(
    clippy::missing_const_for_fn,
    clippy::dbg_macro,
    clippy::perf
)]
pub mod catalog;
pub mod cell;
pub mod data;
pub mod logger;
#[doc(inline)]
pub use catalog::Catalog;
#[doc(inline)]
pub use cell::Cell;
#[doc(inline)]
pub use data::{DataRead, DataWrite, Serializable, map::WorldMap, schematic::SchematicWriter};
