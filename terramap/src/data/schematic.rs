//! TEdit schematic (`.TEditSch`) output
//! ### format
//! - name: `str`
//! - release + 10000: `i32`
//! - frame important: `u16` + `bits(len)`
//! - width: `i32`, height: `i32`
//! - cells, column major (see [`serialize_cell`])
//! - chest count: `u16` (0), chest size: `u16` (0), sign count: `u16` (0), entity count: `u32` (0)
//! - name: `str`, release: `i32`, width: `i32`, height: `i32`
use super::DataWrite;
use super::frames::Frames;
use super::map::WorldMap;
use crate::catalog::{Catalog, Uv};
use crate::cell::{Cell, Liquid};

const HEADER2: u8 = 0x01;
const TILE: u8 = 0x02;
const WALL: u8 = 0x04;
const WATER: u8 = 0x08;
const LAVA: u8 = 0x10;
const HONEY: u8 = 0x18;
const WIDE_TILE: u8 = 0x20;
const RUN_BYTE: u8 = 0x40;
const RUN_SHORT: u8 = 0x80;
// header 2
const HEADER3: u8 = 0x01;
// header 3
const TILE_PAINT: u8 = 0x08;
const WALL_PAINT: u8 = 0x10;
const WIDE_WALL: u8 = 0x40;
const SHIMMER: u8 = 0x80;

/// write one cell record.
///
/// `frame` must be given for frame important tiles, and `wall` is placed behind a tile.
/// `run` more identical cells follow below.
/// ```
/// # use terramap::{Cell, data::{DataWrite, schematic::serialize_cell}};
/// let mut w = DataWrite::new();
/// serialize_cell(&Cell::wall(300), None, None, 2, &mut w);
/// assert_eq!(w.get_data(), [0x45, 0x01, 0x40, 44, 1, 2]);
/// ```
pub fn serialize_cell(cell: &Cell, frame: Option<Uv>, wall: Option<&Cell>, run: u16, w: &mut DataWrite) {
    let (mut h1, mut h3) = (0u8, 0u8);
    let mut data = Vec::with_capacity(13);
    let mut wall_hi = None;
    match *cell {
        Cell::Tile { id, paint, .. } => {
            h1 |= TILE;
            let [lo, hi] = id.to_le_bytes();
            data.push(lo);
            if hi != 0 {
                h1 |= WIDE_TILE;
                data.push(hi);
            }
            if let Some([u, v]) = frame {
                data.extend(u.to_le_bytes());
                data.extend(v.to_le_bytes());
            }
            if paint != 0 {
                h3 |= TILE_PAINT;
                data.push(paint);
            }
            if let Some(wall) = wall {
                wall_hi = wall_data(wall, &mut h1, &mut h3, &mut data);
            }
        }
        Cell::Wall { .. } => wall_hi = wall_data(cell, &mut h1, &mut h3, &mut data),
        Cell::Liquid { id, .. } => {
            h1 |= match id {
                Liquid::Water => WATER,
                Liquid::Shimmer => {
                    h3 |= SHIMMER;
                    WATER
                }
                Liquid::Lava => LAVA,
                Liquid::Honey => HONEY,
            };
            data.push(0xFF);
        }
        Cell::Air { .. } | Cell::Empty => {}
    }
    data.extend(wall_hi);
    if run > 0 {
        let [lo, hi] = run.to_le_bytes();
        data.push(lo);
        if run <= 255 {
            h1 |= RUN_BYTE;
        } else {
            h1 |= RUN_SHORT;
            data.push(hi);
        }
    }

    let h2 = if h3 != 0 { HEADER3 } else { 0 };
    if h2 != 0 {
        h1 |= HEADER2;
    }
    w.write_u8(h1);
    if h2 != 0 {
        w.write_u8(h2);
    }
    if h3 != 0 {
        w.write_u8(h3);
    }
    w.write_bytes(&data);
}

/// returns the high byte of the id, which goes last
fn wall_data(wall: &Cell, h1: &mut u8, h3: &mut u8, data: &mut Vec<u8>) -> Option<u8> {
    let Cell::Wall { id, paint, .. } = *wall else {
        return None;
    };
    *h1 |= WALL;
    let [lo, hi] = id.to_le_bytes();
    data.push(lo);
    if paint != 0 {
        *h3 |= WALL_PAINT;
        data.push(paint);
    }
    (hi != 0).then(|| {
        *h3 |= WIDE_WALL;
        hi
    })
}

/// turns a [`WorldMap`] into a schematic.
pub struct SchematicWriter<'a> {
    map: &'a WorldMap,
    catalog: &'a Catalog,
    frames: Frames<'a>,
}

impl<'a> SchematicWriter<'a> {
    #[must_use]
    pub fn new(map: &'a WorldMap, catalog: &'a Catalog) -> Self {
        Self {
            map,
            catalog,
            frames: Frames::new(map, catalog),
        }
    }

    /// the whole schematic
    pub fn write(&mut self, w: &mut DataWrite) {
        let (m, release) = (self.map, self.catalog.latest_release());
        w.write_string(&m.name, true);
        w.write_i32(release + 10000);
        w.write_bit_array(self.catalog.frame_important(), true);
        w.write_i32(m.width() as i32);
        w.write_i32(m.height() as i32);

        self.write_cells(w);

        // chests, max items per chest
        w.write_u16(0);
        w.write_u16(0);
        // signs
        w.write_u16(0);
        // tile entities
        w.write_u32(0);

        w.write_string(&m.name, true);
        w.write_i32(release);
        w.write_i32(m.width() as i32);
        w.write_i32(m.height() as i32);
    }

    /// what a cell turns into: unexplored cells are filled in
    fn exported(&self, x: usize, y: usize) -> Cell {
        match *self.map.cell(x, y) {
            Cell::Empty => self.catalog.unexplored_tile(),
            c => c,
        }
    }

    fn solid_at(&self, x: isize, y: isize) -> bool {
        self.map
            .get(x, y)
            .and_then(Cell::tile_id)
            .is_some_and(|id| self.catalog.tile(id).solid)
    }

    /// nothing solid below or beside it
    fn needs_wall(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as isize, y as isize);
        !self.solid_at(x, y + 1) && !self.solid_at(x - 1, y) && !self.solid_at(x + 1, y)
    }

    /// the cell records, column major
    pub fn write_cells(&mut self, w: &mut DataWrite) {
        let (width, height) = (self.map.width(), self.map.height());
        let mut last_wall = self.catalog.any_wall();
        let mut records = 0usize;
        for x in 0..width {
            let mut y = 0;
            while y < height {
                let original = *self.map.cell(x, y);
                let cell = self.exported(x, y);
                let mut frame = None;
                let mut pair = None;
                match original {
                    Cell::Tile { id, .. } => {
                        frame = self.frames.get(x, y);
                        if self.catalog.tile(id).needs_wall && self.needs_wall(x, y) {
                            pair = Some(last_wall);
                        }
                    }
                    Cell::Wall { .. } => last_wall = original,
                    _ => {}
                }

                let mut run = 0u16;
                let merges = cell.tile_id().is_none_or(|id| !self.catalog.tile(id).no_run);
                while merges && run < u16::MAX {
                    let below = y + 1 + run as usize;
                    if below >= height || !cell.eq_after_export(&self.exported(x, below)) {
                        break;
                    }
                    if frame.is_some() && self.frames.get(x, below) != frame {
                        break;
                    }
                    run += 1;
                }
                log::trace!("({x}, {y}): {cell} x{}", u32::from(run) + 1);
                serialize_cell(&cell, frame, pair.as_ref(), run, w);
                records += 1;
                y += run as usize + 1;
            }
        }
        log::debug!("wrote {records} records for {} cells", width * height);
    }
}

impl WorldMap {
    /// encode this map as a TEdit schematic.
    /// ```
    /// # use terramap::{Catalog, WorldMap};
    /// let s = WorldMap::new(3, 3).write_schematic(&Catalog::default());
    /// assert_eq!(s[0], 0);
    /// ```
    #[must_use]
    pub fn write_schematic(&self, catalog: &Catalog) -> Vec<u8> {
        let mut w = DataWrite::new();
        SchematicWriter::new(self, catalog).write(&mut w);
        w.into_inner()
    }
}
