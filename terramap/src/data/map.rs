//! the map module
//! ### format
//! note: `str` = `len<u8>` + `utf8(read(len))`
//!
//! key: `: T` and `x<T>` both mean read T, `iterate T` means iterate `read_T()` times
//!
//! header: [`MapReader::header`]
//! - release: `i32` (bit `0x8000` marks unreadable development builds)
//! - if release > 135:
//!     - magic: 7b = `relogic` (or `xindong` for the chinese edition)
//!     - file type: `u8` (should be [`FileType::Map`])
//!     - revision: `u32`
//!     - bitfield: `u64` (skip)
//! - name: `str`, id: `i32`, height: `i32`, width: `i32`
//!
//! legacy cells (release <= 91) [`MapReader::legacy`], column major:
//! - for `x` in `w`, for `y` in `h`
//!     - has data: `bool`
//!     - if not, skip: `u16`, `y += skip`
//!     - id: `u8` (release <= 77) or `u16`
//!     - light: `u8`
//!     - flags: `u8` (release < 50) or `u16`
//!     - repeat: `u16`
//!     - if light != 255, iterate repeat
//!         - light: `u8`
//!
//! modern cells [`MapReader::modern`]:
//! - counts: 6x`u16` (tile, wall, liquid, sky, dirt, rock)
//! - tile has options: `bits(tile count)`, wall has options: `bits(wall count)`
//! - option counts: `u8` for every set bit
//! - if release >= 93 the rest is raw deflate
//! - row major, for `y` in `h`, for `x` in `w`
//!     - flags: `u8` = `VVWZYYYX`
//!     - if X: paint `u8`
//!     - group = YYY
//!     - if group is tile, wall or dirt/rock: index `u16` if Z else `u8`
//!     - if W: light `u8`, else 255
//!     - repeat: `u8` (VV = 1) or `u16` (VV = 2)
//!     - if light != 255, iterate repeat
//!         - light: `u8`
use std::fmt::Write;
use thiserror::Error;

use super::{DataRead, Serializable};
use crate::catalog::{BLACK, Catalog, Color};
use crate::cell::{AirDepth, Cell, Group, Liquid};

/// releases up to this use the column major format
pub const LEGACY_RELEASE: i32 = 91;
/// releases from this compress the cell stream
pub const COMPRESSED_RELEASE: i32 = 93;
/// releases after this carry the file metadata block
pub const METADATA_RELEASE: i32 = 135;
const DEVELOPMENT_BIT: i32 = 0x8000;
/// a few times the largest world size the game offers
pub const MAX_CELLS: usize = 1 << 26;

/// kinds of files sharing the metadata block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FileType {
    None,
    Map,
    World,
    Player,
}

/// horizontal bands of the world
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Sky,
    Underground,
    Cavern,
    Underworld,
}

#[must_use]
pub fn estimate_world_surface(height: i32) -> i32 {
    (0.2 * f64::from(height) + 75.0).round() as i32
}

#[must_use]
pub fn estimate_rock_layer(height: i32) -> i32 {
    (0.35 * f64::from(height) + 25.0).round() as i32
}

/// a decoded minimap.
/// ```
/// # use terramap::{Cell, WorldMap};
/// let mut m = WorldMap::new(4, 3);
/// m.set_cell(1, 2, Cell::tile(5));
/// m.set_cell(9, 9, Cell::tile(5));
/// assert_eq!(m.cell(1, 2), &Cell::tile(5));
/// assert_eq!(m.get(-1, 0), None);
/// assert_eq!(m.get(3, 2), Some(&Cell::Empty));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WorldMap {
    pub name: String,
    pub id: i32,
    pub release: i32,
    /// -1 if the file is too old to have one
    pub revision: i64,
    pub chinese: bool,
    pub world_surface: i32,
    pub world_surface_estimated: bool,
    pub rock_layer: i32,
    pub rock_layer_estimated: bool,
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl WorldMap {
    /// empty map, with the layers guessed from the height
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        Self {
            name: String::new(),
            id: 0,
            release: -1,
            revision: -1,
            chinese: false,
            world_surface: estimate_world_surface(h),
            world_surface_estimated: true,
            rock_layer: estimate_rock_layer(h),
            rock_layer_estimated: true,
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    /// decode a `.map` file
    pub fn read(data: &[u8]) -> Result<Self, ReadError> {
        Self::deserialize(&mut DataRead::new(data))
    }

    /// resize, clearing every cell
    pub fn set_dimensions(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::Empty; width * height];
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// all the cells, row major
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// panics: if out of bounds
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        assert!(x < self.width, "x {x} out of bounds (width {})", self.width);
        &self.cells[y * self.width + x]
    }

    /// the cell at `x, y`, if that is inside the map
    #[must_use]
    pub fn get(&self, x: isize, y: isize) -> Option<&Cell> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    /// writes outside the map are dropped
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    #[must_use]
    pub const fn underworld_layer(&self) -> i32 {
        self.height as i32 - 200
    }

    #[must_use]
    pub const fn layer(&self, y: usize) -> Layer {
        let y = y as i64;
        if y < self.world_surface as i64 {
            Layer::Sky
        } else if y < self.rock_layer as i64 {
            Layer::Underground
        } else if y < self.underworld_layer() as i64 {
            Layer::Cavern
        } else {
            Layer::Underworld
        }
    }

    const fn air_depth(&self, y: usize) -> AirDepth {
        match self.layer(y) {
            Layer::Sky => AirDepth::Sky,
            Layer::Underground => AirDepth::Underground,
            Layer::Cavern | Layer::Underworld => AirDepth::Cavern,
        }
    }

    #[must_use]
    pub fn version(&self, catalog: &Catalog) -> String {
        catalog.version_string(self.release)
    }

    /// whether the catalog knows everything this release can contain
    #[must_use]
    pub const fn is_release_safe(&self, catalog: &Catalog) -> bool {
        self.release <= catalog.latest_release()
    }

    /// the map color of a cell, unpainted
    #[must_use]
    pub fn color(&self, catalog: &Catalog, x: usize, y: usize) -> Color {
        match *self.cell(x, y) {
            Cell::Empty => BLACK,
            Cell::Air { shade, .. } => match self.layer(y) {
                Layer::Sky => catalog.sky_color(y, self.world_surface),
                Layer::Underground => catalog.dirt_color(shade),
                Layer::Cavern => catalog.rock_color(shade),
                Layer::Underworld => catalog.hell_color(),
            },
            Cell::Tile { id, option, .. } => catalog.tile_color(id, option),
            Cell::Wall { id, option, .. } => catalog.wall_color(id, option),
            Cell::Liquid { id, .. } => catalog.liquid_color(id),
        }
    }

    #[must_use]
    pub fn color_painted(&self, catalog: &Catalog, x: usize, y: usize) -> Color {
        let c = self.cell(x, y);
        let color = self.color(catalog, x, y);
        match c.group() {
            Group::Tile | Group::Wall if c.paint() != 0 => {
                catalog.apply_paint(c.group(), color, c.paint())
            }
            _ => color,
        }
    }

    /// human readable description of a cell, for tooltips and the like.
    #[must_use]
    pub fn describe(&self, catalog: &Catalog, x: usize, y: usize) -> String {
        let mut s = format!("({x}, {y}): ");
        let cell = *self.cell(x, y);
        let Some(light) = cell.light() else {
            s.push_str("Empty");
            return s;
        };
        let _ = write!(s, "Light {light}/255 - ");
        let _ = match cell {
            Cell::Empty => Ok(()),
            Cell::Air { shade, .. } => match self.layer(y) {
                Layer::Sky => write!(
                    s,
                    "Air - Surface Layer - Shade {}",
                    catalog.sky_index(y, self.world_surface)
                ),
                Layer::Underground => write!(
                    s,
                    "Air - Underground Layer - Shade {}",
                    catalog.dirt_index(shade)
                ),
                Layer::Cavern => write!(
                    s,
                    "Air - Caverns Layer - Shade {}",
                    catalog.rock_index(shade)
                ),
                Layer::Underworld => write!(s, "Air - Underworld Layer"),
            },
            Cell::Tile {
                id, option, paint, ..
            } => {
                let t = catalog.tile(id);
                write!(
                    s,
                    "Tile - {} ({id}) - Option {}/{} - Paint {} ({paint})",
                    t.name,
                    u16::from(option) + 1,
                    t.colors.len(),
                    catalog.paint(paint).name
                )
            }
            Cell::Wall {
                id, option, paint, ..
            } => {
                let w = catalog.wall(id);
                write!(
                    s,
                    "Wall - {} ({id}) - Option {}/{} - Paint {} ({paint})",
                    w.name,
                    u16::from(option) + 1,
                    w.colors.len(),
                    catalog.paint(paint).name
                )
            }
            Cell::Liquid { id, .. } => {
                write!(s, "Liquid - {} ({})", catalog.liquid(id).name, id.id())
            }
        };
        s
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read from buffer")]
    Read(#[from] super::ReadError),
    #[error(transparent)]
    Decompress(#[from] super::DecompressError),
    #[error("incorrect magic number ({0:?})")]
    Magic([u8; 7]),
    #[error("not a map file (file type {0})")]
    FileType(u8),
    #[error("unsupported format generation ({0:#x}), probably made by a development build")]
    UnsupportedGeneration(i32),
    #[error("invalid dimensions {width}x{height}")]
    Dimensions { width: i32, height: i32 },
    #[error("unknown {group} type index {index} ({count} known)")]
    UnknownType {
        group: &'static str,
        index: u16,
        count: usize,
    },
}

/// the six type counts leading the modern format
#[derive(Debug)]
#[allow(dead_code)] // only logged
struct Counts {
    tile: u16,
    wall: u16,
    liquid: u16,
    sky: u16,
    dirt: u16,
    rock: u16,
}

/// type index -> (id, option)
#[derive(Debug)]
struct Lookup {
    group: &'static str,
    id: Vec<u16>,
    option: Vec<u8>,
}

impl Lookup {
    fn new(group: &'static str, options: &[u8]) -> Self {
        let mut id = vec![];
        let mut option = vec![];
        for (i, &n) in options.iter().enumerate() {
            for o in 0..n {
                id.push(i as u16);
                option.push(o);
            }
        }
        if id.len() > usize::from(u16::MAX) + 1 {
            log::warn!(
                "{group} lookup has {} entries, more than an index can address",
                id.len()
            );
        }
        Self { group, id, option }
    }

    fn get(&self, index: u16) -> Result<(u16, u8), ReadError> {
        let i = index as usize;
        match (self.id.get(i), self.option.get(i)) {
            (Some(&id), Some(&option)) => Ok((id, option)),
            _ => Err(ReadError::UnknownType {
                group: self.group,
                index,
                count: self.id.len(),
            }),
        }
    }
}

/// the 3 bit group of the modern format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Packed {
    Empty,
    Tile,
    Wall,
    Water,
    Lava,
    Honey,
    Sky,
    DirtRock,
}

impl Packed {
    const fn of(flags: u8) -> Self {
        match (flags >> 1) & 7 {
            0 => Self::Empty,
            1 => Self::Tile,
            2 => Self::Wall,
            3 => Self::Water,
            4 => Self::Lava,
            5 => Self::Honey,
            6 => Self::Sky,
            _ => Self::DirtRock,
        }
    }

    const fn has_index(self) -> bool {
        matches!(self, Self::Tile | Self::Wall | Self::DirtRock)
    }
}

/// Struct for granular map deserialization.
pub struct MapReader<'r, 'd> {
    buff: &'r mut DataRead<'d>,
}

impl<'r, 'd> MapReader<'r, 'd> {
    pub fn new(buff: &'r mut DataRead<'d>) -> Self {
        Self { buff }
    }

    /// read the header, returning an empty map of the right size
    pub fn header(&mut self) -> Result<WorldMap, ReadError> {
        let release = self.buff.read_i32()?;
        if release & DEVELOPMENT_BIT != 0 {
            return Err(ReadError::UnsupportedGeneration(release));
        }
        let (mut revision, mut chinese) = (-1, false);
        if release > METADATA_RELEASE {
            let magic = self.buff.readN::<7>()?;
            chinese = match &magic {
                b"relogic" => false,
                b"xindong" => true,
                _ => return Err(ReadError::Magic(magic)),
            };
            let ty = self.buff.read_u8()?;
            if ty != FileType::Map as u8 {
                return Err(ReadError::FileType(ty));
            }
            revision = i64::from(self.buff.read_u32()?);
            // unused bitfield
            self.buff.skip(8)?;
        }
        let name = self.buff.read_string(None)?.to_string();
        let id = self.buff.read_i32()?;
        let height = self.buff.read_i32()?;
        let width = self.buff.read_i32()?;
        if width < 0
            || height < 0
            || (width as usize)
                .checked_mul(height as usize)
                .is_none_or(|n| n > MAX_CELLS)
        {
            return Err(ReadError::Dimensions { width, height });
        }
        log::debug!(
            "map {name:?} ({id}): release {release} revision {revision}, {width}x{height}{}",
            if chinese { " (chinese)" } else { "" }
        );
        let mut m = WorldMap::new(width as usize, height as usize);
        m.name = name;
        m.id = id;
        m.release = release;
        m.revision = revision;
        m.chinese = chinese;
        Ok(m)
    }

    /// read the column major cells of old maps
    pub fn legacy(&mut self, m: &mut WorldMap) -> Result<(), ReadError> {
        let height = m.height as i32;
        m.world_surface = estimate_world_surface(height);
        m.world_surface_estimated = true;
        let wide_id = m.release > 77;
        let wide_flags = m.release >= 50;
        for x in 0..m.width {
            let mut y = 0;
            while y < m.height {
                if !self.buff.read_bool()? {
                    y += self.buff.read_u16()? as usize + 1;
                    continue;
                }
                let id = if wide_id {
                    self.buff.read_u16()?
                } else {
                    u16::from(self.buff.read_u8()?)
                };
                let light = self.buff.read_u8()?;
                let flags = if wide_flags {
                    self.buff.read_u16()?
                } else {
                    u16::from(self.buff.read_u8()?)
                };
                let option = ((flags & 0x1E0) >> 5) as u8;
                let paint = ((flags & 0x1E00) >> 9) as u8;
                let mut cell = if flags & 1 != 0 {
                    Cell::Tile {
                        light,
                        id,
                        option,
                        paint,
                    }
                } else if flags & 2 != 0 {
                    Cell::Liquid {
                        light,
                        id: Liquid::Water,
                    }
                } else if flags & 4 != 0 {
                    Cell::Liquid {
                        light,
                        id: Liquid::Lava,
                    }
                } else if flags & 0x4000 != 0 {
                    Cell::Liquid {
                        light,
                        id: Liquid::Honey,
                    }
                } else if flags & 0x10 != 0 {
                    // walls fold their option into the id
                    Cell::Wall {
                        light,
                        id: id.wrapping_add(u16::from(option)),
                        option: 0,
                        paint,
                    }
                } else {
                    Cell::Air {
                        light,
                        shade: id,
                        depth: m.air_depth(y),
                    }
                };
                m.set_cell(x, y, cell);
                let repeat = self.buff.read_u16()?;
                log::trace!("({x}, {y}): {cell} x{}", u32::from(repeat) + 1);
                for _ in 0..repeat {
                    y += 1;
                    if light != 255 {
                        let l = self.buff.read_u8()?;
                        // too dark to have been seen
                        if l <= 18 {
                            continue;
                        }
                        cell = cell.with_light(l);
                    }
                    if let Cell::Air { depth, .. } = &mut cell {
                        *depth = m.air_depth(y);
                    }
                    m.set_cell(x, y, cell);
                }
                y += 1;
            }
        }
        Ok(())
    }

    /// read the type tables and the row major cells of newer maps.
    /// inflates the cell stream when the release calls for it.
    pub fn modern(&mut self, m: &mut WorldMap) -> Result<(), ReadError> {
        m.world_surface = -1;
        let counts = Counts {
            tile: self.buff.read_u16()?,
            wall: self.buff.read_u16()?,
            liquid: self.buff.read_u16()?,
            sky: self.buff.read_u16()?,
            dirt: self.buff.read_u16()?,
            rock: self.buff.read_u16()?,
        };
        log::debug!("{counts:?}");
        let tile_options = self.buff.read_bit_array(Some(counts.tile as usize))?;
        let wall_options = self.buff.read_bit_array(Some(counts.wall as usize))?;
        let mut options = |has: &[bool]| -> Result<Vec<u8>, ReadError> {
            has.iter()
                .map(|&h| -> Result<u8, ReadError> { Ok(if h { self.buff.read_u8()? } else { 1 }) })
                .collect()
        };
        let tiles = Lookup::new("tile", &options(&tile_options[..])?);
        let walls = Lookup::new("wall", &options(&wall_options[..])?);
        log::debug!(
            "{} tile types, {} wall types",
            tiles.id.len(),
            walls.id.len()
        );

        if m.release >= COMPRESSED_RELEASE {
            let raw = self.buff.deflate()?;
            log::debug!("inflated {} bytes of cells", raw.len());
            modern_cells(&mut DataRead::new(&raw), m, &tiles, &walls)?;
        } else {
            modern_cells(self.buff, m, &tiles, &walls)?;
        }

        if m.world_surface == -1 {
            m.world_surface = estimate_world_surface(m.height as i32);
            m.world_surface_estimated = true;
        } else {
            m.world_surface_estimated = false;
        }
        Ok(())
    }

    /// read a whole map
    pub fn read(&mut self) -> Result<WorldMap, ReadError> {
        let mut m = self.header()?;
        if m.release <= LEGACY_RELEASE {
            log::debug!("legacy format");
            self.legacy(&mut m)?;
        } else {
            log::debug!("modern format");
            self.modern(&mut m)?;
        }
        if !(0 <= m.world_surface
            && m.world_surface <= m.rock_layer
            && m.rock_layer <= m.underworld_layer())
        {
            log::warn!(
                "unusual layers: surface {}, rock {}, underworld {}",
                m.world_surface,
                m.rock_layer,
                m.underworld_layer()
            );
        }
        Ok(m)
    }
}

fn modern_cells(
    buff: &mut DataRead<'_>,
    m: &mut WorldMap,
    tiles: &Lookup,
    walls: &Lookup,
) -> Result<(), ReadError> {
    for y in 0..m.height {
        let mut x = 0;
        while x < m.width {
            let flags = buff.read_u8()?;
            let paint = if flags & 1 != 0 { buff.read_u8()? } else { 0 };
            let group = Packed::of(flags);
            let index = match (group.has_index(), flags & 0x10 != 0) {
                (false, _) => 0,
                (true, true) => buff.read_u16()?,
                (true, false) => u16::from(buff.read_u8()?),
            };
            let light = if flags & 0x20 != 0 {
                buff.read_u8()?
            } else {
                255
            };
            let repeat = match flags >> 6 {
                1 => buff.read_u8()? as usize,
                2 => buff.read_u16()? as usize,
                _ => 0,
            };
            let liquid = |id| Cell::Liquid {
                light,
                id: if paint & 0x40 != 0 { Liquid::Shimmer } else { id },
            };
            let mut cell = match group {
                Packed::Empty => {
                    x += repeat + 1;
                    continue;
                }
                Packed::Tile => {
                    let (id, option) = tiles.get(index)?;
                    Cell::Tile {
                        light,
                        id,
                        option,
                        paint: (paint >> 1) & 31,
                    }
                }
                Packed::Wall => {
                    let (id, option) = walls.get(index)?;
                    Cell::Wall {
                        light,
                        id,
                        option,
                        paint: (paint >> 1) & 31,
                    }
                }
                Packed::Water => liquid(Liquid::Water),
                Packed::Lava => liquid(Liquid::Lava),
                Packed::Honey => liquid(Liquid::Honey),
                Packed::Sky => Cell::Air {
                    light,
                    shade: index,
                    depth: AirDepth::Sky,
                },
                Packed::DirtRock => {
                    if m.world_surface == -1 {
                        log::debug!("surface found at {y}");
                        m.world_surface = y as i32;
                    }
                    Cell::Air {
                        light,
                        shade: index,
                        depth: if (y as i64) < i64::from(m.rock_layer) {
                            AirDepth::Underground
                        } else {
                            AirDepth::Cavern
                        },
                    }
                }
            };
            m.set_cell(x, y, cell);
            log::trace!("({x}, {y}): {cell} x{}", repeat + 1);
            for _ in 0..repeat {
                x += 1;
                if light != 255 {
                    cell = cell.with_light(buff.read_u8()?);
                }
                m.set_cell(x, y, cell);
            }
            x += 1;
        }
    }
    Ok(())
}

/// serde map
impl Serializable for WorldMap {
    type ReadError = ReadError;
    /// deserialize a map
    fn deserialize(buff: &mut DataRead<'_>) -> Result<WorldMap, Self::ReadError> {
        MapReader::new(buff).read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataWrite;
    use std::io::Write as _;

    fn header(w: &mut DataWrite, release: i32, width: i32, height: i32) {
        w.write_i32(release);
        if release > METADATA_RELEASE {
            w.write_bytes(b"relogic");
            w.write_u8(FileType::Map as u8);
            w.write_u32(3);
            w.write_bytes(&[0; 8]);
        }
        w.write_string("test world", true);
        w.write_i32(1234);
        w.write_i32(height);
        w.write_i32(width);
    }

    /// counts and option tables, one entry per id
    fn tables(w: &mut DataWrite, tiles: &[u8], walls: &[u8]) {
        w.write_u16(tiles.len() as u16);
        w.write_u16(walls.len() as u16);
        for n in [4, 2, 3, 5] {
            w.write_u16(n);
        }
        let has = |o: &[u8]| o.iter().map(|&n| n != 1).collect::<Vec<_>>();
        w.write_bit_array(&has(tiles), false);
        w.write_bit_array(&has(walls), false);
        for &n in tiles.iter().chain(walls).filter(|&&n| n != 1) {
            w.write_u8(n);
        }
    }

    const TILE: u8 = 1 << 1;
    const LAVA: u8 = 4 << 1;
    const SKY: u8 = 6 << 1;
    const DIRT_ROCK: u8 = 7 << 1;
    const PAINT: u8 = 1;
    const LIGHT: u8 = 0x20;
    const RUN8: u8 = 0x40;
    const RUN16: u8 = 0x80;

    fn deflated(raw: &[u8]) -> Vec<u8> {
        let mut e = flate2::write::DeflateEncoder::new(vec![], flate2::Compression::default());
        e.write_all(raw).unwrap();
        e.finish().unwrap()
    }

    #[test]
    fn square() {
        let mut w = DataWrite::new();
        header(&mut w, 92, 2, 2);
        tables(&mut w, &[1], &[]);
        for _ in 0..2 {
            w.write_bytes(&[TILE | RUN8, 0, 1]);
        }
        let m = WorldMap::read(w.get_data()).unwrap();
        assert_eq!(m.name, "test world");
        assert_eq!(m.id, 1234);
        assert_eq!(m.revision, -1);
        assert_eq!(m.cell(0, 0), m.cell(1, 1));
        assert!(m.cells().iter().all(|c| *c == Cell::tile(0)));
        assert!(m.world_surface_estimated);
    }

    #[test]
    fn legacy_wall() {
        let mut w = DataWrite::new();
        header(&mut w, 50, 1, 1);
        w.write_bool(true);
        w.write_u8(5);
        w.write_u8(255);
        w.write_u16(0x10 | (2 << 5) | (3 << 9));
        w.write_u16(0);
        let m = WorldMap::read(w.get_data()).unwrap();
        assert_eq!(
            *m.cell(0, 0),
            Cell::Wall {
                light: 255,
                id: 7,
                option: 0,
                paint: 3
            }
        );
    }

    fn legacy(records: impl FnOnce(&mut DataWrite)) -> WorldMap {
        let mut w = DataWrite::new();
        header(&mut w, 80, 1, 4);
        records(&mut w);
        WorldMap::read(w.get_data()).unwrap()
    }

    fn record(w: &mut DataWrite, light: u8, repeat: u16) {
        w.write_bool(true);
        w.write_u16(9);
        w.write_u8(light);
        w.write_u16(1);
        w.write_u16(repeat);
    }

    #[test]
    fn legacy_runs() {
        let fast = legacy(|w| {
            w.write_bool(false);
            w.write_u16(0);
            record(w, 255, 2);
        });
        let slow = legacy(|w| {
            w.write_bool(false);
            w.write_u16(0);
            for _ in 0..3 {
                record(w, 255, 0);
            }
        });
        assert_eq!(fast, slow);
        assert_eq!(*fast.cell(0, 0), Cell::Empty);
        assert_eq!(*fast.cell(0, 3), Cell::tile(9));

        let dim = legacy(|w| {
            record(w, 100, 3);
            w.write_bytes(&[10, 200, 18]);
        });
        assert_eq!(dim.cell(0, 0).light(), Some(100));
        assert_eq!(*dim.cell(0, 1), Cell::Empty);
        assert_eq!(*dim.cell(0, 2), Cell::tile(9).with_light(200));
        assert_eq!(*dim.cell(0, 3), Cell::Empty);
    }

    #[test]
    fn narrow_flags() {
        let mut w = DataWrite::new();
        header(&mut w, 40, 2, 1);
        for (id, flags) in [(9, 1), (4, 0x10 | (1 << 5))] {
            w.write_bool(true);
            w.write_u8(id);
            w.write_u8(255);
            w.write_u8(flags);
            w.write_u16(0);
        }
        let mut r = DataRead::new(w.get_data());
        let m = MapReader::new(&mut r).read().unwrap();
        assert_eq!(r.remaining(), 0);
        assert_eq!(*m.cell(0, 0), Cell::tile(9));
        assert_eq!(
            *m.cell(1, 0),
            Cell::Wall {
                light: 255,
                id: 5,
                option: 0,
                paint: 0
            }
        );
    }

    #[test]
    fn legacy_honey() {
        let m = legacy(|w| {
            w.write_bool(true);
            w.write_u16(0);
            w.write_u8(255);
            w.write_u16(0x4000);
            w.write_u16(3);
        });
        assert!(m.cells().iter().all(|c| *c
            == Cell::Liquid {
                light: 255,
                id: Liquid::Honey
            }));
    }

    #[test]
    fn longest_legacy_run() {
        // the run length shows up in trace output
        log::set_max_level(log::LevelFilter::Trace);
        let mut w = DataWrite::new();
        header(&mut w, 80, 1, 1 << 16);
        record(&mut w, 255, u16::MAX);
        let m = WorldMap::read(w.get_data()).unwrap();
        assert!(m.cells().iter().all(|c| *c == Cell::tile(9)));
    }

    #[test]
    fn wide_repeats() {
        let mut w = DataWrite::new();
        header(&mut w, 92, 300, 1);
        tables(&mut w, &[1], &[]);
        w.write_bytes(&[TILE | RUN16, 0]);
        w.write_u16(299);
        let mut r = DataRead::new(w.get_data());
        let m = MapReader::new(&mut r).read().unwrap();
        assert_eq!(r.remaining(), 0);
        assert_eq!(m.width(), 300);
        assert!(m.cells().iter().all(|c| *c == Cell::tile(0)));
    }

    #[test]
    fn empty_skip() {
        let mut w = DataWrite::new();
        header(&mut w, 92, 3, 1);
        tables(&mut w, &[1], &[]);
        w.write_bytes(&[RUN8, 1]);
        w.write_bytes(&[TILE | PAINT, 6, 0]);
        let mut r = DataRead::new(w.get_data());
        let m = MapReader::new(&mut r).read().unwrap();
        assert_eq!(r.remaining(), 0);
        assert_eq!(m.cells()[..2], [Cell::Empty, Cell::Empty]);
        assert_eq!(
            *m.cell(2, 0),
            Cell::Tile {
                light: 255,
                id: 0,
                option: 0,
                paint: 3
            }
        );
    }

    #[test]
    fn surface() {
        let mut w = DataWrite::new();
        header(&mut w, 92, 2, 3);
        tables(&mut w, &[], &[]);
        w.write_bytes(&[SKY | RUN8, 1]);
        w.write_bytes(&[DIRT_ROCK | LIGHT | RUN8, 4, 90, 1, 91]);
        w.write_bytes(&[DIRT_ROCK | 0x10, 2, 0, DIRT_ROCK, 2]);
        let m = WorldMap::read(w.get_data()).unwrap();
        assert_eq!(m.world_surface, 1);
        assert!(!m.world_surface_estimated);
        assert!(m.rock_layer_estimated);
        assert_eq!(
            *m.cell(0, 0),
            Cell::Air {
                light: 255,
                shade: 0,
                depth: AirDepth::Sky
            }
        );
        assert_eq!(
            *m.cell(1, 1),
            Cell::Air {
                light: 91,
                shade: 4,
                depth: AirDepth::Underground
            }
        );
        assert_eq!(m.layer(0), Layer::Sky);
        assert_eq!(m.layer(2), Layer::Underground);
    }

    #[test]
    fn compressed() {
        let mut w = DataWrite::new();
        header(&mut w, 279, 2, 1);
        tables(&mut w, &[1, 3], &[2]);
        w.write_bytes(&deflated(&[TILE | LIGHT, 2, 77, LAVA | PAINT, 0x40]));
        let m = WorldMap::read(w.get_data()).unwrap();
        assert_eq!(m.revision, 3);
        assert!(!m.chinese);
        assert_eq!(
            *m.cell(0, 0),
            Cell::Tile {
                light: 77,
                id: 1,
                option: 1,
                paint: 0
            }
        );
        assert_eq!(
            *m.cell(1, 0),
            Cell::Liquid {
                light: 255,
                id: Liquid::Shimmer
            }
        );
    }

    #[test]
    fn large_compressed() {
        let mut w = DataWrite::new();
        header(&mut w, 279, 100, 100);
        tables(&mut w, &[1, 1], &[]);
        let raw = [TILE, 1].repeat(100 * 100);
        let cells = deflated(&raw);
        assert!(cells.len() * 4 < raw.len());
        w.write_bytes(&cells);
        let m = WorldMap::read(w.get_data()).unwrap();
        assert!(m.cells().iter().all(|c| *c == Cell::tile(1)));
    }

    #[test]
    fn chinese() {
        let mut w = DataWrite::new();
        header(&mut w, 279, 1, 1);
        tables(&mut w, &[1], &[]);
        w.write_bytes(&deflated(&[TILE, 0]));
        let mut data = w.into_inner();
        data[4..11].copy_from_slice(b"xindong");
        let m = WorldMap::read(&data).unwrap();
        assert!(m.chinese);
        assert_eq!(m.revision, 3);
        assert_eq!(*m.cell(0, 0), Cell::tile(0));
    }

    #[test]
    fn bad_headers() {
        let err = |b: &[u8]| WorldMap::read(b).unwrap_err();
        assert!(matches!(
            err(&(279 | 0x8000i32).to_le_bytes()),
            ReadError::UnsupportedGeneration(_)
        ));

        let mut w = DataWrite::new();
        w.write_i32(279);
        w.write_bytes(b"notterr");
        assert!(matches!(err(w.get_data()), ReadError::Magic(m) if &m == b"notterr"));

        let mut w = DataWrite::new();
        w.write_i32(279);
        w.write_bytes(b"xindong");
        w.write_u8(FileType::World as u8);
        assert!(matches!(err(w.get_data()), ReadError::FileType(2)));

        let mut w = DataWrite::new();
        header(&mut w, 92, -3, 1);
        assert!(matches!(
            err(w.get_data()),
            ReadError::Dimensions {
                width: -3,
                height: 1
            }
        ));

        // refused before anything is allocated
        for (width, height) in [(i32::MAX, i32::MAX), (1 << 14, 1 << 13)] {
            let mut w = DataWrite::new();
            header(&mut w, 50, width, height);
            assert!(matches!(
                err(w.get_data()),
                ReadError::Dimensions { width: x, height: y } if x == width && y == height
            ));
        }

        let mut w = DataWrite::new();
        header(&mut w, 92, 4, 4);
        assert!(matches!(
            err(w.get_data()),
            ReadError::Read(crate::data::ReadError::Underflow { .. })
        ));

        let mut w = DataWrite::new();
        header(&mut w, 92, 1, 1);
        tables(&mut w, &[2], &[]);
        w.write_bytes(&[TILE, 2]);
        assert!(matches!(
            err(w.get_data()),
            ReadError::UnknownType {
                group: "tile",
                index: 2,
                count: 2
            }
        ));
    }

    #[test]
    fn colors() {
        let c = Catalog::default().with_tile(
            3,
            crate::catalog::TileInfo {
                colors: vec![[1, 2, 3]],
                ..Default::default()
            },
        );
        let mut m = WorldMap::new(2, 1);
        m.set_cell(
            0,
            0,
            Cell::Tile {
                light: 255,
                id: 3,
                option: 0,
                paint: 0,
            },
        );
        m.set_cell(
            1,
            0,
            Cell::Liquid {
                light: 9,
                id: Liquid::Water,
            },
        );
        assert_eq!(m.color(&c, 0, 0), [1, 2, 3]);
        assert_eq!(m.color_painted(&c, 0, 0), [1, 2, 3]);
        assert_eq!(m.color(&c, 1, 0), BLACK);
        assert_eq!(
            m.describe(&c, 0, 0),
            "(0, 0): Light 255/255 - Tile - Unknown (3) - Option 1/1 - Paint Unknown (0)"
        );
        assert_eq!(
            m.describe(&c, 1, 0),
            "(1, 0): Light 9/255 - Liquid - Unknown (0)"
        );
        assert!(m.is_release_safe(&c.clone().with_release(5)));
        assert_eq!(m.version(&c), "< 1.0");
    }
}
