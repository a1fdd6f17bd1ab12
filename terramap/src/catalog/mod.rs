//! the tile catalog: per-release data about tiles, walls, liquids and paints.
//!
//! nothing in here is hardcoded; a [`Catalog`] is built once, usually from the
//! json data table ([`Catalog::from_json`]), and handed by reference to whatever needs it.
//! ```
//! # use terramap::catalog::{Catalog, TileInfo};
//! let c = Catalog::default().with_tile(5, TileInfo { width: Some(3), ..TileInfo::named("bench") });
//! assert!(c.tile(5).frame_important);
//! assert!(!c.tile(4).frame_important);
//! assert_eq!(c.frame_important().len(), 6);
//! ```
use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

use crate::cell::{Cell, Group, Liquid};

mod tile_type;
pub use tile_type::{TileType, TreeFrames, Uv};

/// rgb
pub type Color = [u8; 3];
pub const BLACK: Color = [0, 0, 0];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog")]
    Json(#[from] serde_json::Error),
    #[error("failed to read catalog")]
    Io(#[from] std::io::Error),
    #[error("unknown {kind} name: {name:?}")]
    UnknownReference { kind: &'static str, name: String },
    #[error("unknown tile option handling type: {0:?}")]
    UnknownTileType(String),
    #[error("missing {0} id")]
    MissingId(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileInfo {
    pub name: String,
    /// one per option
    pub colors: Vec<Color>,
    /// footprint, if wider than one tile
    pub width: Option<u8>,
    pub height: Option<u8>,
    /// needs explicit frame coordinates once exported
    pub frame_important: bool,
    /// pair it with the last wall seen when it floats
    pub needs_wall: bool,
    pub solid: bool,
    /// every cell gets its own record when exported
    pub no_run: bool,
    pub kind: TileType,
}

impl TileInfo {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn normalize(mut self) -> Self {
        self.frame_important |=
            self.width.is_some() || self.height.is_some() || self.kind != TileType::None;
        self
    }
}

impl Default for TileInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            colors: vec![BLACK],
            width: None,
            height: None,
            frame_important: false,
            needs_wall: false,
            solid: false,
            no_run: false,
            kind: TileType::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WallInfo {
    pub name: String,
    pub colors: Vec<Color>,
}

impl Default for WallInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            colors: vec![BLACK],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LiquidInfo {
    pub name: String,
    pub color: Color,
}

impl Default for LiquidInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            color: BLACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaintInfo {
    pub name: String,
    pub color: Color,
    #[serde(default)]
    pub negative: bool,
    #[serde(default)]
    pub shadow: bool,
}

impl Default for PaintInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            color: BLACK,
            negative: false,
            shadow: false,
        }
    }
}

/// a background gradient (sky, dirt, rock)
#[derive(Clone, Debug, PartialEq)]
struct Gradient {
    colors: Vec<Color>,
}

impl Gradient {
    /// `count` colors interpolated from `min` to `max`; the last one reaches `max` when `inclusive`
    fn new(g: &GradientJson, inclusive: bool) -> Self {
        let count = g.count.max(1) as usize;
        let divide = if inclusive {
            count.saturating_sub(1).max(1)
        } else {
            count
        };
        let colors = (0..count)
            .map(|i| {
                let fac = i as f32 / divide as f32;
                std::array::from_fn(|c| {
                    (g.min[c] as f32 * (1.0 - fac) + g.max[c] as f32 * fac).round() as u8
                })
            })
            .collect();
        Self { colors }
    }

    fn index(&self, shade: u16) -> usize {
        (shade as usize).min(self.colors.len() - 1)
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            colors: vec![BLACK],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Version {
    release: i32,
    version: String,
}

/// all the data the codecs and renderers need about ids. see the [module level docs](self).
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    release: i32,
    versions: Vec<Version>,
    tiles: Vec<TileInfo>,
    walls: Vec<WallInfo>,
    liquids: Vec<LiquidInfo>,
    paints: Vec<PaintInfo>,
    sky: Gradient,
    dirt: Gradient,
    rock: Gradient,
    hell: Color,
    tree: TreeFrames,
    frame_important: Vec<bool>,
    any_wall: Cell,
    unexplored_tile: Cell,
    unknown_tile: TileInfo,
    unknown_wall: WallInfo,
    unknown_liquid: LiquidInfo,
    unknown_paint: PaintInfo,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            release: -1,
            versions: vec![],
            tiles: vec![],
            walls: vec![],
            liquids: vec![],
            paints: vec![],
            sky: Gradient::default(),
            dirt: Gradient::default(),
            rock: Gradient::default(),
            hell: BLACK,
            tree: TreeFrames::default(),
            frame_important: vec![],
            any_wall: Cell::Wall {
                light: 0,
                id: 0,
                option: 0,
                paint: 0,
            },
            unexplored_tile: Cell::Tile {
                light: 0,
                id: 0,
                option: 0,
                paint: 0,
            },
            unknown_tile: TileInfo::default(),
            unknown_wall: WallInfo::default(),
            unknown_liquid: LiquidInfo::default(),
            unknown_paint: PaintInfo::default(),
        }
    }
}

impl Catalog {
    /// load the catalog data table
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::try_from(serde_json::from_str::<CatalogJson>(json)?)
    }

    pub fn from_reader(r: impl Read) -> Result<Self, CatalogError> {
        Self::try_from(serde_json::from_reader::<_, CatalogJson>(r)?)
    }

    /// the newest release this data describes
    #[must_use]
    pub const fn latest_release(&self) -> i32 {
        self.release
    }

    /// human readable version of a release number.
    /// ```
    /// # use terramap::catalog::Catalog;
    /// let c = Catalog::default().with_version(279, "1.4.4.9").with_version(194, "1.3.5.3");
    /// assert_eq!(c.version_string(279), "1.4.4.9");
    /// assert_eq!(c.version_string(230), "> 1.3.5.3");
    /// assert_eq!(c.version_string(12), "< 1.0");
    /// ```
    #[must_use]
    pub fn version_string(&self, release: i32) -> String {
        for v in self.versions.iter().rev() {
            if release == v.release {
                return v.version.clone();
            } else if release > v.release {
                return format!("> {}", v.version);
            }
        }
        "< 1.0".to_string()
    }

    #[must_use]
    pub fn tile(&self, id: u16) -> &TileInfo {
        self.tiles.get(id as usize).unwrap_or(&self.unknown_tile)
    }

    #[must_use]
    pub fn wall(&self, id: u16) -> &WallInfo {
        self.walls.get(id as usize).unwrap_or(&self.unknown_wall)
    }

    #[must_use]
    pub fn liquid(&self, id: Liquid) -> &LiquidInfo {
        self.liquids.get(id as usize).unwrap_or(&self.unknown_liquid)
    }

    #[must_use]
    pub fn paint(&self, id: u8) -> &PaintInfo {
        self.paints.get(id as usize).unwrap_or(&self.unknown_paint)
    }

    /// one flag per known tile id
    #[must_use]
    pub fn frame_important(&self) -> &[bool] {
        &self.frame_important
    }

    #[must_use]
    pub const fn tree(&self) -> &TreeFrames {
        &self.tree
    }

    /// the wall placed behind tiles that need one, when no wall was seen yet
    #[must_use]
    pub const fn any_wall(&self) -> Cell {
        self.any_wall
    }

    /// what unexplored cells become once exported
    #[must_use]
    pub const fn unexplored_tile(&self) -> Cell {
        self.unexplored_tile
    }

    #[must_use]
    pub fn tile_color(&self, id: u16, option: u8) -> Color {
        self.tile(id).colors.get(option as usize).copied().unwrap_or(BLACK)
    }

    #[must_use]
    pub fn wall_color(&self, id: u16, option: u8) -> Color {
        self.wall(id).colors.get(option as usize).copied().unwrap_or(BLACK)
    }

    #[must_use]
    pub fn liquid_color(&self, id: Liquid) -> Color {
        self.liquid(id).color
    }

    /// which step of the sky gradient row `y` falls on
    #[must_use]
    pub fn sky_index(&self, y: usize, world_surface: i32) -> usize {
        if world_surface <= 0 {
            return 0;
        }
        self.sky.colors.len() * y / world_surface as usize
    }

    #[must_use]
    pub fn sky_color(&self, y: usize, world_surface: i32) -> Color {
        self.sky
            .colors
            .get(self.sky_index(y, world_surface))
            .copied()
            .unwrap_or(self.hell)
    }

    /// which step of the dirt gradient a shade falls on
    #[must_use]
    pub fn dirt_index(&self, shade: u16) -> usize {
        self.dirt.index(shade)
    }

    #[must_use]
    pub fn rock_index(&self, shade: u16) -> usize {
        self.rock.index(shade)
    }

    #[must_use]
    pub fn dirt_color(&self, shade: u16) -> Color {
        self.dirt.colors[self.dirt.index(shade)]
    }

    #[must_use]
    pub fn rock_color(&self, shade: u16) -> Color {
        self.rock.colors[self.rock.index(shade)]
    }

    #[must_use]
    pub const fn hell_color(&self) -> Color {
        self.hell
    }

    /// recolor `color` with a paint. walls are darker when painted negative.
    #[must_use]
    pub fn apply_paint(&self, group: Group, color: Color, paint: u8) -> Color {
        let Some(p) = self.paints.get(paint as usize) else {
            return color;
        };
        if p.negative {
            let scale = if group == Group::Wall { 0.5 } else { 1.0 };
            return color.map(|c| ((255 - c) as f32 * scale) as u8);
        }
        let [r, g, b] = color.map(|c| c as f32 / 255.0);
        let factor = if p.shadow {
            r.min(g).min(b) * 0.3
        } else {
            r.max(g).max(b)
        };
        p.color.map(|c| (c as f32 * factor) as u8)
    }

    #[must_use]
    pub fn with_release(mut self, release: i32) -> Self {
        self.release = release;
        self
    }

    #[must_use]
    pub fn with_version(mut self, release: i32, version: impl Into<String>) -> Self {
        self.versions.push(Version {
            release,
            version: version.into(),
        });
        self.versions.sort_by_key(|v| v.release);
        self
    }

    /// set a tiles data, filling ids below it with unknowns
    #[must_use]
    pub fn with_tile(mut self, id: u16, info: TileInfo) -> Self {
        let id = id as usize;
        if self.tiles.len() <= id {
            self.tiles.resize_with(id + 1, TileInfo::default);
        }
        self.tiles[id] = info.normalize();
        self.frame_important = self.tiles.iter().map(|t| t.frame_important).collect();
        self
    }

    #[must_use]
    pub fn with_wall(mut self, id: u16, info: WallInfo) -> Self {
        let id = id as usize;
        if self.walls.len() <= id {
            self.walls.resize_with(id + 1, WallInfo::default);
        }
        self.walls[id] = info;
        self
    }

    #[must_use]
    pub fn with_paint(mut self, id: u8, info: PaintInfo) -> Self {
        let id = id as usize;
        if self.paints.len() <= id {
            self.paints.resize_with(id + 1, PaintInfo::default);
        }
        self.paints[id] = info;
        self
    }

    #[must_use]
    pub const fn with_tree(mut self, tree: TreeFrames) -> Self {
        self.tree = tree;
        self
    }

    #[must_use]
    pub const fn with_any_wall(mut self, wall: Cell) -> Self {
        self.any_wall = wall;
        self
    }

    #[must_use]
    pub const fn with_unexplored_tile(mut self, tile: Cell) -> Self {
        self.unexplored_tile = tile;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogJson {
    #[serde(default = "unknown_release")]
    release: i32,
    #[serde(default)]
    versions: Vec<VersionJson>,
    #[serde(default)]
    tiles: Vec<TileJson>,
    #[serde(default)]
    walls: Vec<WallInfo>,
    #[serde(default)]
    liquids: Vec<LiquidInfo>,
    sky: Option<GradientJson>,
    dirt: Option<GradientJson>,
    rock: Option<GradientJson>,
    hell: Option<Color>,
    #[serde(default)]
    paints: Vec<PaintInfo>,
    tree: Option<TreeFrames>,
    any_wall: Option<CellJson>,
    unexplored_tile: Option<CellJson>,
}

const fn unknown_release() -> i32 {
    -1
}

#[derive(Deserialize)]
struct VersionJson {
    release: i32,
    version: String,
}

/// tiles TEdit never repeats, unless the catalog says otherwise
const UNMERGED_TILES: [usize; 2] = [423, 520];

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeJson {
    Id(u8),
    Name(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileJson {
    name: String,
    #[serde(default)]
    colors: Vec<Color>,
    width: Option<u8>,
    height: Option<u8>,
    #[serde(default)]
    frame_important: bool,
    #[serde(default)]
    needs_wall: bool,
    #[serde(default)]
    solid: bool,
    no_run: Option<bool>,
    #[serde(rename = "type")]
    kind: Option<TypeJson>,
}

impl TryFrom<TileJson> for TileInfo {
    type Error = CatalogError;
    fn try_from(t: TileJson) -> Result<Self, CatalogError> {
        let kind = match t.kind {
            None => TileType::None,
            Some(TypeJson::Id(n)) => {
                TileType::try_from(n).map_err(|n| CatalogError::UnknownTileType(n.to_string()))?
            }
            Some(TypeJson::Name(n)) => {
                TileType::by_name(&n).ok_or(CatalogError::UnknownTileType(n))?
            }
        };
        Ok(Self {
            name: t.name,
            colors: t.colors,
            width: t.width,
            height: t.height,
            frame_important: t.frame_important,
            needs_wall: t.needs_wall,
            solid: t.solid,
            no_run: t.no_run.unwrap_or(false),
            kind,
        }
        .normalize())
    }
}

#[derive(Deserialize)]
struct GradientJson {
    count: u16,
    min: Color,
    max: Color,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellJson {
    name: Option<String>,
    id: Option<u16>,
    paint: Option<String>,
    paint_id: Option<u8>,
}

impl TryFrom<CatalogJson> for Catalog {
    type Error = CatalogError;
    fn try_from(j: CatalogJson) -> Result<Self, CatalogError> {
        let tiles = j
            .tiles
            .into_iter()
            .enumerate()
            .map(|(id, mut t)| {
                t.no_run.get_or_insert(UNMERGED_TILES.contains(&id));
                TileInfo::try_from(t)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut versions = j
            .versions
            .into_iter()
            .map(|v| Version {
                release: v.release,
                version: v.version,
            })
            .collect::<Vec<_>>();
        versions.sort_by_key(|v| v.release);
        let mut c = Self {
            release: j.release,
            versions,
            frame_important: tiles.iter().map(|t| t.frame_important).collect(),
            tiles,
            walls: j.walls,
            liquids: j.liquids,
            paints: j.paints,
            sky: j.sky.map(|g| Gradient::new(&g, false)).unwrap_or_default(),
            dirt: j.dirt.map(|g| Gradient::new(&g, true)).unwrap_or_default(),
            rock: j.rock.map(|g| Gradient::new(&g, true)).unwrap_or_default(),
            hell: j.hell.unwrap_or(BLACK),
            tree: j.tree.unwrap_or_default(),
            ..Self::default()
        };
        if let Some(w) = j.any_wall {
            c.any_wall = c.resolve(w, Group::Wall)?;
        }
        if let Some(t) = j.unexplored_tile {
            c.unexplored_tile = c.resolve(t, Group::Tile)?;
        }
        log::debug!(
            "loaded catalog for release {}: {} tiles, {} walls, {} paints",
            c.release,
            c.tiles.len(),
            c.walls.len(),
            c.paints.len()
        );
        Ok(c)
    }
}

impl Catalog {
    fn resolve(&self, j: CellJson, group: Group) -> Result<Cell, CatalogError> {
        let kind = if group == Group::Wall { "wall" } else { "tile" };
        let id = match (j.id, j.name) {
            (Some(id), _) => id,
            (None, Some(name)) => {
                let pos = if group == Group::Wall {
                    self.walls.iter().position(|w| w.name == name)
                } else {
                    self.tiles.iter().position(|t| t.name == name)
                };
                pos.ok_or(CatalogError::UnknownReference { kind, name })? as u16
            }
            (None, None) => return Err(CatalogError::MissingId(kind)),
        };
        let paint = match (j.paint_id, j.paint) {
            (Some(p), _) => p,
            (None, Some(name)) => self
                .paints
                .iter()
                .position(|p| p.name == name)
                .ok_or(CatalogError::UnknownReference {
                    kind: "paint",
                    name,
                })? as u8,
            (None, None) => 0,
        };
        Ok(if group == Group::Wall {
            Cell::Wall {
                light: 0,
                id,
                option: 0,
                paint,
            }
        } else {
            Cell::Tile {
                light: 0,
                id,
                option: 0,
                paint,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "release": 279,
        "versions": [{ "release": 279, "version": "1.4.4.9" }, { "release": 71, "version": "1.2.0.3" }],
        "tiles": [
            { "name": "Dirt", "colors": [[151, 107, 75]], "solid": true },
            { "name": "Stone", "colors": [[128, 128, 128]], "solid": true },
            { "name": "Torches", "colors": [[253, 221, 3], [1, 2, 3]], "needsWall": true, "type": "Torches" },
            { "name": "Trees", "colors": [[151, 107, 75]], "type": 6 },
            { "name": "Chest", "colors": [[174, 129, 92]], "width": 2, "height": 2 },
            { "name": "Sign", "colors": [[0, 0, 0]], "frameImportant": true }
        ],
        "walls": [{ "name": "Air", "colors": [] }, { "name": "Stone Wall", "colors": [[52, 52, 52]] }],
        "liquids": [{ "name": "Water", "color": [9, 61, 191] }],
        "paints": [
            { "name": "None", "color": [0, 0, 0] },
            { "name": "Red", "color": [255, 0, 0] },
            { "name": "Negative", "color": [0, 0, 0], "negative": true },
            { "name": "Shadow", "color": [25, 25, 25], "shadow": true }
        ],
        "sky": { "count": 4, "min": [0, 0, 0], "max": [200, 200, 200] },
        "dirt": { "count": 3, "min": [0, 0, 0], "max": [100, 100, 100] },
        "tree": { "base": [0, 0], "baseTop": [22, 198], "baseBranchLeft": [0, 1], "branchLeft": [0, 2],
                  "branchLeftLeafy": [0, 3], "baseBranchRight": [0, 4], "branchRight": [0, 5],
                  "branchRightLeafy": [0, 6], "baseBranchBoth": [0, 7], "baseTrunkLeft": [0, 8],
                  "trunkLeft": [0, 9], "baseTrunkRight": [0, 10], "trunkRight": [0, 11], "trunkBoth": [0, 12] },
        "anyWall": { "name": "Stone Wall" },
        "unexploredTile": { "name": "Dirt", "paint": "Shadow" }
    }"#;

    #[test]
    fn load() {
        let c = Catalog::from_json(JSON).unwrap();
        assert_eq!(c.latest_release(), 279);
        assert_eq!(c.version_string(279), "1.4.4.9");
        assert_eq!(c.version_string(100), "> 1.2.0.3");
        assert_eq!(
            c.frame_important(),
            [false, false, true, true, true, true]
        );
        assert_eq!(c.tile(2).kind, TileType::Torches);
        assert!(c.tile(2).needs_wall);
        assert_eq!(c.tile(3).kind, TileType::Trees);
        assert_eq!(c.tile(4).width, Some(2));
        assert_eq!(c.tile(900).name, "Unknown");
        assert_eq!(c.tile_color(2, 1), [1, 2, 3]);
        assert_eq!(c.tile_color(2, 5), BLACK);
        assert_eq!(c.tree().base_top, [22, 198]);
        assert_eq!(c.any_wall(), Cell::Wall { light: 0, id: 1, option: 0, paint: 0 });
        assert_eq!(c.unexplored_tile(), Cell::Tile { light: 0, id: 0, option: 0, paint: 3 });
        assert_eq!(c.liquid_color(Liquid::Water), [9, 61, 191]);
        assert_eq!(c.liquid(Liquid::Shimmer).name, "Unknown");
    }

    #[test]
    fn unmerged() {
        let tiles = (0..521)
            .map(|id| match id {
                0 => r#"{ "name": "Dirt", "noRun": true }"#,
                520 => r#"{ "name": "Food Platter", "noRun": false }"#,
                _ => r#"{ "name": "X" }"#,
            })
            .collect::<Vec<_>>()
            .join(",");
        let c = Catalog::from_json(&format!(r#"{{ "tiles": [{tiles}] }}"#)).unwrap();
        assert!(c.tile(0).no_run);
        assert!(!c.tile(1).no_run);
        assert!(c.tile(423).no_run);
        assert!(!c.tile(520).no_run);
        assert!(!c.tile(900).no_run);
    }

    #[test]
    fn gradients() {
        let c = Catalog::from_json(JSON).unwrap();
        assert_eq!(c.sky_index(0, 100), 0);
        assert_eq!(c.sky_index(99, 100), 3);
        assert_eq!(c.sky_color(50, 100), [100, 100, 100]);
        // below the surface is past the gradient
        assert_eq!(c.sky_color(150, 100), c.hell_color());
        assert_eq!(c.dirt_color(0), [0, 0, 0]);
        assert_eq!(c.dirt_color(2), [100, 100, 100]);
        assert_eq!(c.dirt_color(40), [100, 100, 100]);
        assert_eq!(c.rock_color(7), BLACK);
    }

    #[test]
    fn paints() {
        let c = Catalog::from_json(JSON).unwrap();
        let col = [100, 50, 255];
        assert_eq!(c.apply_paint(Group::Tile, col, 1), [255, 0, 0]);
        assert_eq!(c.apply_paint(Group::Tile, col, 2), [155, 205, 0]);
        assert_eq!(c.apply_paint(Group::Wall, col, 2), [77, 102, 0]);
        assert_eq!(c.apply_paint(Group::Tile, col, 40), col);
    }

    #[test]
    fn bad_references() {
        let e = Catalog::from_json(r#"{ "anyWall": { "name": "Nope" } }"#).unwrap_err();
        assert!(matches!(e, CatalogError::UnknownReference { kind: "wall", .. }));
        let e = Catalog::from_json(
            r#"{ "tiles": [{ "name": "Dirt" }], "unexploredTile": { "id": 0, "paint": "Nope" } }"#,
        )
        .unwrap_err();
        assert!(matches!(e, CatalogError::UnknownReference { kind: "paint", .. }));
        let e = Catalog::from_json(r#"{ "tiles": [{ "name": "X", "type": "Tree" }] }"#).unwrap_err();
        assert!(matches!(e, CatalogError::UnknownTileType(n) if n == "Tree"));
        let e = Catalog::from_json(r#"{ "anyWall": {} }"#).unwrap_err();
        assert!(matches!(e, CatalogError::MissingId("wall")));
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Json(_))));
    }
}
