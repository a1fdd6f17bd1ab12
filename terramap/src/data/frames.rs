//! frame (sprite sheet position) resolution for tiles whose look depends on their neighbours.
//!
//! the map only stores which tile is where. schematics need the exact sprite, so multi tile
//! objects, trees, stalactites and plant detritus are reconstructed from the shape around them.
use super::map::WorldMap;
use crate::catalog::{Catalog, TileInfo, TileType, Uv};
use crate::cell::Cell;

/// one tile on the sheet
const STEP: u16 = 18;

/// lazily resolved frames of a map. each position is computed at most once.
pub struct Frames<'a> {
    map: &'a WorldMap,
    catalog: &'a Catalog,
    /// shape only, without the option offset
    geometry: Vec<Option<Uv>>,
}

impl<'a> Frames<'a> {
    #[must_use]
    pub fn new(map: &'a WorldMap, catalog: &'a Catalog) -> Self {
        Self {
            map,
            catalog,
            geometry: vec![None; map.width() * map.height()],
        }
    }

    /// the frame of the tile at `x, y`, or `None` if it is not a frame important tile.
    pub fn get(&mut self, x: usize, y: usize) -> Option<Uv> {
        let Cell::Tile { id, option, .. } = *self.map.get(x as isize, y as isize)? else {
            return None;
        };
        let catalog = self.catalog;
        let info = catalog.tile(id);
        if !info.frame_important {
            return None;
        }
        let [u, v] = self.geometry(x as isize, y as isize, id, info);
        let [ou, ov] = info.kind.option_frame(option);
        Some([u.wrapping_add(ou), v.wrapping_add(ov)])
    }

    fn geometry(&mut self, x: isize, y: isize, id: u16, info: &TileInfo) -> Uv {
        let i = y as usize * self.map.width() + x as usize;
        if let Some(uv) = self.geometry[i] {
            return uv;
        }
        match info.kind {
            TileType::Trees => self.tree(x, y),
            TileType::Stalactite => self.stalactite(x, y, id),
            TileType::PlantDetritus => self.detritus(x, y, id),
            _ => {
                let u = info.width.map_or(0, |w| self.run(x, y, -1, 0, id) % u16::from(w.max(1)));
                let v = info.height.map_or(0, |h| self.run(x, y, 0, -1, id) % u16::from(h.max(1)));
                self.geometry[i] = Some([u * STEP, v * STEP]);
            }
        }
        *self.geometry[i].get_or_insert([0, 0])
    }

    fn put(&mut self, x: isize, y: isize, uv: Uv) {
        if self.map.get(x, y).is_some() {
            self.geometry[y as usize * self.map.width() + x as usize] = Some(uv);
        }
    }

    fn same_at(&self, x: isize, y: isize, id: u16) -> bool {
        self.map.get(x, y).and_then(Cell::tile_id) == Some(id)
    }

    fn info_at(&self, x: isize, y: isize) -> Option<&TileInfo> {
        let id = self.map.get(x, y).and_then(Cell::tile_id)?;
        Some(self.catalog.tile(id))
    }

    fn tree_at(&self, x: isize, y: isize) -> bool {
        self.info_at(x, y).is_some_and(|t| t.kind == TileType::Trees)
    }

    fn solid_at(&self, x: isize, y: isize) -> bool {
        self.info_at(x, y).is_some_and(|t| t.solid)
    }

    /// how many cells of `id` precede this one going in `dx, dy`
    fn run(&self, mut x: isize, mut y: isize, dx: isize, dy: isize, id: u16) -> u16 {
        let mut n = 0u16;
        while self.same_at(x + dx, y + dy, id) {
            x += dx;
            y += dy;
            n = n.wrapping_add(1);
        }
        n
    }

    /// walk up to the top of the tree, then assign the whole trunk on the way down.
    fn tree(&mut self, mut x: isize, mut y: isize) {
        let t = *self.catalog.tree();
        // sideways steps allowed before giving up
        let mut tolerance = 2;
        while tolerance > 0 && y > 0 {
            if self.tree_at(x, y - 1) {
                y -= 1;
                tolerance = 2;
            } else if self.tree_at(x - 1, y) {
                x -= 1;
                tolerance -= 1;
            } else if self.tree_at(x + 1, y) {
                x += 1;
                tolerance -= 1;
            } else {
                break;
            }
        }
        self.put(x, y, t.base_top);

        y += 1;
        while self.tree_at(x, y + 1) {
            let (left, right) = (self.tree_at(x - 1, y), self.tree_at(x + 1, y));
            let leafy = y % 2 == 0;
            if left {
                self.put(
                    x - 1,
                    y,
                    if leafy {
                        t.branch_left_leafy
                    } else {
                        t.branch_left
                    },
                );
            }
            if right {
                self.put(
                    x + 1,
                    y,
                    if leafy {
                        t.branch_right_leafy
                    } else {
                        t.branch_right
                    },
                );
            }
            let base = match (left, right) {
                (true, true) => t.base_branch_both,
                (true, false) => t.base_branch_left,
                (false, true) => t.base_branch_right,
                (false, false) => t.base,
            };
            self.put(x, y, base);
            y += 1;
        }

        if self.tree_at(x, y) {
            let (left, right) = (self.tree_at(x - 1, y), self.tree_at(x + 1, y));
            if left {
                self.put(x - 1, y, t.trunk_left);
            }
            if right {
                self.put(x + 1, y, t.trunk_right);
            }
            let trunk = match (left, right) {
                (true, true) => t.trunk_both,
                (true, false) => t.base_trunk_left,
                (false, true) => t.base_trunk_right,
                (false, false) => t.base,
            };
            self.put(x, y, trunk);
        }
    }

    fn stalactite(&mut self, x: isize, y: isize, id: u16) {
        let two_tall = self.same_at(x, y + 1, id);
        let (top, bottom) = if self.solid_at(x, y - 1) {
            (0, 72)
        } else {
            (36, 90)
        };
        if two_tall {
            self.put(x, y, [0, top]);
            self.put(x, y + 1, [0, top + STEP]);
        } else {
            self.put(x, y, [0, bottom]);
        }
    }

    /// splits a horizontal run into 3 and 2 wide pieces
    fn detritus(&mut self, x: isize, mut y: isize, id: u16) {
        let mut width = 1;
        while self.same_at(x + width, y, id) {
            width += 1;
        }
        while width > 4 {
            self.detritus_block(x, y, 3, 0);
            y += 3;
            width -= 3;
        }
        match width {
            4 => {
                self.detritus_block(x, y, 2, 36);
                self.detritus_block(x, y + 2, 2, 36);
            }
            3 => self.detritus_block(x, y, 3, 0),
            2 => self.detritus_block(x, y, 2, 36),
            _ => {}
        }
    }

    fn detritus_block(&mut self, x: isize, y: isize, width: u16, v: u16) {
        for dx in 0..width {
            for dy in 0..2 {
                self.put(
                    x + dx as isize,
                    y + dy as isize,
                    [dx * STEP, v + dy * STEP],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TreeFrames;

    const TREE: u16 = 5;
    const STONE: u16 = 1;
    const SPIKE: u16 = 2;
    const LEAVES: u16 = 3;
    const SIGN: u16 = 4;

    fn catalog() -> Catalog {
        let tile = |kind| TileInfo {
            kind,
            ..Default::default()
        };
        let f = |n| [0, n];
        Catalog::default()
            .with_tile(
                STONE,
                TileInfo {
                    solid: true,
                    ..Default::default()
                },
            )
            .with_tile(SPIKE, tile(TileType::Stalactite))
            .with_tile(LEAVES, tile(TileType::PlantDetritus))
            .with_tile(
                SIGN,
                TileInfo {
                    width: Some(2),
                    height: Some(3),
                    ..Default::default()
                },
            )
            .with_tile(TREE, tile(TileType::Trees))
            .with_tree(TreeFrames {
                base: f(1),
                base_top: f(2),
                base_branch_left: f(3),
                branch_left: f(4),
                branch_left_leafy: f(5),
                base_branch_right: f(6),
                branch_right: f(7),
                branch_right_leafy: f(8),
                base_branch_both: f(9),
                base_trunk_left: f(10),
                trunk_left: f(11),
                base_trunk_right: f(12),
                trunk_right: f(13),
                trunk_both: f(14),
            })
    }

    fn map(rows: &[&[u16]]) -> WorldMap {
        let mut m = WorldMap::new(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, &id) in row.iter().enumerate() {
                if id != 0 {
                    m.set_cell(x, y, Cell::tile(id));
                }
            }
        }
        m
    }

    #[test]
    fn plain_tree() {
        let c = catalog();
        let m = map(&[&[TREE], &[TREE], &[TREE], &[TREE]]);
        let mut f = Frames::new(&m, &c);
        assert_eq!(f.get(0, 2), Some([0, 1]));
        assert_eq!(f.get(0, 0), Some([0, 2]));
        assert_eq!(f.get(0, 1), Some([0, 1]));
        assert_eq!(f.get(0, 3), Some([0, 1]));
    }

    #[test]
    fn branches() {
        let c = catalog();
        #[rustfmt::skip]
        let m = map(&[
            &[0, TREE, 0],
            &[0, TREE, TREE],
            &[TREE, TREE, 0],
            &[TREE, TREE, TREE],
        ]);
        let mut f = Frames::new(&m, &c);
        assert_eq!(f.get(0, 2), Some([0, 5]));
        assert_eq!(f.get(1, 0), Some([0, 2]));
        assert_eq!(f.get(2, 1), Some([0, 7]));
        assert_eq!(f.get(1, 1), Some([0, 6]));
        assert_eq!(f.get(1, 2), Some([0, 3]));
        assert_eq!(f.get(0, 3), Some([0, 11]));
        assert_eq!(f.get(2, 3), Some([0, 13]));
        assert_eq!(f.get(1, 3), Some([0, 14]));
    }

    #[test]
    fn stalactites() {
        let c = catalog();
        let m = map(&[&[STONE, 0, 0], &[SPIKE, SPIKE, 0], &[SPIKE, SPIKE, SPIKE]]);
        let mut f = Frames::new(&m, &c);
        assert_eq!(f.get(0, 1), Some([0, 0]));
        assert_eq!(f.get(0, 2), Some([0, 18]));
        assert_eq!(f.get(1, 1), Some([0, 36]));
        assert_eq!(f.get(1, 2), Some([0, 54]));
        assert_eq!(f.get(2, 2), Some([0, 90]));
        assert_eq!(f.get(0, 0), None);
    }

    #[test]
    fn stalactite_options() {
        let c = catalog();
        let mut m = map(&[&[STONE], &[0]]);
        m.set_cell(
            0,
            1,
            Cell::Tile {
                light: 255,
                id: SPIKE,
                option: 2,
                paint: 0,
            },
        );
        assert_eq!(Frames::new(&m, &c).get(0, 1), Some([104, 72]));
    }

    #[test]
    fn detritus() {
        let c = catalog();
        let m = map(&[&[LEAVES; 3], &[LEAVES; 3]]);
        let mut f = Frames::new(&m, &c);
        let row: Vec<_> = (0..3).map(|x| f.get(x, 0)).collect();
        assert_eq!(row, [Some([0, 0]), Some([18, 0]), Some([36, 0])]);
        assert_eq!(f.get(2, 1), Some([36, 18]));

        let m = map(&[&[LEAVES; 4], &[0; 4], &[0; 4]]);
        let mut f = Frames::new(&m, &c);
        assert_eq!(f.get(0, 0), Some([0, 36]));
        assert_eq!(f.get(1, 0), Some([18, 36]));
        // the second half starts its own run
        assert_eq!(f.get(2, 0), Some([0, 36]));
        assert_eq!(f.get(3, 0), Some([18, 36]));

        let m = map(&[&[LEAVES, 0]]);
        assert_eq!(Frames::new(&m, &c).get(0, 0), Some([0, 0]));
    }

    #[test]
    fn wide_detritus() {
        let c = catalog();
        let m = map(&[
            &[LEAVES; 5],
            &[0; 5],
            &[0; 5],
            &[LEAVES, 0, 0, 0, 0],
            &[0; 5],
        ]);
        let mut f = Frames::new(&m, &c);
        let row: Vec<_> = (0..5).map(|x| f.get(x, 0)).collect();
        assert_eq!(
            row,
            [
                Some([0, 0]),
                Some([18, 0]),
                Some([36, 0]),
                Some([0, 36]),
                Some([18, 36])
            ]
        );
        // the 2 wide remainder lands three rows further down
        assert_eq!(f.get(0, 3), Some([0, 36]));

        let m = map(&[&[0, 0, 0], &[0, 0, 0], &[0, 0, 0], &[LEAVES, 0, 0]]);
        assert_eq!(Frames::new(&m, &c).get(0, 3), Some([0, 0]));
    }

    #[test]
    fn tiling() {
        let c = catalog();
        let m = map(&[&[SIGN; 5], &[SIGN; 5], &[SIGN; 5], &[SIGN; 5]]);
        let mut f = Frames::new(&m, &c);
        let us: Vec<_> = (0..5).map(|x| f.get(x, 0).map(|[u, _]| u)).collect();
        assert_eq!(us, [Some(0), Some(18), Some(0), Some(18), Some(0)]);
        let vs: Vec<_> = (0..4).map(|y| f.get(1, y).map(|[_, v]| v)).collect();
        assert_eq!(vs, [Some(0), Some(18), Some(36), Some(0)]);

        let m = map(&[&[STONE, 0]]);
        let mut f = Frames::new(&m, &c);
        assert_eq!(f.get(0, 0), None);
        assert_eq!(f.get(1, 0), None);
    }
}
