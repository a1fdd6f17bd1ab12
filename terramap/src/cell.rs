//! the contents of one map position
use std::fmt;

/// liquid kinds, in the order the `.map` format numbers them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Liquid {
    Water,
    Lava,
    Honey,
    Shimmer,
}

impl Liquid {
    pub const ALL: [Liquid; 4] = [Self::Water, Self::Lava, Self::Honey, Self::Shimmer];

    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Liquid {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        Self::ALL.get(v as usize).copied().ok_or(v)
    }
}

/// which background an air cell shows. decided by the cells y position when it is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AirDepth {
    Sky,
    Underground,
    Cavern,
}

/// what kind of cell, without the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Group {
    Empty,
    Tile,
    Wall,
    Liquid,
    Air,
}

/// a single map cell.
///
/// `light` is 0..=255, where 255 is fully lit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// unexplored, nothing recorded
    #[default]
    Empty,
    Air {
        light: u8,
        /// background shade index, only cosmetic
        shade: u16,
        depth: AirDepth,
    },
    Tile {
        light: u8,
        id: u16,
        /// which color/style variant of the tile
        option: u8,
        paint: u8,
    },
    Wall {
        light: u8,
        id: u16,
        option: u8,
        paint: u8,
    },
    Liquid {
        light: u8,
        id: Liquid,
    },
}

impl Cell {
    #[must_use]
    pub const fn tile(id: u16) -> Self {
        Self::Tile {
            light: 255,
            id,
            option: 0,
            paint: 0,
        }
    }

    #[must_use]
    pub const fn wall(id: u16) -> Self {
        Self::Wall {
            light: 255,
            id,
            option: 0,
            paint: 0,
        }
    }

    #[must_use]
    pub const fn group(&self) -> Group {
        match self {
            Self::Empty => Group::Empty,
            Self::Air { .. } => Group::Air,
            Self::Tile { .. } => Group::Tile,
            Self::Wall { .. } => Group::Wall,
            Self::Liquid { .. } => Group::Liquid,
        }
    }

    /// [`None`] for [`Cell::Empty`]
    #[must_use]
    pub const fn light(&self) -> Option<u8> {
        match *self {
            Self::Empty => None,
            Self::Air { light, .. }
            | Self::Tile { light, .. }
            | Self::Wall { light, .. }
            | Self::Liquid { light, .. } => Some(light),
        }
    }

    /// copy of this cell lit differently. empty stays empty.
    #[must_use]
    pub const fn with_light(mut self, to: u8) -> Self {
        match &mut self {
            Self::Empty => {}
            Self::Air { light, .. }
            | Self::Tile { light, .. }
            | Self::Wall { light, .. }
            | Self::Liquid { light, .. } => *light = to,
        }
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// the tile id, if this is a tile
    #[must_use]
    pub const fn tile_id(&self) -> Option<u16> {
        match *self {
            Self::Tile { id, .. } => Some(id),
            _ => None,
        }
    }

    /// paint id of a tile or wall (0 is unpainted)
    #[must_use]
    pub const fn paint(&self) -> u8 {
        match *self {
            Self::Tile { paint, .. } | Self::Wall { paint, .. } => paint,
            _ => 0,
        }
    }

    /// equal in everything but light. used when merging runs.
    /// ```
    /// # use terramap::Cell;
    /// let a = Cell::tile(5);
    /// assert!(a.eq_ignoring_light(&a.with_light(3)));
    /// assert_ne!(a, a.with_light(3));
    /// ```
    #[must_use]
    pub fn eq_ignoring_light(&self, other: &Self) -> bool {
        self.with_light(0) == other.with_light(0)
    }

    /// equal once exported: any two air cells are the same, since their shade is only visual.
    #[must_use]
    pub fn eq_after_export(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Air { .. }, Self::Air { .. }) => true,
            _ => self.eq_ignoring_light(other),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Empty => write!(f, "Empty"),
            Self::Air { light, shade, depth } => {
                write!(f, "Light {light}/255 - Air ({depth:?}) - shade {shade}")
            }
            Self::Tile {
                light,
                id,
                option,
                paint,
            } => write!(f, "Light {light}/255 - Tile {id}:{option} (paint {paint})"),
            Self::Wall {
                light,
                id,
                option,
                paint,
            } => write!(f, "Light {light}/255 - Wall {id}:{option} (paint {paint})"),
            Self::Liquid { light, id } => write!(f, "Light {light}/255 - Liquid {id:?}"),
        }
    }
}

#[test]
fn equalities() {
    let sky = Cell::Air {
        light: 200,
        shade: 3,
        depth: AirDepth::Sky,
    };
    let rock = Cell::Air {
        light: 255,
        shade: 9,
        depth: AirDepth::Cavern,
    };
    assert!(!sky.eq_ignoring_light(&rock));
    assert!(sky.eq_after_export(&rock));
    assert!(sky.eq_ignoring_light(&sky.with_light(40)));

    let t = Cell::Tile {
        light: 10,
        id: 4,
        option: 1,
        paint: 0,
    };
    assert!(!t.eq_after_export(&Cell::tile(4)));
    assert!(t.eq_after_export(&t.with_light(255)));
    assert!(!t.eq_after_export(&Cell::wall(4)));
    assert!(!Cell::Empty.eq_after_export(&sky));
    assert_eq!(Cell::Empty.with_light(9), Cell::Empty);
    assert_eq!(Cell::Empty.light(), None);
}

#[test]
fn liquid_ids() {
    assert_eq!(Liquid::try_from(3), Ok(Liquid::Shimmer));
    assert_eq!(Liquid::try_from(4), Err(4));
    assert_eq!(Liquid::Lava.id(), 1);
}
