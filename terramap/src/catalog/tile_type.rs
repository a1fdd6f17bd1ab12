//! tile kinds that need special frame handling when exported
use serde::Deserialize;

/// a frame coordinate pair, in pixels of the tile sheet (one tile is 18)
pub type Uv = [u16; 2];

macro_rules! tile_types {
    ($($name:literal => $variant:ident,)+) => {
        /// semantic type of a tile: how its frame is derived from its option and its neighbours
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum TileType {
            #[default]
            $($variant,)+
        }

        impl TileType {
            pub const ALL: &'static [TileType] = &[$(TileType::$variant,)+];

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(TileType::$variant => $name,)+
                }
            }

            /// look a type up by its name in the catalog json
            #[must_use]
            pub fn by_name(name: &str) -> Option<Self> {
                TILE_TYPES.get(name).copied()
            }
        }

        static TILE_TYPES: phf::Map<&'static str, TileType> = phf::phf_map! {
            $($name => TileType::$variant,)+
        };
    };
}

tile_types! {
    "None" => None,
    "Benches" => Benches,
    "Platforms" => Platforms,
    "Chairs" => Chairs,
    "LilyPad" => LilyPad,
    "Torches" => Torches,
    "Trees" => Trees,
    "SoulBottles" => SoulBottles,
    "Containers" => Containers,
    "Containers2" => Containers2,
    "GolfTrophies" => GolfTrophies,
    "Pots" => Pots,
    "ShadowOrbs" => ShadowOrbs,
    "DemonAltar" => DemonAltar,
    "Traps" => Traps,
    "Herbs" => Herbs,
    "PotsSuspended" => PotsSuspended,
    "Statues" => Statues,
    "AdamantiteForge" => AdamantiteForge,
    "MythrilAnvil" => MythrilAnvil,
    "Stalactite" => Stalactite,
    "ExposedGems" => ExposedGems,
    "LongMoss" => LongMoss,
    "SmallPiles1x1" => SmallPiles1x1,
    "SmallPiles2x1" => SmallPiles2x1,
    "LargePiles" => LargePiles,
    "LargePiles2" => LargePiles2,
    "DyePlants" => DyePlants,
    "PlantDetritus" => PlantDetritus,
    "Crystals" => Crystals,
    "Painting3X3" => Painting3X3,
    "Painting6X4" => Painting6X4,
    "GemLocks" => GemLocks,
    "PartyPresent" => PartyPresent,
    "LogicGateLamp" => LogicGateLamp,
    "WeightedPressurePlate" => WeightedPressurePlate,
    "GolfCupFlag" => GolfCupFlag,
    "PottedPlants2" => PottedPlants2,
    "TeleportationPylon" => TeleportationPylon,
}

impl TryFrom<u8> for TileType {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        Self::ALL.get(v as usize).copied().ok_or(v)
    }
}

impl TileType {
    /// the frame offset selected purely by a tiles option (its map color variant).
    ///
    /// options that cannot be told apart on the map pick the first matching sprite.
    /// ```
    /// # use terramap::catalog::TileType;
    /// assert_eq!(TileType::Benches.option_frame(2), [43 * 54, 0]);
    /// assert_eq!(TileType::None.option_frame(7), [0, 0]);
    /// ```
    #[must_use]
    pub const fn option_frame(self, option: u8) -> Uv {
        use TileType::*;
        let o = option as u16;
        match self {
            Benches => [
                match option {
                    0 => 0,
                    2 => 43,
                    _ => 1,
                } * 54,
                0,
            ],
            Platforms if option == 1 => [0, 48 * 18],
            Chairs if option == 1 => [0, 40],
            LilyPad | WeightedPressurePlate => [0, o * 18],
            Torches if option == 1 => [66, 0],
            SoulBottles => [0, o * 36],
            Containers => [
                match option {
                    1 => 1,
                    2 => 3,
                    3 => 6,
                    4 => 11,
                    _ => 0,
                } * 36,
                0,
            ],
            Containers2 | GolfTrophies | PotsSuspended | PartyPresent => [o * 36, 0],
            Pots => [0, o * 108],
            ShadowOrbs if option == 1 => [36, 0],
            DemonAltar if option == 1 => [54, 0],
            Traps => [
                0,
                match option {
                    1 => 1,
                    2 => 5,
                    _ => 0,
                } * 18,
            ],
            Herbs | ExposedGems | LogicGateLamp | GolfCupFlag => [o * 18, 0],
            Statues => [
                match option {
                    1 => 1548,
                    2 => 1656,
                    _ => 0,
                },
                0,
            ],
            AdamantiteForge if option == 1 => [52, 0],
            MythrilAnvil if option == 1 => [28, 0],
            Stalactite => [o * 52, 0],
            LongMoss => [o * 22, 0],
            SmallPiles1x1 => {
                let n = match option {
                    2 => 6,
                    1 => 16,
                    3 => 25,
                    4 => 34,
                    _ => 0,
                };
                [(n % 18) * 36, (n / 18 + 1) * 18]
            }
            SmallPiles2x1 => [
                match option {
                    1 => 6,
                    2 => 12,
                    3 => 36,
                    4 => 48,
                    _ => 0,
                } * 18,
                0,
            ],
            LargePiles => [
                match option {
                    0 => 7,
                    1 => 22,
                    5 => 25,
                    3 => 26,
                    _ => 0,
                } * 54,
                0,
            ],
            LargePiles2 => {
                let n = match option {
                    6 => 3,
                    7 => 6,
                    4 => 9,
                    8 => 18,
                    1 => 25,
                    10 => 50,
                    2 => 52,
                    _ => 0,
                };
                [(n % 36) * 54, (n / 36) * 36]
            }
            DyePlants => [o * 34, 0],
            Crystals if option == 1 => [324, 0],
            Painting3X3 => {
                let n = match option {
                    1 => 12,
                    2 => 16,
                    3 => 41,
                    4 => 46,
                    _ => 0,
                };
                [(n % 36) * 54, (n / 36) * 54]
            }
            Painting6X4 if option == 1 => [0, 22 * 72],
            GemLocks | TeleportationPylon => [o * 54, 0],
            PottedPlants2 if option == 1 => [8 * 54, 0],
            _ => [0, 0],
        }
    }
}

/// frames of the tree sheet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFrames {
    pub base: Uv,
    pub base_top: Uv,
    pub base_branch_left: Uv,
    pub branch_left: Uv,
    pub branch_left_leafy: Uv,
    pub base_branch_right: Uv,
    pub branch_right: Uv,
    pub branch_right_leafy: Uv,
    pub base_branch_both: Uv,
    pub base_trunk_left: Uv,
    pub trunk_left: Uv,
    pub base_trunk_right: Uv,
    pub trunk_right: Uv,
    pub trunk_both: Uv,
}

#[test]
fn names() {
    assert_eq!(TileType::by_name("PlantDetritus"), Some(TileType::PlantDetritus));
    assert_eq!(TileType::by_name("plantdetritus"), None);
    for &t in TileType::ALL {
        assert_eq!(TileType::by_name(t.name()), Some(t));
        assert_eq!(TileType::try_from(t as u8), Ok(t));
    }
    assert_eq!(TileType::try_from(39), Err(39));
}

#[test]
fn option_frames() {
    assert_eq!(TileType::Benches.option_frame(0), [0, 0]);
    assert_eq!(TileType::Benches.option_frame(1), [54, 0]);
    assert_eq!(TileType::Traps.option_frame(2), [0, 90]);
    assert_eq!(TileType::SmallPiles1x1.option_frame(3), [7 * 36, 36]);
    assert_eq!(TileType::LargePiles2.option_frame(10), [14 * 54, 36]);
    assert_eq!(TileType::Stalactite.option_frame(2), [104, 0]);
    assert_eq!(TileType::Platforms.option_frame(0), [0, 0]);
    assert_eq!(TileType::PartyPresent.option_frame(2), [72, 0]);
}
