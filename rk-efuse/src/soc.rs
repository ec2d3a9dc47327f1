//! # RK312x family identification
//!
//! Boards are matched by the first device-tree `compatible` string the
//! family recognizes. Both members share the same e-fuse block.

/// Physical base address of the e-fuse register window.
pub const EFUSE_PHYS: usize = 0x2009_0000;
/// Size of the e-fuse register window.
pub const EFUSE_SIZE: usize = 0x4000;

/// Members of the RK312x family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Soc {
    /// RK3126
    #[strum(to_string = "Rockchip RK3126")]
    Rk3126,
    /// RK3128
    #[strum(to_string = "Rockchip RK3128")]
    Rk3128,
}

impl Soc {
    /// The device-tree compatible string of this SoC.
    pub const fn compatible(self) -> &'static str {
        match self {
            Soc::Rk3126 => "rockchip,rk3126",
            Soc::Rk3128 => "rockchip,rk3128",
        }
    }

    /// Matches a single compatible string.
    pub fn from_compatible(compatible: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        Self::iter().find(|soc| soc.compatible() == compatible)
    }

    /// Matches the first recognized entry of a compatible list, in list order.
    pub fn from_compatible_list<'a>(list: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let soc = list.into_iter().find_map(Self::from_compatible);
        if soc.is_none() {
            debug!("no RK312x compatible string found");
        }
        soc
    }
}
