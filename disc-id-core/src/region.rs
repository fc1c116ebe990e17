use serde::{Deserialize, Serialize};

/// Geographic regions a PlayStation 2 title may be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Asia (excluding Japan/Korea, which have their own catalogs)
    Asia,
    /// Australia
    Australia,
    /// Europe (PAL regions)
    Europe,
    /// Japan
    Japan,
    /// Korea
    Korea,
    /// USA / North America
    Usa,
}

impl Region {
    /// Returns the standard abbreviation for this region.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Asia => "AS",
            Self::Australia => "AU",
            Self::Europe => "EU",
            Self::Japan => "JP",
            Self::Korea => "KO",
            Self::Usa => "US",
        }
    }

    /// Returns the full name of this region.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Asia => "Asia",
            Self::Australia => "Australia",
            Self::Europe => "Europe",
            Self::Japan => "Japan",
            Self::Korea => "Korea",
            Self::Usa => "USA",
        }
    }

    /// All regions, in the order the database resolver checks them.
    pub fn resolution_order() -> [Region; 6] {
        [
            Region::Asia,
            Region::Australia,
            Region::Europe,
            Region::Japan,
            Region::Korea,
            Region::Usa,
        ]
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
