/*!
 * Screen regions and overlap grading.
 *
 * Regions are rectangles in percent of the video frame (origin at the top
 * left). The built-in catalogue covers the layout zones used by the caption
 * and subtitle authoring tools we receive files from. Grading a pair tells a
 * reviewer how visible the collision is; it never hides a pair.
 */

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::overlap::OverlapPair;

/// Rectangle in percent of the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// True when the two rectangles share a non-empty area
    pub fn intersects(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// How visible a time overlap is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapSeverity {
    /// Both events use the same named region
    SameRegion,
    /// Different regions whose rectangles intersect
    IntersectingRegions,
    /// Different regions that never share pixels
    SeparateRegions,
    /// At least one region name is not in the catalogue
    UnknownRegion,
}

impl fmt::Display for OverlapSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SameRegion => "same region",
            Self::IntersectingRegions => "intersecting regions",
            Self::SeparateRegions => "separate regions",
            Self::UnknownRegion => "unknown region",
        };
        write!(f, "{}", name)
    }
}

/// Named regions available for grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCatalog {
    regions: BTreeMap<String, Region>,
}

impl RegionCatalog {
    /// An empty catalogue
    pub fn empty() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    /// Built-in layout zones
    pub fn builtin() -> Self {
        let zones = [
            ("r0", Region::new(25.0, 93.33, 75.0, 6.67)),
            ("r1", Region::new(12.5, 93.33, 87.5, 6.67)),
            ("r2", Region::new(0.0, 86.67, 100.0, 13.33)),
            ("r3", Region::new(0.0, 93.33, 100.0, 6.67)),
            ("r4", Region::new(12.5, 86.67, 87.5, 13.33)),
            ("r5", Region::new(25.0, 86.67, 75.0, 13.33)),
            ("r6", Region::new(37.5, 93.33, 62.5, 6.67)),
            ("r7", Region::new(37.5, 86.67, 62.5, 13.33)),
            ("r8", Region::new(25.0, 0.0, 75.0, 100.0)),
            ("top", Region::new(0.0, 0.0, 100.0, 15.0)),
            ("bottom", Region::new(0.0, 85.0, 100.0, 15.0)),
        ];

        Self {
            regions: zones
                .into_iter()
                .map(|(name, region)| (name.to_string(), region))
                .collect(),
        }
    }

    /// Add or replace a region
    pub fn insert(&mut self, name: impl Into<String>, region: Region) {
        self.regions.insert(name.into(), region);
    }

    /// Add every region of `other`, replacing same-named entries
    pub fn extend(&mut self, other: &BTreeMap<String, Region>) {
        self.regions
            .extend(other.iter().map(|(name, region)| (name.clone(), *region)));
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Grade a pair by where its two events sit on screen
    pub fn grade(&self, pair: &OverlapPair) -> OverlapSeverity {
        self.grade_regions(pair.a.region(), pair.b.region())
    }

    pub fn grade_regions(&self, a: &str, b: &str) -> OverlapSeverity {
        if a == b {
            return OverlapSeverity::SameRegion;
        }
        match (self.get(a), self.get(b)) {
            (Some(ra), Some(rb)) if ra.intersects(rb) => OverlapSeverity::IntersectingRegions,
            (Some(_), Some(_)) => OverlapSeverity::SeparateRegions,
            _ => OverlapSeverity::UnknownRegion,
        }
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
