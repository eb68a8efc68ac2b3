use std::collections::HashMap;

use crate::color::Rgb;
use crate::region_map::{RegionMap, ShapeId};

/// Per-region coloring status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionStatus {
    Unfilled,
    Highlighted,
    Filled,
}

/// What the presentation layer should paint a region with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paint {
    Blank,
    Marker,
    Color(Rgb),
}

impl Paint {
    pub fn css(&self, blank: &str, marker: &str) -> String {
        match self {
            Paint::Blank => blank.to_string(),
            Paint::Marker => marker.to_string(),
            Paint::Color(c) => c.css(),
        }
    }
}

/// Result of a click on a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Click {
    /// The region was not highlighted (or unknown); nothing changed.
    Ignored,
    Filled {
        color: Rgb,
        remaining: usize,
        /// True when this click filled the last region of `color`.
        completed: bool,
    },
}

/// Progress of one palette entry.
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteEntry {
    /// 1-based number printed inside the regions of this color.
    pub number: usize,
    pub color: Rgb,
    pub total: usize,
    pub remaining: usize,
    pub selected: bool,
}

impl PaletteEntry {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Filled share in `0.0..=1.0`; empty groups count as done.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.total - self.remaining) as f64 / self.total as f64
        }
    }
}

/// Interactive coloring state for one displayed picture.
///
/// All mutation goes through `&mut self`, so two updates of `remaining`
/// can never interleave. The returned shape lists name exactly the regions
/// whose paint changed.
#[derive(Clone, Debug, PartialEq)]
pub struct FillState {
    map: RegionMap,
    status: HashMap<ShapeId, RegionStatus>,
    remaining: HashMap<Rgb, usize>,
    selected: Option<Rgb>,
}

impl FillState {
    pub fn new(map: RegionMap) -> Self {
        let status = map
            .shapes()
            .map(|s| (s.clone(), RegionStatus::Unfilled))
            .collect();
        let remaining = full_counts(&map);
        FillState {
            map,
            status,
            remaining,
            selected: None,
        }
    }

    pub fn region_map(&self) -> &RegionMap {
        &self.map
    }

    pub fn selected(&self) -> Option<Rgb> {
        self.selected
    }

    pub fn status(&self, shape: &ShapeId) -> Option<RegionStatus> {
        self.status.get(shape).copied()
    }

    pub fn remaining(&self, color: Rgb) -> Option<usize> {
        self.remaining.get(&color).copied()
    }

    pub fn remaining_counts(&self) -> &HashMap<Rgb, usize> {
        &self.remaining
    }

    pub fn total_remaining(&self) -> usize {
        self.remaining.values().sum()
    }

    /// Untracked colors (background, unknown) are never complete.
    pub fn is_color_complete(&self, color: Rgb) -> bool {
        self.remaining.get(&color) == Some(&0)
    }

    /// True once every palette color is complete.
    pub fn is_complete(&self) -> bool {
        self.remaining.values().all(|&n| n == 0)
    }

    pub fn paint_of(&self, shape: &ShapeId) -> Option<Paint> {
        let paint = match self.status.get(shape)? {
            RegionStatus::Unfilled => Paint::Blank,
            RegionStatus::Highlighted => Paint::Marker,
            RegionStatus::Filled => Paint::Color(self.map.color_of(shape)?),
        };
        Some(paint)
    }

    pub fn palette(&self) -> Vec<PaletteEntry> {
        self.map
            .palette()
            .map(|(number, g)| PaletteEntry {
                number,
                color: g.color,
                total: g.shapes.len(),
                remaining: self.remaining.get(&g.color).copied().unwrap_or(0),
                selected: self.selected == Some(g.color),
            })
            .collect()
    }

    /// Highlight the regions of `color` that are still unfilled.
    ///
    /// Colors outside the palette leave everything untouched.
    pub fn select_color(&mut self, color: Rgb) -> Vec<ShapeId> {
        if !self.remaining.contains_key(&color) {
            return Vec::new();
        }
        self.selected = Some(color);
        let mut changed = Vec::new();
        for (gi, group) in self.map.groups().iter().enumerate() {
            let want = if gi > 0 && group.color == color {
                RegionStatus::Highlighted
            } else {
                RegionStatus::Unfilled
            };
            for shape in &group.shapes {
                if let Some(st) = self.status.get_mut(shape)
                    && *st != RegionStatus::Filled
                    && *st != want
                {
                    *st = want;
                    changed.push(shape.clone());
                }
            }
        }
        changed
    }

    /// Fill a highlighted region. Anything else is ignored.
    pub fn click_region(&mut self, shape: &ShapeId) -> Click {
        let Some(st) = self.status.get_mut(shape) else {
            return Click::Ignored;
        };
        if *st != RegionStatus::Highlighted {
            return Click::Ignored;
        }
        let Some(color) = self.map.color_of(shape) else {
            return Click::Ignored;
        };
        *st = RegionStatus::Filled;
        let left = match self.remaining.get_mut(&color) {
            Some(n) => {
                *n = n.saturating_sub(1);
                *n
            }
            None => 0,
        };
        Click::Filled {
            color,
            remaining: left,
            completed: left == 0,
        }
    }

    /// Reveal the whole picture, background included.
    pub fn fill_all(&mut self) -> Vec<ShapeId> {
        let changed = self.set_all(RegionStatus::Filled);
        for n in self.remaining.values_mut() {
            *n = 0;
        }
        changed
    }

    /// Back to the initial blank picture. The selection is dropped and has to
    /// be re-issued by the caller.
    pub fn clear_all(&mut self) -> Vec<ShapeId> {
        let changed = self.set_all(RegionStatus::Unfilled);
        self.remaining = full_counts(&self.map);
        self.selected = None;
        changed
    }

    fn set_all(&mut self, to: RegionStatus) -> Vec<ShapeId> {
        let mut changed = Vec::new();
        for shape in self.map.shapes() {
            if let Some(st) = self.status.get_mut(shape)
                && *st != to
            {
                *st = to;
                changed.push(shape.clone());
            }
        }
        changed
    }
}

fn full_counts(map: &RegionMap) -> HashMap<Rgb, usize> {
    map.palette()
        .map(|(_, g)| (g.color, g.shapes.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region_map::ColorGroup;

    const BLACK: Rgb = Rgb(0, 0, 0);
    const RED: Rgb = Rgb(255, 0, 0);
    const GREEN: Rgb = Rgb(0, 255, 0);

    fn sample() -> FillState {
        let map = RegionMap::new(vec![
            ColorGroup { color: BLACK, shapes: vec!["bg".into()] },
            ColorGroup { color: RED, shapes: vec!["s1".into(), "s2".into()] },
            ColorGroup { color: GREEN, shapes: vec!["s3".into()] },
        ])
        .unwrap();
        FillState::new(map)
    }

    fn id(s: &str) -> ShapeId {
        ShapeId::from(s)
    }

    #[test]
    fn init_counts_palette_groups_only() {
        let fs = sample();
        assert_eq!(fs.remaining(RED), Some(2));
        assert_eq!(fs.remaining(GREEN), Some(1));
        assert_eq!(fs.remaining(BLACK), None);
        assert_eq!(fs.total_remaining(), 3);
        assert_eq!(fs.status(&id("bg")), Some(RegionStatus::Unfilled));
        assert_eq!(fs.selected(), None);
    }

    #[test]
    fn full_playthrough() {
        let mut fs = sample();
        let changed = fs.select_color(RED);
        assert_eq!(changed, vec![id("s1"), id("s2")]);
        assert_eq!(fs.status(&id("s1")), Some(RegionStatus::Highlighted));
        assert_eq!(fs.status(&id("s2")), Some(RegionStatus::Highlighted));
        assert_eq!(fs.status(&id("s3")), Some(RegionStatus::Unfilled));

        assert_eq!(
            fs.click_region(&id("s1")),
            Click::Filled { color: RED, remaining: 1, completed: false }
        );
        assert_eq!(fs.remaining(RED), Some(1));
        assert!(!fs.is_color_complete(RED));

        assert_eq!(
            fs.click_region(&id("s2")),
            Click::Filled { color: RED, remaining: 0, completed: true }
        );
        assert_eq!(fs.remaining(RED), Some(0));
        assert!(fs.is_color_complete(RED));
        assert!(!fs.is_complete());
    }

    #[test]
    fn switching_color_unhighlights_but_keeps_fills() {
        let mut fs = sample();
        fs.select_color(RED);
        fs.click_region(&id("s1"));
        let changed = fs.select_color(GREEN);
        assert_eq!(changed, vec![id("s2"), id("s3")]);
        assert_eq!(fs.status(&id("s1")), Some(RegionStatus::Filled));
        assert_eq!(fs.status(&id("s2")), Some(RegionStatus::Unfilled));
        assert_eq!(fs.status(&id("s3")), Some(RegionStatus::Highlighted));
        assert_eq!(fs.paint_of(&id("s1")), Some(Paint::Color(RED)));
        assert_eq!(fs.paint_of(&id("s3")), Some(Paint::Marker));
        assert_eq!(fs.paint_of(&id("s2")), Some(Paint::Blank));
    }

    #[test]
    fn unknown_and_background_colors_are_ignored() {
        let mut fs = sample();
        fs.select_color(RED);
        let before = fs.clone();
        assert!(fs.select_color(Rgb(1, 2, 3)).is_empty());
        assert!(fs.select_color(BLACK).is_empty());
        assert_eq!(fs, before);
    }

    #[test]
    fn clicks_outside_highlight_do_nothing() {
        let mut fs = sample();
        fs.select_color(RED);
        let before = fs.clone();
        assert_eq!(fs.click_region(&id("s3")), Click::Ignored);
        assert_eq!(fs.click_region(&id("bg")), Click::Ignored);
        assert_eq!(fs.click_region(&id("nope")), Click::Ignored);
        assert_eq!(fs, before);

        fs.click_region(&id("s1"));
        let filled = fs.clone();
        assert_eq!(fs.click_region(&id("s1")), Click::Ignored);
        assert_eq!(fs, filled);
    }

    #[test]
    fn fill_all_reveals_background_too() {
        let mut fs = sample();
        let changed = fs.fill_all();
        assert_eq!(changed.len(), 4);
        assert_eq!(fs.status(&id("bg")), Some(RegionStatus::Filled));
        assert_eq!(fs.paint_of(&id("bg")), Some(Paint::Color(BLACK)));
        assert!(fs.is_color_complete(RED));
        assert!(fs.is_color_complete(GREEN));
        assert!(!fs.is_color_complete(BLACK));
        assert!(fs.is_complete());
    }

    #[test]
    fn clear_all_undoes_fills_and_drops_selection() {
        let mut fs = sample();
        fs.select_color(RED);
        fs.click_region(&id("s1"));
        let changed = fs.clear_all();
        assert_eq!(changed, vec![id("s1"), id("s2")]);
        assert_eq!(fs, sample());

        // a highlight has to be re-issued after clearing
        assert_eq!(fs.click_region(&id("s2")), Click::Ignored);
    }

    #[test]
    fn palette_reports_progress() {
        let mut fs = sample();
        fs.select_color(RED);
        fs.click_region(&id("s1"));
        let palette = fs.palette();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[0].number, 1);
        assert_eq!(palette[0].remaining, 1);
        assert!(palette[0].selected);
        assert!((palette[0].progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(palette[1].number, 2);
        assert!(!palette[1].selected);
        assert_eq!(palette[1].progress(), 0.0);
    }

    #[test]
    fn empty_groups_start_complete() {
        let map = RegionMap::new(vec![
            ColorGroup { color: BLACK, shapes: vec![] },
            ColorGroup { color: RED, shapes: vec![] },
        ])
        .unwrap();
        let fs = FillState::new(map);
        assert!(fs.is_color_complete(RED));
        assert_eq!(fs.palette()[0].progress(), 1.0);
    }
}
