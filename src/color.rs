//! Deterministic color derivation for timeline items
//!
//! Teams are told apart by hue, task priorities by intensity. The derivation
//! is a pure function of its inputs so that the merge and the push reconciler
//! always agree on an item's color without sharing any lookup table.

use csscolorparser::Color;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::item::SourceKind;

/// Base hues, one per team up to palette exhaustion (after which hues repeat).
const PALETTE_HEX: [&str; 8] = [
    "#e6194b", // crimson
    "#3cb44b", // green
    "#ffb000", // amber
    "#4363d8", // blue
    "#f58231", // orange
    "#911eb4", // purple
    "#12b5b0", // teal
    "#f032e6", // magenta
];

/// The fixed event color. Deliberately absent from the palette above so that
/// events never collide with a task hue.
const EVENT_HEX: &str = "#3788d8";

/// Fill intensity per priority 1..=5. Priority 1 renders at full intensity.
const FILL_INTENSITY: [f64; 5] = [1.0, 0.85, 0.70, 0.55, 0.40];

static PALETTE: Lazy<Vec<Color>> = Lazy::new(|| {
    PALETTE_HEX
        .iter()
        .map(|hex| hex.parse().unwrap(/* cannot panic: these are compile-time known hex colors */))
        .collect()
});

static EVENT_BASE: Lazy<Color> = Lazy::new(|| {
    EVENT_HEX.parse().unwrap(/* cannot panic: compile-time known hex color */)
});

/// A display-ready fill/border pair, as CSS hex strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemColor {
    pub fill: String,
    pub border: String,
}

impl ItemColor {
    /// Color policy for a whole item: events get the fixed event color, every
    /// task-backed item is derived from its team and priority.
    pub fn for_item(source: SourceKind, team_id: Option<u64>, priority: Option<u8>) -> Self {
        match source {
            SourceKind::Event => event_color(),
            SourceKind::Task | SourceKind::Assignment => {
                derive_color(team_id.unwrap_or(0), priority.unwrap_or(3))
            }
        }
    }
}

/// Derive the fill/border pair for a (team, priority) combination.
///
/// Same inputs always produce the same outputs. Out-of-range priorities are
/// clamped into 1..=5 rather than rejected.
pub fn derive_color(team_id: u64, priority: u8) -> ItemColor {
    let base = &PALETTE[(team_id % PALETTE.len() as u64) as usize];
    let factor = FILL_INTENSITY[usize::from(priority.max(1).min(5)) - 1];
    scaled(base, factor)
}

/// The fixed, non-priority-scaled color used for events.
pub fn event_color() -> ItemColor {
    scaled(&EVENT_BASE, 1.0)
}

fn scaled(base: &Color, factor: f64) -> ItemColor {
    let (r, g, b) = (base.r * factor, base.g * factor, base.b * factor);
    ItemColor {
        fill: hex(r, g, b),
        // the border sits 20% of the remaining headroom above the fill
        border: hex(headroom(r), headroom(g), headroom(b)),
    }
}

fn headroom(channel: f64) -> f64 {
    (channel + 0.2 * (1.0 - channel)).min(1.0)
}

fn hex(r: f64, g: f64, b: f64) -> String {
    format!("#{:02x}{:02x}{:02x}", quantize(r), quantize(g), quantize(b))
}

fn quantize(channel: f64) -> u8 {
    (channel.max(0.0).min(1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_sum(hex: &str) -> u32 {
        let hex = hex.trim_start_matches('#');
        (0..3)
            .map(|i| u32::from_str_radix(&hex[2 * i..2 * i + 2], 16).unwrap())
            .sum()
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(derive_color(4, 2), derive_color(4, 2));
        assert_eq!(event_color(), event_color());
    }

    #[test]
    fn higher_priority_is_more_saturated() {
        for team in 0..16 {
            let urgent = derive_color(team, 1);
            let relaxed = derive_color(team, 5);
            assert!(channel_sum(&urgent.fill) > channel_sum(&relaxed.fill),
                    "team {} priority 1 should out-saturate priority 5", team);
        }
    }

    #[test]
    fn intensity_decreases_monotonically() {
        let sums: Vec<u32> = (1..=5).map(|p| channel_sum(&derive_color(2, p).fill)).collect();
        for pair in sums.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn distinct_teams_get_distinct_hues_up_to_palette_exhaustion() {
        for a in 0..8u64 {
            for b in (a + 1)..8u64 {
                assert_ne!(derive_color(a, 3).fill, derive_color(b, 3).fill);
            }
        }
        // hues repeat afterwards; accepted degradation
        assert_eq!(derive_color(0, 3), derive_color(8, 3));
    }

    #[test]
    fn event_color_is_not_a_task_color() {
        let event = event_color();
        for team in 0..8u64 {
            for priority in 1..=5u8 {
                assert_ne!(event.fill, derive_color(team, priority).fill);
            }
        }
    }

    #[test]
    fn border_is_at_least_as_bright_as_fill() {
        let color = derive_color(1, 5);
        assert!(channel_sum(&color.border) > channel_sum(&color.fill));
    }

    #[test]
    fn fills_are_css_hex_strings() {
        let color = derive_color(3, 1);
        assert_eq!(color.fill, "#4363d8");
        assert!(color.border.starts_with('#') && color.border.len() == 7);
    }

    #[test]
    fn out_of_range_priorities_are_clamped() {
        assert_eq!(derive_color(3, 0), derive_color(3, 1));
        assert_eq!(derive_color(3, 9), derive_color(3, 5));
    }
}
