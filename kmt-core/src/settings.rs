use serde::{Deserialize, Serialize};

use crate::CATEGORIES;

pub const DEFAULT_HERO_VIDEO_URL: &str = "https://youtu.be/YPPMM-i5ebU";

/// Whether a course category is shown, and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySetting {
    pub id: String,
    pub enabled: bool,
    pub order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Every known category enabled, in declaration order.
pub fn default_category_settings() -> Vec<CategorySetting> {
    CATEGORIES
        .iter()
        .enumerate()
        .map(|(order, id)| CategorySetting {
            id: id.to_string(),
            enabled: true,
            order,
        })
        .collect()
}

/// All settings sorted by their order.
pub fn sorted(settings: &[CategorySetting]) -> Vec<CategorySetting> {
    let mut sorted = settings.to_vec();
    sorted.sort_by_key(|s| s.order);
    sorted
}

/// Enabled categories sorted by their order.
pub fn enabled(settings: &[CategorySetting]) -> Vec<CategorySetting> {
    sorted(settings).into_iter().filter(|s| s.enabled).collect()
}

pub fn set_enabled(settings: &[CategorySetting], id: &str, enabled: bool) -> Vec<CategorySetting> {
    settings
        .iter()
        .cloned()
        .map(|s| {
            if s.id == id {
                CategorySetting { enabled, ..s }
            } else {
                s
            }
        })
        .collect()
}

/// Puts the listed categories first, in the given order, followed by the rest
/// in their previous order. Unknown ids are ignored. Orders are renumbered from 0.
pub fn set_order(settings: &[CategorySetting], ordered_ids: &[&str]) -> Vec<CategorySetting> {
    let listed = ordered_ids
        .iter()
        .filter_map(|id| settings.iter().find(|s| s.id == *id));

    let rest = sorted(settings)
        .into_iter()
        .filter(|s| !ordered_ids.contains(&s.id.as_str()));

    listed
        .cloned()
        .chain(rest)
        .enumerate()
        .map(|(order, s)| CategorySetting { order, ..s })
        .collect()
}

/// Swaps a category with its neighbour. Moving past either end changes nothing.
pub fn move_category(
    settings: &[CategorySetting],
    id: &str,
    direction: Direction,
) -> Vec<CategorySetting> {
    let mut next = sorted(settings);

    let Some(index) = next.iter().position(|s| s.id == id) else {
        return next;
    };

    let other = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|i| *i < next.len()),
    };

    if let Some(other) = other {
        next.swap(index, other);
    }

    next.into_iter()
        .enumerate()
        .map(|(order, s)| CategorySetting { order, ..s })
        .collect()
}

/// The hero video url to store for `url`, falling back to the default when blank.
pub fn normalize_hero_video_url(url: &str) -> String {
    match url.trim() {
        "" => DEFAULT_HERO_VIDEO_URL.to_string(),
        trimmed => trimmed.to_string(),
    }
}
