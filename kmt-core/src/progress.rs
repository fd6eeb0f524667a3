use crate::{Catalog, Course, Level, User};

/// How far a user is through the lessons of their current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: Level,
    pub completed: usize,
    pub total: usize,
    /// The level finishing this one unlocks
    pub next: Option<Level>,
}

impl LevelProgress {
    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }
}

/// Percentage of `course` the user has watched, rounded down.
/// An empty course counts as not started.
pub fn course_progress(user: &User, course: &Course) -> u8 {
    let total = course.lessons.len();

    if total == 0 {
        return 0;
    }

    let completed = course
        .lessons
        .iter()
        .filter(|l| user.has_completed(l.id))
        .count();

    (completed * 100 / total) as u8
}

pub fn level_progress(user: &User, catalog: Catalog) -> LevelProgress {
    let (completed, total) = catalog
        .lessons_at(user.current_level)
        .fold((0, 0), |(completed, total), lesson| {
            let done = user.has_completed(lesson.id) as usize;
            (completed + done, total + 1)
        });

    LevelProgress {
        level: user.current_level,
        completed,
        total,
        next: user.current_level.next(),
    }
}
