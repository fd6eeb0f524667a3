use log::debug;

use crate::{Catalog, Level, LessonId, User};

/// The result of marking a lesson as watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The user after the operation. Equal to the input if nothing changed.
    pub user: User,
    /// False if the lesson was already completed
    pub recorded: bool,
    /// The level the user was promoted to, if any
    pub promoted_to: Option<Level>,
}

impl Completion {
    pub fn promoted(&self) -> bool {
        self.promoted_to.is_some()
    }
}

/// Records `lesson_id` as watched by `user` and promotes them if that finished their level.
///
/// The lesson is recorded even if the catalog doesn't know it, but an unknown lesson can
/// never trigger a promotion on its own. Completing an already completed lesson changes nothing.
pub fn complete_lesson(user: &User, lesson_id: LessonId, catalog: Catalog) -> Completion {
    if user.has_completed(lesson_id) {
        return Completion {
            user: user.clone(),
            recorded: false,
            promoted_to: None,
        };
    }

    let mut updated = user.clone();
    updated.completed_videos.insert(lesson_id);

    let promoted_to = promotion_for(&updated, catalog);

    if let Some(level) = promoted_to {
        debug!(
            "User {} finished {} and moves up to {}",
            updated.id, updated.current_level, level
        );
        updated.current_level = level;
    }

    Completion {
        user: updated,
        recorded: true,
        promoted_to,
    }
}

/// Returns the level `user` should be promoted to, if they have watched every lesson of their current level.
///
/// A level with no lessons at all is never considered finished.
pub fn promotion_for(user: &User, catalog: Catalog) -> Option<Level> {
    let next = user.current_level.next()?;

    let mut lessons = catalog.lessons_at(user.current_level).peekable();
    lessons.peek()?;

    let finished = lessons.all(|lesson| user.has_completed(lesson.id));

    finished.then_some(next)
}
