use std::sync::Arc;

use kmt_core::{
    progress::{course_progress, level_progress, LevelProgress},
    progression::{complete_lesson, Completion},
    Catalog, Course, CourseId, LessonId, User, UserId,
};
use log::info;

use crate::{CollabContext, Database, DatabaseError};

/// Keeps track of watched lessons and levels, on top of the stored records.
pub struct ProgressTracker<Db> {
    db: Arc<Db>,
}

impl<Db> ProgressTracker<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    /// Marks a lesson as watched, promoting the user if that finished their level.
    ///
    /// Only visible courses count towards a level. The stored user is updated,
    /// and so is the session if it belongs to them.
    pub async fn mark_video_completed(
        &self,
        user_id: &UserId,
        lesson_id: LessonId,
    ) -> Result<Completion, DatabaseError> {
        let user = self.db.users().get(user_id).await?;
        let courses = self.visible_courses().await?;

        let completion = complete_lesson(&user, lesson_id, Catalog::new(&courses));

        if !completion.recorded {
            return Ok(completion);
        }

        let saved = self.db.users().save(completion.user.clone()).await?;
        self.db.mirror_session(&saved).await?;

        if let Some(level) = completion.promoted_to {
            info!("{} reached the {} level", saved.email, level);
        }

        Ok(completion)
    }

    /// How far the user is through their current level
    pub async fn level_progress(&self, user: &User) -> Result<LevelProgress, DatabaseError> {
        let courses = self.visible_courses().await?;
        Ok(level_progress(user, Catalog::new(&courses)))
    }

    /// Percentage of a course the user has watched
    pub async fn course_progress(
        &self,
        user: &User,
        course_id: CourseId,
    ) -> Result<u8, DatabaseError> {
        let course = self.db.courses().get(&course_id).await?;
        Ok(course_progress(user, &course))
    }

    async fn visible_courses(&self) -> Result<Vec<Course>, DatabaseError> {
        self.db.courses().list(&|c: &Course| c.is_visible).await
    }
}
