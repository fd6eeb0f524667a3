use std::sync::Arc;

use chrono::Utc;
use kmt_core::{
    gate::{self, Access},
    Catalog, CatalogIssue, Course, CourseId, CourseLevel, Lesson, LessonId, LessonType, User,
    TRADING_PLATFORM_CATEGORY,
};
use log::{info, warn};
use thiserror::Error;

use crate::{util::next_id, CollabContext, Database, DatabaseError};

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The course data is incomplete or conflicts with the catalog
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// A lesson of a course, along with whether a user can watch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonAccess {
    pub lesson: Lesson,
    pub access: Access,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub lesson_type: LessonType,
    pub duration: String,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Defaults to the main trading category
    pub category_id: Option<String>,
    pub level: CourseLevel,
    pub lessons: Vec<NewLesson>,
}

/// Changes to a course. Fields left as [None] are kept.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub category_id: Option<String>,
    pub level: Option<CourseLevel>,
}

/// Supplies the course catalog and lets admins manage it.
pub struct CatalogManager<Db> {
    db: Arc<Db>,
}

impl<Db> CatalogManager<Db>
where
    Db: Database,
{
    pub fn new(context: &CollabContext<Db>) -> Self {
        Self {
            db: context.database.clone(),
        }
    }

    /// Courses students can see
    pub async fn visible_courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.db.courses().list(&|c: &Course| c.is_visible).await?)
    }

    /// Every course, hidden ones included
    pub async fn all_courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.db.courses().all().await?)
    }

    pub async fn course(&self, course_id: CourseId) -> Result<Course, CatalogError> {
        Ok(self.db.courses().get(&course_id).await?)
    }

    /// Lists the lessons of a course with their lock state for `user`
    pub async fn lessons_for(
        &self,
        user: &User,
        course_id: CourseId,
    ) -> Result<Vec<LessonAccess>, CatalogError> {
        let course = self.course(course_id).await?;

        Ok(course
            .lessons
            .iter()
            .map(|lesson| LessonAccess {
                lesson: lesson.clone(),
                access: gate::access(user, lesson, &course),
                completed: user.has_completed(lesson.id),
            })
            .collect())
    }

    /// Finds the course a lesson belongs to
    pub async fn find_lesson(&self, lesson_id: LessonId) -> Result<(Course, Lesson), CatalogError> {
        let courses = self.all_courses().await?;

        Catalog::new(&courses)
            .find_lesson(lesson_id)
            .map(|(course, lesson)| (course.clone(), lesson.clone()))
            .ok_or_else(|| DatabaseError::not_found("lesson", lesson_id).into())
    }

    pub async fn add_course(&self, new_course: NewCourse) -> Result<Course, CatalogError> {
        let title = new_course.title.trim().to_string();

        if title.is_empty() {
            return Err(CatalogError::Invalid("Course title is required".to_string()));
        }

        let courses = self.all_courses().await?;
        let id = next_id(courses.iter().map(|c| c.id))?;
        let first_lesson_id = self.next_lesson_id(&courses).await?;

        let lessons = new_course
            .lessons
            .into_iter()
            .zip(first_lesson_id..)
            .map(|(lesson, id)| into_lesson(id, lesson))
            .collect();

        let course = Course {
            id,
            category_id: new_course
                .category_id
                .unwrap_or_else(|| TRADING_PLATFORM_CATEGORY.to_string()),
            title,
            description: new_course.description,
            thumbnail: new_course.thumbnail,
            level: new_course.level,
            lessons,
            is_visible: true,
            views: 0,
            premium_views: 0,
            created_at: Some(Utc::now()),
        };

        let course = self.db.courses().save(course).await?;
        info!("Added course {} ({})", course.id, course.title);

        self.report_issues().await?;
        Ok(course)
    }

    pub async fn update_course(
        &self,
        course_id: CourseId,
        patch: CoursePatch,
    ) -> Result<Course, CatalogError> {
        let mut course = self.course(course_id).await?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();

            if title.is_empty() {
                return Err(CatalogError::Invalid("Course title is required".to_string()));
            }

            course.title = title;
        }

        if let Some(description) = patch.description {
            course.description = description;
        }

        if let Some(thumbnail) = patch.thumbnail {
            course.thumbnail = thumbnail;
        }

        if let Some(category_id) = patch.category_id {
            course.category_id = category_id;
        }

        if let Some(level) = patch.level {
            course.level = level;
        }

        Ok(self.db.courses().save(course).await?)
    }

    /// Appends a lesson to a course, with an id unique across the catalog
    pub async fn add_lesson(
        &self,
        course_id: CourseId,
        new_lesson: NewLesson,
    ) -> Result<Lesson, CatalogError> {
        let courses = self.all_courses().await?;

        let mut course = courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found("course", course_id))?;

        let lesson = into_lesson(self.next_lesson_id(&courses).await?, new_lesson);
        course.lessons.push(lesson.clone());

        self.db.courses().save(course).await?;
        Ok(lesson)
    }

    pub async fn remove_lesson(
        &self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<(), CatalogError> {
        let mut course = self.course(course_id).await?;

        let index = course
            .lessons
            .iter()
            .position(|l| l.id == lesson_id)
            .ok_or_else(|| DatabaseError::not_found("lesson", lesson_id))?;

        course.lessons.remove(index);
        self.db.courses().save(course).await?;

        self.report_issues().await?;
        Ok(())
    }

    pub async fn delete_course(&self, course_id: CourseId) -> Result<(), CatalogError> {
        self.db.courses().delete(&course_id).await?;
        info!("Deleted course {}", course_id);

        Ok(())
    }

    /// Hides a visible course or shows a hidden one, returning the new visibility
    pub async fn toggle_visibility(&self, course_id: CourseId) -> Result<bool, CatalogError> {
        let mut course = self.course(course_id).await?;
        course.is_visible = !course.is_visible;

        let course = self.db.courses().save(course).await?;
        Ok(course.is_visible)
    }

    /// Counts a view of a course, separately tracking views by premium users
    pub async fn record_view(&self, course_id: CourseId, premium: bool) -> Result<(), CatalogError> {
        let mut course = self.course(course_id).await?;

        course.views += 1;
        if premium {
            course.premium_views += 1;
        }

        self.db.courses().save(course).await?;
        Ok(())
    }

    /// Checks the stored catalog for problems that would break gating or progression
    pub async fn validate(&self) -> Result<Vec<CatalogIssue>, CatalogError> {
        let courses = self.all_courses().await?;
        Ok(Catalog::new(&courses).validate())
    }

    /// A lesson id that was never handed out before. Ids recorded as watched by
    /// any user count as taken, so a removed lesson's id is never reused.
    async fn next_lesson_id(&self, courses: &[Course]) -> Result<LessonId, CatalogError> {
        let users = self.db.users().all().await?;

        let in_catalog = courses.iter().flat_map(|c| c.lessons.iter().map(|l| l.id));
        let watched = users.iter().flat_map(|u| u.completed_videos.iter().copied());

        Ok(next_id(in_catalog.chain(watched))?)
    }

    async fn report_issues(&self) -> Result<(), CatalogError> {
        for issue in self.validate().await? {
            warn!("Catalog issue: {:?}", issue);
        }

        Ok(())
    }
}

fn into_lesson(id: LessonId, new_lesson: NewLesson) -> Lesson {
    Lesson {
        id,
        title: new_lesson.title,
        lesson_type: new_lesson.lesson_type,
        duration: new_lesson.duration,
        video_url: new_lesson.video_url,
    }
}

#[cfg(test)]
mod test {
    use kmt_core::{Config, Level};

    use super::*;
    use crate::{Collab, MemoryDatabase};

    fn collab() -> Collab<MemoryDatabase> {
        let config = Config::instant();
        let db = MemoryDatabase::in_memory(&config).unwrap();

        Collab::new(db, config)
    }

    fn new_lesson(title: &str, lesson_type: LessonType) -> NewLesson {
        NewLesson {
            title: title.to_string(),
            lesson_type,
            duration: "10:00".to_string(),
            video_url: None,
        }
    }

    fn new_course(title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            description: "Charts all day".to_string(),
            thumbnail: String::new(),
            category_id: None,
            level: Level::Intermediate.into(),
            lessons: vec![
                new_lesson("One", LessonType::Free),
                new_lesson("Two", LessonType::Premium),
            ],
        }
    }

    #[tokio::test]
    async fn test_seeded_catalog() {
        let collab = collab();

        let courses = collab.catalog.visible_courses().await.unwrap();
        assert_eq!(courses.len(), 3);
        assert!(collab.catalog.validate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_course_assigns_ids() {
        let collab = collab();

        let course = collab.catalog.add_course(new_course(" Swing Trading ")).await.unwrap();

        assert_eq!(course.id, 4);
        assert_eq!(course.title, "Swing Trading");
        assert_eq!(course.category_id, TRADING_PLATFORM_CATEGORY);
        assert!(course.is_visible);
        assert_eq!(course.views, 0);
        assert!(course.created_at.is_some());

        let ids: Vec<_> = course.lessons.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![304, 305]);
        assert!(collab.catalog.validate().await.unwrap().is_empty());

        let result = collab.catalog.add_course(new_course("  ")).await;
        assert!(matches!(result, Err(CatalogError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_update_course_keeps_unpatched_fields() {
        let collab = collab();

        let patch = CoursePatch {
            title: Some("Trading Basics".to_string()),
            level: Some(Level::Intermediate.into()),
            ..Default::default()
        };
        let course = collab.catalog.update_course(1, patch).await.unwrap();

        assert_eq!(course.title, "Trading Basics");
        assert_eq!(course.level, CourseLevel::Known(Level::Intermediate));
        assert_eq!(course.lessons.len(), 5);
        assert_eq!(course.description, "Master the basics of stock and forex trading.");
    }

    #[tokio::test]
    async fn test_visibility_and_deletion() {
        let collab = collab();

        assert!(!collab.catalog.toggle_visibility(2).await.unwrap());
        assert_eq!(collab.catalog.visible_courses().await.unwrap().len(), 2);
        assert_eq!(collab.catalog.all_courses().await.unwrap().len(), 3);

        assert!(collab.catalog.toggle_visibility(2).await.unwrap());

        collab.catalog.delete_course(2).await.unwrap();
        assert!(matches!(
            collab.catalog.course(2).await,
            Err(CatalogError::Db(DatabaseError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_record_view() {
        let collab = collab();

        collab.catalog.record_view(1, false).await.unwrap();
        collab.catalog.record_view(1, true).await.unwrap();

        let course = collab.catalog.course(1).await.unwrap();
        assert_eq!(course.views, 2);
        assert_eq!(course.premium_views, 1);
    }

    #[tokio::test]
    async fn test_lessons_for_beginner_in_intermediate_course() {
        let collab = collab();
        let course = collab.catalog.add_course(new_course("Swing Trading")).await.unwrap();
        let student = collab
            .database()
            .users()
            .get(&"u2".to_string())
            .await
            .unwrap();

        let lessons = collab.catalog.lessons_for(&student, course.id).await.unwrap();

        assert_eq!(lessons[0].access, Access::Unlocked);
        assert_eq!(
            lessons[1].access,
            Access::LevelRequired(Level::Intermediate.into())
        );
        assert!(!lessons[0].completed);
    }

    #[tokio::test]
    async fn test_lesson_management() {
        let collab = collab();

        let lesson = collab
            .catalog
            .add_lesson(3, new_lesson("Stablecoins", LessonType::Premium))
            .await
            .unwrap();
        assert_eq!(lesson.id, 304);

        let (course, found) = collab.catalog.find_lesson(304).await.unwrap();
        assert_eq!(course.id, 3);
        assert_eq!(found.title, "Stablecoins");

        collab.catalog.remove_lesson(3, 304).await.unwrap();
        assert!(collab.catalog.find_lesson(304).await.is_err());
        assert!(collab.catalog.remove_lesson(3, 304).await.is_err());
    }

    #[tokio::test]
    async fn test_removed_lesson_ids_are_not_reused() {
        let collab = collab();
        let student = "u2".to_string();

        let watched = collab
            .catalog
            .add_lesson(3, new_lesson("Stablecoins", LessonType::Free))
            .await
            .unwrap();
        collab
            .progress
            .mark_video_completed(&student, watched.id)
            .await
            .unwrap();
        collab.catalog.remove_lesson(3, watched.id).await.unwrap();

        let replacement = collab
            .catalog
            .add_lesson(1, new_lesson("Position Sizing", LessonType::Premium))
            .await
            .unwrap();
        assert_ne!(replacement.id, watched.id);

        let user = collab.users.user(&student).await.unwrap();
        assert!(!user.has_completed(replacement.id));

        let course = collab.catalog.add_course(new_course("Options")).await.unwrap();
        assert!(course
            .lessons
            .iter()
            .all(|l| !user.has_completed(l.id) && l.id != replacement.id));
    }
}
