use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CourseLevel, Level};

pub type CourseId = u64;
pub type LessonId = u64;

/// Category of the main trading courses, and the default for new courses.
pub const TRADING_PLATFORM_CATEGORY: &str = "tradingPlatform";
/// Editorial category. Courses in it are never locked by level.
pub const NEWS_COURSES_CATEGORY: &str = "newsCourses";
pub const PAID_COURSES_CATEGORY: &str = "paidCourses";
pub const PRAXIS_CATEGORY: &str = "praxis";

/// Every known course category, in their default order.
pub const CATEGORIES: [&str; 4] = [
    TRADING_PLATFORM_CATEGORY,
    NEWS_COURSES_CATEGORY,
    PAID_COURSES_CATEGORY,
    PRAXIS_CATEGORY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Free,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    /// Display only, for example `"15:30"`
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl Lesson {
    pub fn is_free(&self) -> bool {
        self.lesson_type == LessonType::Free
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    #[serde(default = "default_category")]
    pub category_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    pub level: CourseLevel,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub premium_views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    TRADING_PLATFORM_CATEGORY.to_string()
}

fn default_visible() -> bool {
    true
}

impl Course {
    /// Returns true if the course belongs to the editorial category.
    pub fn is_editorial(&self) -> bool {
        self.category_id == NEWS_COURSES_CATEGORY
    }

    pub fn lesson(&self, lesson_id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    pub fn total_lessons(&self) -> usize {
        self.lessons.len()
    }
}

/// A problem found while validating a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    /// The same lesson id appears more than once
    DuplicateLesson {
        lesson_id: LessonId,
        course_ids: Vec<CourseId>,
    },
    /// A course has no lessons, so it can never be completed
    EmptyCourse { course_id: CourseId },
    /// A course has a level we don't know, it will always be locked
    UnknownLevel { course_id: CourseId, level: String },
    /// Two courses share an id
    DuplicateCourse { course_id: CourseId },
}

/// A read-only view over a list of courses.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    courses: &'a [Course],
}

impl<'a> Catalog<'a> {
    pub fn new(courses: &'a [Course]) -> Self {
        Self { courses }
    }

    pub fn courses(&self) -> &'a [Course] {
        self.courses
    }

    pub fn course(&self, course_id: CourseId) -> Option<&'a Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    /// Finds a lesson and the course it belongs to.
    pub fn find_lesson(&self, lesson_id: LessonId) -> Option<(&'a Course, &'a Lesson)> {
        self.courses
            .iter()
            .find_map(|c| c.lesson(lesson_id).map(|l| (c, l)))
    }

    /// All lessons of courses at exactly `level`.
    pub fn lessons_at(&self, level: Level) -> impl Iterator<Item = &'a Lesson> + 'a {
        self.courses
            .iter()
            .filter(move |c| c.level.known() == Some(level))
            .flat_map(|c| c.lessons.iter())
    }

    /// The known levels that at least one course uses, ascending.
    pub fn levels(&self) -> BTreeSet<Level> {
        self.courses.iter().filter_map(|c| c.level.known()).collect()
    }

    /// Checks the shape of the catalog, returning every issue found.
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = vec![];
        let mut seen_courses = HashSet::new();

        for course in self.courses {
            if !seen_courses.insert(course.id) {
                issues.push(CatalogIssue::DuplicateCourse {
                    course_id: course.id,
                });
            }

            if course.lessons.is_empty() {
                issues.push(CatalogIssue::EmptyCourse {
                    course_id: course.id,
                });
            }

            if let CourseLevel::Unknown(level) = &course.level {
                issues.push(CatalogIssue::UnknownLevel {
                    course_id: course.id,
                    level: level.clone(),
                });
            }
        }

        let mut owners: Vec<(LessonId, Vec<CourseId>)> = vec![];

        for course in self.courses {
            for lesson in &course.lessons {
                match owners.iter_mut().find(|(id, _)| *id == lesson.id) {
                    Some((_, course_ids)) => course_ids.push(course.id),
                    None => owners.push((lesson.id, vec![course.id])),
                }
            }
        }

        issues.extend(
            owners
                .into_iter()
                .filter(|(_, course_ids)| course_ids.len() > 1)
                .map(|(lesson_id, course_ids)| CatalogIssue::DuplicateLesson {
                    lesson_id,
                    course_ids,
                }),
        );

        issues
    }
}

fn lesson(id: LessonId, title: &str, lesson_type: LessonType, duration: &str) -> Lesson {
    Lesson {
        id,
        title: title.to_string(),
        lesson_type,
        duration: duration.to_string(),
        video_url: None,
    }
}

/// The catalog a fresh installation starts with.
pub fn default_courses(now: DateTime<Utc>) -> Vec<Course> {
    use LessonType::*;

    vec![
        Course {
            id: 1,
            category_id: TRADING_PLATFORM_CATEGORY.to_string(),
            title: "Trading Fundamentals".to_string(),
            description: "Master the basics of stock and forex trading.".to_string(),
            thumbnail: String::new(),
            level: Level::Beginner.into(),
            lessons: vec![
                lesson(101, "Introduction to Markets", Free, "10:00"),
                lesson(102, "Understanding Candlesticks", Free, "15:30"),
                lesson(103, "Risk Management 101", Premium, "20:00"),
                lesson(104, "Support & Resistance", Premium, "25:00"),
                lesson(105, "Your First Trade", Premium, "12:00"),
            ],
            is_visible: true,
            views: 0,
            premium_views: 0,
            created_at: Some(now),
        },
        Course {
            id: 2,
            category_id: TRADING_PLATFORM_CATEGORY.to_string(),
            title: "Advanced Technical Analysis".to_string(),
            description: "Deep dive into chart patterns and indicators.".to_string(),
            thumbnail: String::new(),
            level: Level::Professional.into(),
            lessons: vec![
                lesson(201, "Fibonacci Retracement", Free, "18:00"),
                lesson(202, "Elliott Wave Theory", Premium, "30:00"),
                lesson(203, "Wyckoff Method", Premium, "45:00"),
                lesson(204, "Order Flow Analysis", Premium, "22:00"),
            ],
            is_visible: true,
            views: 0,
            premium_views: 0,
            created_at: Some(now),
        },
        Course {
            id: 3,
            category_id: NEWS_COURSES_CATEGORY.to_string(),
            title: "Crypto Trading Mystery".to_string(),
            description: "Unlocking the secrets of the blockchain markets.".to_string(),
            thumbnail: String::new(),
            level: Level::Intermediate.into(),
            lessons: vec![
                lesson(301, "Blockchain Basics", Free, "12:00"),
                lesson(302, "DeFi Trading Strategies", Premium, "28:00"),
                lesson(303, "NFT Flipping", Premium, "15:00"),
            ],
            is_visible: true,
            views: 0,
            premium_views: 0,
            created_at: Some(now),
        },
    ]
}
