use crate::{Course, CourseLevel, Lesson, User};

/// The outcome of gating a piece of content for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Unlocked,
    /// The lesson needs a premium subscription
    PremiumRequired,
    /// The user has not reached the level of the course yet
    LevelRequired(CourseLevel),
}

impl Access {
    pub fn is_locked(&self) -> bool {
        !matches!(self, Access::Unlocked)
    }
}

/// Decides whether `user` may watch `lesson` of `course`.
///
/// Rules, first match wins:
/// 1. Free lessons are open to everyone, whatever the course level.
/// 2. Admins and premium users see everything.
/// 3. Editorial courses are never level gated, so a premium lesson there needs a subscription.
/// 4. Otherwise the lesson opens once the user's level reaches the course level.
///    A course level we don't recognize is never reached.
pub fn access(user: &User, lesson: &Lesson, course: &Course) -> Access {
    if lesson.is_free() || user.is_admin() || user.is_premium {
        return Access::Unlocked;
    }

    if course.is_editorial() {
        return Access::PremiumRequired;
    }

    if course.level.exceeds(user.current_level) {
        return Access::LevelRequired(course.level.clone());
    }

    Access::Unlocked
}

pub fn is_locked(user: &User, lesson: &Lesson, course: &Course) -> bool {
    access(user, lesson, course).is_locked()
}

/// Decides whether a whole course shows as locked in the catalog.
///
/// Only level gating applies here, individual premium lessons are gated by [access].
pub fn is_course_locked(user: &User, course: &Course) -> bool {
    if user.is_admin() || user.is_premium || course.is_editorial() {
        return false;
    }

    course.level.exceeds(user.current_level)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::fixtures::{make_course, make_lesson};
    use crate::{Level, LessonType, Role, NEWS_COURSES_CATEGORY, LEVELS};

    fn student(level: Level) -> User {
        let mut user = User::new("u2".into(), "Student".into(), "student@kmt.local".into());
        user.current_level = level;
        user
    }

    fn every_user() -> Vec<User> {
        let mut users = vec![];

        for level in LEVELS {
            for role in [Role::User, Role::Admin] {
                for is_premium in [false, true] {
                    let mut user = student(level);
                    user.role = role;
                    user.is_premium = is_premium;
                    users.push(user);
                }
            }
        }

        users
    }

    fn every_course() -> Vec<Course> {
        let mut courses: Vec<_> = LEVELS
            .into_iter()
            .map(CourseLevel::from)
            .chain([CourseLevel::from("Expert"), CourseLevel::from("")])
            .enumerate()
            .map(|(i, level)| make_course(i as u64, level, vec![]))
            .collect();

        let mut editorial = make_course(99, Level::Professional, vec![]);
        editorial.category_id = NEWS_COURSES_CATEGORY.to_string();
        courses.push(editorial);

        courses
    }

    #[test]
    fn test_premium_lesson_above_level_is_locked() {
        let user = student(Level::Beginner);
        let course = make_course(2, Level::Intermediate, vec![]);

        let premium = make_lesson(1, LessonType::Premium);
        let free = make_lesson(2, LessonType::Free);

        assert!(is_locked(&user, &premium, &course));
        assert_eq!(
            access(&user, &premium, &course),
            Access::LevelRequired(Level::Intermediate.into())
        );
        assert!(!is_locked(&user, &free, &course));
    }

    #[test]
    fn test_premium_lesson_at_level_is_unlocked() {
        let user = student(Level::Intermediate);
        let lesson = make_lesson(1, LessonType::Premium);

        assert!(!is_locked(&user, &lesson, &make_course(1, Level::Beginner, vec![])));
        assert!(!is_locked(&user, &lesson, &make_course(1, Level::Intermediate, vec![])));
        assert!(is_locked(&user, &lesson, &make_course(1, Level::Professional, vec![])));
    }

    #[test]
    fn test_unknown_level_is_locked() {
        let user = student(Level::Professional);
        let lesson = make_lesson(1, LessonType::Premium);
        let course = make_course(1, "Grandmaster", vec![]);

        assert!(is_locked(&user, &lesson, &course));
        assert!(is_course_locked(&user, &course));
    }

    #[test]
    fn test_editorial_courses_only_gate_premium() {
        let user = student(Level::Beginner);
        let mut course = make_course(3, Level::Professional, vec![]);
        course.category_id = NEWS_COURSES_CATEGORY.to_string();

        assert!(!is_course_locked(&user, &course));
        assert!(!is_locked(&user, &make_lesson(1, LessonType::Free), &course));
        assert_eq!(
            access(&user, &make_lesson(2, LessonType::Premium), &course),
            Access::PremiumRequired
        );

        let mut premium_user = user.clone();
        premium_user.is_premium = true;
        assert!(!is_locked(&premium_user, &make_lesson(2, LessonType::Premium), &course));
    }

    #[test]
    fn test_overrides_hold_for_every_combination() {
        let premium = make_lesson(1, LessonType::Premium);
        let free = make_lesson(2, LessonType::Free);

        for user in every_user() {
            for course in every_course() {
                assert!(!is_locked(&user, &free, &course));

                if user.is_admin() {
                    assert!(!is_locked(&user, &premium, &course));
                    assert!(!is_course_locked(&user, &course));
                }

                if user.is_premium {
                    assert!(!is_locked(&user, &premium, &course));
                }
            }
        }
    }

    #[test]
    fn test_course_lock_follows_level() {
        let user = student(Level::Intermediate);

        assert!(!is_course_locked(&user, &make_course(1, Level::Beginner, vec![])));
        assert!(!is_course_locked(&user, &make_course(1, Level::Intermediate, vec![])));
        assert!(is_course_locked(&user, &make_course(1, Level::Professional, vec![])));
    }
}
