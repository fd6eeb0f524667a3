use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use kmt_collab::{Collab, Credentials, Database, LessonAccess, NewSignup};
use kmt_core::{
    gate::{self, Access},
    progress::course_progress,
    Course, CourseId, LessonId, LessonType, User, UserId,
};

#[derive(Parser)]
#[command(name = "kmt")]
#[command(about = "KMT Trade Platform academy from the terminal")]
pub struct Cli {
    /// Show debug messages
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a student account and log in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the logged in user
    Whoami,
    /// List the visible courses by category
    Courses,
    /// List the lessons of a course and whether they can be watched
    Lessons { course: CourseId },
    /// Watch a lesson, counting it towards the current level
    Watch { lesson: LessonId },
    /// Show how far the current level is done
    Progress,
    News,
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// List every user
    Users,
    /// Grant or revoke premium
    Premium {
        user: UserId,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Show a hidden course or hide a visible one
    CourseVisibility { course: CourseId },
    /// Show the hero video, or replace it
    HeroVideo { url: Option<String> },
    /// Report problems with the stored catalog
    Validate,
}

pub async fn execute<Db: Database>(command: Command, collab: &Collab<Db>) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = collab
                .auth
                .login(Credentials { email, password })
                .await?;
            println!("Welcome back, {}!", user.name.bold());
        }
        Command::Signup {
            name,
            email,
            password,
        } => {
            let user = collab
                .auth
                .signup(NewSignup {
                    name,
                    email,
                    password,
                })
                .await?;
            println!("Welcome, {}! You start at the {} level.", user.name.bold(), user.current_level);
        }
        Command::Logout => {
            collab.auth.logout().await?;
            println!("Logged out.");
        }
        Command::Whoami => match collab.auth.current_user().await? {
            Some(user) => print_user(&user),
            None => println!("Not logged in."),
        },
        Command::Courses => courses(collab).await?,
        Command::Lessons { course } => lessons(collab, course).await?,
        Command::Watch { lesson } => watch(collab, lesson).await?,
        Command::Progress => progress(collab).await?,
        Command::News => news(collab).await?,
        Command::Admin { command } => admin(collab, command).await?,
    }

    Ok(())
}

async fn require_user<Db: Database>(collab: &Collab<Db>) -> Result<User> {
    match collab.auth.current_user().await? {
        Some(user) => Ok(user),
        None => bail!("You need to log in first"),
    }
}

/// Hidden courses only exist for admins
fn ensure_visible(user: &User, course: &Course) -> Result<()> {
    if !course.is_visible && !user.is_admin() {
        bail!("Course {} doesn't exist", course.id);
    }

    Ok(())
}

async fn courses<Db: Database>(collab: &Collab<Db>) -> Result<()> {
    let user = collab.auth.current_user().await?;
    let courses = collab.catalog.visible_courses().await?;

    for category in collab.categories.categories().await? {
        let in_category: Vec<_> = courses
            .iter()
            .filter(|c| c.category_id == category.id)
            .collect();

        if in_category.is_empty() {
            continue;
        }

        println!("{}", category.id.bold().underline());

        for course in in_category {
            let status = match &user {
                Some(user) if gate::is_course_locked(user, course) => "locked".red().to_string(),
                Some(user) => format!("{}%", course_progress(user, course)).green().to_string(),
                None => String::new(),
            };

            println!(
                "  [{}] {} ({}, {} lessons) {}",
                course.id,
                course.title,
                course.level,
                course.total_lessons(),
                status
            );
        }
    }

    Ok(())
}

async fn lessons<Db: Database>(collab: &Collab<Db>, course_id: CourseId) -> Result<()> {
    let user = require_user(collab).await?;
    let course = collab.catalog.course(course_id).await?;

    ensure_visible(&user, &course)?;

    println!("{} ({})", course.title.bold(), course.level);

    for LessonAccess {
        lesson,
        access,
        completed,
    } in collab.catalog.lessons_for(&user, course_id).await?
    {
        let kind = match lesson.lesson_type {
            LessonType::Free => "free".cyan(),
            LessonType::Premium => "premium".yellow(),
        };

        let state = match (&access, completed) {
            (_, true) => "watched".green().to_string(),
            (Access::Unlocked, false) => String::new(),
            (Access::PremiumRequired, false) => "needs premium".red().to_string(),
            (Access::LevelRequired(level), false) => format!("needs {level}").red().to_string(),
        };

        println!(
            "  [{}] {} {} {} {}",
            lesson.id, lesson.title, lesson.duration, kind, state
        );
    }

    Ok(())
}

async fn watch<Db: Database>(collab: &Collab<Db>, lesson_id: LessonId) -> Result<()> {
    let user = require_user(collab).await?;
    let (course, lesson) = collab
        .catalog
        .find_lesson(lesson_id)
        .await
        .with_context(|| format!("Lesson {lesson_id} doesn't exist"))?;

    ensure_visible(&user, &course)?;

    match gate::access(&user, &lesson, &course) {
        Access::Unlocked => {}
        Access::PremiumRequired => bail!("\"{}\" needs a premium subscription", lesson.title),
        Access::LevelRequired(level) => {
            bail!("\"{}\" opens at the {} level", lesson.title, level)
        }
    }

    collab.catalog.record_view(course.id, user.is_premium).await?;

    if let Some(video_url) = &lesson.video_url {
        println!("Playing {} ({})", lesson.title.bold(), video_url);
    } else {
        println!("Playing {}", lesson.title.bold());
    }

    let completion = collab
        .progress
        .mark_video_completed(&user.id, lesson.id)
        .await?;

    if let Some(level) = completion.promoted_to {
        println!(
            "{} You reached the {} level.",
            "Congratulations!".green().bold(),
            level
        );
    }

    Ok(())
}

async fn progress<Db: Database>(collab: &Collab<Db>) -> Result<()> {
    let user = require_user(collab).await?;
    let progress = collab.progress.level_progress(&user).await?;

    match progress.next {
        Some(next) if progress.total > 0 => println!(
            "{}: {} of {} lessons watched, {} to go until {}",
            progress.level,
            progress.completed,
            progress.total,
            progress.remaining(),
            next
        ),
        Some(_) => println!("{}: no lessons available yet", progress.level),
        None => println!("{}: top level reached", progress.level),
    }

    Ok(())
}

async fn news<Db: Database>(collab: &Collab<Db>) -> Result<()> {
    for item in collab.news.list().await? {
        println!(
            "{} {}",
            item.created_at.format("%Y-%m-%d").to_string().bright_black(),
            item.title.bold()
        );

        if !item.description.is_empty() {
            println!("  {}", item.description);
        }
    }

    Ok(())
}

async fn admin<Db: Database>(collab: &Collab<Db>, command: AdminCommand) -> Result<()> {
    let user = require_user(collab).await?;

    if !user.is_admin() {
        bail!("Only admins can do that");
    }

    match command {
        AdminCommand::Users => {
            for user in collab.users.list_users().await? {
                print_user(&user);
            }
        }
        AdminCommand::Premium { user, enabled } => {
            let user = collab.users.set_premium(&user, enabled).await?;
            println!("{} premium: {}", user.email, user.is_premium);
        }
        AdminCommand::CourseVisibility { course } => {
            let visible = collab.catalog.toggle_visibility(course).await?;
            println!(
                "Course {} is now {}",
                course,
                if visible { "visible" } else { "hidden" }
            );
        }
        AdminCommand::HeroVideo { url: Some(url) } => {
            let url = collab.settings.set_hero_video_url(&url).await?;
            println!("Hero video set to {url}");
        }
        AdminCommand::HeroVideo { url: None } => {
            println!("{}", collab.settings.hero_video_url().await?);

            if let Some(embed) = collab.settings.hero_embed_url().await? {
                println!("{}", embed.bright_black());
            }
        }
        AdminCommand::Validate => {
            let issues = collab.catalog.validate().await?;

            if issues.is_empty() {
                println!("No issues found.");
            }

            for issue in issues {
                println!("{issue:?}");
            }
        }
    }

    Ok(())
}

fn print_user(user: &User) {
    let mut badges = Vec::new();

    if user.is_admin() {
        badges.push("admin".red().to_string());
    }

    if user.is_premium {
        badges.push("premium".yellow().to_string());
    }

    println!(
        "{} {} <{}> {} ({} lessons watched) {}",
        user.id.bright_black(),
        user.name.bold(),
        user.email,
        user.current_level,
        user.completed_videos.len(),
        badges.join(" ")
    );
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["kmt", "watch", "101"]).unwrap();
        assert!(matches!(cli.command, Command::Watch { lesson: 101 }));

        let cli =
            Cli::try_parse_from(["kmt", "--verbose", "admin", "premium", "u2", "true"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Admin {
                command: AdminCommand::Premium { enabled: true, .. }
            }
        ));

        assert!(Cli::try_parse_from(["kmt", "lessons", "abc"]).is_err());
    }

    #[test]
    fn test_hidden_courses_are_admin_only() {
        let config = kmt_core::Config::default();
        let mut courses = kmt_core::default_courses(chrono::Utc::now());
        let users = kmt_core::default_users(&config);
        let (admin, student) = (&users[0], &users[1]);

        assert!(ensure_visible(student, &courses[0]).is_ok());

        courses[0].is_visible = false;
        assert!(ensure_visible(student, &courses[0]).is_err());
        assert!(ensure_visible(admin, &courses[0]).is_ok());
    }
}
