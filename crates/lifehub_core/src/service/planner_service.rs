//! School planner: courses, assignments and their progress.

use crate::derive::index::{group_by, IdIndex};
use crate::derive::progress::completion_rate;
use crate::model::school::{Assignment, AssignmentDraft, AssignmentPatch, Course, CourseDraft};
use crate::service::facade::EntityFacade;
use crate::service::{require_text, ServiceError, ServiceResult};
use crate::store::backend::DocumentBackend;
use crate::store::client::DocumentStore;
use crate::store::query::Predicate;
use chrono::{Days, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct CourseProgress {
    pub course: Course,
    pub assignments: Vec<Assignment>,
    pub completed: usize,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOverview {
    pub courses: Vec<CourseProgress>,
    /// Assignments whose `course_id` matches no course.
    pub orphaned: Vec<Assignment>,
}

pub struct PlannerService<'s, B: DocumentBackend> {
    courses: EntityFacade<'s, B, Course>,
    assignments: EntityFacade<'s, B, Assignment>,
}

impl<'s, B: DocumentBackend> PlannerService<'s, B> {
    pub fn new(store: &'s DocumentStore<B>, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        Self {
            courses: EntityFacade::new(store, owner.clone()),
            assignments: EntityFacade::new(store, owner),
        }
    }

    pub fn add_course(&self, draft: &CourseDraft) -> ServiceResult<Course> {
        require_text("course name", &draft.name)?;
        Ok(self.courses.create(draft)?)
    }

    /// Adds an assignment to an existing course.
    pub fn add_assignment(&self, draft: &AssignmentDraft) -> ServiceResult<Assignment> {
        require_text("assignment title", &draft.title)?;
        if self.courses.get(&draft.course_id)?.is_none() {
            return Err(ServiceError::not_found("course", &draft.course_id));
        }
        Ok(self.assignments.create(draft)?)
    }

    pub fn set_completed(&self, assignment_id: &str, completed: bool) -> ServiceResult<Assignment> {
        let patch = AssignmentPatch {
            completed: Some(completed),
            ..AssignmentPatch::default()
        };
        Ok(self.assignments.update(assignment_id, &patch)?)
    }

    /// Courses with their assignments and completion rates.
    pub fn course_overview(&self) -> ServiceResult<PlannerOverview> {
        let courses = self.courses.list()?;
        let assignments = self.assignments.list()?;

        let course_index = IdIndex::build(&courses);
        let by_course = group_by(&assignments, |assignment| assignment.course_id.as_str());

        let progress = courses
            .iter()
            .map(|course| {
                let assignments: Vec<Assignment> = by_course
                    .get(course.id.as_str())
                    .map(|items| items.iter().map(|&item| item.clone()).collect())
                    .unwrap_or_default();
                let completed = assignments.iter().filter(|item| item.completed).count();
                CourseProgress {
                    course: course.clone(),
                    completion_rate: completion_rate(completed, assignments.len()),
                    completed,
                    assignments,
                }
            })
            .collect();
        let orphaned = assignments
            .iter()
            .filter(|assignment| !course_index.contains(&assignment.course_id))
            .cloned()
            .collect();

        Ok(PlannerOverview {
            courses: progress,
            orphaned,
        })
    }

    /// Open assignments due within `days` days from `today`, inclusive,
    /// soonest first.
    pub fn upcoming(&self, today: NaiveDate, days: u32) -> ServiceResult<Vec<Assignment>> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| ServiceError::InvalidInput(format!("window of {days} days overflows")))?;
        Ok(self.assignments.select(vec![
            Predicate::eq("completed", false),
            Predicate::ge("due_date", today.to_string()),
            Predicate::le("due_date", until.to_string()),
        ])?)
    }
}
