use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::tasks::repo::Task;
use crate::validation::Validator;

pub const STATUSES: &[&str] = &["open", "in_progress", "done"];

/// Allow-listed list filters plus pagination. Unknown query parameters are
/// ignored by deserialization; only these four are ever read.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_page")]
    pub page: i64,
    pub status: Option<String>,
    pub title: Option<String>,
}

fn default_limit() -> i64 {
    20
}
fn default_page() -> i64 {
    1
}

impl TaskListQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.one_of("status", self.status.as_deref(), STATUSES);
        v.finish()
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require("title", &self.title)
            .max_len("title", &self.title, 200);
        v.one_of("status", self.status.as_deref(), STATUSES);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: i64, page: i64) -> TaskListQuery {
        TaskListQuery {
            limit,
            page,
            status: None,
            title: None,
        }
    }

    #[test]
    fn page_two_of_twenty_five_records() {
        let q = query(10, 2);
        assert_eq!(q.offset(), 10);
        assert_eq!(total_pages(25, q.limit()), 3);
    }

    #[test]
    fn limit_and_page_are_clamped() {
        let q = query(0, 0);
        assert_eq!(q.limit(), 1);
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(), 0);

        let q = query(1000, 3);
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 200);
    }

    #[test]
    fn total_pages_boundaries() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn status_filter_is_allow_listed() {
        let mut q = query(10, 1);
        q.status = Some("open".into());
        assert!(q.validate().is_ok());
        q.status = Some("bogus".into());
        assert!(q.validate().is_err());
    }

    #[test]
    fn create_request_requires_title() {
        let req = CreateTaskRequest {
            title: "  ".into(),
            description: None,
            status: None,
        };
        assert!(req.validate().is_err());

        let req = CreateTaskRequest {
            title: "Write the report".into(),
            description: Some("due friday".into()),
            status: Some("in_progress".into()),
        };
        assert!(req.validate().is_ok());
    }
}
