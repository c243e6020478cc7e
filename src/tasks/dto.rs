use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TaskIdQuery {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub done: Option<bool>,
}
