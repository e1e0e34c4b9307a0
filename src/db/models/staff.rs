//! Staff records used to personalise the first chat message.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub staff_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub job_title: Option<String>,
    pub dept_name: String,
    pub salary: Option<f64>,
    pub phone: Option<String>,
    pub manager_id: Option<String>,
    pub status: String,
}

impl Staff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
