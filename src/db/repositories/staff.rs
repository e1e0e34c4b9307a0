use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::parse_optional_date,
    models::Staff,
};

/// Read access to staff records.
#[async_trait]
pub trait StaffLookup: Send + Sync {
    async fn get_single_staff(&self, staff_id: &str) -> Result<Option<Staff>>;
}

const STAFF_COLUMNS: &str = "staff_id, first_name, last_name, email, hire_date, job_title, \
     dept_name, salary, phone, manager_id, status";

fn row_to_staff(row: &Row) -> Result<Staff> {
    let hire_date: Option<String> = row.get("hire_date")?;

    Ok(Staff {
        staff_id: row.get("staff_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        hire_date: parse_optional_date(hire_date, "hire_date")?,
        job_title: row.get("job_title")?,
        dept_name: row.get("dept_name")?,
        salary: row.get("salary")?,
        phone: row.get("phone")?,
        manager_id: row.get("manager_id")?,
        status: row.get("status")?,
    })
}

impl Database {
    pub async fn get_single_staff(&self, staff_id: &str) -> Result<Option<Staff>> {
        let staff_id = staff_id.to_string();
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = ?1"))?;
            let raw = stmt
                .query_row(params![staff_id], |row| Ok(row_to_staff(row)))
                .optional()?;
            raw.transpose()
        })
        .await
    }
}

#[async_trait]
impl StaffLookup for Database {
    async fn get_single_staff(&self, staff_id: &str) -> Result<Option<Staff>> {
        Database::get_single_staff(self, staff_id).await
    }
}
