use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    directory::{EmployeeDirectory, logged},
    error::{HrError, HrResult},
    model::{Employee, NewEmployee},
};

const DEMO_ROSTER: &[(&str, &str, &str, &str, (i32, u32, u32), i64)] = &[
    ("E1", "Ann", "Lee", "Eng", (2023, 1, 10), 500_000),
    ("E2", "Bo", "Ray", "Eng", (2022, 5, 1), 600_000),
    ("E3", "Cy", "Tan", "Sales", (2021, 9, 15), 400_000),
    ("E4", "Dee", "Park", "Sales", (2020, 3, 2), 455_000),
    ("E5", "Eli", "Moss", "People", (2024, 7, 22), 380_000),
];

pub fn demo_roster() -> Vec<NewEmployee> {
    DEMO_ROSTER
        .iter()
        .filter_map(|&(id, first, last, department, (y, m, d), salary_cents)| {
            let hire_date = NaiveDate::from_ymd_opt(y, m, d)?;
            Some(NewEmployee::new(
                id,
                first,
                last,
                department,
                hire_date,
                salary_cents,
            ))
        })
        .collect()
}

/// Insert the demo roster, leaving ids that already exist untouched.
/// Returns only the rows inserted by this call.
pub async fn seed_demo(directory: &EmployeeDirectory) -> HrResult<Vec<Employee>> {
    let mut created = Vec::new();
    for employee in demo_roster() {
        match directory.insert_employee(employee).await {
            Ok(record) => created.push(record),
            Err(HrError::Conflict(id)) => debug!(employee_id = %id, "seed row already present"),
            Err(err) => return Err(logged(err)),
        }
    }
    info!(inserted = created.len(), "demo roster seeded");
    Ok(created)
}
