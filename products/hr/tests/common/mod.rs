#![allow(dead_code)]

use std::{
    io,
    sync::{Arc, Mutex},
};

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use products_hr::{EmployeeDirectory, NewEmployee};
use sea_orm::Database;
use tracing_subscriber::fmt::MakeWriter;

pub async fn empty_directory() -> EmployeeDirectory {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
    EmployeeDirectory::new(conn)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The three-person roster used throughout: two in Eng, one in Sales.
pub fn scenario() -> Vec<NewEmployee> {
    vec![
        NewEmployee::new("E1", "Ann", "Lee", "Eng", date(2023, 1, 10), 500_000),
        NewEmployee::new("E2", "Bo", "Ray", "Eng", date(2022, 5, 1), 600_000),
        NewEmployee::new("E3", "Cy", "Tan", "Sales", date(2021, 9, 15), 400_000),
    ]
}

pub async fn scenario_directory() -> EmployeeDirectory {
    let directory = empty_directory().await;
    for employee in scenario() {
        directory.create_employee(employee).await.unwrap();
    }
    directory
}

pub fn ids(employees: &[products_hr::Employee]) -> Vec<&str> {
    employees.iter().map(|e| e.employee_id.as_str()).collect()
}

/// In-memory sink for log lines emitted while a test holds the guard.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route `WARN` and above on the current thread into this buffer.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut sink) = self.0.lock() {
            sink.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
