//! HR vertical slice: employee records and payroll analytics on top of the
//! `employees` table.

mod analytics;
mod directory;
mod error;
mod model;
mod seed;

pub use analytics::{DepartmentSalarySummary, PayrollOverview};
pub use directory::EmployeeDirectory;
pub use error::{HrError, HrResult};
pub use model::{
    DepartmentFilter, Employee, EmployeeChanges, EmployeeQuery, EmployeeSort, NewEmployee,
};
pub use seed::{demo_roster, seed_demo};
