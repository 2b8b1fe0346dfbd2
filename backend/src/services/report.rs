//! Attendance reporting.
//!
//! Reports read attendance rows over a range and re-derive late/early minutes
//! from each department's *current* shift policy. A report generated after a
//! policy change therefore reflects the new policy, not the one in force when
//! the employee clocked in. Zero denominators produce zero, never an error.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use crate::{
    error::AppError,
    models::{
        attendance::{AttendanceDetail, AttendanceFilter, AttendanceStatus},
        employee::Employee,
        report::{
            AttendanceReportRow, CsvExport, DepartmentReport, DepartmentSummary,
            EmployeeMonthlyStats, EmployeeReportEntry, ReportQuery, SummaryReport,
        },
    },
    repositories::{
        attendance::AttendanceRepositoryTrait, department::DepartmentRepositoryTrait,
        employee::EmployeeRepositoryTrait,
    },
    types::DepartmentId,
    utils::{
        csv::{render_csv, render_sectioned_csv},
        time::{in_timezone, Clock},
    },
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Number of calendar days in `month` of `year`, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// One report row per attendance record.
pub fn attendance_rows(details: &[AttendanceDetail], tz: &Tz) -> Vec<AttendanceReportRow> {
    details
        .iter()
        .map(|detail| {
            let verdict = detail.verdict(tz);
            AttendanceReportRow {
                employee_id: detail.employee_code.clone(),
                employee_name: detail.employee_name.clone(),
                department: detail.department_name.clone(),
                date: detail.clock_in_date,
                clock_in: detail.clock_in,
                clock_out: detail.clock_out,
                work_hours: detail.work_hours,
                status: detail.status,
                late_minutes: verdict.late_minutes,
                early_minutes: verdict.early_minutes,
            }
        })
        .collect()
}

/// Range summary. Absence is `employees - present rows`, floored at zero;
/// it does not account for employees joining or leaving mid-range.
pub fn summarize(
    period: String,
    total_employees: i64,
    details: &[AttendanceDetail],
) -> SummaryReport {
    let total_present = details.len() as i64;
    let total_late = details
        .iter()
        .filter(|detail| detail.status == AttendanceStatus::Late)
        .count() as i64;
    let hours: Vec<f64> = details.iter().filter_map(|detail| detail.work_hours).collect();
    let total_work_hours: f64 = hours.iter().sum();

    SummaryReport {
        period,
        total_employees,
        total_present,
        total_late,
        total_absent: (total_employees - total_present).max(0),
        total_work_hours: round2(total_work_hours),
        average_work_hours: round2(ratio(total_work_hours, hours.len() as f64)),
    }
}

/// Monthly block for one employee. Every calendar day counts as a work day.
pub fn monthly_stats(days_in_month: u32, rows: &[&AttendanceDetail]) -> EmployeeMonthlyStats {
    let total_present = rows.len() as i64;
    let total_late = rows
        .iter()
        .filter(|row| row.status == AttendanceStatus::Late)
        .count() as i64;
    let hours: Vec<f64> = rows.iter().filter_map(|row| row.work_hours).collect();
    let total_work_days = i64::from(days_in_month);

    EmployeeMonthlyStats {
        total_present,
        total_late,
        total_absent: (total_work_days - total_present).max(0),
        avg_work_hours: round2(ratio(hours.iter().sum(), hours.len() as f64)),
        total_work_days,
    }
}

pub fn department_summary(entries: &[EmployeeReportEntry]) -> DepartmentSummary {
    let total_present: i64 = entries.iter().map(|entry| entry.stats.total_present).sum();
    let total_late: i64 = entries.iter().map(|entry| entry.stats.total_late).sum();
    let total_absent: i64 = entries.iter().map(|entry| entry.stats.total_absent).sum();
    let hours: f64 = entries.iter().map(|entry| entry.stats.avg_work_hours).sum();

    DepartmentSummary {
        total_present,
        total_late,
        total_absent,
        attendance_rate: round2(
            ratio(total_present as f64, (total_present + total_absent) as f64) * 100.0,
        ),
        average_work_hours: round2(ratio(hours, entries.len() as f64)),
    }
}

/// Builds the per-employee blocks for a month. Employees without rows get
/// an all-absent block.
pub fn employee_entries(
    employees: &[Employee],
    details: &[AttendanceDetail],
    days: u32,
) -> Vec<EmployeeReportEntry> {
    let mut by_employee: BTreeMap<&str, Vec<&AttendanceDetail>> = BTreeMap::new();
    for detail in details {
        by_employee
            .entry(detail.employee_code.as_str())
            .or_default()
            .push(detail);
    }

    employees
        .iter()
        .map(|employee| {
            let rows = by_employee
                .get(employee.employee_code.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            EmployeeReportEntry {
                employee_id: employee.employee_code.clone(),
                employee_name: employee.name.clone(),
                stats: monthly_stats(days, rows),
            }
        })
        .collect()
}

fn format_hours(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn attendance_csv(rows: &[AttendanceReportRow], tz: &Tz) -> anyhow::Result<String> {
    let records: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.employee_id.clone(),
                row.employee_name.clone(),
                row.department.clone(),
                row.date.format("%Y-%m-%d").to_string(),
                in_timezone(row.clock_in, tz)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                row.clock_out
                    .map(|at| in_timezone(at, tz).format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                row.work_hours.map(format_hours).unwrap_or_default(),
                row.status.as_str().to_string(),
                row.late_minutes.to_string(),
                row.early_minutes.to_string(),
            ]
        })
        .collect();
    render_csv(
        &[
            "Employee ID",
            "Employee Name",
            "Department",
            "Date",
            "Clock In",
            "Clock Out",
            "Work Hours",
            "Status",
            "Late Minutes",
            "Early Minutes",
        ],
        &records,
    )
}

pub fn summary_csv(summary: &SummaryReport) -> anyhow::Result<String> {
    render_csv(
        &["Metric", "Value"],
        &[
            vec!["Period".into(), summary.period.clone()],
            vec!["Total Employees".into(), summary.total_employees.to_string()],
            vec!["Total Present".into(), summary.total_present.to_string()],
            vec!["Total Late".into(), summary.total_late.to_string()],
            vec!["Total Absent".into(), summary.total_absent.to_string()],
            vec!["Total Work Hours".into(), format_hours(summary.total_work_hours)],
            vec![
                "Average Work Hours".into(),
                format_hours(summary.average_work_hours),
            ],
        ],
    )
}

pub fn department_csv(report: &DepartmentReport) -> anyhow::Result<String> {
    let header = vec![
        vec!["Department Report".to_string()],
        vec!["Department".into(), report.department_name.clone()],
        vec!["Period".into(), report.period.clone()],
        vec!["Total Employees".into(), report.total_employees.to_string()],
    ];
    let summary = &report.summary;
    let totals = vec![
        vec!["Summary Statistics".to_string()],
        vec!["Total Present".into(), summary.total_present.to_string()],
        vec!["Total Late".into(), summary.total_late.to_string()],
        vec!["Total Absent".into(), summary.total_absent.to_string()],
        vec![
            "Attendance Rate".into(),
            format!("{:.2}%", summary.attendance_rate),
        ],
        vec![
            "Average Work Hours".into(),
            format_hours(summary.average_work_hours),
        ],
    ];
    let mut employees = vec![
        vec!["Employee Statistics".to_string()],
        vec![
            "Employee ID".into(),
            "Employee Name".into(),
            "Present Days".into(),
            "Late Days".into(),
            "Absent Days".into(),
            "Avg Work Hours".into(),
        ],
    ];
    employees.extend(report.employee_stats.iter().map(|entry| {
        vec![
            entry.employee_id.clone(),
            entry.employee_name.clone(),
            entry.stats.total_present.to_string(),
            entry.stats.total_late.to_string(),
            entry.stats.total_absent.to_string(),
            format_hours(entry.stats.avg_work_hours),
        ]
    }));

    render_sectioned_csv(&[header, totals, employees])
}

fn validate_range(query: &ReportQuery) -> Result<(), AppError> {
    if query.start_date > query.end_date {
        return Err(AppError::BadRequest(
            "start_date must be on or before end_date".into(),
        ));
    }
    Ok(())
}

fn range_filter(query: &ReportQuery) -> AttendanceFilter {
    AttendanceFilter {
        start_date: Some(query.start_date),
        end_date: Some(query.end_date),
        department_id: query.department_id,
        employee_code: None,
    }
}

async fn render_blocking<F>(render: F) -> Result<String, AppError>
where
    F: FnOnce() -> anyhow::Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(render)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(AppError::Internal)
}

#[derive(Clone)]
pub struct ReportService {
    employees: Arc<dyn EmployeeRepositoryTrait>,
    departments: Arc<dyn DepartmentRepositoryTrait>,
    attendance: Arc<dyn AttendanceRepositoryTrait>,
    clock: Arc<dyn Clock>,
    time_zone: Tz,
}

impl ReportService {
    pub fn new(
        employees: Arc<dyn EmployeeRepositoryTrait>,
        departments: Arc<dyn DepartmentRepositoryTrait>,
        attendance: Arc<dyn AttendanceRepositoryTrait>,
        clock: Arc<dyn Clock>,
        time_zone: Tz,
    ) -> Self {
        Self {
            employees,
            departments,
            attendance,
            clock,
            time_zone,
        }
    }

    pub async fn attendance_report(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<AttendanceReportRow>, AppError> {
        validate_range(query)?;
        let details = self.attendance.scan(range_filter(query)).await?;
        Ok(attendance_rows(&details, &self.time_zone))
    }

    pub async fn summary_report(&self, query: &ReportQuery) -> Result<SummaryReport, AppError> {
        validate_range(query)?;
        let total_employees = self.employees.count_active(query.department_id).await?;
        let details = self.attendance.scan(range_filter(query)).await?;
        let period = format!("{} to {}", query.start_date, query.end_date);
        Ok(summarize(period, total_employees, &details))
    }

    /// Monthly report for one department; `month`/`year` default to the
    /// current local month.
    pub async fn department_report(
        &self,
        department_id: DepartmentId,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<DepartmentReport, AppError> {
        let today = in_timezone(self.clock.now(), &self.time_zone).date_naive();
        let month = month.unwrap_or_else(|| today.month());
        let year = year.unwrap_or_else(|| today.year());
        let days = days_in_month(year, month)
            .ok_or_else(|| AppError::BadRequest("month must be between 1 and 12".into()))?;

        let department = self
            .departments
            .find_by_id(department_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".into()))?;
        let employees = self.employees.find_by_department(department_id).await?;

        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::BadRequest("Invalid month".into()))?;
        let end = NaiveDate::from_ymd_opt(year, month, days)
            .ok_or_else(|| AppError::BadRequest("Invalid month".into()))?;
        let details = self
            .attendance
            .scan(AttendanceFilter {
                start_date: Some(start),
                end_date: Some(end),
                department_id: Some(department_id),
                employee_code: None,
            })
            .await?;

        let employee_stats = employee_entries(&employees, &details, days);
        let summary = department_summary(&employee_stats);

        Ok(DepartmentReport {
            department_id,
            department_name: department.name,
            period: format!("{}-{:02}", year, month),
            total_employees: employees.len() as i64,
            employee_stats,
            summary,
        })
    }

    pub async fn export_attendance(&self, query: &ReportQuery) -> Result<CsvExport, AppError> {
        let rows = self.attendance_report(query).await?;
        let tz = self.time_zone;
        let csv_data = render_blocking(move || attendance_csv(&rows, &tz)).await?;
        Ok(CsvExport {
            csv_data,
            filename: format!(
                "attendance_report_{}_to_{}.csv",
                query.start_date, query.end_date
            ),
        })
    }

    pub async fn export_summary(&self, query: &ReportQuery) -> Result<CsvExport, AppError> {
        let summary = self.summary_report(query).await?;
        let csv_data = render_blocking(move || summary_csv(&summary)).await?;
        Ok(CsvExport {
            csv_data,
            filename: format!(
                "summary_report_{}_to_{}.csv",
                query.start_date, query.end_date
            ),
        })
    }

    pub async fn export_department(
        &self,
        department_id: DepartmentId,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<CsvExport, AppError> {
        let report = self.department_report(department_id, month, year).await?;
        let filename = format!(
            "department_report_{}_{}.csv",
            report
                .department_name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect::<String>(),
            report.period
        );
        let csv_data = render_blocking(move || department_csv(&report)).await?;
        Ok(CsvExport { csv_data, filename })
    }
}
