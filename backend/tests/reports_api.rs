use attendance_backend::{
    models::{
        attendance::{Attendance, AttendanceStatus},
        employee::Employee,
        user::UserRole,
    },
    types::AttendanceId,
};
use axum::http::{Method, StatusCode};
use serde_json::json;

mod support;

use support::{utc, TestApp};

struct Fixture {
    app: TestApp,
    engineering_id: String,
    manager_token: String,
    employee_token: String,
}

fn record(
    app: &TestApp,
    employee: &Employee,
    day: u32,
    clock_in: (u32, u32),
    clock_out: (u32, u32),
    status: AttendanceStatus,
) {
    let clock_in = utc(2024, 3, day, clock_in.0, clock_in.1);
    let clock_out = utc(2024, 3, day, clock_out.0, clock_out.1);
    let hours = (clock_out - clock_in).num_minutes() as f64 / 60.0;
    app.store.insert_attendance(Attendance {
        id: AttendanceId::new(),
        employee_id: employee.id,
        clock_in,
        clock_in_date: clock_in.date_naive(),
        clock_out: Some(clock_out),
        work_hours: Some(hours),
        status,
        notes: String::new(),
        created_at: clock_in,
        updated_at: clock_out,
    });
}

/// Engineering: Ann (two on-time days) and Bo (one late day). Ops: Cy, absent.
fn fixture() -> Fixture {
    let app = TestApp::new(utc(2024, 3, 20, 12, 0));
    let engineering = app.store.seed_department("Engineering", "09:00:00", "17:00:00");
    let ops = app.store.seed_department("Ops", "08:00:00", "16:00:00");
    let ann = app.store.seed_employee("EMP001", "Ann", &engineering);
    let bo = app.store.seed_employee("EMP002", "Bo", &engineering);
    app.store.seed_employee("EMP003", "Cy", &ops);

    record(&app, &ann, 4, (9, 0), (17, 0), AttendanceStatus::Present);
    record(&app, &bo, 4, (9, 30), (17, 0), AttendanceStatus::Late);
    record(&app, &ann, 5, (9, 0), (17, 0), AttendanceStatus::Present);

    let manager = app.store.seed_user("manager", UserRole::Manager, None);
    let employee = app.store.seed_user("emp001", UserRole::Employee, Some("EMP001"));
    Fixture {
        engineering_id: engineering.id.to_string(),
        manager_token: app.token_for(&manager),
        employee_token: app.token_for(&employee),
        app,
    }
}

#[tokio::test]
async fn summary_counts_present_late_and_absent() {
    let f = fixture();
    let (status, body) = f
        .app
        .send(
            Method::GET,
            "/api/reports/summary?start_date=2024-03-04&end_date=2024-03-04",
            Some(&f.manager_token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "2024-03-04 to 2024-03-04");
    assert_eq!(body["total_employees"], 3);
    assert_eq!(body["total_present"], 2);
    assert_eq!(body["total_late"], 1);
    assert_eq!(body["total_absent"], 1);
    assert_eq!(body["total_work_hours"], 15.5);
    assert_eq!(body["average_work_hours"], 7.75);
}

#[tokio::test]
async fn attendance_report_rederives_minutes_per_row() {
    let f = fixture();
    let uri = format!(
        "/api/reports/attendance?start_date=2024-03-04&end_date=2024-03-05&department_id={}",
        f.engineering_id
    );
    let (status, body) = f
        .app
        .send(Method::GET, &uri, Some(&f.manager_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["employee_id"], "EMP001");
    assert_eq!(rows[1]["employee_id"], "EMP002");
    assert_eq!(rows[1]["status"], "late");
    assert_eq!(rows[1]["late_minutes"], 15);
    assert_eq!(rows[1]["early_minutes"], 0);
    assert_eq!(rows[2]["date"], "2024-03-05");
}

#[tokio::test]
async fn department_report_covers_every_day_of_the_month() {
    let f = fixture();
    let uri = format!(
        "/api/reports/department/{}?month=3&year=2024",
        f.engineering_id
    );
    let (status, body) = f
        .app
        .send(Method::GET, &uri, Some(&f.manager_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department_name"], "Engineering");
    assert_eq!(body["period"], "2024-03");
    assert_eq!(body["total_employees"], 2);

    let ann = &body["employee_stats"][0];
    assert_eq!(ann["employee_id"], "EMP001");
    assert_eq!(ann["stats"]["total_present"], 2);
    assert_eq!(ann["stats"]["total_absent"], 29);
    assert_eq!(ann["stats"]["total_work_days"], 31);
    assert_eq!(ann["stats"]["avg_work_hours"], 8.0);

    let summary = &body["summary"];
    assert_eq!(summary["total_present"], 3);
    assert_eq!(summary["total_late"], 1);
    assert_eq!(summary["total_absent"], 59);
    assert_eq!(summary["attendance_rate"], 4.84);
    assert_eq!(summary["average_work_hours"], 7.75);
}

#[tokio::test]
async fn department_report_defaults_to_current_month() {
    let f = fixture();
    let uri = format!("/api/reports/department/{}", f.engineering_id);
    let (status, body) = f
        .app
        .send(Method::GET, &uri, Some(&f.manager_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "2024-03");

    let uri = format!(
        "/api/reports/department/{}?month=13&year=2024",
        f.engineering_id
    );
    let (status, _) = f
        .app
        .send(Method::GET, &uri, Some(&f.manager_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exports_return_csv_with_dated_filenames() {
    let f = fixture();
    let (status, body) = f
        .app
        .send(
            Method::GET,
            "/api/reports/export/attendance?start_date=2024-03-04&end_date=2024-03-05",
            Some(&f.manager_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "attendance_report_2024-03-04_to_2024-03-05.csv");
    let csv = body["csv_data"].as_str().expect("csv data");
    assert!(csv.starts_with("\"Employee ID\",\"Employee Name\",\"Department\""));
    assert!(csv.contains("\"EMP002\",\"Bo\",\"Engineering\",\"2024-03-04\""));
    assert!(csv.contains("\"7.50\",\"late\",\"15\",\"0\""));

    let (status, body) = f
        .app
        .send(
            Method::GET,
            "/api/reports/export/summary?start_date=2024-03-04&end_date=2024-03-04",
            Some(&f.manager_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "summary_report_2024-03-04_to_2024-03-04.csv");
    let csv = body["csv_data"].as_str().expect("csv data");
    assert!(csv.starts_with("\"Metric\",\"Value\""));
    assert!(csv.contains("\"Total Work Hours\",\"15.50\""));

    let uri = format!(
        "/api/reports/export/department/{}?month=3&year=2024",
        f.engineering_id
    );
    let (status, body) = f
        .app
        .send(Method::GET, &uri, Some(&f.manager_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "department_report_Engineering_2024-03.csv");
    let csv = body["csv_data"].as_str().expect("csv data");
    assert!(csv.contains("\"Attendance Rate\",\"4.84%\""));
    assert!(csv.contains("\"EMP002\",\"Bo\",\"1\",\"1\",\"30\",\"7.50\""));
}

#[tokio::test]
async fn reports_reject_inverted_ranges() {
    let f = fixture();
    let (status, body) = f
        .app
        .send(
            Method::GET,
            "/api/reports/summary?start_date=2024-03-05&end_date=2024-03-04",
            Some(&f.manager_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "start_date must be on or before end_date");
}

#[tokio::test]
async fn reports_are_closed_to_employees() {
    let f = fixture();
    let (status, _) = f
        .app
        .send(
            Method::GET,
            "/api/reports/summary?start_date=2024-03-04&end_date=2024-03-04",
            Some(&f.employee_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = f
        .app
        .send(
            Method::GET,
            "/api/reports/department/not-a-uuid",
            Some(&f.manager_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_minutes_match_clock_responses() {
    let app = TestApp::new(utc(2024, 3, 4, 9, 16));
    let engineering = app.store.seed_department("Engineering", "09:00:00", "17:00:00");
    app.store.seed_employee("EMP001", "Ann", &engineering);
    let ann = app.store.seed_user("emp001", UserRole::Employee, Some("EMP001"));
    let manager = app.store.seed_user("manager", UserRole::Manager, None);
    let ann_token = app.token_for(&ann);
    let manager_token = app.token_for(&manager);
    let report_uri = "/api/reports/attendance?start_date=2024-03-04&end_date=2024-03-04";

    let (status, clock_in) = app
        .send(
            Method::POST,
            "/api/attendance/clock-in",
            Some(&ann_token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(clock_in["late_minutes"], 1);

    let (status, body) = app
        .send(Method::GET, report_uri, Some(&manager_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body[0]["work_hours"].is_null());
    assert_eq!(body[0]["late_minutes"], clock_in["late_minutes"]);

    app.clock.set(utc(2024, 3, 4, 16, 29));
    let (status, clock_out) = app
        .send(
            Method::PUT,
            "/api/attendance/clock-out",
            Some(&ann_token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clock_out["early_minutes"], 1);

    let (status, body) = app
        .send(Method::GET, report_uri, Some(&manager_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "late");
    assert_eq!(rows[0]["late_minutes"], 1);
    assert_eq!(rows[0]["early_minutes"], 1);
    assert_eq!(rows[0]["late_minutes"], clock_in["late_minutes"]);
    assert_eq!(rows[0]["early_minutes"], clock_out["early_minutes"]);
}
