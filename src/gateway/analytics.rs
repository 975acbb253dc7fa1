//! Read-only aggregation routes for the dashboard charts.
//!
//! Pure functions over the user/role collections; no mutation, no extra
//! state. Each aggregation takes an explicit "today" so the math is
//! clock-independent under test.

use super::{require_auth, AppState};
use crate::error::ApiResult;
use crate::store::{Role, User, UserStatus};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

/// Chart colors keyed by account status.
const STATUS_COLORS: [(UserStatus, &str); 3] = [
    (UserStatus::Active, "#22C55E"),
    (UserStatus::Pending, "#F59E0B"),
    (UserStatus::Inactive, "#EF4444"),
];

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// GET /api/analytics/stats
pub(crate) async fn handle_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;
    let users = state.store.users();
    Ok(Json(json!({
        "success": true,
        "stats": stats_summary(&users, Utc::now().date_naive()),
    })))
}

#[derive(Deserialize)]
pub(crate) struct GrowthQuery {
    pub days: Option<u32>,
}

/// GET /api/analytics/growth?days=N — daily join counts, oldest first.
pub(crate) async fn handle_growth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GrowthQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let days = query.days.unwrap_or(30).clamp(1, 365);
    let users = state.store.users();
    let (labels, data) = growth_series(&users, days, Utc::now().date_naive());

    Ok(Json(json!({
        "success": true,
        "growth": { "labels": labels, "data": data },
    })))
}

/// GET /api/analytics/monthly-trends — join counts for the last 6 months.
pub(crate) async fn handle_monthly_trends(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let users = state.store.users();
    let (labels, data) = monthly_series(&users, Utc::now().date_naive());

    Ok(Json(json!({
        "success": true,
        "trends": { "labels": labels, "data": data },
    })))
}

/// GET /api/analytics/roles-distribution
pub(crate) async fn handle_roles_distribution(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let users = state.store.users();
    let roles = state.store.roles();

    Ok(Json(json!({
        "success": true,
        "distribution": roles_distribution(&users, &roles),
    })))
}

/// GET /api/analytics/status-distribution
pub(crate) async fn handle_status_distribution(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let users = state.store.users();
    let distribution: Vec<_> = STATUS_COLORS
        .iter()
        .map(|(status, color)| {
            json!({
                "name": status.as_str(),
                "count": users.iter().filter(|u| u.status == *status).count(),
                "color": color,
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "distribution": distribution })))
}

/// GET /api/analytics/recent-activity — the 10 most recent joiners.
pub(crate) async fn handle_recent_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let mut users = state.store.users();
    users.sort_by(|a, b| b.joined.cmp(&a.joined));

    let activities: Vec<_> = users
        .iter()
        .take(10)
        .map(|user| {
            let name = format!("{} {}", user.first_name, user.last_name);
            json!({
                "type": "user_joined",
                "message": format!("{name} joined as {}", user.role),
                "timestamp": user.joined,
                "user": { "name": name, "avatar": user.avatar },
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "activities": activities })))
}

// ── Aggregation helpers ─────────────────────────────────────────────

fn stats_summary(users: &[User], today: NaiveDate) -> serde_json::Value {
    let first_of_month = today.with_day(1).unwrap_or(today);
    let count_status =
        |status: UserStatus| users.iter().filter(|u| u.status == status).count();

    json!({
        "totalUsers": users.len(),
        "activeUsers": count_status(UserStatus::Active),
        "pendingUsers": count_status(UserStatus::Pending),
        "inactiveUsers": count_status(UserStatus::Inactive),
        "newUsersThisMonth": users.iter().filter(|u| u.joined >= first_of_month).count(),
    })
}

/// Per-day join counts for the trailing window ending today.
fn growth_series(users: &[User], days: u32, today: NaiveDate) -> (Vec<String>, Vec<usize>) {
    let mut labels = Vec::with_capacity(days as usize);
    let mut data = Vec::with_capacity(days as usize);

    for offset in (0..i64::from(days)).rev() {
        let date = today - Duration::days(offset);
        labels.push(date.format("%b %-d").to_string());
        data.push(users.iter().filter(|u| u.joined == date).count());
    }

    (labels, data)
}

/// Join counts for the last six calendar months, oldest first.
fn monthly_series(users: &[User], today: NaiveDate) -> (Vec<String>, Vec<usize>) {
    let mut labels = Vec::with_capacity(6);
    let mut data = Vec::with_capacity(6);

    for offset in (0..6).rev() {
        let (year, month) = months_back(today, offset);
        labels.push(MONTH_LABELS[month as usize - 1].to_string());
        data.push(
            users
                .iter()
                .filter(|u| u.joined.year() == year && u.joined.month() == month)
                .count(),
        );
    }

    (labels, data)
}

/// Walk a (year, month) pair backwards by whole months.
fn months_back(date: NaiveDate, back: u32) -> (i32, u32) {
    let total = date.year() * 12 + date.month() as i32 - 1 - back as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

fn roles_distribution(users: &[User], roles: &[Role]) -> Vec<serde_json::Value> {
    roles
        .iter()
        .map(|role| {
            json!({
                "name": role.name,
                "count": users.iter().filter(|u| u.role == role.name).count(),
                "color": role.color,
            })
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testutil::{auth_headers, test_state};

    fn user(id: u64, role: &str, status: UserStatus, joined: NaiveDate) -> User {
        User {
            id,
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
            email: format!("user{id}@email.com"),
            password: None,
            role: role.into(),
            status,
            joined,
            avatar: "#3B82F6".into(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn stats_counts_statuses_and_new_this_month() {
        let users = vec![
            user(1, "Admin", UserStatus::Active, d(2026, 8, 3)),
            user(2, "User", UserStatus::Active, d(2026, 7, 20)),
            user(3, "User", UserStatus::Pending, d(2026, 8, 1)),
            user(4, "User", UserStatus::Inactive, d(2026, 1, 2)),
        ];

        let stats = stats_summary(&users, d(2026, 8, 7));
        assert_eq!(stats["totalUsers"], 4);
        assert_eq!(stats["activeUsers"], 2);
        assert_eq!(stats["pendingUsers"], 1);
        assert_eq!(stats["inactiveUsers"], 1);
        assert_eq!(stats["newUsersThisMonth"], 2);
    }

    #[test]
    fn growth_series_spans_the_window_oldest_first() {
        let users = vec![
            user(1, "User", UserStatus::Active, d(2026, 8, 7)),
            user(2, "User", UserStatus::Active, d(2026, 8, 7)),
            user(3, "User", UserStatus::Active, d(2026, 8, 5)),
            // Outside the 7-day window.
            user(4, "User", UserStatus::Active, d(2026, 7, 1)),
        ];

        let (labels, data) = growth_series(&users, 7, d(2026, 8, 7));
        assert_eq!(labels.len(), 7);
        assert_eq!(labels[0], "Aug 1");
        assert_eq!(labels[6], "Aug 7");
        assert_eq!(data[6], 2);
        assert_eq!(data[4], 1);
        assert_eq!(data.iter().sum::<usize>(), 3);
    }

    #[test]
    fn monthly_series_covers_six_months_and_year_boundaries() {
        let users = vec![
            user(1, "User", UserStatus::Active, d(2026, 2, 10)),
            user(2, "User", UserStatus::Active, d(2025, 12, 24)),
            user(3, "User", UserStatus::Active, d(2025, 9, 1)),
            // Same month, previous year — must not be counted.
            user(4, "User", UserStatus::Active, d(2025, 2, 10)),
        ];

        let (labels, data) = monthly_series(&users, d(2026, 2, 7));
        assert_eq!(labels, vec!["Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]);
        assert_eq!(data, vec![1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn months_back_crosses_year_boundaries() {
        assert_eq!(months_back(d(2026, 2, 7), 0), (2026, 2));
        assert_eq!(months_back(d(2026, 2, 7), 1), (2026, 1));
        assert_eq!(months_back(d(2026, 2, 7), 2), (2025, 12));
        assert_eq!(months_back(d(2026, 2, 7), 14), (2024, 12));
    }

    #[test]
    fn roles_distribution_counts_referencing_users() {
        let users = vec![
            user(1, "Admin", UserStatus::Active, d(2026, 1, 1)),
            user(2, "Admin", UserStatus::Active, d(2026, 1, 1)),
            user(3, "User", UserStatus::Active, d(2026, 1, 1)),
        ];
        let roles = vec![
            Role {
                id: 1,
                name: "Admin".into(),
                description: String::new(),
                permissions: vec!["all".into()],
                color: "#8B5CF6".into(),
                created_at: Utc::now(),
            },
            Role {
                id: 2,
                name: "User".into(),
                description: String::new(),
                permissions: vec!["read".into()],
                color: "#64748B".into(),
                created_at: Utc::now(),
            },
        ];

        let distribution = roles_distribution(&users, &roles);
        assert_eq!(distribution[0]["count"], 2);
        assert_eq!(distribution[1]["count"], 1);
        assert_eq!(distribution[0]["color"], "#8B5CF6");
    }

    #[tokio::test]
    async fn status_distribution_covers_all_three_states() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let Json(body) = handle_status_distribution(State(state), headers)
            .await
            .unwrap();
        let distribution = body["distribution"].as_array().unwrap();
        assert_eq!(distribution.len(), 3);
        assert_eq!(distribution[0]["name"], "Active");
        assert_eq!(distribution[0]["color"], "#22C55E");
        // Seeded dataset: 9 active, 2 pending, 2 inactive.
        assert_eq!(distribution[0]["count"], 9);
        assert_eq!(distribution[1]["count"], 2);
        assert_eq!(distribution[2]["count"], 2);
    }

    #[tokio::test]
    async fn recent_activity_lists_newest_joiners_first() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let Json(body) = handle_recent_activity(State(state), headers).await.unwrap();
        let activities = body["activities"].as_array().unwrap();
        assert_eq!(activities.len(), 10);

        // Seeded user 1 joined today — newest.
        assert_eq!(activities[0]["user"]["name"], "Omar Gad");
        assert_eq!(activities[0]["type"], "user_joined");
        assert_eq!(activities[0]["message"], "Omar Gad joined as Admin");
    }

    #[tokio::test]
    async fn stats_endpoint_reports_seeded_totals() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let Json(body) = handle_stats(State(state), headers).await.unwrap();
        assert_eq!(body["stats"]["totalUsers"], 13);
        assert_eq!(body["stats"]["activeUsers"], 9);
    }
}
