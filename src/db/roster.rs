//! Team roster store.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::team::TeamRoster;

/// Resolve a team's members.
///
/// Every roster row stored for the team contributes its members, in insertion
/// order. An unknown team yields an empty roster.
pub async fn get_team_roster(pool: &DbPool, team: &str) -> Result<TeamRoster, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT members FROM assignees WHERE team = ? ORDER BY id")
            .bind(team)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "get_team_roster"))?;

    let mut members = Vec::new();
    for (json,) in rows {
        let batch: Vec<String> = serde_json::from_str(&json).map_err(|e| {
            AppError::internal(format!("Malformed roster for team {}: {}", team, e))
        })?;
        members.extend(batch);
    }

    Ok(TeamRoster {
        team: team.to_string(),
        members,
    })
}

/// Store a roster document for a team.
pub async fn add_roster(pool: &DbPool, team: &str, members: &[String]) -> Result<(), AppError> {
    let json = serde_json::to_string(members)?;

    sqlx::query("INSERT INTO assignees (team, members) VALUES (?, ?)")
        .bind(team)
        .bind(&json)
        .execute(pool)
        .await?;

    Ok(())
}

/// Names of every team with a stored roster.
pub async fn list_teams(pool: &DbPool) -> Result<Vec<String>, AppError> {
    let teams: Vec<String> = sqlx::query_scalar("SELECT DISTINCT team FROM assignees ORDER BY team")
        .fetch_all(pool)
        .await?;
    Ok(teams)
}
