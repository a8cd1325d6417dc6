use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};

use crate::models::{
    BodyType, DailyTotals, FoodEntry, Goal, NewFoodEntry, NewUser, PendingUser, User,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, height, weight, body_type, goal, \
     profile_photo, is_approved, is_admin, daily_calorie_goal, daily_protein_goal, created_at";

const SESSION_USER_COLUMNS: &str = "u.id, u.name, u.email, u.password_hash, u.height, u.weight, \
     u.body_type, u.goal, u.profile_photo, u.is_approved, u.is_admin, u.daily_calorie_goal, \
     u.daily_protein_goal, u.created_at";

const FOOD_ENTRY_COLUMNS: &str = "id, user_id, food_name, weight_grams, calories, protein, \
     entry_date, entry_time, image_path, created_at";

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let db = Database { pool };
        db.init_tables().await?;
        Ok(db)
    }

    /// Pool that only connects on first use; nothing is created.
    #[cfg(test)]
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(database_url)?;

        Ok(Database { pool })
    }

    async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                height DOUBLE PRECISION NOT NULL,
                weight DOUBLE PRECISION NOT NULL,
                body_type TEXT NOT NULL,
                goal TEXT NOT NULL,
                profile_photo TEXT,
                is_approved BOOLEAN NOT NULL DEFAULT FALSE,
                is_admin BOOLEAN NOT NULL DEFAULT FALSE,
                daily_calorie_goal INTEGER NOT NULL DEFAULT 2000,
                daily_protein_goal INTEGER NOT NULL DEFAULT 100,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS food_entries (
                id SERIAL PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                food_name TEXT NOT NULL,
                weight_grams DOUBLE PRECISION NOT NULL,
                calories DOUBLE PRECISION NOT NULL,
                protein DOUBLE PRECISION NOT NULL,
                entry_date DATE NOT NULL,
                entry_time TIME NOT NULL,
                image_path TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS food_entries_user_date ON food_entries (user_id, entry_date)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Users

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get(0))
    }

    /// Insert a user and return its id. Existing emails are left untouched and yield `None`.
    pub async fn create_user(&self, user: &NewUser) -> Result<Option<i32>> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (
                name, email, password_hash, height, weight, body_type, goal, profile_photo,
                is_approved, is_admin, daily_calorie_goal, daily_protein_goal, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.height)
        .bind(user.weight)
        .bind(user.body_type.to_string())
        .bind(user.goal.to_string())
        .bind(&user.profile_photo)
        .bind(user.is_approved)
        .bind(user.is_admin)
        .bind(user.daily_calorie_goal)
        .bind(user.daily_protein_goal)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get(0)))
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| user_from_row(&row));

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| user_from_row(&row));

        Ok(user)
    }

    pub async fn get_pending_users(&self) -> Result<Vec<PendingUser>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, profile_photo, goal, body_type, created_at
            FROM users
            WHERE is_approved = FALSE AND is_admin = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(|row| {
                let goal: String = row.get(4);
                let body_type: String = row.get(5);
                PendingUser {
                    id: row.get(0),
                    name: row.get(1),
                    email: row.get(2),
                    profile_photo: row.get(3),
                    goal: parse_goal(&goal),
                    body_type: parse_body_type(&body_type),
                    created_at: row.get(6),
                }
            })
            .collect();

        Ok(users)
    }

    /// Returns false when no pending user has this id.
    pub async fn approve_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_approved = TRUE WHERE id = $1 AND is_admin = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a non-admin user together with their sessions and food entries.
    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND is_admin = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Sessions

    pub async fn create_session(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_session_user(&self, token_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            "#,
            SESSION_USER_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| user_from_row(&row));

        Ok(user)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // Food entries

    pub async fn add_food_entry(&self, entry: &NewFoodEntry) -> Result<i32> {
        let row = sqlx::query(
            r#"
            INSERT INTO food_entries (
                user_id, food_name, weight_grams, calories, protein,
                entry_date, entry_time, image_path, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.food_name)
        .bind(entry.weight_grams)
        .bind(entry.calories)
        .bind(entry.protein)
        .bind(entry.entry_date)
        .bind(entry.entry_time)
        .bind(&entry.image_path)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get(0))
    }

    pub async fn get_entries_for_date(&self, user_id: i32, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM food_entries
            WHERE user_id = $1 AND entry_date = $2
            ORDER BY entry_time DESC
            "#,
            FOOD_ENTRY_COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(food_entry_from_row).collect())
    }

    pub async fn get_entries_since(&self, user_id: i32, since: NaiveDate) -> Result<Vec<FoodEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM food_entries
            WHERE user_id = $1 AND entry_date >= $2
            ORDER BY entry_date DESC, entry_time DESC
            "#,
            FOOD_ENTRY_COLUMNS
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(food_entry_from_row).collect())
    }

    /// Only the owner can delete an entry; returns false otherwise.
    pub async fn delete_food_entry(&self, user_id: i32, entry_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM food_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Per-day sums, newest day first. Days without entries are absent.
    pub async fn get_daily_totals(&self, user_id: i32, since: NaiveDate) -> Result<Vec<DailyTotals>> {
        let rows = sqlx::query(
            r#"
            SELECT entry_date,
                   COALESCE(SUM(calories), 0)::DOUBLE PRECISION AS calories,
                   COALESCE(SUM(protein), 0)::DOUBLE PRECISION AS protein,
                   COUNT(*) AS entries
            FROM food_entries
            WHERE user_id = $1 AND entry_date >= $2
            GROUP BY entry_date
            ORDER BY entry_date DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let totals = rows
            .into_iter()
            .map(|row| DailyTotals {
                date: row.get(0),
                calories: row.get(1),
                protein: row.get(2),
                entries: row.get(3),
            })
            .collect();

        Ok(totals)
    }
}

fn user_from_row(row: &PgRow) -> User {
    let body_type: String = row.get(6);
    let goal: String = row.get(7);

    User {
        id: row.get(0),
        name: row.get(1),
        email: row.get(2),
        password_hash: row.get(3),
        height: row.get(4),
        weight: row.get(5),
        body_type: parse_body_type(&body_type),
        goal: parse_goal(&goal),
        profile_photo: row.get(8),
        is_approved: row.get(9),
        is_admin: row.get(10),
        daily_calorie_goal: row.get(11),
        daily_protein_goal: row.get(12),
        created_at: row.get(13),
    }
}

fn food_entry_from_row(row: &PgRow) -> FoodEntry {
    FoodEntry {
        id: row.get(0),
        user_id: row.get(1),
        food_name: row.get(2),
        weight_grams: row.get(3),
        calories: row.get(4),
        protein: row.get(5),
        entry_date: row.get(6),
        entry_time: row.get(7),
        image_path: row.get(8),
        created_at: row.get(9),
    }
}

fn parse_body_type(value: &str) -> BodyType {
    BodyType::from_string(value).unwrap_or_else(|| {
        log::warn!("Unknown body type '{}', defaulting to Normal", value);
        BodyType::Normal
    })
}

fn parse_goal(value: &str) -> Goal {
    Goal::from_string(value).unwrap_or_else(|| {
        log::warn!("Unknown goal '{}', defaulting to Weight Loss", value);
        Goal::WeightLoss
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_user_columns_match_user_columns() {
        let plain: Vec<&str> = USER_COLUMNS.split(',').map(str::trim).collect();
        let joined: Vec<&str> = SESSION_USER_COLUMNS.split(',').map(str::trim).collect();

        assert_eq!(plain.len(), 14);
        assert_eq!(joined.len(), plain.len());
        for (column, prefixed) in plain.iter().zip(&joined) {
            assert_eq!(prefixed.strip_prefix("u."), Some(*column));
        }
    }

    #[test]
    fn test_unknown_stored_enums_fall_back() {
        assert_eq!(parse_body_type("Bulk"), BodyType::Bulk);
        assert_eq!(parse_body_type("Skinny"), BodyType::Normal);
        assert_eq!(parse_goal("Weight Gain"), Goal::WeightGain);
        assert_eq!(parse_goal("maintain"), Goal::WeightLoss);
    }
}
