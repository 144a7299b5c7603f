use sqlx::PgPool;

use crate::db::error::DatabaseError;
use crate::models::Course;
use crate::utils::generate_ulid;

pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub async fn find_active(&self) -> Result<Vec<Course>, DatabaseError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, name, cohort, term, meeting_id, channel, is_active,
                   created_at, updated_at
            FROM courses
            WHERE is_active = true
            ORDER BY term, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn create(
        &self,
        name: &str,
        cohort: &str,
        term: i32,
        meeting_id: i64,
        channel: &str,
    ) -> Result<Course, DatabaseError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, name, cohort, term, meeting_id, channel, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, true)
            RETURNING id, name, cohort, term, meeting_id, channel, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(generate_ulid())
        .bind(name)
        .bind(cohort)
        .bind(term)
        .bind(meeting_id)
        .bind(channel)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::ConstraintViolation(
                    "A course is already registered for this meeting".to_string(),
                )
            }
            _ => DatabaseError::from(e),
        })?;

        Ok(course)
    }

    pub async fn set_active(&self, meeting_id: i64, active: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE courses SET is_active = $2, updated_at = NOW() WHERE meeting_id = $1",
        )
        .bind(meeting_id)
        .bind(active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
