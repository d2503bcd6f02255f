use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension as _, Row};

use super::encode::{day_at, dt_at, encode_day, encode_dt, opt_day_at, opt_score_at};
use super::SqliteStore;
use crate::error::RepositoryError;
use crate::ids::{EducationId, ExperienceId, SkillId, UserId};
use crate::workflows::candidates::{
    CandidateProfile, CandidateRepository, Education, Experience, NewEducation, NewExperience,
    NewSkill, ProfileFields, Skill,
};

const PROFILE_COLUMNS: &str =
    "user_id, full_name, email, phone, address, birth_date, summary, cv_path, updated_at";

const EDUCATION_COLUMNS: &str =
    "id, user_id, institution, degree, field_of_study, start_year, end_year, gpa";

const EXPERIENCE_COLUMNS: &str =
    "id, user_id, company_name, position, started_on, ended_on, description";

fn profile_row(row: &Row<'_>) -> rusqlite::Result<CandidateProfile> {
    Ok(CandidateProfile {
        user_id: UserId(row.get(0)?),
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        birth_date: opt_day_at(row, 5)?,
        summary: row.get(6)?,
        cv_path: row.get(7)?,
        updated_at: dt_at(row, 8)?,
    })
}

fn education_row(row: &Row<'_>) -> rusqlite::Result<Education> {
    Ok(Education {
        id: EducationId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        institution: row.get(2)?,
        degree: row.get(3)?,
        field_of_study: row.get(4)?,
        start_year: row.get(5)?,
        end_year: row.get(6)?,
        gpa: opt_score_at(row, 7)?,
    })
}

fn experience_row(row: &Row<'_>) -> rusqlite::Result<Experience> {
    Ok(Experience {
        id: ExperienceId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        company_name: row.get(2)?,
        position: row.get(3)?,
        started_on: day_at(row, 4)?,
        ended_on: opt_day_at(row, 5)?,
        description: row.get(6)?,
    })
}

fn skill_row(row: &Row<'_>) -> rusqlite::Result<Skill> {
    Ok(Skill {
        id: SkillId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        name: row.get(2)?,
        level: row.get(3)?,
    })
}

fn fetch_profile(conn: &Connection, user: UserId) -> rusqlite::Result<Option<CandidateProfile>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM candidate_profiles WHERE user_id = ?1"),
        params![user.0],
        profile_row,
    )
    .optional()
}

fn missing_profile(user: UserId) -> RepositoryError {
    RepositoryError::NotFound(format!("profile of candidate {user}"))
}

impl CandidateRepository for SqliteStore {
    fn fetch_profile(&self, user: UserId) -> Result<Option<CandidateProfile>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_profile(&conn, user)?)
    }

    fn upsert_profile(
        &self,
        user: UserId,
        fields: ProfileFields,
        at: DateTime<Utc>,
    ) -> Result<CandidateProfile, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO candidate_profiles
                (user_id, full_name, email, phone, address, birth_date, summary, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (user_id) DO UPDATE SET
                full_name = excluded.full_name,
                email = excluded.email,
                phone = excluded.phone,
                address = excluded.address,
                birth_date = excluded.birth_date,
                summary = excluded.summary,
                updated_at = excluded.updated_at",
            params![
                user.0,
                fields.full_name,
                fields.email,
                fields.phone,
                fields.address,
                fields.birth_date.map(encode_day),
                fields.summary,
                encode_dt(at)
            ],
        )?;
        fetch_profile(&conn, user)?.ok_or_else(|| missing_profile(user))
    }

    fn set_cv_path(
        &self,
        user: UserId,
        cv_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<CandidateProfile, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE candidate_profiles SET cv_path = ?1, updated_at = ?2 WHERE user_id = ?3",
            params![cv_path, encode_dt(at), user.0],
        )?;
        if updated == 0 {
            return Err(missing_profile(user));
        }
        fetch_profile(&conn, user)?.ok_or_else(|| missing_profile(user))
    }

    fn educations(&self, user: UserId) -> Result<Vec<Education>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EDUCATION_COLUMNS} FROM educations
             WHERE user_id = ?1 ORDER BY start_year DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![user.0], education_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn add_education(
        &self,
        user: UserId,
        education: NewEducation,
    ) -> Result<Education, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO educations
                (user_id, institution, degree, field_of_study, start_year, end_year, gpa)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.0,
                education.institution,
                education.degree,
                education.field_of_study,
                education.start_year,
                education.end_year,
                education.gpa.map(f64::from)
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
            &format!("SELECT {EDUCATION_COLUMNS} FROM educations WHERE id = ?1"),
            params![id],
            education_row,
        )?)
    }

    fn delete_education(&self, user: UserId, id: EducationId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM educations WHERE id = ?1 AND user_id = ?2",
            params![id.0, user.0],
        )?;
        Ok(removed > 0)
    }

    fn experiences(&self, user: UserId) -> Result<Vec<Experience>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experiences
             WHERE user_id = ?1 ORDER BY started_on DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![user.0], experience_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn add_experience(
        &self,
        user: UserId,
        experience: NewExperience,
    ) -> Result<Experience, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO experiences
                (user_id, company_name, position, started_on, ended_on, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.0,
                experience.company_name,
                experience.position,
                encode_day(experience.started_on),
                experience.ended_on.map(encode_day),
                experience.description
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
            &format!("SELECT {EXPERIENCE_COLUMNS} FROM experiences WHERE id = ?1"),
            params![id],
            experience_row,
        )?)
    }

    fn delete_experience(&self, user: UserId, id: ExperienceId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM experiences WHERE id = ?1 AND user_id = ?2",
            params![id.0, user.0],
        )?;
        Ok(removed > 0)
    }

    fn skills(&self, user: UserId) -> Result<Vec<Skill>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, user_id, name, level FROM skills WHERE user_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![user.0], skill_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn add_skill(&self, user: UserId, skill: NewSkill) -> Result<Skill, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO skills (user_id, name, level) VALUES (?1, ?2, ?3)",
            params![user.0, skill.name, skill.level],
        )?;
        Ok(Skill {
            id: SkillId(conn.last_insert_rowid()),
            user_id: user,
            name: skill.name,
            level: skill.level,
        })
    }

    fn delete_skill(&self, user: UserId, id: SkillId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM skills WHERE id = ?1 AND user_id = ?2",
            params![id.0, user.0],
        )?;
        Ok(removed > 0)
    }
}
