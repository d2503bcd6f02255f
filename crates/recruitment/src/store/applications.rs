use rusqlite::{params, OptionalExtension as _, Row};

use super::encode::{day_at, dt_at, encode_dt, opt_dt_at, opt_score_at, status_at};
use super::SqliteStore;
use crate::error::RepositoryError;
use crate::ids::{ApplicationId, HistoryId, UserId, VacancyId, VacancyPeriodId};
use crate::workflows::pipeline::{
    Application, ApplicationHistory, ApplicationRepository, ApplicationStatus, AssessmentTotal,
    DocumentPaths, NewApplication, PeriodWindow, Transition,
};

const APPLICATION_COLUMNS: &str = "id, user_id, vacancy_period_id, status_id, resume_path, \
     cover_letter_path, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, application_id, status_id, processed_at, reviewed_at, \
     completed_at, score, notes, reviewed_by, is_active, zoom_url, scheduled_at";

fn application_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        id: ApplicationId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        vacancy_period_id: VacancyPeriodId(row.get(2)?),
        status: status_at(row, 3)?,
        resume_path: row.get(4)?,
        cover_letter_path: row.get(5)?,
        created_at: dt_at(row, 6)?,
        updated_at: dt_at(row, 7)?,
    })
}

fn history_row(row: &Row<'_>) -> rusqlite::Result<ApplicationHistory> {
    Ok(ApplicationHistory {
        id: HistoryId(row.get(0)?),
        application_id: ApplicationId(row.get(1)?),
        status: status_at(row, 2)?,
        processed_at: dt_at(row, 3)?,
        reviewed_at: opt_dt_at(row, 4)?,
        completed_at: opt_dt_at(row, 5)?,
        score: opt_score_at(row, 6)?,
        notes: row.get(7)?,
        reviewed_by: row.get::<_, Option<i64>>(8)?.map(UserId),
        is_active: row.get(9)?,
        zoom_url: row.get(10)?,
        scheduled_at: opt_dt_at(row, 11)?,
    })
}

fn fetch_application(
    conn: &rusqlite::Connection,
    id: ApplicationId,
) -> rusqlite::Result<Option<Application>> {
    conn.query_row(
        &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
        params![id.0],
        application_row,
    )
    .optional()
}

impl ApplicationRepository for SqliteStore {
    fn period_window(
        &self,
        period: VacancyPeriodId,
    ) -> Result<Option<PeriodWindow>, RepositoryError> {
        let conn = self.conn()?;
        let window = conn
            .query_row(
                "SELECT id, vacancy_id, starts_on, ends_on FROM vacancy_periods WHERE id = ?1",
                params![period.0],
                |row| {
                    Ok(PeriodWindow {
                        id: VacancyPeriodId(row.get(0)?),
                        vacancy_id: VacancyId(row.get(1)?),
                        starts_on: day_at(row, 2)?,
                        ends_on: day_at(row, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(window)
    }

    fn create(&self, application: NewApplication) -> Result<Application, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let at = encode_dt(application.applied_at);
        let status = ApplicationStatus::AdminSelection;

        tx.execute(
            "INSERT INTO applications (user_id, vacancy_period_id, status_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                application.user_id.0,
                application.vacancy_period_id.0,
                status.id(),
                at
            ],
        )?;
        let id = ApplicationId(tx.last_insert_rowid());
        tx.execute(
            "INSERT INTO application_histories (application_id, status_id, processed_at, is_active)
             VALUES (?1, ?2, ?3, 1)",
            params![id.0, status.id(), at],
        )?;
        let record = fetch_application(&tx, id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("application {id}")))?;
        tx.commit()?;
        Ok(record)
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_application(&conn, id)?)
    }

    fn history(&self, id: ApplicationId) -> Result<Vec<ApplicationHistory>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM application_histories
             WHERE application_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![id.0], history_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn transition(&self, transition: Transition) -> Result<Application, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let id = transition.application_id;
        let review = &transition.review;
        let at = encode_dt(review.reviewed_at);

        // Guarded on the expected status so a concurrent decision loses cleanly.
        let moved = tx.execute(
            "UPDATE applications SET status_id = ?1, updated_at = ?2
             WHERE id = ?3 AND status_id = ?4",
            params![transition.to.id(), at, id.0, transition.from.id()],
        )?;
        if moved == 0 {
            let current = fetch_application(&tx, id)?
                .ok_or_else(|| RepositoryError::NotFound(format!("application {id}")))?;
            return Err(RepositoryError::StaleStatus {
                expected: transition.from,
                actual: current.status,
            });
        }

        tx.execute(
            "UPDATE application_histories
             SET is_active = 0, score = ?1, notes = ?2, reviewed_by = ?3,
                 reviewed_at = ?4, completed_at = ?4
             WHERE application_id = ?5 AND is_active = 1",
            params![
                review.score.map(f64::from),
                review.notes,
                review.reviewed_by.0,
                at,
                id.0
            ],
        )?;

        let completed_at = transition.to.is_terminal().then(|| at.clone());
        let (zoom_url, scheduled_at) = match &transition.schedule {
            Some(slot) => (
                Some(slot.zoom_url.clone()),
                Some(encode_dt(slot.scheduled_at)),
            ),
            None => (None, None),
        };
        tx.execute(
            "INSERT INTO application_histories
                (application_id, status_id, processed_at, completed_at, is_active, zoom_url, scheduled_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![
                id.0,
                transition.to.id(),
                at,
                completed_at,
                zoom_url,
                scheduled_at
            ],
        )?;

        let record = fetch_application(&tx, id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("application {id}")))?;
        tx.commit()?;
        Ok(record)
    }

    fn attach_documents(
        &self,
        id: ApplicationId,
        documents: DocumentPaths,
    ) -> Result<Application, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE applications
             SET resume_path = COALESCE(?1, resume_path),
                 cover_letter_path = COALESCE(?2, cover_letter_path)
             WHERE id = ?3",
            params![documents.resume_path, documents.cover_letter_path, id.0],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("application {id}")));
        }
        fetch_application(&conn, id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("application {id}")))
    }

    fn list_for_period(
        &self,
        period: VacancyPeriodId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE vacancy_period_id = ?1 AND (?2 IS NULL OR status_id = ?2)
             ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![period.0, status.map(ApplicationStatus::id)], application_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn list_for_user(&self, user: UserId) -> Result<Vec<Application>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![user.0], application_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn assessment_total(
        &self,
        id: ApplicationId,
    ) -> Result<Option<AssessmentTotal>, RepositoryError> {
        let conn = self.conn()?;
        let (total, ungraded): (Option<f64>, Option<i64>) = conn.query_row(
            "SELECT SUM(score), SUM(CASE WHEN score IS NULL THEN 1 ELSE 0 END) \
             FROM user_answers WHERE application_id = ?1",
            params![id.0],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(total.map(|total| AssessmentTotal {
            score: total as f32,
            ungraded: ungraded.unwrap_or_default().try_into().unwrap_or(u32::MAX),
        }))
    }
}
