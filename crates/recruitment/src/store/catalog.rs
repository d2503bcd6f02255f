use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension as _, Row};

use super::encode::{day_at, dt_at, encode_day, encode_dt};
use super::SqliteStore;
use crate::error::RepositoryError;
use crate::ids::{CompanyId, QuestionPackId, VacancyId, VacancyPeriodId};
use crate::workflows::catalog::{
    AboutFields, AboutUs, CatalogRepository, Company, CompanyFields, NewPeriod, OpenPosition,
    Vacancy, VacancyFields, VacancyPeriod,
};

const COMPANY_COLUMNS: &str =
    "id, name, email, phone, address, description, logo_path, created_at, updated_at";

const VACANCY_COLUMNS: &str = "id, company_id, title, department, location, employment_type, \
     description, requirements, question_pack_id, created_at, updated_at";

const PERIOD_COLUMNS: &str = "id, vacancy_id, name, starts_on, ends_on, created_at";

fn company_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: CompanyId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        description: row.get(5)?,
        logo_path: row.get(6)?,
        created_at: dt_at(row, 7)?,
        updated_at: dt_at(row, 8)?,
    })
}

fn vacancy_row_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Vacancy> {
    Ok(Vacancy {
        id: VacancyId(row.get(base)?),
        company_id: CompanyId(row.get(base + 1)?),
        title: row.get(base + 2)?,
        department: row.get(base + 3)?,
        location: row.get(base + 4)?,
        employment_type: row.get(base + 5)?,
        description: row.get(base + 6)?,
        requirements: row.get(base + 7)?,
        question_pack_id: row.get::<_, Option<i64>>(base + 8)?.map(QuestionPackId),
        created_at: dt_at(row, base + 9)?,
        updated_at: dt_at(row, base + 10)?,
    })
}

fn period_row_at(row: &Row<'_>, base: usize) -> rusqlite::Result<VacancyPeriod> {
    Ok(VacancyPeriod {
        id: VacancyPeriodId(row.get(base)?),
        vacancy_id: VacancyId(row.get(base + 1)?),
        name: row.get(base + 2)?,
        starts_on: day_at(row, base + 3)?,
        ends_on: day_at(row, base + 4)?,
        created_at: dt_at(row, base + 5)?,
    })
}

fn fetch_company(conn: &Connection, id: CompanyId) -> rusqlite::Result<Option<Company>> {
    conn.query_row(
        &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
        params![id.0],
        company_row,
    )
    .optional()
}

fn fetch_vacancy(conn: &Connection, id: VacancyId) -> rusqlite::Result<Option<Vacancy>> {
    conn.query_row(
        &format!("SELECT {VACANCY_COLUMNS} FROM vacancies WHERE id = ?1"),
        params![id.0],
        |row| vacancy_row_at(row, 0),
    )
    .optional()
}

fn fetch_period(conn: &Connection, id: VacancyPeriodId) -> rusqlite::Result<Option<VacancyPeriod>> {
    conn.query_row(
        &format!("SELECT {PERIOD_COLUMNS} FROM vacancy_periods WHERE id = ?1"),
        params![id.0],
        |row| period_row_at(row, 0),
    )
    .optional()
}

fn fetch_about(conn: &Connection, company: CompanyId) -> rusqlite::Result<Option<AboutUs>> {
    conn.query_row(
        "SELECT company_id, vision, mission, description, logo_path, updated_at
         FROM about_us WHERE company_id = ?1",
        params![company.0],
        |row| {
            Ok(AboutUs {
                company_id: CompanyId(row.get(0)?),
                vision: row.get(1)?,
                mission: row.get(2)?,
                description: row.get(3)?,
                logo_path: row.get(4)?,
                updated_at: dt_at(row, 5)?,
            })
        },
    )
    .optional()
}

impl CatalogRepository for SqliteStore {
    fn insert_company(
        &self,
        fields: CompanyFields,
        logo_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Company, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO companies
                (name, email, phone, address, description, logo_path, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                fields.name,
                fields.email,
                fields.phone,
                fields.address,
                fields.description,
                logo_path,
                encode_dt(at)
            ],
        )?;
        let id = CompanyId(conn.last_insert_rowid());
        fetch_company(&conn, id)?.ok_or_else(|| RepositoryError::NotFound(format!("company {id}")))
    }

    fn update_company(
        &self,
        id: CompanyId,
        fields: CompanyFields,
        logo_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Company, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE companies
             SET name = ?1, email = ?2, phone = ?3, address = ?4, description = ?5,
                 logo_path = COALESCE(?6, logo_path), updated_at = ?7
             WHERE id = ?8",
            params![
                fields.name,
                fields.email,
                fields.phone,
                fields.address,
                fields.description,
                logo_path,
                encode_dt(at),
                id.0
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("company {id}")));
        }
        fetch_company(&conn, id)?.ok_or_else(|| RepositoryError::NotFound(format!("company {id}")))
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name, id"
        ))?;
        let companies = stmt
            .query_map([], company_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(companies)
    }

    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_company(&conn, id)?)
    }

    fn delete_company(&self, id: CompanyId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM companies WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn fetch_about(&self, company: CompanyId) -> Result<Option<AboutUs>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_about(&conn, company)?)
    }

    fn upsert_about(
        &self,
        company: CompanyId,
        fields: AboutFields,
        logo_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<AboutUs, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO about_us (company_id, vision, mission, description, logo_path, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (company_id) DO UPDATE SET
                vision = excluded.vision,
                mission = excluded.mission,
                description = excluded.description,
                logo_path = COALESCE(excluded.logo_path, about_us.logo_path),
                updated_at = excluded.updated_at",
            params![
                company.0,
                fields.vision,
                fields.mission,
                fields.description,
                logo_path,
                encode_dt(at)
            ],
        )?;
        fetch_about(&conn, company)?
            .ok_or_else(|| RepositoryError::NotFound(format!("about us for company {company}")))
    }

    fn insert_vacancy(
        &self,
        fields: VacancyFields,
        at: DateTime<Utc>,
    ) -> Result<Vacancy, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO vacancies
                (company_id, title, department, location, employment_type, description,
                 requirements, question_pack_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                fields.company_id.0,
                fields.title,
                fields.department,
                fields.location,
                fields.employment_type,
                fields.description,
                fields.requirements,
                fields.question_pack_id.map(|pack| pack.0),
                encode_dt(at)
            ],
        )?;
        let id = VacancyId(conn.last_insert_rowid());
        fetch_vacancy(&conn, id)?.ok_or_else(|| RepositoryError::NotFound(format!("vacancy {id}")))
    }

    fn update_vacancy(
        &self,
        id: VacancyId,
        fields: VacancyFields,
        at: DateTime<Utc>,
    ) -> Result<Vacancy, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE vacancies
             SET company_id = ?1, title = ?2, department = ?3, location = ?4,
                 employment_type = ?5, description = ?6, requirements = ?7,
                 question_pack_id = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                fields.company_id.0,
                fields.title,
                fields.department,
                fields.location,
                fields.employment_type,
                fields.description,
                fields.requirements,
                fields.question_pack_id.map(|pack| pack.0),
                encode_dt(at),
                id.0
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("vacancy {id}")));
        }
        fetch_vacancy(&conn, id)?.ok_or_else(|| RepositoryError::NotFound(format!("vacancy {id}")))
    }

    fn list_vacancies(&self, company: Option<CompanyId>) -> Result<Vec<Vacancy>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies
             WHERE ?1 IS NULL OR company_id = ?1 ORDER BY id"
        ))?;
        let vacancies = stmt
            .query_map(params![company.map(|company| company.0)], |row| {
                vacancy_row_at(row, 0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vacancies)
    }

    fn fetch_vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_vacancy(&conn, id)?)
    }

    fn delete_vacancy(&self, id: VacancyId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM vacancies WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn question_pack_exists(&self, id: QuestionPackId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM question_packs WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_period(&self, period: NewPeriod) -> Result<VacancyPeriod, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO vacancy_periods (vacancy_id, name, starts_on, ends_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                period.vacancy_id.0,
                period.name,
                encode_day(period.starts_on),
                encode_day(period.ends_on),
                encode_dt(period.created_at)
            ],
        )?;
        let id = VacancyPeriodId(conn.last_insert_rowid());
        fetch_period(&conn, id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("vacancy period {id}")))
    }

    fn list_periods(&self, vacancy: VacancyId) -> Result<Vec<VacancyPeriod>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PERIOD_COLUMNS} FROM vacancy_periods
             WHERE vacancy_id = ?1 ORDER BY starts_on, id"
        ))?;
        let periods = stmt
            .query_map(params![vacancy.0], |row| period_row_at(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(periods)
    }

    fn fetch_period(&self, id: VacancyPeriodId) -> Result<Option<VacancyPeriod>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_period(&conn, id)?)
    }

    fn delete_period(&self, id: VacancyPeriodId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM vacancy_periods WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn open_positions(&self, day: NaiveDate) -> Result<Vec<OpenPosition>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.vacancy_id, p.name, p.starts_on, p.ends_on, p.created_at,
                    v.id, v.company_id, v.title, v.department, v.location, v.employment_type,
                    v.description, v.requirements, v.question_pack_id, v.created_at, v.updated_at,
                    c.name
             FROM vacancy_periods p
             JOIN vacancies v ON v.id = p.vacancy_id
             JOIN companies c ON c.id = v.company_id
             WHERE p.starts_on <= ?1 AND p.ends_on >= ?1
             ORDER BY p.ends_on, p.id",
        )?;
        let positions = stmt
            .query_map(params![encode_day(day)], |row| {
                Ok(OpenPosition {
                    period: period_row_at(row, 0)?,
                    vacancy: vacancy_row_at(row, 6)?,
                    company_name: row.get(17)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(positions)
    }
}
