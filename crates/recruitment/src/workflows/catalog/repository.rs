use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{AboutUs, Company, OpenPosition, Vacancy, VacancyPeriod};
use crate::error::RepositoryError;
use crate::ids::{CompanyId, QuestionPackId, VacancyId, VacancyPeriodId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFields {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AboutFields {
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacancyFields {
    pub company_id: CompanyId,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub question_pack_id: Option<QuestionPackId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeriod {
    pub vacancy_id: VacancyId,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Storage port for companies, vacancies and their application windows.
///
/// Deletes return `false` when the row did not exist and `Conflict` when
/// dependent rows (vacancies, periods, applications) still reference it.
pub trait CatalogRepository: Send + Sync {
    fn insert_company(
        &self,
        fields: CompanyFields,
        logo_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Company, RepositoryError>;

    /// `logo_path` of `None` keeps the stored logo.
    fn update_company(
        &self,
        id: CompanyId,
        fields: CompanyFields,
        logo_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Company, RepositoryError>;

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;

    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;

    /// Removes the company with its about-us page.
    fn delete_company(&self, id: CompanyId) -> Result<bool, RepositoryError>;

    fn fetch_about(&self, company: CompanyId) -> Result<Option<AboutUs>, RepositoryError>;

    fn upsert_about(
        &self,
        company: CompanyId,
        fields: AboutFields,
        logo_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<AboutUs, RepositoryError>;

    fn insert_vacancy(
        &self,
        fields: VacancyFields,
        at: DateTime<Utc>,
    ) -> Result<Vacancy, RepositoryError>;

    fn update_vacancy(
        &self,
        id: VacancyId,
        fields: VacancyFields,
        at: DateTime<Utc>,
    ) -> Result<Vacancy, RepositoryError>;

    fn list_vacancies(&self, company: Option<CompanyId>) -> Result<Vec<Vacancy>, RepositoryError>;

    fn fetch_vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, RepositoryError>;

    fn delete_vacancy(&self, id: VacancyId) -> Result<bool, RepositoryError>;

    fn question_pack_exists(&self, id: QuestionPackId) -> Result<bool, RepositoryError>;

    fn insert_period(&self, period: NewPeriod) -> Result<VacancyPeriod, RepositoryError>;

    fn list_periods(&self, vacancy: VacancyId) -> Result<Vec<VacancyPeriod>, RepositoryError>;

    fn fetch_period(&self, id: VacancyPeriodId) -> Result<Option<VacancyPeriod>, RepositoryError>;

    fn delete_period(&self, id: VacancyPeriodId) -> Result<bool, RepositoryError>;

    /// Periods accepting applications on `day`, soonest closing first.
    fn open_positions(&self, day: NaiveDate) -> Result<Vec<OpenPosition>, RepositoryError>;
}
