use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::{info, warn};

use super::domain::{AboutUs, Company, OpenPosition, Vacancy, VacancyPeriod};
use super::repository::{AboutFields, CatalogRepository, CompanyFields, NewPeriod, VacancyFields};
use crate::error::RepositoryError;
use crate::ids::{CompanyId, QuestionPackId, VacancyId, VacancyPeriodId};
use crate::storage::{FileStorage, StorageError, Upload};
use crate::validation::ValidationErrors;
use crate::workflows::MultipartForm;

pub const LOGO_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "svg", "webp"];
const LOGO_DIRECTORY: &str = "logos";
const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;
const MAX_TEXT_LEN: usize = 255;

/// Company form fields, submitted as multipart alongside an optional `logo` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl CompanyInput {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name"),
            email: form.text("email"),
            phone: form.text("phone"),
            address: form.text("address"),
            description: form.text("description"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutInput {
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub description: Option<String>,
}

impl AboutInput {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            vision: form.text("vision"),
            mission: form.text("mission"),
            description: form.text("description"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyRequest {
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub question_pack_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub starts_on: Option<String>,
    #[serde(default)]
    pub ends_on: Option<String>,
}

/// HR catalog: companies, their about-us pages, vacancies and vacancy periods.
pub struct CatalogService<C> {
    repository: Arc<C>,
    storage: Arc<dyn FileStorage>,
}

impl<C> CatalogService<C>
where
    C: CatalogRepository + 'static,
{
    pub fn new(repository: Arc<C>, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.storage
    }

    pub fn create_company(
        &self,
        input: &CompanyInput,
        logo: Option<Upload>,
    ) -> Result<Company, CatalogError> {
        let fields = validate_company(input, logo.as_ref())?;
        let logo_path = self.store_logo(logo)?;

        let company = match self
            .repository
            .insert_company(fields, logo_path.clone(), Utc::now())
        {
            Ok(company) => company,
            Err(err) => {
                self.discard(logo_path.as_deref());
                return Err(err.into());
            }
        };
        info!(company_id = %company.id, name = %company.name, "company created");
        Ok(company)
    }

    pub fn update_company(
        &self,
        id: CompanyId,
        input: &CompanyInput,
        logo: Option<Upload>,
    ) -> Result<Company, CatalogError> {
        let existing = self.company(id)?;
        let fields = validate_company(input, logo.as_ref())?;
        let logo_path = self.store_logo(logo)?;

        let company = match self
            .repository
            .update_company(id, fields, logo_path.clone(), Utc::now())
        {
            Ok(company) => company,
            Err(err) => {
                self.discard(logo_path.as_deref());
                return Err(err.into());
            }
        };
        if logo_path.is_some() {
            self.discard(existing.logo_path.as_deref());
        }
        info!(company_id = %id, "company updated");
        Ok(company)
    }

    pub fn list_companies(&self) -> Result<Vec<Company>, CatalogError> {
        Ok(self.repository.list_companies()?)
    }

    pub fn company(&self, id: CompanyId) -> Result<Company, CatalogError> {
        self.repository
            .fetch_company(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("company {id}")))
    }

    /// Deletes the company and its about-us page, then their logo files.
    pub fn delete_company(&self, id: CompanyId) -> Result<(), CatalogError> {
        let company = self.company(id)?;
        let about = self.repository.fetch_about(id)?;
        self.repository.delete_company(id)?;

        self.discard(company.logo_path.as_deref());
        if let Some(about) = about {
            self.discard(about.logo_path.as_deref());
        }
        info!(company_id = %id, "company deleted");
        Ok(())
    }

    pub fn about(&self, company: CompanyId) -> Result<AboutUs, CatalogError> {
        self.company(company)?;
        self.repository
            .fetch_about(company)?
            .ok_or_else(|| CatalogError::NotFound(format!("about us for company {company}")))
    }

    pub fn upsert_about(
        &self,
        company: CompanyId,
        input: &AboutInput,
        logo: Option<Upload>,
    ) -> Result<AboutUs, CatalogError> {
        self.company(company)?;
        let mut errors = ValidationErrors::new();
        check_logo(logo.as_ref(), &mut errors);
        errors.finish()?;

        let previous = self.repository.fetch_about(company)?;
        let logo_path = self.store_logo(logo)?;
        let fields = AboutFields {
            vision: input.vision.clone(),
            mission: input.mission.clone(),
            description: input.description.clone(),
        };
        let about = match self
            .repository
            .upsert_about(company, fields, logo_path.clone(), Utc::now())
        {
            Ok(about) => about,
            Err(err) => {
                self.discard(logo_path.as_deref());
                return Err(err.into());
            }
        };
        if logo_path.is_some() {
            if let Some(previous) = previous {
                self.discard(previous.logo_path.as_deref());
            }
        }
        info!(company_id = %company, "about us updated");
        Ok(about)
    }

    pub fn create_vacancy(&self, request: &VacancyRequest) -> Result<Vacancy, CatalogError> {
        let fields = self.validate_vacancy(request)?;
        let vacancy = self.repository.insert_vacancy(fields, Utc::now())?;
        info!(vacancy_id = %vacancy.id, company_id = %vacancy.company_id, "vacancy created");
        Ok(vacancy)
    }

    pub fn update_vacancy(
        &self,
        id: VacancyId,
        request: &VacancyRequest,
    ) -> Result<Vacancy, CatalogError> {
        self.vacancy(id)?;
        let fields = self.validate_vacancy(request)?;
        let vacancy = self.repository.update_vacancy(id, fields, Utc::now())?;
        info!(vacancy_id = %id, "vacancy updated");
        Ok(vacancy)
    }

    pub fn list_vacancies(&self, company: Option<CompanyId>) -> Result<Vec<Vacancy>, CatalogError> {
        Ok(self.repository.list_vacancies(company)?)
    }

    pub fn vacancy(&self, id: VacancyId) -> Result<Vacancy, CatalogError> {
        self.repository
            .fetch_vacancy(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("vacancy {id}")))
    }

    pub fn delete_vacancy(&self, id: VacancyId) -> Result<(), CatalogError> {
        if !self.repository.delete_vacancy(id)? {
            return Err(CatalogError::NotFound(format!("vacancy {id}")));
        }
        info!(vacancy_id = %id, "vacancy deleted");
        Ok(())
    }

    pub fn create_period(
        &self,
        vacancy: VacancyId,
        request: &PeriodRequest,
    ) -> Result<VacancyPeriod, CatalogError> {
        self.vacancy(vacancy)?;
        let mut errors = ValidationErrors::new();
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        errors.require_text("name", name.as_deref(), "name is required");
        let starts_on = parse_day("starts_on", request.starts_on.as_deref(), &mut errors);
        let ends_on = parse_day("ends_on", request.ends_on.as_deref(), &mut errors);
        if let (Some(starts_on), Some(ends_on)) = (starts_on, ends_on) {
            if ends_on < starts_on {
                errors.add("ends_on", "ends_on must not be before starts_on");
            }
        }
        errors.finish()?;
        let (Some(starts_on), Some(ends_on)) = (starts_on, ends_on) else {
            return Err(ValidationErrors::single("starts_on", "starts_on is required").into());
        };

        let period = self.repository.insert_period(NewPeriod {
            vacancy_id: vacancy,
            name: name.unwrap_or_default(),
            starts_on,
            ends_on,
            created_at: Utc::now(),
        })?;
        info!(
            period_id = %period.id,
            vacancy_id = %vacancy,
            starts_on = %period.starts_on,
            ends_on = %period.ends_on,
            "vacancy period opened"
        );
        Ok(period)
    }

    pub fn list_periods(&self, vacancy: VacancyId) -> Result<Vec<VacancyPeriod>, CatalogError> {
        self.vacancy(vacancy)?;
        Ok(self.repository.list_periods(vacancy)?)
    }

    pub fn period(&self, id: VacancyPeriodId) -> Result<VacancyPeriod, CatalogError> {
        self.repository
            .fetch_period(id)?
            .ok_or_else(|| CatalogError::NotFound(format!("vacancy period {id}")))
    }

    pub fn delete_period(&self, id: VacancyPeriodId) -> Result<(), CatalogError> {
        if !self.repository.delete_period(id)? {
            return Err(CatalogError::NotFound(format!("vacancy period {id}")));
        }
        info!(period_id = %id, "vacancy period deleted");
        Ok(())
    }

    pub fn open_positions(&self, day: NaiveDate) -> Result<Vec<OpenPosition>, CatalogError> {
        Ok(self.repository.open_positions(day)?)
    }

    fn validate_vacancy(&self, request: &VacancyRequest) -> Result<VacancyFields, CatalogError> {
        let mut errors = ValidationErrors::new();
        let title = clean(request.title.as_deref());
        errors.require_text("title", title.as_deref(), "title is required");
        if title.as_ref().is_some_and(|title| title.chars().count() > MAX_TEXT_LEN) {
            errors.add("title", format!("title may not be longer than {MAX_TEXT_LEN} characters"));
        }

        let company_id = request.company_id.map(CompanyId);
        match company_id {
            None => errors.add("company_id", "company_id is required"),
            Some(id) if self.repository.fetch_company(id)?.is_none() => {
                errors.add("company_id", format!("company {id} does not exist"))
            }
            Some(_) => {}
        }

        let question_pack_id = request.question_pack_id.map(QuestionPackId);
        if let Some(pack) = question_pack_id {
            if !self.repository.question_pack_exists(pack)? {
                errors.add("question_pack_id", format!("question pack {pack} does not exist"));
            }
        }
        errors.finish()?;
        let Some(company_id) = company_id else {
            return Err(ValidationErrors::single("company_id", "company_id is required").into());
        };

        Ok(VacancyFields {
            company_id,
            title: title.unwrap_or_default(),
            department: clean(request.department.as_deref()),
            location: clean(request.location.as_deref()),
            employment_type: clean(request.employment_type.as_deref()),
            description: clean(request.description.as_deref()),
            requirements: clean(request.requirements.as_deref()),
            question_pack_id,
        })
    }

    fn store_logo(&self, logo: Option<Upload>) -> Result<Option<String>, StorageError> {
        logo.map(|logo| {
            self.storage
                .put(LOGO_DIRECTORY, &logo.file_name, &logo.bytes)
        })
        .transpose()
    }

    fn discard(&self, path: Option<&str>) {
        let Some(path) = path else {
            return;
        };
        if let Err(err) = self.storage.delete(path) {
            warn!(%path, error = %err, "failed to remove stored logo");
        }
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn check_logo(logo: Option<&Upload>, errors: &mut ValidationErrors) {
    let Some(logo) = logo else {
        return;
    };
    if !logo.has_extension(&LOGO_EXTENSIONS) {
        errors.add("logo", "logo must be a png, jpg, jpeg, gif, svg, or webp image");
    }
    if logo.bytes.len() > MAX_LOGO_BYTES {
        errors.add("logo", "logo may not be larger than 2 MB");
    }
}

fn validate_company(
    input: &CompanyInput,
    logo: Option<&Upload>,
) -> Result<CompanyFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = clean(input.name.as_deref());
    errors.require_text("name", name.as_deref(), "name is required");
    if name.as_ref().is_some_and(|name| name.chars().count() > MAX_TEXT_LEN) {
        errors.add("name", format!("name may not be longer than {MAX_TEXT_LEN} characters"));
    }
    let email = clean(input.email.as_deref());
    if email.as_ref().is_some_and(|email| !email.contains('@')) {
        errors.add("email", "email must be a valid address");
    }
    check_logo(logo, &mut errors);
    errors.finish()?;

    Ok(CompanyFields {
        name: name.unwrap_or_default(),
        email,
        phone: clean(input.phone.as_deref()),
        address: clean(input.address.as_deref()),
        description: clean(input.description.as_deref()),
    })
}

fn parse_day(field: &str, raw: Option<&str>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => {
            errors.add(field, format!("{field} is required"));
            None
        }
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(day) => Some(day),
            Err(_) => {
                errors.add(field, format!("{field} must be a date formatted YYYY-MM-DD"));
                None
            }
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("catalog task failed: {0}")]
    Worker(#[from] JoinError),
}
