//! Companies, about-us pages, vacancies, and vacancy periods managed by HR.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{AboutUs, Company, OpenPosition, Vacancy, VacancyPeriod};
pub use repository::{AboutFields, CatalogRepository, CompanyFields, NewPeriod, VacancyFields};
pub use router::catalog_router;
pub use service::{
    AboutInput, CatalogError, CatalogService, CompanyInput, PeriodRequest, VacancyRequest,
    LOGO_EXTENSIONS,
};
