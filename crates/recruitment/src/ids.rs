//! Row identifiers shared across the workflow modules.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Candidate or HR staff account.
    UserId
);
row_id!(ApplicationId);
row_id!(HistoryId);
row_id!(CompanyId);
row_id!(VacancyId);
row_id!(
    /// Dated window in which a vacancy accepts applications.
    VacancyPeriodId
);
row_id!(QuestionPackId);
row_id!(QuestionId);
row_id!(ChoiceId);
row_id!(AnswerId);
row_id!(EducationId);
row_id!(ExperienceId);
row_id!(SkillId);
