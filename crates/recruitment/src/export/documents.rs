//! Pre-formatted views handed to the HTML templates.
//!
//! Every field is already a display string so the templates only loop and
//! print.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::workflows::assessment::{AnswerSheet, QuestionKind, SheetEntry};
use crate::workflows::candidates::{CandidateResume, Education, Experience};
use crate::workflows::catalog::{Company, Vacancy, VacancyPeriod};
use crate::workflows::pipeline::{Application, ApplicationHistory};

const DATE: &str = "%d %B %Y";
const DATE_TIME: &str = "%d %B %Y %H:%M UTC";

pub(crate) fn day_text(day: NaiveDate) -> String {
    day.format(DATE).to_string()
}

pub(crate) fn time_text(at: DateTime<Utc>) -> String {
    at.format(DATE_TIME).to_string()
}

/// Scores print without trailing zeros: `80`, `72.5`.
pub(crate) fn score_text(score: f32) -> String {
    let rounded = (score * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EducationLine {
    pub institution: String,
    pub program: String,
    pub years: String,
    pub gpa: String,
}

impl From<&Education> for EducationLine {
    fn from(education: &Education) -> Self {
        let program = [education.degree.as_deref(), education.field_of_study.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let years = match education.end_year {
            Some(end) => format!("{} - {end}", education.start_year),
            None => format!("{} - present", education.start_year),
        };
        Self {
            institution: education.institution.clone(),
            program,
            years,
            gpa: education.gpa.map(|gpa| format!("{gpa:.2}")).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperienceLine {
    pub position: String,
    pub company_name: String,
    pub period: String,
    pub description: String,
}

impl From<&Experience> for ExperienceLine {
    fn from(experience: &Experience) -> Self {
        let ended = experience
            .ended_on
            .map(|day| day.format("%B %Y").to_string())
            .unwrap_or_else(|| "present".to_string());
        Self {
            position: experience.position.clone(),
            company_name: experience.company_name.clone(),
            period: format!("{} - {ended}", experience.started_on.format("%B %Y")),
            description: experience.description.clone().unwrap_or_default(),
        }
    }
}

/// Candidate block shared by the CV and the dossier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSection {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birth_date: String,
    pub summary: String,
    pub educations: Vec<EducationLine>,
    pub experiences: Vec<ExperienceLine>,
    pub skills: Vec<String>,
}

impl From<&CandidateResume> for CandidateSection {
    fn from(resume: &CandidateResume) -> Self {
        let profile = &resume.profile;
        Self {
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            birth_date: profile.birth_date.map(day_text).unwrap_or_default(),
            summary: profile.summary.clone().unwrap_or_default(),
            educations: resume.educations.iter().map(EducationLine::from).collect(),
            experiences: resume.experiences.iter().map(ExperienceLine::from).collect(),
            skills: resume
                .skills
                .iter()
                .map(|skill| match &skill.level {
                    Some(level) => format!("{} ({level})", skill.name),
                    None => skill.name.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CvDocument {
    pub candidate: CandidateSection,
    pub generated_on: String,
}

impl CvDocument {
    pub fn new(resume: &CandidateResume, today: NaiveDate) -> Self {
        Self {
            candidate: CandidateSection::from(resume),
            generated_on: day_text(today),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryLine {
    pub status_name: String,
    pub processed_at: String,
    pub completed_at: String,
    pub score: String,
    pub notes: String,
    pub reviewer: String,
    pub interview: String,
    pub active: bool,
}

impl From<&ApplicationHistory> for HistoryLine {
    fn from(entry: &ApplicationHistory) -> Self {
        let interview = match (&entry.zoom_url, entry.scheduled_at) {
            (Some(url), Some(at)) => format!("{} via {url}", time_text(at)),
            (Some(url), None) => url.clone(),
            (None, Some(at)) => time_text(at),
            (None, None) => String::new(),
        };
        Self {
            status_name: entry.status.name().to_string(),
            processed_at: time_text(entry.processed_at),
            completed_at: entry.completed_at.map(time_text).unwrap_or_default(),
            score: entry.score.map(score_text).unwrap_or_default(),
            notes: entry.notes.clone().unwrap_or_default(),
            reviewer: entry
                .reviewed_by
                .map(|user| format!("#{user}"))
                .unwrap_or_default(),
            interview,
            active: entry.is_active,
        }
    }
}

/// Everything HR prints about one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DossierDocument {
    pub application_id: i64,
    pub user_id: i64,
    pub status_name: String,
    pub applied_at: String,
    pub company_name: String,
    pub vacancy_title: String,
    pub period_name: String,
    pub period_window: String,
    pub resume_url: String,
    pub cover_letter_url: String,
    pub candidate: Option<CandidateSection>,
    pub history: Vec<HistoryLine>,
    pub generated_on: String,
}

/// Catalog rows describing the position applied for.
pub struct Position<'a> {
    pub company: Option<&'a Company>,
    pub vacancy: Option<&'a Vacancy>,
    pub period: Option<&'a VacancyPeriod>,
}

impl DossierDocument {
    pub fn new(
        application: &Application,
        position: Position<'_>,
        resume: Option<&CandidateResume>,
        history: &[ApplicationHistory],
        document_url: impl Fn(&str) -> String,
        today: NaiveDate,
    ) -> Self {
        Self {
            application_id: application.id.0,
            user_id: application.user_id.0,
            status_name: application.status.name().to_string(),
            applied_at: time_text(application.created_at),
            company_name: position
                .company
                .map(|company| company.name.clone())
                .unwrap_or_default(),
            vacancy_title: position
                .vacancy
                .map(|vacancy| vacancy.title.clone())
                .unwrap_or_default(),
            period_name: position
                .period
                .map(|period| period.name.clone())
                .unwrap_or_default(),
            period_window: position
                .period
                .map(|period| format!("{} - {}", day_text(period.starts_on), day_text(period.ends_on)))
                .unwrap_or_default(),
            resume_url: application
                .resume_path
                .as_deref()
                .map(&document_url)
                .unwrap_or_default(),
            cover_letter_url: application
                .cover_letter_path
                .as_deref()
                .map(&document_url)
                .unwrap_or_default(),
            candidate: resume.map(CandidateSection::from),
            history: history.iter().map(HistoryLine::from).collect(),
            generated_on: day_text(today),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetLine {
    pub number: usize,
    pub kind: String,
    pub prompt: String,
    pub answer: String,
    pub verdict: String,
    pub score: String,
    pub points: u32,
}

impl SheetLine {
    fn new(number: usize, entry: &SheetEntry) -> Self {
        let question = &entry.question;
        let answer = entry.answer.as_ref();
        let answer_text = match question.kind {
            QuestionKind::MultipleChoice => answer
                .and_then(|answer| answer.choice_id)
                .and_then(|choice| question.choice(choice))
                .map(|choice| choice.label.clone()),
            QuestionKind::Essay => answer.and_then(|answer| answer.answer_text.clone()),
        };
        let verdict = match (answer, entry.is_correct, question.kind) {
            (None, _, _) => "not answered",
            (Some(_), Some(true), _) => "correct",
            (Some(_), Some(false), _) => "incorrect",
            (Some(answer), None, QuestionKind::Essay) if answer.score.is_none() => "awaiting grade",
            (Some(_), None, _) => "graded",
        };
        Self {
            number,
            kind: match question.kind {
                QuestionKind::MultipleChoice => "Multiple choice".to_string(),
                QuestionKind::Essay => "Essay".to_string(),
            },
            prompt: question.prompt.clone(),
            answer: answer_text.unwrap_or_default(),
            verdict: verdict.to_string(),
            score: answer
                .and_then(|answer| answer.score)
                .map(score_text)
                .unwrap_or_default(),
            points: question.points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSheetDocument {
    pub application_id: i64,
    pub candidate_name: String,
    pub pack_name: String,
    pub lines: Vec<SheetLine>,
    pub answered: usize,
    pub questions: usize,
    pub correct: usize,
    pub multiple_choice: usize,
    pub pending_essays: usize,
    pub total_score: String,
    pub max_score: String,
    pub generated_on: String,
}

impl AnswerSheetDocument {
    pub fn new(sheet: &AnswerSheet, candidate_name: Option<&str>, today: NaiveDate) -> Self {
        let summary = &sheet.summary;
        let multiple_choice = sheet
            .entries
            .iter()
            .filter(|entry| entry.question.kind == QuestionKind::MultipleChoice)
            .count();
        Self {
            application_id: sheet.application_id.0,
            candidate_name: candidate_name
                .map(str::to_string)
                .unwrap_or_else(|| format!("Candidate #{}", sheet.user_id)),
            pack_name: sheet
                .pack
                .as_ref()
                .map(|pack| pack.name.clone())
                .unwrap_or_else(|| "No question pack".to_string()),
            lines: sheet
                .entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| SheetLine::new(idx + 1, entry))
                .collect(),
            answered: summary.answered,
            questions: summary.questions,
            correct: summary.correct,
            multiple_choice,
            pending_essays: summary.pending_essays,
            total_score: score_text(summary.total_score),
            max_score: score_text(summary.max_score),
            generated_on: day_text(today),
        }
    }
}
