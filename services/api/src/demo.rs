use crate::infra::Services;
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use recruitment::config::{AppConfig, TelemetryConfig};
use recruitment::error::AppError;
use recruitment::ids::{ApplicationId, UserId, VacancyPeriodId};
use recruitment::storage::{FileStorage, LocalDiskStorage};
use recruitment::store::SqliteStore;
use recruitment::telemetry;
use recruitment::workflows::assessment::{
    AnswerRequest, ChoiceRequest, GradeRequest, PackRequest, QuestionKind, QuestionRequest,
    SubmitAnswersRequest,
};
use recruitment::workflows::candidates::{
    EducationRequest, ExperienceRequest, ProfileRequest, SkillRequest,
};
use recruitment::workflows::catalog::{AboutInput, CompanyInput, PeriodRequest, VacancyRequest};
use recruitment::workflows::pipeline::{ApplicationDetail, Stage, StageActionRequest};
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_REVIEWER: UserId = UserId(1);
const DEMO_CANDIDATE: UserId = UserId(101);

#[derive(Args, Debug)]
pub(crate) struct SeedArgs {
    /// First day the seeded period accepts applications (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) opens_on: Option<NaiveDate>,
    /// Number of days the seeded period stays open.
    #[arg(long, default_value_t = 30)]
    pub(crate) days: i64,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Vacancy period to report on
    #[arg(long)]
    pub(crate) period: i64,
    /// Write the CSV to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory for files written during the demo. Defaults to a fresh temp directory.
    #[arg(long)]
    pub(crate) storage_dir: Option<PathBuf>,
    /// Print the rendered dossier HTML after the pipeline run.
    #[arg(long)]
    pub(crate) show_dossier: bool,
}

/// Ids of the catalog entries created by [`seed_position`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeededPosition {
    pub(crate) period: VacancyPeriodId,
    pub(crate) vacancy: i64,
    pub(crate) company: i64,
    pub(crate) pack: i64,
}

fn open_configured() -> Result<Services, AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(SqliteStore::open(&config.database.path)?);
    std::fs::create_dir_all(&config.storage.root)?;
    let storage: Arc<dyn FileStorage> = Arc::new(LocalDiskStorage::new(
        config.storage.root,
        config.storage.public_url,
    ));
    Services::build(store, storage)
}

pub(crate) fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let services = open_configured()?;
    let opens_on = args.opens_on.unwrap_or_else(|| Utc::now().date_naive());
    let seeded = seed_position(&services, opens_on, args.days)?;

    println!("Seeded recruitment catalog");
    println!("  company         #{}", seeded.company);
    println!("  question pack   #{}", seeded.pack);
    println!("  vacancy         #{}", seeded.vacancy);
    println!("  vacancy period  #{}", seeded.period);
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let services = open_configured()?;
    let csv = services
        .export
        .period_report_csv(VacancyPeriodId(args.period))?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, csv)?;
            println!("Report for period #{} written to {}", args.period, path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

/// Company, question pack, vacancy, and one open period to apply to.
pub(crate) fn seed_position(
    services: &Services,
    opens_on: NaiveDate,
    days: i64,
) -> Result<SeededPosition, AppError> {
    let pack = services.assessment.create_pack(&PackRequest {
        name: Some("General Aptitude".to_string()),
        description: Some("Reasoning and written communication".to_string()),
        duration_minutes: Some(45),
    })?;
    let choice = |label: &str, is_correct: bool| ChoiceRequest {
        label: Some(label.to_string()),
        is_correct,
    };
    services.assessment.add_question(
        pack.id,
        &QuestionRequest {
            kind: Some("multiple_choice".to_string()),
            prompt: Some("Which number continues the series 2, 4, 8, 16?".to_string()),
            points: Some(2),
            choices: vec![choice("24", false), choice("32", true), choice("30", false)],
        },
    )?;
    services.assessment.add_question(
        pack.id,
        &QuestionRequest {
            kind: Some("multiple_choice".to_string()),
            prompt: Some("A meeting moves from 09:00 to 10:30. How long was the delay?".to_string()),
            points: Some(2),
            choices: vec![choice("90 minutes", true), choice("60 minutes", false)],
        },
    )?;
    services.assessment.add_question(
        pack.id,
        &QuestionRequest {
            kind: Some("essay".to_string()),
            prompt: Some("Describe a project you are proud of.".to_string()),
            points: Some(10),
            choices: Vec::new(),
        },
    )?;

    let company = services.catalog.create_company(
        &CompanyInput {
            name: Some("PT Nusantara Digital".to_string()),
            email: Some("careers@nusantara.example".to_string()),
            phone: Some("+62 21 555 0100".to_string()),
            address: Some("Jl. Sudirman 10, Jakarta".to_string()),
            description: Some("Payments infrastructure for Indonesian merchants".to_string()),
        },
        None,
    )?;
    services.catalog.upsert_about(
        company.id,
        &AboutInput {
            vision: Some("Every merchant paid on time".to_string()),
            mission: Some("Build dependable payment rails".to_string()),
            description: Some("Founded in Jakarta, serving merchants nationwide.".to_string()),
        },
        None,
    )?;

    let vacancy = services.catalog.create_vacancy(&VacancyRequest {
        company_id: Some(company.id.0),
        title: Some("Backend Engineer".to_string()),
        department: Some("Engineering".to_string()),
        location: Some("Jakarta".to_string()),
        employment_type: Some("full_time".to_string()),
        description: Some("Own the settlement services.".to_string()),
        requirements: Some("Three years building web services.".to_string()),
        question_pack_id: Some(pack.id.0),
    })?;
    let closes_on = opens_on + Duration::days(days.max(0));
    let period = services.catalog.create_period(
        vacancy.id,
        &PeriodRequest {
            name: Some(format!("Intake {}", opens_on.format("%B %Y"))),
            starts_on: Some(opens_on.format("%Y-%m-%d").to_string()),
            ends_on: Some(closes_on.format("%Y-%m-%d").to_string()),
        },
    )?;

    Ok(SeededPosition {
        period: period.id,
        vacancy: vacancy.id.0,
        company: company.id.0,
        pack: pack.id.0,
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    // Candidate notifications surface as log lines.
    telemetry::init(&TelemetryConfig {
        log_level: "info".to_string(),
    })?;
    let storage_dir = args.storage_dir.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("recruitment-demo-{}", std::process::id()))
    });
    std::fs::create_dir_all(&storage_dir)?;
    let store = Arc::new(SqliteStore::open_in_memory()?);
    let storage: Arc<dyn FileStorage> =
        Arc::new(LocalDiskStorage::new(storage_dir.clone(), "/storage"));
    let services = Services::build(store, storage)?;

    println!("=== Recruitment Admin Demo ===");
    let seeded = seed_position(&services, Utc::now().date_naive(), 30)?;
    println!(
        "Catalog: company #{}, vacancy #{}, period #{}, question pack #{}",
        seeded.company, seeded.vacancy, seeded.period, seeded.pack
    );

    fill_profile(&services)?;
    let cv = services.candidates.generate_cv(DEMO_CANDIDATE)?;
    println!(
        "Candidate #{DEMO_CANDIDATE} profile saved, CV at {}",
        cv.cv_path.as_deref().unwrap_or("-")
    );

    let application = services.pipeline.apply(DEMO_CANDIDATE, seeded.period)?;
    println!("Application #{} received", application.id);

    let detail = decide(
        &services,
        application.id,
        Stage::Administration,
        StageActionRequest {
            status: Some("passed".to_string()),
            score: Some(85.0),
            notes: Some("Relevant payments experience".to_string()),
            ..StageActionRequest::default()
        },
    )?;
    print_step("administration", &detail);

    take_psychotest(&services, application.id)?;

    let scheduled_at = (Utc::now() + Duration::days(3)).to_rfc3339();
    let detail = decide(
        &services,
        application.id,
        Stage::Psychotest,
        StageActionRequest {
            status: Some("passed".to_string()),
            zoom_url: Some("https://zoom.us/j/4815162342".to_string()),
            scheduled_at: Some(scheduled_at),
            ..StageActionRequest::default()
        },
    )?;
    print_step("psychotest", &detail);

    let detail = decide(
        &services,
        application.id,
        Stage::Interview,
        StageActionRequest {
            status: Some("passed".to_string()),
            score: Some(90.0),
            notes: Some("Clear system design reasoning".to_string()),
            ..StageActionRequest::default()
        },
    )?;
    print_step("interview", &detail);

    println!();
    println!("History for application #{}:", application.id);
    for entry in &detail.history {
        println!(
            "  {:<16} active={:<5} score={:<6} reviewed={}",
            entry.status.code(),
            entry.is_active,
            entry
                .score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry
                .reviewed_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    let dossier = services.export.dossier(application.id)?;
    let sheet = services.export.answer_sheet(application.id)?;
    let dossier_path = storage_dir.join(format!("dossier-{}.html", application.id));
    let sheet_path = storage_dir.join(format!("answer-sheet-{}.html", application.id));
    std::fs::write(&dossier_path, &dossier)?;
    std::fs::write(&sheet_path, &sheet)?;
    println!();
    println!("Dossier written to {}", dossier_path.display());
    println!("Answer sheet written to {}", sheet_path.display());
    if args.show_dossier {
        println!("{dossier}");
    }

    println!();
    println!("Period report:");
    print!("{}", services.export.period_report_csv(seeded.period)?);
    Ok(())
}

fn fill_profile(services: &Services) -> Result<(), AppError> {
    let candidates = &services.candidates;
    candidates.upsert_profile(
        DEMO_CANDIDATE,
        &ProfileRequest {
            full_name: Some("Dewi Sartika".to_string()),
            email: Some("dewi@example.test".to_string()),
            phone: Some("+62 812 0000 1111".to_string()),
            address: Some("Bandung".to_string()),
            birth_date: Some("1996-04-12".to_string()),
            summary: Some("Backend engineer focused on payment systems.".to_string()),
        },
    )?;
    candidates.add_education(
        DEMO_CANDIDATE,
        &EducationRequest {
            institution: Some("Institut Teknologi Bandung".to_string()),
            degree: Some("S1".to_string()),
            field_of_study: Some("Informatics".to_string()),
            start_year: Some(2014),
            end_year: Some(2018),
            gpa: Some(3.6),
        },
    )?;
    candidates.add_experience(
        DEMO_CANDIDATE,
        &ExperienceRequest {
            company_name: Some("Kopi Pay".to_string()),
            position: Some("Software Engineer".to_string()),
            started_on: Some("2019-02-01".to_string()),
            ended_on: None,
            description: Some("Settlement and reconciliation services.".to_string()),
        },
    )?;
    candidates.add_skill(
        DEMO_CANDIDATE,
        &SkillRequest {
            name: Some("Rust".to_string()),
            level: Some("advanced".to_string()),
        },
    )?;
    Ok(())
}

fn take_psychotest(services: &Services, application: ApplicationId) -> Result<(), AppError> {
    let test = services
        .assessment
        .questions_for_application(application, DEMO_CANDIDATE)?;
    println!(
        "Psychotest '{}' handed out with {} questions",
        test.pack_name,
        test.questions.len()
    );

    let answers = test
        .questions
        .iter()
        .map(|question| match question.kind {
            QuestionKind::MultipleChoice => AnswerRequest {
                question_id: question.id.0,
                choice_id: question.choices.first().map(|choice| choice.id.0),
                answer_text: None,
            },
            QuestionKind::Essay => AnswerRequest {
                question_id: question.id.0,
                choice_id: None,
                answer_text: Some("I rebuilt our settlement batch into a streaming job.".to_string()),
            },
        })
        .collect();
    let recorded = services.assessment.submit_answers(
        application,
        DEMO_CANDIDATE,
        &SubmitAnswersRequest { answers },
    )?;

    for answer in recorded.iter().filter(|answer| answer.score.is_none()) {
        services.assessment.grade_answer(
            answer.id,
            &GradeRequest { score: Some(8.0) },
            DEMO_REVIEWER,
        )?;
    }
    println!("{} answers recorded and graded", recorded.len());
    Ok(())
}

fn decide(
    services: &Services,
    application: ApplicationId,
    stage: Stage,
    request: StageActionRequest,
) -> Result<ApplicationDetail, AppError> {
    Ok(services
        .pipeline
        .act(application, stage, &request, DEMO_REVIEWER)?)
}

fn print_step(stage: &str, detail: &ApplicationDetail) {
    let score = detail
        .history
        .iter()
        .rev()
        .find_map(|entry| entry.score)
        .map(|score| score.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Decided {stage:<14} -> {} (last score {score})",
        detail.status.name
    );
}
