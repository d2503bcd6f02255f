use super::common::*;
use crate::ids::UserId;
use crate::storage::FileStorage;
use crate::workflows::candidates::{
    CandidateError, EducationRequest, ExperienceRequest, ProfileRequest, SkillRequest,
};

#[test]
fn profile_requires_name_and_valid_email() {
    let fixture = build_service();
    let request = ProfileRequest {
        full_name: Some(" ".to_string()),
        email: Some("rina.example.test".to_string()),
        birth_date: Some("17-08-1996".to_string()),
        ..ProfileRequest::default()
    };

    let err = fixture
        .service
        .upsert_profile(CANDIDATE, &request)
        .expect_err("invalid profile");

    let CandidateError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.has("full_name"));
    assert!(errors.has("email"));
    assert!(errors.has("birth_date"));
}

#[test]
fn upsert_overwrites_the_existing_profile() {
    let fixture = build_service().with_profile();

    let updated = fixture
        .service
        .upsert_profile(
            CANDIDATE,
            &ProfileRequest {
                full_name: Some("Rina L.".to_string()),
                email: Some("rina@work.test".to_string()),
                ..ProfileRequest::default()
            },
        )
        .expect("profile updated");

    assert_eq!(updated.full_name, "Rina L.");
    assert_eq!(updated.phone, None);
    assert_eq!(fixture.service.profile(CANDIDATE).expect("profile"), updated);
}

#[test]
fn education_years_must_be_ordered() {
    let fixture = build_service();

    let err = fixture
        .service
        .add_education(
            CANDIDATE,
            &EducationRequest {
                institution: Some("Universitas Indonesia".to_string()),
                start_year: Some(2018),
                end_year: Some(2016),
                gpa: Some(4.5),
                ..EducationRequest::default()
            },
        )
        .expect_err("invalid education");

    let CandidateError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.has("end_year"));
    assert!(errors.has("gpa"));
    assert!(!errors.has("institution"));
}

#[test]
fn experience_end_may_not_precede_start() {
    let fixture = build_service();

    let err = fixture
        .service
        .add_experience(
            CANDIDATE,
            &ExperienceRequest {
                company_name: Some("Tokopedia".to_string()),
                position: Some("Intern".to_string()),
                started_on: Some("2022-05-01".to_string()),
                ended_on: Some("2022-04-30".to_string()),
                description: None,
            },
        )
        .expect_err("invalid experience");
    let CandidateError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.has("ended_on"));

    let err = fixture
        .service
        .add_experience(CANDIDATE, &ExperienceRequest::default())
        .expect_err("empty experience");
    let CandidateError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.has("company_name"));
    assert!(errors.has("position"));
    assert!(errors.has("started_on"));
}

#[test]
fn sections_are_scoped_to_their_owner() {
    let fixture = build_service().with_profile();
    let education = fixture
        .service
        .add_education(
            CANDIDATE,
            &EducationRequest {
                institution: Some("ITB".to_string()),
                degree: Some("S1".to_string()),
                field_of_study: Some("Informatics".to_string()),
                start_year: Some(2014),
                end_year: Some(2018),
                gpa: Some(3.62),
            },
        )
        .expect("education added");

    assert!(matches!(
        fixture.service.delete_education(UserId(99), education.id),
        Err(CandidateError::NotFound(_))
    ));
    assert_eq!(fixture.service.resume(CANDIDATE).expect("resume").educations.len(), 1);

    fixture
        .service
        .delete_education(CANDIDATE, education.id)
        .expect("own education deleted");
    assert!(fixture.service.resume(CANDIDATE).expect("resume").educations.is_empty());
    assert!(matches!(
        fixture.service.delete_education(CANDIDATE, education.id),
        Err(CandidateError::NotFound(_))
    ));
}

#[test]
fn skill_needs_a_name() {
    let fixture = build_service();

    let err = fixture
        .service
        .add_skill(CANDIDATE, &SkillRequest::default())
        .expect_err("nameless skill");
    assert!(matches!(err, CandidateError::Validation(ref errors) if errors.has("name")));

    let skill = fixture
        .service
        .add_skill(
            CANDIDATE,
            &SkillRequest {
                name: Some("SQL".to_string()),
                level: Some("advanced".to_string()),
            },
        )
        .expect("skill added");
    assert_eq!(skill.name, "SQL");
    assert_eq!(skill.user_id, CANDIDATE);
}

#[test]
fn generate_cv_stores_html_and_replaces_previous_file() {
    let fixture = build_service().with_profile();
    fixture
        .service
        .add_skill(
            CANDIDATE,
            &SkillRequest {
                name: Some("Rust".to_string()),
                level: None,
            },
        )
        .expect("skill added");

    let first = fixture.service.generate_cv(CANDIDATE).expect("first cv");
    let first_path = first.cv_path.expect("cv path");
    assert!(first_path.starts_with("cv/"));
    assert!(first_path.ends_with(".html"));

    let html = String::from_utf8(fixture.storage.read(&first_path).expect("cv readable"))
        .expect("utf-8 cv");
    assert!(html.contains("Rina Lubis"));
    assert!(html.contains("Rust"));
    assert!(html.contains("&lt;b&gt;tidy&lt;"));

    let second = fixture.service.generate_cv(CANDIDATE).expect("second cv");
    let second_path = second.cv_path.expect("cv path");
    assert_ne!(first_path, second_path);
    assert!(!fixture.storage.exists(&first_path));
    assert!(fixture.storage.exists(&second_path));

    let download = fixture.service.download_cv(CANDIDATE).expect("download");
    assert_eq!(download.path, second_path);
    assert_eq!(download.file_name, "cv-rina-lubis.html");
}

#[test]
fn cv_needs_a_profile() {
    let fixture = build_service();

    assert!(matches!(
        fixture.service.generate_cv(CANDIDATE),
        Err(CandidateError::NotFound(_))
    ));
    assert!(matches!(
        fixture.service.download_cv(CANDIDATE),
        Err(CandidateError::NotFound(_))
    ));
}

#[test]
fn download_before_generation_is_not_found() {
    let fixture = build_service().with_profile();

    assert!(matches!(
        fixture.service.download_cv(CANDIDATE),
        Err(CandidateError::NotFound(_))
    ));
}
