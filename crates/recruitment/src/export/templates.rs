use minijinja::Environment;
use serde::Serialize;

use super::documents::{AnswerSheetDocument, CvDocument, DossierDocument};
use super::ExportError;

const CV_TEMPLATE: &str = "cv.html";
const DOSSIER_TEMPLATE: &str = "dossier.html";
const ANSWER_SHEET_TEMPLATE: &str = "answer_sheet.html";

const STYLE: &str = r#"<style>
body { font-family: "Helvetica Neue", Arial, sans-serif; color: #222; margin: 32px; font-size: 13px; }
h1 { font-size: 22px; margin-bottom: 4px; }
h2 { font-size: 15px; border-bottom: 1px solid #999; padding-bottom: 2px; margin-top: 24px; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 4px 6px; text-align: left; vertical-align: top; }
th { background: #f2f2f2; }
.muted { color: #777; }
.active { font-weight: bold; }
@media print { body { margin: 0; } }
</style>"#;

/// Reads `candidate` from the including template's context.
const CANDIDATE_BLOCK: &str = r#"<h2>Profile</h2>
<p><strong>{{ candidate.full_name }}</strong><br>
{{ candidate.email }}{% if candidate.phone %} | {{ candidate.phone }}{% endif %}<br>
{% if candidate.address %}{{ candidate.address }}<br>{% endif %}
{% if candidate.birth_date %}Born {{ candidate.birth_date }}{% endif %}</p>
{% if candidate.summary %}<p>{{ candidate.summary }}</p>{% endif %}
<h2>Education</h2>
{% for education in candidate.educations %}
<p><strong>{{ education.institution }}</strong> <span class="muted">{{ education.years }}</span><br>
{{ education.program }}{% if education.gpa %} | GPA {{ education.gpa }}{% endif %}</p>
{% else %}<p class="muted">No education recorded.</p>{% endfor %}
<h2>Experience</h2>
{% for experience in candidate.experiences %}
<p><strong>{{ experience.position }}</strong>, {{ experience.company_name }} <span class="muted">{{ experience.period }}</span>
{% if experience.description %}<br>{{ experience.description }}{% endif %}</p>
{% else %}<p class="muted">No experience recorded.</p>{% endfor %}
<h2>Skills</h2>
{% if candidate.skills %}<ul>{% for skill in candidate.skills %}<li>{{ skill }}</li>{% endfor %}</ul>
{% else %}<p class="muted">No skills recorded.</p>{% endif %}
"#;

const CV_SOURCE: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>CV {{ candidate.full_name }}</title>{% include "style.html" %}</head>
<body>
<h1>{{ candidate.full_name }}</h1>
<p class="muted">Curriculum vitae generated on {{ generated_on }}</p>
{% include "candidate.html" %}
</body></html>
"#;

const DOSSIER_SOURCE: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Application #{{ application_id }}</title>{% include "style.html" %}</head>
<body>
<h1>Application #{{ application_id }}</h1>
<p class="muted">Dossier generated on {{ generated_on }}</p>
<table>
<tr><th>Company</th><td>{{ company_name }}</td></tr>
<tr><th>Vacancy</th><td>{{ vacancy_title }}</td></tr>
<tr><th>Period</th><td>{{ period_name }} ({{ period_window }})</td></tr>
<tr><th>Status</th><td>{{ status_name }}</td></tr>
<tr><th>Applied</th><td>{{ applied_at }}</td></tr>
<tr><th>Resume</th><td>{% if resume_url %}<a href="{{ resume_url }}">{{ resume_url }}</a>{% else %}-{% endif %}</td></tr>
<tr><th>Cover letter</th><td>{% if cover_letter_url %}<a href="{{ cover_letter_url }}">{{ cover_letter_url }}</a>{% else %}-{% endif %}</td></tr>
</table>
{% if candidate %}{% include "candidate.html" %}{% else %}
<h2>Profile</h2><p class="muted">Candidate #{{ user_id }} has not filled in a profile.</p>
{% endif %}
<h2>Stage history</h2>
<table>
<tr><th>Stage</th><th>Processed</th><th>Completed</th><th>Score</th><th>Notes</th><th>Reviewer</th><th>Interview</th></tr>
{% for entry in history %}
<tr{% if entry.active %} class="active"{% endif %}><td>{{ entry.status_name }}</td><td>{{ entry.processed_at }}</td><td>{{ entry.completed_at }}</td><td>{{ entry.score }}</td><td>{{ entry.notes }}</td><td>{{ entry.reviewer }}</td><td>{{ entry.interview }}</td></tr>
{% endfor %}
</table>
</body></html>
"#;

const ANSWER_SHEET_SOURCE: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Answer sheet #{{ application_id }}</title>{% include "style.html" %}</head>
<body>
<h1>Psychotest answer sheet</h1>
<p>{{ candidate_name }} | Application #{{ application_id }} | {{ pack_name }}</p>
<p class="muted">Generated on {{ generated_on }}</p>
<table>
<tr><th>#</th><th>Type</th><th>Question</th><th>Answer</th><th>Result</th><th>Score</th><th>Points</th></tr>
{% for line in lines %}
<tr><td>{{ line.number }}</td><td>{{ line.kind }}</td><td>{{ line.prompt }}</td><td>{{ line.answer }}</td><td>{{ line.verdict }}</td><td>{{ line.score }}</td><td>{{ line.points }}</td></tr>
{% endfor %}
</table>
<h2>Summary</h2>
<table>
<tr><th>Answered</th><td>{{ answered }} / {{ questions }}</td></tr>
<tr><th>Correct multiple choice</th><td>{{ correct }} / {{ multiple_choice }}</td></tr>
<tr><th>Essays awaiting grade</th><td>{{ pending_essays }}</td></tr>
<tr><th>Total score</th><td>{{ total_score }} / {{ max_score }}</td></tr>
</table>
</body></html>
"#;

/// HTML renderer holding the compiled export templates.
///
/// Template names end in `.html`, so every interpolated value is escaped.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, ExportError> {
        let mut env = Environment::new();
        env.add_template("style.html", STYLE)?;
        env.add_template("candidate.html", CANDIDATE_BLOCK)?;
        env.add_template(CV_TEMPLATE, CV_SOURCE)?;
        env.add_template(DOSSIER_TEMPLATE, DOSSIER_SOURCE)?;
        env.add_template(ANSWER_SHEET_TEMPLATE, ANSWER_SHEET_SOURCE)?;
        Ok(Self { env })
    }

    pub fn cv(&self, document: &CvDocument) -> Result<String, ExportError> {
        self.render(CV_TEMPLATE, document)
    }

    pub fn dossier(&self, document: &DossierDocument) -> Result<String, ExportError> {
        self.render(DOSSIER_TEMPLATE, document)
    }

    pub fn answer_sheet(&self, document: &AnswerSheetDocument) -> Result<String, ExportError> {
        self.render(ANSWER_SHEET_TEMPLATE, document)
    }

    fn render<T: Serialize>(&self, name: &str, document: &T) -> Result<String, ExportError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(document)?)
    }
}
