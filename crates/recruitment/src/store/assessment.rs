use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension as _, Row};

use super::encode::{dt_at, encode_dt, opt_score_at, status_at};
use super::SqliteStore;
use crate::error::RepositoryError;
use crate::ids::{
    AnswerId, ApplicationId, ChoiceId, QuestionId, QuestionPackId, UserId, VacancyPeriodId,
};
use crate::workflows::assessment::{
    ApplicationContext, Choice, NewAnswer, NewQuestion, NewQuestionPack, Question, QuestionBank,
    QuestionKind, QuestionPack, UserAnswer,
};

const ANSWER_COLUMNS: &str = "id, user_id, question_id, application_id, choice_id, answer_text, \
     score, answered_at, graded_by";

fn pack_row(row: &Row<'_>) -> rusqlite::Result<QuestionPack> {
    Ok(QuestionPack {
        id: QuestionPackId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: row.get(3)?,
        created_at: dt_at(row, 4)?,
    })
}

fn answer_row(row: &Row<'_>) -> rusqlite::Result<UserAnswer> {
    Ok(UserAnswer {
        id: AnswerId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        question_id: QuestionId(row.get(2)?),
        application_id: ApplicationId(row.get(3)?),
        choice_id: row.get::<_, Option<i64>>(4)?.map(ChoiceId),
        answer_text: row.get(5)?,
        score: opt_score_at(row, 6)?,
        answered_at: dt_at(row, 7)?,
        graded_by: row.get::<_, Option<i64>>(8)?.map(UserId),
    })
}

fn kind_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<QuestionKind> {
    let raw: String = row.get(idx)?;
    QuestionKind::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown question kind {raw:?}").into(),
        )
    })
}

/// Questions matching `filter` (`pack` or `id`) with their choices attached.
fn load_questions(
    conn: &Connection,
    filter: &str,
    value: i64,
) -> rusqlite::Result<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, question_pack_id, kind, prompt, points FROM questions
         WHERE {filter} = ?1 ORDER BY id"
    ))?;
    let mut questions = stmt
        .query_map(params![value], |row| {
            Ok(Question {
                id: QuestionId(row.get(0)?),
                question_pack_id: QuestionPackId(row.get(1)?),
                kind: kind_at(row, 2)?,
                prompt: row.get(3)?,
                points: row.get(4)?,
                choices: Vec::new(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT c.id, c.question_id, c.label, c.is_correct FROM choices c
         JOIN questions q ON q.id = c.question_id
         WHERE q.{filter} = ?1 ORDER BY c.id"
    ))?;
    let mut choices: BTreeMap<QuestionId, Vec<Choice>> = BTreeMap::new();
    let rows = stmt.query_map(params![value], |row| {
        Ok(Choice {
            id: ChoiceId(row.get(0)?),
            question_id: QuestionId(row.get(1)?),
            label: row.get(2)?,
            is_correct: row.get(3)?,
        })
    })?;
    for choice in rows {
        let choice = choice?;
        choices.entry(choice.question_id).or_default().push(choice);
    }

    for question in &mut questions {
        question.choices = choices.remove(&question.id).unwrap_or_default();
    }
    Ok(questions)
}

fn fetch_answer(conn: &Connection, id: AnswerId) -> rusqlite::Result<Option<UserAnswer>> {
    conn.query_row(
        &format!("SELECT {ANSWER_COLUMNS} FROM user_answers WHERE id = ?1"),
        params![id.0],
        answer_row,
    )
    .optional()
}

impl QuestionBank for SqliteStore {
    fn create_pack(&self, pack: NewQuestionPack) -> Result<QuestionPack, RepositoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO question_packs (name, description, duration_minutes, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                pack.name,
                pack.description,
                pack.duration_minutes,
                encode_dt(pack.created_at)
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
            "SELECT id, name, description, duration_minutes, created_at
             FROM question_packs WHERE id = ?1",
            params![id],
            pack_row,
        )?)
    }

    fn list_packs(&self) -> Result<Vec<QuestionPack>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, duration_minutes, created_at
             FROM question_packs ORDER BY name, id",
        )?;
        let packs = stmt
            .query_map([], pack_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(packs)
    }

    fn fetch_pack(&self, id: QuestionPackId) -> Result<Option<QuestionPack>, RepositoryError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, description, duration_minutes, created_at
                 FROM question_packs WHERE id = ?1",
                params![id.0],
                pack_row,
            )
            .optional()?)
    }

    fn pack_in_use(&self, id: QuestionPackId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let used: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM vacancies WHERE question_pack_id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        Ok(used)
    }

    fn delete_pack(&self, id: QuestionPackId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM question_packs WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn questions(&self, pack: QuestionPackId) -> Result<Vec<Question>, RepositoryError> {
        let conn = self.conn()?;
        Ok(load_questions(&conn, "question_pack_id", pack.0)?)
    }

    fn add_question(&self, question: NewQuestion) -> Result<Question, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO questions (question_pack_id, kind, prompt, points)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                question.question_pack_id.0,
                question.kind.code(),
                question.prompt,
                question.points
            ],
        )?;
        let id = tx.last_insert_rowid();
        for choice in &question.choices {
            tx.execute(
                "INSERT INTO choices (question_id, label, is_correct) VALUES (?1, ?2, ?3)",
                params![id, choice.label, choice.is_correct],
            )?;
        }
        let record = load_questions(&tx, "id", id)?
            .pop()
            .ok_or_else(|| RepositoryError::NotFound(format!("question {id}")))?;
        tx.commit()?;
        Ok(record)
    }

    fn fetch_question(&self, id: QuestionId) -> Result<Option<Question>, RepositoryError> {
        let conn = self.conn()?;
        Ok(load_questions(&conn, "id", id.0)?.pop())
    }

    fn delete_question(&self, id: QuestionId) -> Result<bool, RepositoryError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM questions WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn application_context(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationContext>, RepositoryError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT a.id, a.user_id, a.vacancy_period_id, a.status_id, v.question_pack_id
                 FROM applications a
                 JOIN vacancy_periods p ON p.id = a.vacancy_period_id
                 JOIN vacancies v ON v.id = p.vacancy_id
                 WHERE a.id = ?1",
                params![id.0],
                |row| {
                    Ok(ApplicationContext {
                        application_id: ApplicationId(row.get(0)?),
                        user_id: UserId(row.get(1)?),
                        vacancy_period_id: VacancyPeriodId(row.get(2)?),
                        status: status_at(row, 3)?,
                        question_pack_id: row.get::<_, Option<i64>>(4)?.map(QuestionPackId),
                    })
                },
            )
            .optional()?)
    }

    fn answers_for_application(
        &self,
        id: ApplicationId,
    ) -> Result<Vec<UserAnswer>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANSWER_COLUMNS} FROM user_answers WHERE application_id = ?1 ORDER BY id"
        ))?;
        let answers = stmt
            .query_map(params![id.0], answer_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(answers)
    }

    fn record_answers(&self, answers: Vec<NewAnswer>) -> Result<Vec<UserAnswer>, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut recorded = Vec::with_capacity(answers.len());
        for answer in answers {
            tx.execute(
                "INSERT INTO user_answers
                    (user_id, question_id, application_id, choice_id, answer_text, score, answered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    answer.user_id.0,
                    answer.question_id.0,
                    answer.application_id.0,
                    answer.choice_id.map(|choice| choice.0),
                    answer.answer_text,
                    answer.score.map(f64::from),
                    encode_dt(answer.answered_at)
                ],
            )?;
            let id = AnswerId(tx.last_insert_rowid());
            let record = fetch_answer(&tx, id)?
                .ok_or_else(|| RepositoryError::NotFound(format!("answer {id}")))?;
            recorded.push(record);
        }
        tx.commit()?;
        Ok(recorded)
    }

    fn fetch_answer(&self, id: AnswerId) -> Result<Option<UserAnswer>, RepositoryError> {
        let conn = self.conn()?;
        Ok(fetch_answer(&conn, id)?)
    }

    fn grade_answer(
        &self,
        id: AnswerId,
        score: f32,
        graded_by: UserId,
    ) -> Result<UserAnswer, RepositoryError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE user_answers SET score = ?1, graded_by = ?2 WHERE id = ?3",
            params![f64::from(score), graded_by.0, id.0],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("answer {id}")));
        }
        fetch_answer(&conn, id)?.ok_or_else(|| RepositoryError::NotFound(format!("answer {id}")))
    }
}
