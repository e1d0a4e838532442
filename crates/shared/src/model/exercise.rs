use exemplar::Model;
use sea_query::{
    error::Error as QueryError, Expr, Iden, InsertStatement, Order, Query, SelectStatement,
};
use serde::{Deserialize, Serialize};

use crate::api::payloads::ExerciseLogQuery;

#[derive(Iden)]
#[iden = "Exercises"]
pub enum ExerciseIden {
    Table,
    ExerciseId,
    Description,
    Duration,
    Date,
    UserId,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("Exercises")]
#[check("../../../server/migrations/02-exercises/up.sql")]
pub struct Exercise {
    pub exercise_id: i64,
    pub description: Option<String>,
    pub duration: i64,
    pub date: Option<String>,
    pub user_id: i64,
}

impl Exercise {
    fn select_star() -> SelectStatement {
        Query::select()
            .columns([
                ExerciseIden::ExerciseId,
                ExerciseIden::Description,
                ExerciseIden::Duration,
                ExerciseIden::Date,
                ExerciseIden::UserId,
            ])
            .from(ExerciseIden::Table)
            .to_owned()
    }

    /// A user's exercises narrowed by whichever filters are present. Dates are
    /// compared as text so they must share the ISO-8601 layout
    pub fn select_log(query: &ExerciseLogQuery) -> SelectStatement {
        Self::select_star()
            .and_where(Expr::col(ExerciseIden::UserId).eq(query.user_id))
            .and_where_option(query.limit.map(|limit| Expr::col(ExerciseIden::Duration).lte(limit)))
            .and_where_option(
                query
                    .from
                    .as_ref()
                    .map(|from| Expr::col(ExerciseIden::Date).gte(from.as_str())),
            )
            .and_where_option(
                query
                    .to
                    .as_ref()
                    .map(|to| Expr::col(ExerciseIden::Date).lte(to.as_str())),
            )
            .order_by(ExerciseIden::ExerciseId, Order::Asc)
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExercise {
    pub user_id: i64,
    pub description: String,
    pub duration: i64,
    pub date: Option<String>,
}

impl NewExercise {
    pub fn insert_statement(&self) -> Result<InsertStatement, QueryError> {
        let mut insert = Query::insert();
        insert
            .into_table(ExerciseIden::Table)
            .columns([
                ExerciseIden::Description,
                ExerciseIden::Duration,
                ExerciseIden::Date,
                ExerciseIden::UserId,
            ])
            .values([
                self.description.clone().into(),
                self.duration.into(),
                self.date.clone().into(),
                self.user_id.into(),
            ])?;
        Ok(insert)
    }
}
