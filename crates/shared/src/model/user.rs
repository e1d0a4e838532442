use exemplar::Model;
use sea_query::{error::Error as QueryError, Expr, Iden, InsertStatement, Query, SelectStatement};
use serde::{Deserialize, Serialize};

/// Username of the user inserted when the database is first created
pub const DEFAULT_USERNAME: &str = "test";

#[derive(Iden)]
#[iden = "Users"]
pub enum UserIden {
    Table,
    Id,
    Username,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("Users")]
#[check("../../../server/migrations/01-users/up.sql")]
pub struct User {
    pub id: i64,
    pub username: String,
}

impl User {
    fn select_star() -> SelectStatement {
        Query::select()
            .columns([UserIden::Id, UserIden::Username])
            .from(UserIden::Table)
            .to_owned()
    }

    pub fn select_by_id(id: i64) -> SelectStatement {
        Self::select_star()
            .and_where(Expr::col(UserIden::Id).eq(id))
            .limit(1)
            .to_owned()
    }

    /// Exact, case sensitive match
    pub fn select_by_username(username: &str) -> SelectStatement {
        Self::select_star()
            .and_where(Expr::col(UserIden::Username).eq(username))
            .limit(1)
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
}

impl NewUser {
    pub fn new<T: Into<String>>(username: T) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn insert_statement(&self) -> Result<InsertStatement, QueryError> {
        let mut insert = Query::insert();
        insert
            .into_table(UserIden::Table)
            .columns([UserIden::Username])
            .values([self.username.clone().into()])?;
        Ok(insert)
    }
}
