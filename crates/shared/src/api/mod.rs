use const_format::concatcp;
pub mod error;
pub mod payloads;
pub mod response_errors;

pub const API_BASE_PATH: &str = "/api/";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Object {
    Ping,
}

impl Object {
    pub const fn path(&self) -> &str {
        use Object::*;
        match self {
            Ping => concatcp!(API_BASE_PATH, "ping"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exercise {
    NewUser,
    Add,
    Log,
}

impl Exercise {
    pub const fn path(&self) -> &str {
        use Exercise::*;
        match self {
            NewUser => concatcp!(API_BASE_PATH, "exercise/new/user"),
            Add => concatcp!(API_BASE_PATH, "exercise/add"),
            Log => concatcp!(API_BASE_PATH, "exercise/log"),
        }
    }
}
