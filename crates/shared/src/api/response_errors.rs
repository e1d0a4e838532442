use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business rule rejections. The message is sent to the client verbatim as
/// `{"error": <message>}`
macro_rules! response_error {
    ($name:ident {
        $(
            #[message($msg:literal)]
            $variant:ident
        ,)*
    }) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
        pub enum $name {
            $(
                #[error($msg)]
                $variant,
            )*
        }
    };
}

response_error!(RegisterError {
    #[message("username has been taken")]
    UsernameTaken,
});

response_error!(AddExerciseError {
    #[message("Cant add exercise because userId does not exist")]
    UserIdDoesntExist,
});

response_error!(ExerciseLogError {
    #[message("User ID does not exist")]
    UserIdDoesntExist,
});

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages_match_wire_format() {
        assert_eq!(RegisterError::UsernameTaken.to_string(), "username has been taken");
        assert_eq!(
            AddExerciseError::UserIdDoesntExist.to_string(),
            "Cant add exercise because userId does not exist"
        );
        assert_eq!(ExerciseLogError::UserIdDoesntExist.to_string(), "User ID does not exist");
    }
}
