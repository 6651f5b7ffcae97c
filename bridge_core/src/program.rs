use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// The user's current program source, stored exactly as the input surface reported it.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct ProgramText(String);

impl ProgramText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for ProgramText {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for ProgramText {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProgramText {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for ProgramText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
