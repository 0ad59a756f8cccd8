use core::str::{FromStr, Split};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SetError {
    MalformedPath,
    ExpectValue,
    UnexpectedValue,
}

impl core::fmt::Display for SetError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let err_string = match self {
            Self::MalformedPath => "Specified path not exists or invalid",
            Self::ExpectValue => "Expected some value specified",
            Self::UnexpectedValue => "Value not valid",
        };
        write!(f, "{}", err_string)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Value<'a>(pub Option<&'a str>);

impl<'a> Value<'a> {
    pub fn of(string: &'a str) -> Self {
        Self(Some(string))
    }

    pub fn parse<T: FromStr>(&self) -> Result<T, SetError> {
        let string = self.0.ok_or(SetError::ExpectValue)?;
        string.trim().parse().map_err(|_| SetError::UnexpectedValue)
    }

    pub fn parse_or<T: FromStr>(&self, or: T) -> Result<T, SetError> {
        match self.0 {
            Some(_) => self.parse(),
            None => Ok(or),
        }
    }
}

pub trait Setter {
    fn set(&mut self, path: &mut Split<char>, value: Value) -> Result<(), SetError>;

    /// Applies a `dotted.path=value` line, a bare path resets the entry to
    /// its default.
    fn set_line(&mut self, line: &str) -> Result<(), SetError> {
        let mut splitted = line.splitn(2, '=');
        let path = splitted.next().map(str::trim).filter(|p| !p.is_empty());
        let path = path.ok_or(SetError::MalformedPath)?;
        let value = Value(splitted.next());
        self.set(&mut path.split('.'), value)
    }
}
