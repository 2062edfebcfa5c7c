use std::fmt;

/// The category of a JSONPath evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonPathErrorKind {
    /// The path did not start with `$`.
    ExpectedRoot,
    /// A name was expected after `.`.
    ExpectedName,
    /// Expected `.` or `[` after a name.
    ExpectedSeparator,
    /// Bad content inside a bracketed selection.
    ExpectedRightBracket,
    /// A slice bound or index literal did not parse.
    ExpectedIndex,
    /// A function name with no entry in the function table.
    UnsupportedFunction,
    /// A malformed filter expression.
    FilterSyntax,
}

/// An error raised while evaluating a JSONPath expression, annotated with
/// the line and column of the offending character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPathError {
    pub kind: JsonPathErrorKind,
    pub msg: String,
    pub line: usize,
    pub column: usize,
}

impl JsonPathError {
    pub fn new(kind: JsonPathErrorKind, msg: String, line: usize, column: usize) -> Self {
        Self {
            kind,
            msg,
            line,
            column,
        }
    }

    pub fn filter(msg: String, line: usize, column: usize) -> Self {
        Self::new(JsonPathErrorKind::FilterSyntax, msg, line, column)
    }
}

impl std::error::Error for JsonPathError {}

impl fmt::Display for JsonPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            JsonPathErrorKind::ExpectedRoot => "expected root",
            JsonPathErrorKind::ExpectedName => "expected name",
            JsonPathErrorKind::ExpectedSeparator => "expected separator",
            JsonPathErrorKind::ExpectedRightBracket => "expected right bracket",
            JsonPathErrorKind::ExpectedIndex => "expected index",
            JsonPathErrorKind::UnsupportedFunction => "unsupported function",
            JsonPathErrorKind::FilterSyntax => "filter syntax error",
        };
        write!(
            f,
            "{}: {} at line {} column {}",
            prefix, self.msg, self.line, self.column
        )
    }
}

/// An error raised by a [`CborView`](crate::cbor::CborView) operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CborError {
    /// The buffer ended inside an item.
    UnexpectedEof,
    /// The underlying byte source could not be read.
    SourceError,
    /// Indexed descent on something that is not an array.
    NotAnArray,
    /// Keyed descent on something that is not a map.
    NotAnObject,
    /// A typed accessor did not match the item's type.
    NotAnInteger,
    NotAnUinteger,
    NotABool,
    NotADouble,
    NotAString,
    /// `at_key` exhausted the map without a match.
    KeyNotFound,
    /// An index past the end of an array.
    IndexOutOfRange,
    /// A decoder made no progress; `offset` is the position in the buffer.
    Decode { offset: usize },
}

impl std::error::Error for CborError {}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CborError::UnexpectedEof => f.write_str("unexpected end of CBOR input"),
            CborError::SourceError => f.write_str("error reading CBOR source"),
            CborError::NotAnArray => f.write_str("not an array"),
            CborError::NotAnObject => f.write_str("not an object"),
            CborError::NotAnInteger => f.write_str("not an integer"),
            CborError::NotAnUinteger => f.write_str("not an unsigned integer"),
            CborError::NotABool => f.write_str("not a bool"),
            CborError::NotADouble => f.write_str("not a double"),
            CborError::NotAString => f.write_str("not a string"),
            CborError::KeyNotFound => f.write_str("key not found"),
            CborError::IndexOutOfRange => f.write_str("index out of range"),
            CborError::Decode { offset } => {
                write!(f, "error decoding CBOR at offset {}", offset)
            }
        }
    }
}
