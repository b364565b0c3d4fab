//! Token kinds produced by the scanner (spec §4.4).

use std::fmt;

/// One lexical token. Literal payloads carry their already-converted value;
/// `Identifier` carries the raw lexeme.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Int(i64),
    Float(f64),
    Char(u8),
    Str(String),
    Identifier(String),

    // Type keywords
    KwChar,
    KwInt,
    KwFloat,
    KwStr,
    KwList,

    // Control-flow / statement keywords
    KwDef,
    KwIf,
    KwElse,
    KwWhile,
    KwDo,
    KwFor,
    KwIn,
    KwBreak,
    KwContinue,
    KwReturn,
    KwPass,
    KwPrint,
    KwInput,
    KwImport,
    KwAnd,
    KwOr,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Eq,
    NotEq,
    AltNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Bang,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,

    // Structural tokens
    Newline,
    Indent,
    Dedent,
    EndMarker,
}

impl TokenType {
    /// Keyword lookup used by the scanner's identifier path.
    pub fn keyword(word: &str) -> Option<TokenType> {
        Some(match word {
            "char" => TokenType::KwChar,
            "int" => TokenType::KwInt,
            "float" => TokenType::KwFloat,
            "str" => TokenType::KwStr,
            "list" => TokenType::KwList,
            "def" => TokenType::KwDef,
            "if" => TokenType::KwIf,
            "else" => TokenType::KwElse,
            "while" => TokenType::KwWhile,
            "do" => TokenType::KwDo,
            "for" => TokenType::KwFor,
            "in" => TokenType::KwIn,
            "break" => TokenType::KwBreak,
            "continue" => TokenType::KwContinue,
            "return" => TokenType::KwReturn,
            "pass" => TokenType::KwPass,
            "print" => TokenType::KwPrint,
            "input" => TokenType::KwInput,
            "import" => TokenType::KwImport,
            "and" => TokenType::KwAnd,
            "or" => TokenType::KwOr,
            _ => return None,
        })
    }

    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenType::KwChar | TokenType::KwInt | TokenType::KwFloat | TokenType::KwStr | TokenType::KwList
        )
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenType::Plus
                | TokenType::Minus
                | TokenType::Star
                | TokenType::Slash
                | TokenType::Percent
                | TokenType::Assign
                | TokenType::Eq
                | TokenType::NotEq
                | TokenType::AltNotEq
                | TokenType::Lt
                | TokenType::LtEq
                | TokenType::Gt
                | TokenType::GtEq
                | TokenType::Bang
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Int(n) => write!(f, "{n}"),
            TokenType::Float(n) => write!(f, "{n}"),
            TokenType::Char(c) => write!(f, "'{}'", *c as char),
            TokenType::Str(s) => write!(f, "\"{s}\""),
            TokenType::Identifier(name) => write!(f, "{name}"),
            TokenType::KwChar => write!(f, "char"),
            TokenType::KwInt => write!(f, "int"),
            TokenType::KwFloat => write!(f, "float"),
            TokenType::KwStr => write!(f, "str"),
            TokenType::KwList => write!(f, "list"),
            TokenType::KwDef => write!(f, "def"),
            TokenType::KwIf => write!(f, "if"),
            TokenType::KwElse => write!(f, "else"),
            TokenType::KwWhile => write!(f, "while"),
            TokenType::KwDo => write!(f, "do"),
            TokenType::KwFor => write!(f, "for"),
            TokenType::KwIn => write!(f, "in"),
            TokenType::KwBreak => write!(f, "break"),
            TokenType::KwContinue => write!(f, "continue"),
            TokenType::KwReturn => write!(f, "return"),
            TokenType::KwPass => write!(f, "pass"),
            TokenType::KwPrint => write!(f, "print"),
            TokenType::KwInput => write!(f, "input"),
            TokenType::KwImport => write!(f, "import"),
            TokenType::KwAnd => write!(f, "and"),
            TokenType::KwOr => write!(f, "or"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Percent => write!(f, "%"),
            TokenType::Assign => write!(f, "="),
            TokenType::Eq => write!(f, "=="),
            TokenType::NotEq => write!(f, "!="),
            TokenType::AltNotEq => write!(f, "<>"),
            TokenType::Lt => write!(f, "<"),
            TokenType::LtEq => write!(f, "<="),
            TokenType::Gt => write!(f, ">"),
            TokenType::GtEq => write!(f, ">="),
            TokenType::Bang => write!(f, "!"),
            TokenType::LParen => write!(f, "("),
            TokenType::RParen => write!(f, ")"),
            TokenType::LBracket => write!(f, "["),
            TokenType::RBracket => write!(f, "]"),
            TokenType::Colon => write!(f, ":"),
            TokenType::Comma => write!(f, ","),
            TokenType::Newline => write!(f, "NEWLINE"),
            TokenType::Indent => write!(f, "INDENT"),
            TokenType::Dedent => write!(f, "DEDENT"),
            TokenType::EndMarker => write!(f, "ENDMARKER"),
        }
    }
}
