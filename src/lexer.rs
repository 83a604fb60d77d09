//! Hand-written single-pass lexer (SPEC_FULL.md "Lexer, parser, and AST").

use crate::error::{CascadeError, Location};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    Let,
    Struct,
    Optional,
    Mandatory,
    New,
    If,
    Else,
    While,
    Fn,
    Return,
    Print,
    True,
    False,
    Null,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Location,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), line: 1, col: 1 }
    }

    fn loc(&self) -> Location {
        Location::new(self.line, self.col)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        match c {
            Some('\n') => {
                self.line += 1;
                self.col = 1;
            }
            Some(_) => self.col += 1,
            None => {}
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut clone = self.chars.clone();
                    clone.next();
                    if clone.peek() == Some(&'/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn ident_or_keyword(&mut self) -> TokenKind {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match s.as_str() {
            "let" => TokenKind::Let,
            "struct" => TokenKind::Struct,
            "optional" => TokenKind::Optional,
            "mandatory" => TokenKind::Mandatory,
            "new" => TokenKind::New,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "fn" => TokenKind::Fn,
            "return" => TokenKind::Return,
            "print" => TokenKind::Print,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident(s),
        }
    }

    fn number(&mut self) -> Result<TokenKind, CascadeError> {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            let mut clone = self.chars.clone();
            clone.next();
            if clone.next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                s.push('.');
                self.bump();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        s.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        s.parse::<f64>().map(TokenKind::Number).map_err(|_| CascadeError::lex(format!("invalid number literal `{}`", s), self.loc()))
    }

    fn string(&mut self) -> Result<TokenKind, CascadeError> {
        let start = self.loc();
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(CascadeError::lex("unterminated string literal", start)),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => s.push(other),
                    None => return Err(CascadeError::lex("unterminated string literal", start)),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(TokenKind::Str(s))
    }
}

pub fn lex(source: &str) -> Result<Vec<Token>, CascadeError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia();
        let loc = lexer.loc();
        let kind = match lexer.peek() {
            None => {
                tokens.push(Token { kind: TokenKind::Eof, loc });
                break;
            }
            Some(c) if c.is_ascii_digit() => lexer.number()?,
            Some('"') => lexer.string()?,
            Some(c) if c.is_alphabetic() || c == '_' => lexer.ident_or_keyword(),
            Some('(') => {
                lexer.bump();
                TokenKind::LParen
            }
            Some(')') => {
                lexer.bump();
                TokenKind::RParen
            }
            Some('{') => {
                lexer.bump();
                TokenKind::LBrace
            }
            Some('}') => {
                lexer.bump();
                TokenKind::RBrace
            }
            Some('[') => {
                lexer.bump();
                TokenKind::LBracket
            }
            Some(']') => {
                lexer.bump();
                TokenKind::RBracket
            }
            Some(',') => {
                lexer.bump();
                TokenKind::Comma
            }
            Some(':') => {
                lexer.bump();
                TokenKind::Colon
            }
            Some(';') => {
                lexer.bump();
                TokenKind::Semicolon
            }
            Some('.') => {
                lexer.bump();
                TokenKind::Dot
            }
            Some('+') => {
                lexer.bump();
                TokenKind::Plus
            }
            Some('-') => {
                lexer.bump();
                TokenKind::Minus
            }
            Some('*') => {
                lexer.bump();
                TokenKind::Star
            }
            Some('/') => {
                lexer.bump();
                TokenKind::Slash
            }
            Some('=') => {
                lexer.bump();
                if lexer.peek() == Some('=') {
                    lexer.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            Some('!') => {
                lexer.bump();
                if lexer.peek() == Some('=') {
                    lexer.bump();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            Some('<') => {
                lexer.bump();
                if lexer.peek() == Some('=') {
                    lexer.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            Some('>') => {
                lexer.bump();
                if lexer.peek() == Some('=') {
                    lexer.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            Some('&') => {
                lexer.bump();
                if lexer.peek() == Some('&') {
                    lexer.bump();
                    TokenKind::AndAnd
                } else {
                    return Err(CascadeError::lex("unexpected character `&`", loc));
                }
            }
            Some('|') => {
                lexer.bump();
                if lexer.peek() == Some('|') {
                    lexer.bump();
                    TokenKind::OrOr
                } else {
                    return Err(CascadeError::lex("unexpected character `|`", loc));
                }
            }
            Some(c) => return Err(CascadeError::lex(format!("unexpected character `{}`", c), loc)),
        };
        tokens.push(Token { kind, loc });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_basic_tokens() {
        let tokens = lex("let a = 1 + 2;").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Ident("a".to_string()),
                TokenKind::Eq,
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.0),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_lex_error() {
        let err = lex("\"abc").unwrap_err();
        assert!(matches!(err, CascadeError::Lex { .. }));
    }

    #[test]
    fn skips_line_comments() {
        let tokens = lex("// comment\nlet a = 1;").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Let);
    }

    #[test]
    fn keywords_recognized() {
        let tokens = lex("struct optional mandatory new if else while fn return print true false null").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Struct,
                TokenKind::Optional,
                TokenKind::Mandatory,
                TokenKind::New,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Fn,
                TokenKind::Return,
                TokenKind::Print,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }
}
