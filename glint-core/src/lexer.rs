use crate::ast::{Number, NumberKind, Span, Stage};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::source::SourceFile;
use log::trace;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_until, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace1, one_of, space0},
    combinator::{map, map_opt, opt, recognize, value},
    multi::many0,
    sequence::{pair, tuple},
};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Fn,
    Struct,
    Uniform,
    Var,
    Let,
    Return,
    True,
    False,

    Identifier(String),
    Number(Number),
    /// A `// visibility: a, b` line comment. Generated WGSL carries uniform
    /// visibility this way since WGSL has no syntax for it.
    VisibilityComment(Vec<Stage>),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    AndAnd,
    OrOr,
    Arrow,
    Dot,
    At,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Fn => "fn",
            Token::Struct => "struct",
            Token::Uniform => "uniform",
            Token::Var => "var",
            Token::Let => "let",
            Token::Return => "return",
            Token::True => "true",
            Token::False => "false",
            Token::Identifier(name) => return write!(f, "`{}`", name),
            Token::Number(n) => return write!(f, "`{}`", n.value),
            Token::VisibilityComment(_) => return f.write_str("visibility comment"),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Assign => "=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEq => "<=",
            Token::GreaterEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Arrow => "->",
            Token::Dot => ".",
            Token::At => "@",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Eof => return f.write_str("end of input"),
        };
        write!(f, "`{}`", text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Clone)]
enum Lexeme<'a> {
    Token(Token),
    Word(&'a str),
    NumberText(&'a str),
    Trivia,
}

fn parse_visibility_comment(input: &str) -> IResult<&str, Lexeme<'_>> {
    map_opt(
        tuple((tag("//"), space0, tag("visibility:"), take_till(|c| c == '\n'))),
        |(_, _, _, list): (&str, &str, &str, &str)| {
            let stages = list
                .split(',')
                .map(|name| Stage::from_name(name.trim()))
                .collect::<Option<Vec<_>>>()?;
            (!stages.is_empty()).then_some(Lexeme::Token(Token::VisibilityComment(stages)))
        },
    )(input)
}

fn parse_line_comment(input: &str) -> IResult<&str, Lexeme<'_>> {
    value(Lexeme::Trivia, pair(tag("//"), take_till(|c| c == '\n')))(input)
}

fn parse_block_comment(input: &str) -> IResult<&str, Lexeme<'_>> {
    value(Lexeme::Trivia, tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

fn parse_whitespace(input: &str) -> IResult<&str, Lexeme<'_>> {
    value(Lexeme::Trivia, multispace1)(input)
}

fn parse_word(input: &str) -> IResult<&str, Lexeme<'_>> {
    map(
        recognize(pair(alt((alpha1, tag("_"))), many0(alt((alphanumeric1, tag("_")))))),
        Lexeme::Word,
    )(input)
}

/// Digits, an optional fraction and exponent, then any trailing identifier
/// characters. The trailing run is validated as a suffix afterwards so that
/// `12abc` is one bad literal rather than a number followed by a name.
fn parse_number_text(input: &str) -> IResult<&str, Lexeme<'_>> {
    map(
        recognize(tuple((
            digit1,
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        ))),
        Lexeme::NumberText,
    )(input)
}

fn parse_operator(input: &str) -> IResult<&str, Lexeme<'_>> {
    map(
        alt((
            alt((
                value(Token::Arrow, tag("->")),
                value(Token::EqEq, tag("==")),
                value(Token::NotEq, tag("!=")),
                value(Token::LessEq, tag("<=")),
                value(Token::GreaterEq, tag(">=")),
                value(Token::AndAnd, tag("&&")),
                value(Token::OrOr, tag("||")),
            )),
            alt((
                value(Token::Plus, char('+')),
                value(Token::Minus, char('-')),
                value(Token::Star, char('*')),
                value(Token::Slash, char('/')),
                value(Token::Percent, char('%')),
                value(Token::Bang, char('!')),
                value(Token::Assign, char('=')),
                value(Token::Less, char('<')),
                value(Token::Greater, char('>')),
                value(Token::Dot, char('.')),
                value(Token::At, char('@')),
            )),
        )),
        Lexeme::Token,
    )(input)
}

fn parse_delimiter(input: &str) -> IResult<&str, Lexeme<'_>> {
    map(
        alt((
            value(Token::LeftParen, char('(')),
            value(Token::RightParen, char(')')),
            value(Token::LeftBrace, char('{')),
            value(Token::RightBrace, char('}')),
            value(Token::LeftBracket, char('[')),
            value(Token::RightBracket, char(']')),
            value(Token::Comma, char(',')),
            value(Token::Semicolon, char(';')),
            value(Token::Colon, char(':')),
        )),
        Lexeme::Token,
    )(input)
}

fn parse_lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        parse_whitespace,
        parse_visibility_comment,
        parse_line_comment,
        parse_block_comment,
        parse_word,
        parse_number_text,
        parse_operator,
        parse_delimiter,
    ))(input)
}

fn keyword_or_identifier(word: &str) -> Token {
    match word {
        "fn" => Token::Fn,
        "struct" => Token::Struct,
        "uniform" => Token::Uniform,
        "var" => Token::Var,
        "let" => Token::Let,
        "return" => Token::Return,
        "true" => Token::True,
        "false" => Token::False,
        _ => Token::Identifier(word.to_string()),
    }
}

/// Interpret the text matched by [`parse_number_text`].
pub fn number_from_text(text: &str) -> Result<Number, String> {
    let body_end = text
        .char_indices()
        .find(|&(i, c)| {
            c.is_ascii_alphabetic() && !(matches!(c, 'e' | 'E') && exponent_at(text, i))
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (body, suffix) = text.split_at(body_end);
    let kind = match suffix {
        "" => NumberKind::Abstract,
        s if s.len() == 1 => NumberKind::from_suffix(s.chars().next().unwrap_or(' '))
            .ok_or_else(|| format!("invalid suffix `{}` on numeric literal `{}`", s, text))?,
        s => return Err(format!("invalid suffix `{}` on numeric literal `{}`", s, text)),
    };
    let integral = !body.contains(['.', 'e', 'E']);
    if kind.is_integer() && !integral {
        return Err(format!("integer suffix on non-integral literal `{}`", text));
    }
    let value: f64 = body.parse().map_err(|_| format!("invalid numeric literal `{}`", text))?;
    let in_range = match kind {
        NumberKind::I32 => value <= i32::MAX as f64,
        NumberKind::U32 => value <= u32::MAX as f64,
        _ => value.is_finite(),
    };
    if !in_range {
        return Err(format!("numeric literal `{}` is out of range", text));
    }
    Ok(Number { value, kind, integral })
}

/// Whether the `e` at byte `i` starts a well-formed exponent.
fn exponent_at(text: &str, i: usize) -> bool {
    let rest = text[i + 1..].trim_start_matches(['+', '-']);
    i > 0 && rest.starts_with(|c: char| c.is_ascii_digit())
}

/// Tokenize a source file. Lexing never stops early: invalid characters and
/// malformed literals are reported and skipped. The token list always ends
/// with [`Token::Eof`].
pub fn tokenize(source: &SourceFile) -> (Vec<LocatedToken>, Vec<Diagnostic>) {
    let input = source.text();
    let mut remaining = input;
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    while !remaining.is_empty() {
        let offset = input.len() - remaining.len();
        if remaining.starts_with("/*") && !remaining.contains("*/") {
            diagnostics.push(
                Diagnostic::new(DiagnosticCode::UnexpectedToken, "unterminated block comment")
                    .at(source.span(offset, 2)),
            );
            break;
        }
        match parse_lexeme(remaining) {
            Ok((rest, lexeme)) => {
                let len = remaining.len() - rest.len();
                let span = source.span(offset, len);
                match lexeme {
                    Lexeme::Trivia => {}
                    Lexeme::Token(token) => tokens.push(LocatedToken { token, span }),
                    Lexeme::Word(word) => tokens.push(LocatedToken {
                        token: keyword_or_identifier(word),
                        span,
                    }),
                    Lexeme::NumberText(text) => match number_from_text(text) {
                        Ok(number) => tokens.push(LocatedToken {
                            token: Token::Number(number),
                            span,
                        }),
                        Err(message) => {
                            diagnostics.push(Diagnostic::new(DiagnosticCode::InvalidNumber, message).at(span))
                        }
                    },
                }
                remaining = rest;
            }
            Err(_) => {
                let c = remaining.chars().next().unwrap_or('\0');
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::InvalidCharacter, format!("invalid character `{}`", c))
                        .at(source.span(offset, c.len_utf8())),
                );
                remaining = &remaining[c.len_utf8()..];
            }
        }
    }

    tokens.push(LocatedToken {
        token: Token::Eof,
        span: source.span(input.len(), 0),
    });
    trace!("lexed {} tokens from {}", tokens.len(), source.name());
    (tokens, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        let (tokens, diags) = tokenize(&SourceFile::new("test.glint", text));
        (tokens.into_iter().map(|t| t.token).collect(), diags)
    }

    fn num(value: f64, kind: NumberKind, integral: bool) -> Token {
        Token::Number(Number { value, kind, integral })
    }

    #[test]
    fn test_visibility_comment_is_a_token() {
        let (tokens, diags) = lex("// visibility: vertex, fragment\n// a note\n//visibility: mesh\nvar");
        assert!(diags.is_empty());
        assert_eq!(
            tokens,
            vec![
                Token::VisibilityComment(vec![Stage::Vertex, Stage::Fragment]),
                Token::Var,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords() {
        let (tokens, diags) = lex("fn struct uniform var let return true false");
        assert!(diags.is_empty());
        assert_eq!(
            tokens,
            vec![
                Token::Fn,
                Token::Struct,
                Token::Uniform,
                Token::Var,
                Token::Let,
                Token::Return,
                Token::True,
                Token::False,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_tokenize_identifiers() {
        let (tokens, _) = lex("vertex_main _tmp vec3 letter");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("vertex_main".to_string()),
                Token::Identifier("_tmp".to_string()),
                Token::Identifier("vec3".to_string()),
                Token::Identifier("letter".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_number_suffixes() {
        let (tokens, diags) = lex("1.0 2 3u 4i 0.5h 1.5f 1e3");
        assert!(diags.is_empty());
        assert_eq!(
            tokens,
            vec![
                num(1.0, NumberKind::Abstract, false),
                num(2.0, NumberKind::Abstract, true),
                num(3.0, NumberKind::U32, true),
                num(4.0, NumberKind::I32, true),
                num(0.5, NumberKind::F16, false),
                num(1.5, NumberKind::F32, false),
                num(1000.0, NumberKind::Abstract, false),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        let (tokens, diags) = lex("12abc 1.5u 4294967296u");
        assert_eq!(tokens, vec![Token::Eof]);
        assert_eq!(diags.len(), 3);
        assert!(diags.iter().all(|d| d.code == DiagnosticCode::InvalidNumber));
    }

    #[test]
    fn test_comments_are_trivia() {
        let (tokens, diags) = lex("let // trailing\n/* block\n comment */ x");
        assert!(diags.is_empty());
        assert_eq!(tokens, vec![Token::Let, Token::Identifier("x".to_string()), Token::Eof]);
    }

    #[test]
    fn test_operators() {
        let (tokens, _) = lex("-> == != <= >= && || < > = ! %");
        assert_eq!(
            tokens,
            vec![
                Token::Arrow,
                Token::EqEq,
                Token::NotEq,
                Token::LessEq,
                Token::GreaterEq,
                Token::AndAnd,
                Token::OrOr,
                Token::Less,
                Token::Greater,
                Token::Assign,
                Token::Bang,
                Token::Percent,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_invalid_character_is_skipped() {
        let (tokens, diags) = lex("let $ x");
        assert_eq!(tokens, vec![Token::Let, Token::Identifier("x".to_string()), Token::Eof]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::InvalidCharacter);
        let span = diags[0].location.unwrap();
        assert_eq!((span.line, span.column), (1, 5));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, diags) = lex("fn /* never closed");
        assert_eq!(tokens, vec![Token::Fn, Token::Eof]);
        assert_eq!(diags[0].code, DiagnosticCode::UnexpectedToken);
    }

    #[test]
    fn test_spans_track_lines() {
        let (tokens, _) = tokenize(&SourceFile::new("t", "fn main() {\n  return;\n}"));
        let ret = tokens.iter().find(|t| t.token == Token::Return).unwrap();
        assert_eq!((ret.span.line, ret.span.column, ret.span.len), (2, 3, 6));
    }

    #[test]
    fn test_member_access_after_number_is_not_fraction() {
        let (tokens, _) = lex("v.x 1.0");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("v".to_string()),
                Token::Dot,
                Token::Identifier("x".to_string()),
                num(1.0, NumberKind::Abstract, false),
                Token::Eof
            ]
        );
    }
}
