//! Owner-only debug command: evaluates a small arithmetic expression with
//! a few named session values, and replies in a `>>>` block.

use std::collections::HashMap;
use std::fmt;

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use tracing::info;

use super::html_escape;
use crate::bot::BotState;

pub async fn run(bot: &Bot, msg: &Message, state: &BotState, args: &str) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let username = user.username.as_deref().unwrap_or(&user.first_name);

    if !state.config.is_owner(user.id) {
        info!("[EVAL] {username} ({}) is not an owner, ignoring.", user.id);
        return Ok(());
    }

    let code = args.trim_matches(['`', ' ']);

    let mut env = HashMap::new();
    env.insert("uptime".to_string(), state.boot_time.elapsed().as_secs_f64());
    env.insert("chat_id".to_string(), msg.chat.id.0 as f64);
    env.insert("user_id".to_string(), user.id.0 as f64);
    env.insert("message_id".to_string(), f64::from(msg.id.0));

    let body = match eval(code, &env) {
        Ok(value) => {
            info!("[EVAL] {username} ({}) ran `{code}`.", user.id);
            format_result(value)
        }
        Err(e) => {
            info!(
                "[EVAL] {username} ({}) tried to run `{code}` but was met with `{}: {e}`.",
                user.id,
                e.name()
            );
            format!("{}: {e}", e.name())
        }
    };

    let reply = format!(
        "<pre>&gt;&gt;&gt; {}\n{}</pre>",
        html_escape(code),
        html_escape(&body)
    );
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Errors from the debug expression evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    Empty,
    UnexpectedChar(char),
    BadNumber(String),
    UnexpectedToken(String),
    UnexpectedEnd,
    UnknownName(String),
}

impl EvalError {
    /// Variant name, shown to the user the way an exception class name
    /// would be.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::UnexpectedChar(_) => "UnexpectedChar",
            Self::BadNumber(_) => "BadNumber",
            Self::UnexpectedToken(_) => "UnexpectedToken",
            Self::UnexpectedEnd => "UnexpectedEnd",
            Self::UnknownName(_) => "UnknownName",
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "nothing to evaluate"),
            Self::UnexpectedChar(c) => write!(f, "unexpected character '{c}'"),
            Self::BadNumber(s) => write!(f, "malformed number '{s}'"),
            Self::UnexpectedToken(t) => write!(f, "unexpected '{t}'"),
            Self::UnexpectedEnd => write!(f, "unexpected end of expression"),
            Self::UnknownName(n) => write!(f, "unknown name '{n}'"),
        }
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Self::Num(v) => v.to_string(),
            Self::Ident(name) => name.clone(),
            Self::Plus => "+".to_string(),
            Self::Minus => "-".to_string(),
            Self::Star => "*".to_string(),
            Self::Slash => "/".to_string(),
            Self::Percent => "%".to_string(),
            Self::LParen => "(".to_string(),
            Self::RParen => ")".to_string(),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = num.parse().map_err(|_| EvalError::BadNumber(num.clone()))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '+' | '-' | '*' | '/' | '%' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                chars.next();
            }
            other => return Err(EvalError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    env: &'a HashMap<String, f64>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.bump();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.bump();
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.bump();
                    value /= self.unary()?;
                }
                Token::Percent => {
                    self.bump();
                    value %= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        if self.peek() == Some(&Token::Minus) {
            self.bump();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.bump() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::Ident(name)) => self
                .env
                .get(&name)
                .copied()
                .ok_or(EvalError::UnknownName(name)),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(value),
                    Some(t) => Err(EvalError::UnexpectedToken(t.text())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(t) => Err(EvalError::UnexpectedToken(t.text())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

/// Evaluate an expression against named values.
///
/// Grammar: `+ - * / %`, parentheses, unary minus, f64 literals, and
/// identifiers looked up in `env`.
pub fn eval(input: &str, env: &HashMap<String, f64>) -> Result<f64, EvalError> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = Parser { tokens: &tokens, pos: 0, env };
    let value = parser.expr()?;
    if let Some(t) = parser.peek() {
        return Err(EvalError::UnexpectedToken(t.text()));
    }
    Ok(value)
}

/// Whole results print without a trailing ".0".
pub fn format_result(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
