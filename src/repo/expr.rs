// Wed Aug 5 2026 - Alex

//! Constant-expression evaluation for C numeric initializers: integer,
//! hexadecimal and float literals, named constants resolved through a
//! caller-supplied symbol table, arithmetic/bitwise/unary operators.
//! Anything else fails closed with no value.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Num::Int(v) => v,
            Num::Float(v) => v as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    LParen,
    RParen,
}

pub fn evaluate(expr: &str, symbols: &dyn Fn(&str) -> Option<Num>) -> Option<Num> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return None;
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        symbols,
    };
    let value = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return None;
    }
    Some(value)
}

fn tokenize(source: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '&' => {
                tokens.push(Token::Amp);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '~' => {
                tokens.push(Token::Tilde);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '<' if chars.get(i + 1) == Some(&'<') => {
                tokens.push(Token::Shl);
                i += 2;
            }
            '>' if chars.get(i + 1) == Some(&'>') => {
                tokens.push(Token::Shr);
                i += 2;
            }
            '0' if matches!(chars.get(i + 1), Some('x') | Some('X')) => {
                let start = i + 2;
                let mut end = start;
                while end < chars.len() && chars[end].is_ascii_hexdigit() {
                    end += 1;
                }
                if end == start {
                    return None;
                }
                let text: String = chars[start..end].iter().collect();
                tokens.push(Token::Int(i64::from_str_radix(&text, 16).ok()?));
                i = end;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut end = i;
                let mut is_float = false;
                while end < chars.len()
                    && (chars[end].is_ascii_digit() || (!is_float && chars[end] == '.'))
                {
                    if chars[end] == '.' {
                        is_float = true;
                    }
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                if is_float {
                    tokens.push(Token::Float(text.parse().ok()?));
                } else {
                    tokens.push(Token::Int(text.parse().ok()?));
                }
                i = end;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                let mut end = i;
                while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                tokens.push(Token::Ident(chars[start..end].iter().collect()));
                i = end;
            }
            _ => return None,
        }
    }

    Some(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    symbols: &'a dyn Fn(&str) -> Option<Num>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Option<Num> {
        let mut left = self.parse_xor()?;
        while self.peek() == Some(&Token::Pipe) {
            self.advance();
            let right = self.parse_xor()?;
            left = Num::Int(left.as_i64() | right.as_i64());
        }
        Some(left)
    }

    fn parse_xor(&mut self) -> Option<Num> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Caret) {
            self.advance();
            let right = self.parse_and()?;
            left = Num::Int(left.as_i64() ^ right.as_i64());
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Num> {
        let mut left = self.parse_shift()?;
        while self.peek() == Some(&Token::Amp) {
            self.advance();
            let right = self.parse_shift()?;
            left = Num::Int(left.as_i64() & right.as_i64());
        }
        Some(left)
    }

    fn parse_shift(&mut self) -> Option<Num> {
        let mut left = self.parse_term()?;
        loop {
            let shl = match self.peek() {
                Some(Token::Shl) => true,
                Some(Token::Shr) => false,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?.as_i64();
            if !(0..64).contains(&right) {
                return None;
            }
            let value = if shl {
                left.as_i64().checked_shl(right as u32)?
            } else {
                left.as_i64() >> right
            };
            left = Num::Int(value);
        }
        Some(left)
    }

    fn parse_term(&mut self) -> Option<Num> {
        let mut left = self.parse_factor()?;
        loop {
            let add = match self.peek() {
                Some(Token::Plus) => true,
                Some(Token::Minus) => false,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = match (left, right) {
                (Num::Int(l), Num::Int(r)) => {
                    Num::Int(if add { l.checked_add(r)? } else { l.checked_sub(r)? })
                }
                (l, r) => Num::Float(if add {
                    l.as_f64() + r.as_f64()
                } else {
                    l.as_f64() - r.as_f64()
                }),
            };
        }
        Some(left)
    }

    fn parse_factor(&mut self) -> Option<Num> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Token::Star,
                Some(Token::Slash) => Token::Slash,
                Some(Token::Percent) => Token::Percent,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = match op {
                Token::Star => match (left, right) {
                    (Num::Int(l), Num::Int(r)) => Num::Int(l.checked_mul(r)?),
                    (l, r) => Num::Float(l.as_f64() * r.as_f64()),
                },
                Token::Slash => {
                    if right.as_f64() == 0.0 {
                        return None;
                    }
                    Num::Float(left.as_f64() / right.as_f64())
                }
                _ => {
                    let divisor = right.as_i64();
                    if divisor == 0 {
                        return None;
                    }
                    Num::Int(left.as_i64() % divisor)
                }
            };
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Num> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(match operand {
                    Num::Int(v) => Num::Int(v.checked_neg()?),
                    Num::Float(v) => Num::Float(-v),
                })
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            Some(Token::Tilde) => {
                self.advance();
                let operand = self.parse_unary()?.as_i64();
                Some(Num::Int(!operand & 0xFFFFFFFF))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Option<Num> {
        match self.advance()? {
            Token::Int(v) => Some(Num::Int(v)),
            Token::Float(v) => Some(Num::Float(v)),
            Token::Ident(name) => (self.symbols)(&name),
            Token::LParen => {
                let value = self.parse_or()?;
                if self.advance()? != Token::RParen {
                    return None;
                }
                Some(value)
            }
            _ => None,
        }
    }
}
