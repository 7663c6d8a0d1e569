//! Restricted arithmetic evaluator for the expression typed on the keypad.
//!
//! Only numbers, `+ - * /`, parentheses and whitespace are understood; any other
//! character is an error. Grammar (recursive descent):
//!
//! ```text
//! expr    ::= term (('+' | '-') term)*
//! term    ::= unary (('*' | '/') unary)*
//! unary   ::= ('+' | '-') unary | primary
//! primary ::= NUMBER | '(' expr ')'
//! ```

use std::fmt;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

/// Maximum nesting of parentheses and unary signs.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character {0:?} at byte {1}")]
    UnexpectedChar(char, usize),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unclosed parenthesis")]
    UnclosedParen,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// A calculator value. Integer literals stay exact through `+ - *` however long
/// they get; a decimal point or a `/` anywhere in a subexpression makes it a float.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(BigInt),
    Float(f64),
}

impl Number {
    fn to_f64(&self) -> Result<f64, EvalError> {
        match self {
            Number::Int(n) => n.to_f64().filter(|v| v.is_finite()).ok_or(EvalError::NotFinite),
            Number::Float(v) => finite(*v),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => n.is_zero(),
            Number::Float(v) => *v == 0.0,
        }
    }

    fn neg(self) -> Number {
        match self {
            Number::Int(n) => Number::Int(-n),
            Number::Float(v) => Number::Float(-v),
        }
    }

    fn combine(
        self,
        rhs: Number,
        exact: fn(BigInt, BigInt) -> BigInt,
        float: fn(f64, f64) -> f64,
    ) -> Result<Number, EvalError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Ok(Number::Int(exact(a, b))),
            (a, b) => Ok(Number::Float(finite(float(a.to_f64()?, b.to_f64()?))?)),
        }
    }

    fn add(self, rhs: Number) -> Result<Number, EvalError> {
        self.combine(rhs, |a, b| a + b, |a, b| a + b)
    }

    fn sub(self, rhs: Number) -> Result<Number, EvalError> {
        self.combine(rhs, |a, b| a - b, |a, b| a - b)
    }

    fn mul(self, rhs: Number) -> Result<Number, EvalError> {
        self.combine(rhs, |a, b| a * b, |a, b| a * b)
    }

    /// True division: always a float, even for two integers.
    fn div(self, rhs: Number) -> Result<Number, EvalError> {
        if rhs.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        Ok(Number::Float(finite(self.to_f64()? / rhs.to_f64()?)?))
    }
}

/// Text shown for a result: integers in full, floats via [`format_number`].
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(v) => f.write_str(&format_number(*v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
        }
    }
}

fn number(text: &str) -> Result<Number, EvalError> {
    let invalid = || EvalError::InvalidNumber(text.to_string());
    if text.contains('.') {
        // Rust's float parser accepts "1." and ".5", same as a calculator would.
        text.parse().map(Number::Float).map_err(|_| invalid())
    } else {
        // Leading zeros ("007") are accepted as the plain number.
        text.parse().map(Number::Int).map_err(|_| invalid())
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        let token = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let start = pos;
                let mut end = pos;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(number(&input[start..end])?));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(EvalError::UnexpectedChar(other, pos)),
        };
        chars.next();
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Number, EvalError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    acc = acc.add(self.term()?)?;
                }
                Some(Token::Minus) => {
                    self.next();
                    acc = acc.sub(self.term()?)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<Number, EvalError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    acc = acc.mul(self.unary()?)?;
                }
                Some(Token::Slash) => {
                    self.next();
                    acc = acc.div(self.unary()?)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn unary(&mut self) -> Result<Number, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.next();
                self.descend()?;
                let v = self.unary()?.neg();
                self.depth -= 1;
                Ok(v)
            }
            Some(Token::Plus) => {
                self.next();
                self.descend()?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(v)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Number, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(v),
                    Some(t) => Err(EvalError::UnexpectedToken(t.describe())),
                    None => Err(EvalError::UnclosedParen),
                }
            }
            Some(t) => Err(EvalError::UnexpectedToken(t.describe())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

fn finite(v: f64) -> Result<f64, EvalError> {
    if v.is_finite() { Ok(v) } else { Err(EvalError::NotFinite) }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    if let Some(t) = parser.peek() {
        return Err(EvalError::UnexpectedToken(t.describe()));
    }
    Ok(value)
}

/// Text shown for a float result: whole numbers without a fraction, `-0` as `0`.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    // f64 Display never uses exponents and prints integral values without ".0".
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Evaluate and render the way the display shows results.
    fn shown(input: &str) -> Result<String, EvalError> {
        evaluate(input).map(|n| n.to_string())
    }

    fn ok(text: &str) -> Result<String, EvalError> {
        Ok(text.to_string())
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(shown("7+3"), ok("10"));
        assert_eq!(shown("2+3*4"), ok("14"));
        assert_eq!(shown("10-4-3"), ok("3"));
        assert_eq!(shown("100/10/5"), ok("2"));
        assert_eq!(shown("(2+3)*4"), ok("20"));
        assert_eq!(shown(" 8 / ( 3 - 1 ) "), ok("4"));
    }

    #[test]
    fn unary_signs() {
        assert_eq!(shown("-3+2"), ok("-1"));
        assert_eq!(shown("5*-2"), ok("-10"));
        assert_eq!(shown("--4"), ok("4"));
        assert_eq!(shown("+6"), ok("6"));
    }

    #[test]
    fn decimals_from_earlier_results() {
        assert_eq!(evaluate("3.5*2"), Ok(Number::Float(7.0)));
        assert_eq!(evaluate(".5+1."), Ok(Number::Float(1.5)));
        assert_eq!(shown("3.5*2"), ok("7"));
    }

    #[test]
    fn integers_stay_exact() {
        assert_eq!(evaluate("7+3"), Ok(Number::Int(BigInt::from(10))));
        assert_eq!(shown("9007199254740993+0"), ok("9007199254740993"));
        assert_eq!(shown("99999999999999999*3"), ok("299999999999999997"));
        assert_eq!(shown("-99999999999999999-1"), ok("-100000000000000000"));
    }

    #[test]
    fn long_integers_evaluate_to_themselves() {
        let nines = "9".repeat(400);
        assert_eq!(shown(&nines), Ok(nines.clone()));
        assert_eq!(shown(&format!("{nines}*{nines}")).map(|s| s.len()), Ok(800));
    }

    #[test]
    fn leading_zeros_are_accepted() {
        assert_eq!(shown("007"), ok("7"));
        assert_eq!(shown("007+1"), ok("8"));
        assert_eq!(shown("0.50*2"), ok("1"));
    }

    #[test]
    fn division_is_true_division_without_trailing_zero_fraction() {
        assert_eq!(evaluate("6/2"), Ok(Number::Float(3.0)));
        assert_eq!(shown("6/2"), ok("3"));
        assert_eq!(shown("7/2"), ok("3.5"));
        assert_eq!(shown("1/3"), ok("0.3333333333333333"));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(evaluate("5/0"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("5/(2-2)"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("5/0.0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn malformed_input() {
        assert_eq!(evaluate(""), Err(EvalError::Empty));
        assert_eq!(evaluate("   "), Err(EvalError::Empty));
        assert_eq!(evaluate("7+"), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("*7"), Err(EvalError::UnexpectedToken("'*'".into())));
        assert_eq!(evaluate("(1+2"), Err(EvalError::UnclosedParen));
        assert_eq!(evaluate("1+2)"), Err(EvalError::UnexpectedToken("')'".into())));
        assert_eq!(evaluate("1.2.3"), Err(EvalError::InvalidNumber("1.2.3".into())));
        assert_eq!(evaluate("."), Err(EvalError::InvalidNumber(".".into())));
    }

    #[test]
    fn power_and_floor_division_are_not_operators() {
        assert!(evaluate("2**3").is_err());
        assert!(evaluate("7//2").is_err());
    }

    #[test]
    fn anything_outside_the_alphabet_is_rejected() {
        assert_eq!(evaluate("Error5"), Err(EvalError::UnexpectedChar('E', 0)));
        assert_eq!(evaluate("1+x"), Err(EvalError::UnexpectedChar('x', 2)));
        assert!(matches!(evaluate("__import__('os')"), Err(EvalError::UnexpectedChar('_', 0))));
        assert!(matches!(evaluate("2^3"), Err(EvalError::UnexpectedChar('^', 1))));
    }

    #[test]
    fn float_overflow_is_not_finite() {
        let huge = format!("{}.0*{}", "9".repeat(200), "9".repeat(200));
        assert_eq!(evaluate(&huge), Err(EvalError::NotFinite));
        // An integer too large for a float cannot be divided.
        let too_big = format!("{}/3", "9".repeat(400));
        assert_eq!(evaluate(&too_big), Err(EvalError::NotFinite));
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(evaluate(&deep), Err(EvalError::TooDeep));

        let ok = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(shown(&ok), Ok("1".to_string()));

        assert_eq!(evaluate(&"-".repeat(MAX_DEPTH + 1)), Err(EvalError::TooDeep));
    }

    #[test]
    fn formatting_results() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(Number::Int(BigInt::from(-12)).to_string(), "-12");
    }

    fn keypad_char() -> impl Strategy<Value = char> {
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '+', '-', '*', '/',
        ])
    }

    proptest! {
        #[test]
        fn keypad_input_never_panics_and_results_are_finite(
            chars in prop::collection::vec(keypad_char(), 0..40)
        ) {
            let text: String = chars.into_iter().collect();
            if let Ok(Number::Float(v)) = evaluate(&text) {
                prop_assert!(v.is_finite());
            }
        }

        #[test]
        fn integer_sums_and_products_match_i128(
            a in -1_000_000_000_000i64..1_000_000_000_000,
            b in -1_000_000_000_000i64..1_000_000_000_000,
        ) {
            let (a, b) = (a as i128, b as i128);
            prop_assert_eq!(shown(&format!("{a}+({b})")), Ok((a + b).to_string()));
            prop_assert_eq!(shown(&format!("{a}*({b})")), Ok((a * b).to_string()));
        }

        #[test]
        fn formatted_results_evaluate_back(a in -100_000i64..100_000, b in 1i64..1000) {
            let text = shown(&format!("{a}/{b}")).unwrap();
            let again = shown(&text).unwrap();
            prop_assert_eq!(again, text);
        }
    }
}
