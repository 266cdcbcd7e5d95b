//! [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
//!
//! Error-tolerant selector lexer. Malformed input degrades to delim,
//! bad-string, or bad-url tokens; the lexer never fails.

use super::token::{HashType, Token};

/// Tokenize a selector-shaped string. Deterministic and total: every input
/// yields a token list ending in [`Token::Eof`].
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    lexer.run();
    lexer.tokens
}

/// [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
struct Lexer {
    /// The input, after the preprocessing pass.
    input: Vec<char>,
    /// Current position in the input
    position: usize,
    /// Collected tokens
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: preprocess(input),
            position: 0,
            tokens: Vec::new(),
        }
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    ///
    /// Tokenizes until EOF. The loop is additionally bounded by the input
    /// length: a consume-token step always makes progress, so hitting the
    /// bound would be an internal defect, not a normal code path.
    fn run(&mut self) {
        let bound = self.input.len() + 1;
        for _ in 0..bound {
            let token = self.consume_token();
            let is_eof = token.is_eof();
            self.tokens.push(token);
            if is_eof {
                return;
            }
        }
        self.tokens.push(Token::Eof);
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    fn consume_token(&mut self) -> Token {
        self.consume_comments();

        let Some(c) = self.consume() else {
            return Token::Eof;
        };

        match c {
            // "whitespace"
            // "Consume as much whitespace as possible. Return a <whitespace-token>."
            c if is_whitespace(c) => {
                self.consume_whitespace();
                Token::Whitespace
            }

            // "U+0022 QUOTATION MARK (")"
            '"' => self.consume_string_token('"'),

            // "U+0023 NUMBER SIGN (#)"
            '#' => {
                // "If the next input code point is an ident code point or the next
                // two input code points are a valid escape..."
                if self.peek().is_some_and(is_ident_code_point)
                    || self.is_valid_escape(self.peek(), self.peek_at(1))
                {
                    // "If the next 3 input code points would start an ident sequence,
                    // set the <hash-token>'s type flag to 'id'."
                    let hash_type = if self.would_start_ident_sequence() {
                        HashType::Id
                    } else {
                        HashType::Unrestricted
                    };
                    let value = self.consume_ident_sequence();
                    Token::Hash { value, hash_type }
                } else {
                    Token::Delim('#')
                }
            }

            // "U+0027 APOSTROPHE (')"
            '\'' => self.consume_string_token('\''),

            '(' => Token::LeftParen,
            ')' => Token::RightParen,

            // "U+002B PLUS SIGN (+)"
            '+' => {
                if self.would_start_number() {
                    self.reconsume();
                    self.consume_numeric_token()
                } else {
                    Token::Delim('+')
                }
            }

            ',' => Token::Comma,

            // "U+002D HYPHEN-MINUS (-)"
            '-' => {
                if self.would_start_number() {
                    self.reconsume();
                    self.consume_numeric_token()
                } else if self.would_start_ident_sequence_with(Some('-')) {
                    self.reconsume();
                    self.consume_ident_like_token()
                } else {
                    Token::Delim('-')
                }
            }

            // "U+002E FULL STOP (.)"
            '.' => {
                if self.would_start_number() {
                    self.reconsume();
                    self.consume_numeric_token()
                } else {
                    Token::Delim('.')
                }
            }

            ':' => Token::Colon,
            ';' => Token::Semicolon,

            // "U+0040 COMMERCIAL AT (@)"
            '@' => {
                if self.would_start_ident_sequence() {
                    let value = self.consume_ident_sequence();
                    Token::AtKeyword(value)
                } else {
                    Token::Delim('@')
                }
            }

            '[' => Token::LeftBracket,

            // "U+005C REVERSE SOLIDUS (\)"
            '\\' => {
                if self.is_valid_escape(Some('\\'), self.peek()) {
                    self.reconsume();
                    self.consume_ident_like_token()
                } else {
                    // "This is a parse error."
                    Token::Delim('\\')
                }
            }

            ']' => Token::RightBracket,
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,

            // "digit"
            c if c.is_ascii_digit() => {
                self.reconsume();
                self.consume_numeric_token()
            }

            // "ident-start code point"
            c if is_ident_start_code_point(c) => {
                self.reconsume();
                self.consume_ident_like_token()
            }

            // "anything else"
            // "Return a <delim-token> with its value set to the current input code point."
            c => Token::Delim(c),
        }
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
    fn consume_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            let _ = self.consume(); // /
            let _ = self.consume(); // *

            loop {
                match self.consume() {
                    Some('*') if self.peek() == Some('/') => {
                        let _ = self.consume(); // /
                        break;
                    }
                    Some(_) => continue,
                    None => break, // EOF
                }
            }
        }
    }

    fn consume_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            let _ = self.consume();
        }
    }

    /// [§ 4.3.4 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string_token(&mut self, ending_code_point: char) -> Token {
        let mut value = String::new();

        loop {
            match self.consume() {
                // "ending code point" - "Return the <string-token>."
                Some(c) if c == ending_code_point => {
                    return Token::String(value);
                }

                // "EOF" - "This is a parse error. Return the <string-token>."
                None => {
                    return Token::String(value);
                }

                // "newline"
                // "This is a parse error. Reconsume the current input code point,
                // create a <bad-string-token>, and return it."
                Some('\n') => {
                    self.reconsume();
                    return Token::BadString;
                }

                // "U+005C REVERSE SOLIDUS (\)"
                Some('\\') => {
                    match self.peek() {
                        // "If the next input code point is EOF, do nothing."
                        None => {}
                        // "Otherwise, if the next input code point is a newline,
                        // consume it."
                        Some('\n') => {
                            let _ = self.consume();
                        }
                        // "Otherwise... consume an escaped code point."
                        Some(_) => {
                            if let Some(c) = self.consume_escaped_code_point() {
                                value.push(c);
                            }
                        }
                    }
                }

                // "anything else"
                Some(c) => {
                    value.push(c);
                }
            }
        }
    }

    /// [§ 4.3.5 Consume a numeric token](https://www.w3.org/TR/css-syntax-3/#consume-numeric-token)
    fn consume_numeric_token(&mut self) -> Token {
        let (value, int_value, repr) = self.consume_number();

        if self.would_start_ident_sequence() {
            let unit = self.consume_ident_sequence();
            Token::Dimension { value, repr, unit }
        } else if self.peek() == Some('%') {
            let _ = self.consume();
            Token::Percentage { value, repr }
        } else {
            Token::Number {
                value,
                int_value,
                repr,
            }
        }
    }

    /// [§ 4.3.6 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like_token(&mut self) -> Token {
        let string = self.consume_ident_sequence();

        if string.eq_ignore_ascii_case("url") && self.peek() == Some('(') {
            let _ = self.consume(); // (

            while self.peek().is_some_and(is_whitespace) {
                let _ = self.consume();
            }

            // Quoted url bodies tokenize as a function + string instead.
            match self.peek() {
                Some('"' | '\'') => Token::Function(string),
                _ => self.consume_url_token(),
            }
        } else if self.peek() == Some('(') {
            let _ = self.consume();
            Token::Function(string)
        } else {
            Token::Ident(string)
        }
    }

    /// [§ 4.3.7 Consume a url token](https://www.w3.org/TR/css-syntax-3/#consume-url-token)
    fn consume_url_token(&mut self) -> Token {
        let mut value = String::new();

        self.consume_whitespace();

        loop {
            match self.consume() {
                Some(')') | None => {
                    return Token::Url(value);
                }

                Some(c) if is_whitespace(c) => {
                    self.consume_whitespace();
                    match self.peek() {
                        Some(')') => {
                            let _ = self.consume();
                            return Token::Url(value);
                        }
                        None => {
                            return Token::Url(value);
                        }
                        _ => {
                            self.consume_bad_url_remnants();
                            return Token::BadUrl;
                        }
                    }
                }

                // "This is a parse error. Consume the remnants of a bad url..."
                Some('"' | '\'' | '(') => {
                    self.consume_bad_url_remnants();
                    return Token::BadUrl;
                }

                Some('\\') => {
                    if self.is_valid_escape(Some('\\'), self.peek()) {
                        if let Some(c) = self.consume_escaped_code_point() {
                            value.push(c);
                        }
                    } else {
                        self.consume_bad_url_remnants();
                        return Token::BadUrl;
                    }
                }

                Some(c) => {
                    value.push(c);
                }
            }
        }
    }

    /// [§ 4.3.14 Consume the remnants of a bad url](https://www.w3.org/TR/css-syntax-3/#consume-remnants-of-bad-url)
    fn consume_bad_url_remnants(&mut self) {
        loop {
            match self.consume() {
                Some(')') | None => return,
                Some('\\') => {
                    if self.is_valid_escape(Some('\\'), self.peek()) {
                        let _ = self.consume_escaped_code_point();
                    }
                }
                _ => continue,
            }
        }
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();

        loop {
            match self.consume() {
                Some(c) if is_ident_code_point(c) => {
                    result.push(c);
                }

                Some('\\') if self.is_valid_escape(Some('\\'), self.peek()) => {
                    if let Some(c) = self.consume_escaped_code_point() {
                        result.push(c);
                    }
                }

                Some(_) => {
                    self.reconsume();
                    return result;
                }

                None => return result,
            }
        }
    }

    /// [§ 4.3.12 Consume a number](https://www.w3.org/TR/css-syntax-3/#consume-number)
    ///
    /// Returns the numeric value, the integer value when the type flag is
    /// 'integer', and the source representation.
    fn consume_number(&mut self) -> (f64, Option<i64>, String) {
        let mut is_integer = true;
        let mut repr = String::new();

        if self.peek() == Some('+') || self.peek() == Some('-') {
            repr.extend(self.consume());
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            repr.extend(self.consume());
        }

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.extend(self.consume()); // .
            repr.extend(self.consume()); // digit
            is_integer = false;

            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                repr.extend(self.consume());
            }
        }

        // Scientific notation: e or E, optional sign, digits.
        if self.peek() == Some('e') || self.peek() == Some('E') {
            let next = self.peek_at(1);
            let has_sign = next == Some('+') || next == Some('-');
            let digit_pos = if has_sign { 2 } else { 1 };

            if self.peek_at(digit_pos).is_some_and(|c| c.is_ascii_digit()) {
                repr.extend(self.consume()); // e or E
                if has_sign {
                    repr.extend(self.consume()); // + or -
                }
                repr.extend(self.consume()); // digit
                is_integer = false;

                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    repr.extend(self.consume());
                }
            }
        }

        let value: f64 = repr.parse().unwrap_or(0.0);
        let int_value = if is_integer { repr.parse().ok() } else { None };

        (value, int_value, repr)
    }

    /// [§ 4.3.13 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    fn consume_escaped_code_point(&mut self) -> Option<char> {
        match self.consume() {
            // "hex digit"
            Some(c) if c.is_ascii_hexdigit() => {
                let mut hex = c.to_string();
                // "Consume as many hex digits as possible, but no more than 5."
                for _ in 0..5 {
                    if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                        hex.extend(self.consume());
                    } else {
                        break;
                    }
                }
                // "If the next input code point is whitespace, consume it."
                if self.peek().is_some_and(is_whitespace) {
                    let _ = self.consume();
                }
                let code_point = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
                // "If this number is zero, or is for a surrogate, or is greater
                // than the maximum allowed code point, return U+FFFD."
                if code_point == 0
                    || (0xD800..=0xDFFF).contains(&code_point)
                    || code_point > 0x0010_FFFF
                {
                    Some('\u{FFFD}')
                } else {
                    char::from_u32(code_point)
                }
            }
            // "EOF" - "This is a parse error. Return U+FFFD."
            None => Some('\u{FFFD}'),
            // "anything else" - "Return the current input code point."
            Some(c) => Some(c),
        }
    }

    /// [§ 4.3.8 Check if two code points are a valid escape](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
    fn is_valid_escape(&self, first: Option<char>, second: Option<char>) -> bool {
        first == Some('\\') && second != Some('\n')
    }

    /// [§ 4.3.9 Check if three code points would start an ident sequence](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
    fn would_start_ident_sequence(&self) -> bool {
        self.would_start_ident_sequence_with(self.peek())
    }

    fn would_start_ident_sequence_with(&self, first: Option<char>) -> bool {
        match first {
            Some('-') => {
                let second = self.peek_at(1);
                second.is_some_and(is_ident_start_code_point)
                    || second == Some('-')
                    || self.is_valid_escape(second, self.peek_at(2))
            }
            Some(c) if is_ident_start_code_point(c) => true,
            Some('\\') => self.is_valid_escape(Some('\\'), self.peek_at(1)),
            _ => false,
        }
    }

    /// [§ 4.3.10 Check if three code points would start a number](https://www.w3.org/TR/css-syntax-3/#starts-with-a-number)
    fn would_start_number(&self) -> bool {
        match self.peek() {
            Some('+' | '-') => {
                let second = self.peek_at(1);
                if second.is_some_and(|c| c.is_ascii_digit()) {
                    return true;
                }
                if second == Some('.') {
                    return self.peek_at(2).is_some_and(|c| c.is_ascii_digit());
                }
                false
            }
            Some('.') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            Some(c) if c.is_ascii_digit() => true,
            _ => false,
        }
    }

    /// Consume and return the next character.
    fn consume(&mut self) -> Option<char> {
        if self.position < self.input.len() {
            let c = self.input[self.position];
            self.position += 1;
            Some(c)
        } else {
            None
        }
    }

    /// Put back the last consumed character.
    fn reconsume(&mut self) {
        if self.position > 0 {
            self.position -= 1;
        }
    }

    /// Peek at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    /// Peek at a character at an offset from current position.
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }
}

/// [§ 3.3 Preprocessing the input stream](https://www.w3.org/TR/css-syntax-3/#input-preprocessing)
///
/// "Replace any U+000D CARRIAGE RETURN, U+000C FORM FEED... by a single
/// U+000A LINE FEED. Replace any U+0000 NULL or surrogate code points with
/// U+FFFD REPLACEMENT CHARACTER." Rust strings cannot carry lone surrogates,
/// so only NUL replacement applies here.
fn preprocess(input: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    let _ = chars.next();
                }
                out.push('\n');
            }
            '\x0C' => out.push('\n'),
            '\0' => out.push('\u{FFFD}'),
            _ => out.push(c),
        }
    }
    out
}

/// [§ 4.2 Definitions - whitespace](https://www.w3.org/TR/css-syntax-3/#whitespace)
fn is_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\t' | ' ')
}

/// [§ 4.2 Definitions - ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
///
/// "A letter, a non-ASCII code point, or U+005F LOW LINE (_)."
fn is_ident_start_code_point(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.2 Definitions - ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
///
/// "An ident-start code point, a digit, or U+002D HYPHEN-MINUS (-)."
fn is_ident_code_point(c: char) -> bool {
    is_ident_start_code_point(c) || c.is_ascii_digit() || c == '-'
}
