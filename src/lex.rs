//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del traductor. Descompone el texto de un
//! [`Source`] en unidades léxicas denominadas tokens, bajo demanda: el
//! parser solicita cada token por medio de [`Lexer::next_token()`] en el
//! momento en que lo necesita. Los espacios en blanco y los comentarios
//! se descartan durante esta operación. Cada token emitido está asociado
//! a una ubicación en el código fuente original.
//!
//! # Contenido de un token
//! Todo token incluye su lexema exacto. Para palabras clave, el lexema
//! coincide con el nombre de la palabra clave. Los literales de cadena
//! se almacenan sin las comillas que los delimitan.
//!
//! # Reglas importantes del lenguaje
//! - Los saltos de línea son significativos y separan sentencias.
//! - Los comentarios inician con `'#'` y terminan al final de la línea.
//! - Las palabras clave se escriben en mayúsculas; `let` es un
//!   identificador, no la palabra clave [`Keyword::Let`].
//! - Los literales de cadena no admiten secuencias de escape, saltos
//!   de línea, tabuladores ni `'%'`.
//! - Los literales numéricos no llevan signo ni exponente.
//!
//! # Errores
//! Cualquier error léxico es fatal. El lexer no intenta recuperarse y
//! deja de producir tokens tras el primer error.

use crate::source::{Located, Location, Position, Source};
use std::{
    fmt::{self, Display},
    ops::Range,
    rc::Rc,
    str::FromStr,
};

use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),

    /// Se encontró `!` sin un `=` a continuación.
    #[error("Expected `!=`, found `!` followed by {}", describe_char(.0))]
    ExpectedNotEqual(Option<char>),

    /// Carácter prohibido dentro de un literal de cadena.
    #[error("Illegal character {0:?} in string literal")]
    IllegalStringChar(char),

    /// El texto terminó antes de cerrar un literal de cadena.
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// Un punto decimal que no es seguido por al menos un dígito.
    #[error("Illegal character in number: expected a digit after `.`")]
    MalformedNumber,
}

fn describe_char(c: &Option<char>) -> String {
    match c {
        Some(c) => format!("{:?}", c),
        None => String::from("end of file"),
    }
}

/// Objeto resultante del análisis léxico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    /// Construye un token a partir de su categoría y su lexema.
    pub fn new<T: Into<String>>(kind: TokenKind, text: T) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    /// Categoría del token.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Lexema exacto.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        match self.kind {
            Number => write!(fmt, "number `{}`", self.text),
            Str => write!(fmt, "string \"{}\"", self.text),
            Ident => write!(fmt, "identifier `{}`", self.text),
            kind => kind.fmt(fmt),
        }
    }
}

/// Categoría de un token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Fin del texto fuente.
    Eof,

    /// `\n`
    Newline,

    /// Literal numérico.
    Number,

    /// Literal de cadena.
    Str,

    /// Identificador.
    Ident,

    /// Palabra clave.
    Keyword(Keyword),

    /// `=`
    Eq,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Asterisk,

    /// `/`
    Slash,

    /// `==`
    EqEq,

    /// `!=`
    NotEq,

    /// `<`
    Lt,

    /// `<=`
    LtEq,

    /// `>`
    Gt,

    /// `>=`
    GtEq,
}

impl TokenKind {
    /// Determina si la categoría corresponde a un operador de comparación.
    pub fn is_comparison(self) -> bool {
        use TokenKind::*;
        matches!(self, Gt | GtEq | Lt | LtEq | EqEq | NotEq)
    }
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        match self {
            Eof => fmt.write_str("end of file"),
            Newline => fmt.write_str("newline"),
            Number => fmt.write_str("number"),
            Str => fmt.write_str("string"),
            Ident => fmt.write_str("identifier"),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            Eq => fmt.write_str("`=`"),
            Plus => fmt.write_str("`+`"),
            Minus => fmt.write_str("`-`"),
            Asterisk => fmt.write_str("`*`"),
            Slash => fmt.write_str("`/`"),
            EqEq => fmt.write_str("`==`"),
            NotEq => fmt.write_str("`!=`"),
            Lt => fmt.write_str("`<`"),
            LtEq => fmt.write_str("`<=`"),
            Gt => fmt.write_str("`>`"),
            GtEq => fmt.write_str("`>=`"),
        }
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Label,
    Goto,
    Print,
    Input,
    Let,
    If,
    Then,
    EndIf,
    While,
    Repeat,
    EndWhile,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("LABEL",    Keyword::Label),
    ("GOTO",     Keyword::Goto),
    ("PRINT",    Keyword::Print),
    ("INPUT",    Keyword::Input),
    ("LET",      Keyword::Let),
    ("IF",       Keyword::If),
    ("THEN",     Keyword::Then),
    ("ENDIF",    Keyword::EndIf),
    ("WHILE",    Keyword::While),
    ("REPEAT",   Keyword::Repeat),
    ("ENDWHILE", Keyword::EndWhile),
];

impl Keyword {
    /// Nombre de la palabra clave, idéntico a su lexema.
    pub fn name(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|&&(_, keyword)| keyword == self)
            .map(|&(name, _)| name)
            .unwrap_or_default()
    }

    /// Busca una palabra clave que difiera de `word` únicamente en
    /// mayúsculas y minúsculas.
    ///
    /// Esto no afecta el análisis léxico, solo sirve para mejorar
    /// mensajes de error.
    pub fn resembling(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|&&(name, _)| unicase::eq_ascii(name, word))
            .map(|&(_, keyword)| keyword)
    }
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Analizador léxico bajo demanda.
///
/// El lexer mantiene un cursor sobre el texto fuente y el carácter
/// que se encuentra bajo el mismo (`None` al final del texto). Cada
/// invocación de [`Lexer::next_token()`] consume exactamente un token.
pub struct Lexer {
    source: Rc<Source>,
    offset: usize,
    current: Option<char>,
    position: Position,
    exhausted: bool,
}

impl Lexer {
    /// Crea un lexer posicionado al inicio del texto.
    pub fn new(source: Rc<Source>) -> Self {
        let current = source.text().chars().next();
        Lexer {
            source,
            offset: 0,
            current,
            position: Position::default(),
            exhausted: false,
        }
    }

    /// Origen sobre el cual opera este lexer.
    pub fn source(&self) -> &Rc<Source> {
        &self.source
    }

    /// Produce el siguiente token.
    ///
    /// Una vez alcanzado el final del texto, todas las invocaciones
    /// subsecuentes retornan [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<Located<Token>, Located<LexerError>> {
        self.skip_blanks();
        let start = self.position;

        let (kind, lexeme) = match self.classify() {
            Ok(classified) => classified,
            Err(error) => {
                let location = Location::at(Rc::clone(&self.source), self.position);
                return Err(Located::at(error, location));
            }
        };

        // El cursor se encuentra sobre el último carácter consumido
        let end = match self.current {
            Some(_) => self.position.advance(),
            None => start.advance(),
        };

        let text = &self.source.text()[lexeme];
        let token = Token::new(kind, text);
        let location = Location::range(Rc::clone(&self.source), start, end);

        self.advance();
        Ok(Located::at(token, location))
    }

    /// Reduce la entrada completa a una secuencia de tokens que termina
    /// en [`TokenKind::Eof`], o bien al primer error léxico.
    pub fn try_exhaustive(self) -> Result<Vec<Located<Token>>, Located<LexerError>> {
        self.collect()
    }

    /// Clasifica el token que inicia en el carácter actual.
    ///
    /// Retorna la categoría y el rango de bytes del lexema. Al retornar,
    /// el cursor queda sobre el último carácter que forma parte del token.
    fn classify(&mut self) -> Result<(TokenKind, Range<usize>), LexerError> {
        use TokenKind::*;

        let start = self.offset;
        let c = match self.current {
            None => return Ok((Eof, start..start)),
            Some(c) => c,
        };

        let kind = match c {
            '\n' => Newline,

            // Tokens triviales
            '+' => Plus,
            '-' => Minus,
            '*' => Asterisk,
            '/' => Slash,

            // Operadores de uno o dos caracteres
            '=' => self.either('=', EqEq, Eq),
            '>' => self.either('=', GtEq, Gt),
            '<' => self.either('=', LtEq, Lt),
            '!' => match self.peek() {
                Some('=') => {
                    self.advance();
                    NotEq
                }

                next => return Err(LexerError::ExpectedNotEqual(next)),
            },

            '"' => return self.string(),
            c if c.is_ascii_digit() => return self.number(),
            c if c.is_alphabetic() => return Ok(self.word()),

            c => return Err(LexerError::BadChar(c)),
        };

        Ok((kind, start..self.end_of_current()))
    }

    /// Cuerpo de un literal de cadena, sin comillas.
    fn string(&mut self) -> Result<(TokenKind, Range<usize>), LexerError> {
        self.advance();
        let start = self.offset;

        loop {
            match self.current {
                None => break Err(LexerError::UnterminatedString),
                Some('"') => break Ok((TokenKind::Str, start..self.offset)),
                Some(c @ ('\r' | '\n' | '\t' | '\\' | '%')) => {
                    break Err(LexerError::IllegalStringChar(c))
                }

                Some(_) => self.advance(),
            }
        }
    }

    /// Literal numérico, con parte decimal opcional.
    fn number(&mut self) -> Result<(TokenKind, Range<usize>), LexerError> {
        let start = self.offset;
        self.skip_digits();

        if self.peek() == Some('.') {
            self.advance();
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(LexerError::MalformedNumber);
            }

            self.skip_digits();
        }

        Ok((TokenKind::Number, start..self.end_of_current()))
    }

    /// Término que puede ser un identificador o una palabra clave.
    fn word(&mut self) -> (TokenKind, Range<usize>) {
        let start = self.offset;
        while self.peek().map_or(false, is_word_char) {
            self.advance();
        }

        let range = start..self.end_of_current();
        let kind = match Keyword::from_str(&self.source.text()[range.clone()]) {
            Ok(keyword) => TokenKind::Keyword(keyword),
            Err(()) => TokenKind::Ident,
        };

        (kind, range)
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Descarta espacios en blanco (excepto `'\n'`) y comentarios.
    fn skip_blanks(&mut self) {
        loop {
            match self.current {
                Some(' ' | '\t' | '\r') => self.advance(),
                Some('#') => {
                    while !matches!(self.current, None | Some('\n')) {
                        self.advance();
                    }
                }

                _ => break,
            }
        }
    }

    /// Operador de dos caracteres si sigue `next`, de uno si no.
    fn either(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Mueve el cursor al siguiente carácter. No tiene efecto al final del texto.
    fn advance(&mut self) {
        if let Some(c) = self.current {
            self.offset += c.len_utf8();
            self.position = self.position.after(c);
            self.current = self.source.text()[self.offset..].chars().next();
        }
    }

    /// Observa el carácter que sigue al actual sin consumirlo.
    fn peek(&self) -> Option<char> {
        let next = self.end_of_current();
        self.current
            .and_then(|_| self.source.text()[next..].chars().next())
    }

    /// Desplazamiento inmediatamente posterior al carácter actual.
    fn end_of_current(&self) -> usize {
        self.offset + self.current.map_or(0, char::len_utf8)
    }
}

impl Iterator for Lexer {
    type Item = Result<Located<Token>, Located<LexerError>>;

    /// Emite todos los tokens, incluyendo un único [`TokenKind::Eof`].
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let result = self.next_token();
        self.exhausted = match &result {
            Ok(token) => token.val().kind() == TokenKind::Eof,
            Err(_) => true,
        };

        Some(result)
    }
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::{
        Asterisk, Eof, Eq, EqEq, Gt, GtEq, Ident, Lt, LtEq, Minus, Newline, NotEq, Number, Plus,
        Slash, Str,
    };

    fn lexer(text: &str) -> Lexer {
        Lexer::new(Source::new("<test>", text))
    }

    fn kinds(text: &str) -> Vec<TokenKind> {
        lexer(text)
            .try_exhaustive()
            .unwrap()
            .into_iter()
            .map(|token| token.val().kind())
            .collect()
    }

    fn texts(text: &str) -> Vec<String> {
        lexer(text)
            .try_exhaustive()
            .unwrap()
            .into_iter()
            .map(|token| token.val().text().to_owned())
            .collect()
    }

    fn error(text: &str) -> LexerError {
        lexer(text).try_exhaustive().unwrap_err().into_inner()
    }

    #[test]
    fn empty_input_is_eof_forever() {
        let mut lexer = lexer("");
        for _ in 0..3 {
            let token = lexer.next_token().unwrap();
            assert_eq!(token.val().kind(), Eof);
            assert_eq!(token.val().text(), "");
        }
    }

    #[test]
    fn consumed_input_is_eof_forever() {
        let mut lexer = lexer("PRINT 1");
        assert_eq!(lexer.next_token().unwrap().val().kind(), TokenKind::Keyword(Keyword::Print));
        assert_eq!(lexer.next_token().unwrap().val().kind(), Number);

        for _ in 0..3 {
            let token = lexer.next_token().unwrap();
            assert_eq!(token.val().kind(), Eof);
            assert_eq!(token.location().to_string(), "<test>:1:8");
        }
    }

    #[test]
    fn iterator_stops_after_eof() {
        let tokens: Vec<_> = lexer("PRINT 1").collect();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("+ - * / = == > >= < <= !="),
            vec![Plus, Minus, Asterisk, Slash, Eq, EqEq, Gt, GtEq, Lt, LtEq, NotEq, Eof]
        );

        assert_eq!(kinds("a>=b"), vec![Ident, GtEq, Ident, Eof]);
        assert_eq!(texts("<= =="), vec!["<=", "==", ""]);
    }

    #[test]
    fn newlines_are_tokens() {
        assert_eq!(
            kinds("PRINT 1\n\nPRINT 2\n"),
            vec![
                TokenKind::Keyword(Keyword::Print),
                Number,
                Newline,
                Newline,
                TokenKind::Keyword(Keyword::Print),
                Number,
                Newline,
                Eof
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("LET let LETx ENDWHILE x1"),
            vec![TokenKind::Keyword(Keyword::Let), Ident, Ident, TokenKind::Keyword(Keyword::EndWhile), Ident, Eof]
        );

        assert_eq!(texts("WHILE counter2"), vec!["WHILE", "counter2", ""]);
    }

    #[test]
    fn keyword_names_match_lexemes() {
        for &(name, keyword) in KEYWORDS {
            assert_eq!(keyword.name(), name);
            assert_eq!(name.parse::<Keyword>(), Ok(keyword));
        }

        assert_eq!("Print".parse::<Keyword>(), Err(()));
        assert_eq!(Keyword::resembling("endIf"), Some(Keyword::EndIf));
        assert_eq!(Keyword::resembling("nope"), None);
    }

    #[test]
    fn numbers() {
        assert_eq!(texts("0 42 3.14 10.0"), vec!["0", "42", "3.14", "10.0", ""]);
        assert_eq!(kinds("-5"), vec![Minus, Number, Eof]);
        assert_eq!(error("LET x = 1."), LexerError::MalformedNumber);
        assert_eq!(error("1.x"), LexerError::MalformedNumber);
    }

    #[test]
    fn strings() {
        let tokens = lexer("PRINT \"hello, world!\"").try_exhaustive().unwrap();
        assert_eq!(tokens[1].val(), &Token::new(Str, "hello, world!"));
        assert_eq!(texts("\"\""), vec!["", ""]);

        assert_eq!(error("\"a\tb\""), LexerError::IllegalStringChar('\t'));
        assert_eq!(error("\"50%\""), LexerError::IllegalStringChar('%'));
        assert_eq!(error("\"a\\n\""), LexerError::IllegalStringChar('\\'));
        assert_eq!(error("\"a\nb\""), LexerError::IllegalStringChar('\n'));
        assert_eq!(error("\"open"), LexerError::UnterminatedString);
    }

    #[test]
    fn comments_and_whitespace() {
        assert_eq!(
            kinds("  # a comment\nPRINT 1 # trailing\t\r\n# at eof"),
            vec![Newline, TokenKind::Keyword(Keyword::Print), Number, Newline, Eof]
        );
    }

    #[test]
    fn bad_characters() {
        assert_eq!(error("LET x = 1 ! 2"), LexerError::ExpectedNotEqual(Some(' ')));
        assert_eq!(error("!"), LexerError::ExpectedNotEqual(None));
        assert_eq!(error("LET x = (1)"), LexerError::BadChar('('));
        assert_eq!(error("x & y"), LexerError::BadChar('&'));
    }

    #[test]
    fn locations() {
        let tokens = lexer("LET x = 10\n  PRINT \"hi\"").try_exhaustive().unwrap();
        let at = |index: usize| tokens[index].location().to_string();

        assert_eq!(at(0), "<test>:[1:1-1:3]");
        assert_eq!(at(1), "<test>:1:5");
        assert_eq!(at(3), "<test>:[1:9-1:10]");
        assert_eq!(at(5), "<test>:[2:3-2:7]");
        assert_eq!(at(6), "<test>:[2:9-2:12]");
    }

    #[test]
    fn error_locations() {
        let error = lexer("PRINT 1\nLET y = $").try_exhaustive().unwrap_err();
        assert_eq!(error.location().to_string(), "<test>:2:9");
    }
}
