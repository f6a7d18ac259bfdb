//! Análisis sintáctico y traducción.
//!
//! El parser es de descenso recursivo con un token de lookahead. No se
//! construye un árbol sintáctico: cada regla de la gramática emite su
//! traducción a través del [`Emitter`] en el mismo momento en que es
//! reconocida.
//!
//! ```text
//! program     := {NEWLINE} {statement} EOF
//! statement   := "PRINT" (STRING | expression) nl
//!              | "IF" comparison "THEN" nl block "ENDIF" nl
//!              | "WHILE" comparison "REPEAT" nl block "ENDWHILE" nl
//!              | "LABEL" IDENT nl
//!              | "GOTO" IDENT nl
//!              | "LET" IDENT "=" expression nl
//!              | "INPUT" IDENT nl
//! comparison  := expression cmp expression {cmp expression}
//! expression  := term {("+" | "-") term}
//! term        := unary {("*" | "/") unary}
//! unary       := ["+" | "-"] primary
//! primary     := NUMBER | IDENT
//! ```
//!
//! El primer error léxico o sintáctico aborta la traducción completa.

use std::{
    collections::HashSet,
    fmt::{self, Display},
    rc::Rc,
};
use thiserror::Error;

use crate::{
    codegen::Emitter,
    lex::{Keyword, Lexer, LexerError, Token, TokenKind},
    source::{Located, Location, Source},
};

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParserError {
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: TokenKind, found: Token },

    #[error("Expected comparison operator, found {0}")]
    ExpectedComparison(Token),

    #[error("Expected a number or a variable, found {0}")]
    ExpectedOperand(Token),

    #[error("Invalid statement at {0}")]
    ExpectedStatement(Token),

    #[error("Invalid statement at identifier `{found}`, keywords are uppercase (did you mean `{keyword}`?)")]
    LowercaseKeyword { found: String, keyword: Keyword },

    #[error("Referenced variable `{0}` before assignment")]
    UndefinedVariable(String),

    #[error("Label `{0}` already exists")]
    DuplicateLabel(String),

    #[error("Tried to GOTO non-existing label `{0}`")]
    UndeclaredLabel(String),
}

/// Causa por la cual se abortó una traducción.
#[derive(Debug)]
pub enum Failure {
    Lexical(Located<LexerError>),
    Syntax(Located<ParserError>),
}

impl Failure {
    pub fn location(&self) -> &Location {
        match self {
            Failure::Lexical(error) => error.location(),
            Failure::Syntax(error) => error.location(),
        }
    }
}

impl Display for Failure {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Lexical(error) => write!(fmt, "{}: {}", error.location(), error.val()),
            Failure::Syntax(error) => write!(fmt, "{}: {}", error.location(), error.val()),
        }
    }
}

impl std::error::Error for Failure {}

impl From<Located<LexerError>> for Failure {
    fn from(error: Located<LexerError>) -> Self {
        Failure::Lexical(error)
    }
}

type Translate<T> = Result<T, Failure>;

/// Traduce un programa completo.
///
/// Se retorna el [`Emitter`] con la salida acumulada solo si la
/// traducción tuvo éxito de principio a fin.
pub fn translate(source: Rc<Source>) -> Result<Emitter, Failure> {
    let mut emitter = Emitter::new();
    Parser::new(Lexer::new(source), &mut emitter)?.program()?;

    Ok(emitter)
}

/// Estado de una traducción en curso.
pub struct Parser<'e> {
    lexer: Lexer,
    emitter: &'e mut Emitter,
    current: Located<Token>,
    lookahead: Located<Token>,
    symbols: HashSet<String>,
    labels_declared: HashSet<String>,
    labels_gotoed: Vec<Located<String>>,
}

impl<'e> Parser<'e> {
    /// Construye un parser y obtiene el token actual y el de lookahead.
    pub fn new(mut lexer: Lexer, emitter: &'e mut Emitter) -> Translate<Self> {
        let current = lexer.next_token()?;
        let lookahead = lexer.next_token()?;

        Ok(Parser {
            lexer,
            emitter,
            current,
            lookahead,
            symbols: HashSet::new(),
            labels_declared: HashSet::new(),
            labels_gotoed: Vec::new(),
        })
    }

    /// Traduce el programa completo, hasta el fin del texto.
    pub fn program(&mut self) -> Translate<()> {
        while self.check(TokenKind::Newline) {
            self.advance()?;
        }

        while !self.check(TokenKind::Eof) {
            self.statement()?;
        }

        // Se permiten referencias hacia adelante, por lo cual esto
        // solo puede verificarse al final
        match self
            .labels_gotoed
            .iter()
            .find(|label| !self.labels_declared.contains(label.val()))
        {
            Some(label) => {
                let error = ParserError::UndeclaredLabel(label.val().clone());
                Err(Failure::Syntax(Located::at(error, label.location().clone())))
            }

            None => Ok(()),
        }
    }

    /// Traduce una sentencia. Retorna `false` si la sentencia no produjo
    /// ninguna línea ejecutable en la salida.
    fn statement(&mut self) -> Translate<bool> {
        let executable = match self.kind() {
            TokenKind::Keyword(Keyword::Print) => {
                self.advance()?;
                if self.check(TokenKind::Str) {
                    emit_line!(self.emitter, "print(\"{}\")", self.current.val().text());
                    self.advance()?;
                } else {
                    emit!(self.emitter, "print(");
                    self.expression()?;
                    emit_line!(self.emitter, ")");
                }

                true
            }

            TokenKind::Keyword(Keyword::If) => {
                self.advance()?;
                emit!(self.emitter, "if ");
                self.comparison()?;

                self.expect(TokenKind::Keyword(Keyword::Then))?;
                self.nl()?;
                emit_line!(self.emitter, ":");

                self.block(Keyword::EndIf)?;
                true
            }

            TokenKind::Keyword(Keyword::While) => {
                self.advance()?;
                emit!(self.emitter, "while ");
                self.comparison()?;

                self.expect(TokenKind::Keyword(Keyword::Repeat))?;
                self.nl()?;
                emit_line!(self.emitter, ":");

                self.block(Keyword::EndWhile)?;
                true
            }

            TokenKind::Keyword(Keyword::Label) => {
                self.advance()?;
                let (location, label) = self.expect(TokenKind::Ident)?.split();

                if !self.labels_declared.insert(label.text().to_owned()) {
                    let error = ParserError::DuplicateLabel(label.text().to_owned());
                    return Err(Failure::Syntax(Located::at(error, location)));
                }

                // El lenguaje objetivo no tiene saltos
                emit_line!(self.emitter, "# LABEL {}", label.text());
                false
            }

            TokenKind::Keyword(Keyword::Goto) => {
                self.advance()?;
                let label = self.expect(TokenKind::Ident)?;

                emit_line!(self.emitter, "# GOTO {}", label.val().text());
                self.labels_gotoed
                    .push(label.map(|label| label.text().to_owned()));

                false
            }

            TokenKind::Keyword(Keyword::Let) => {
                self.advance()?;
                let target = self.expect(TokenKind::Ident)?.into_inner();
                self.expect(TokenKind::Eq)?;

                // El destino queda declarado antes del lado derecho
                self.symbols.insert(target.text().to_owned());
                emit!(self.emitter, "{} = ", target.text());
                self.expression()?;
                emit_line!(self.emitter, "");

                true
            }

            TokenKind::Keyword(Keyword::Input) => {
                self.advance()?;
                let target = self.expect(TokenKind::Ident)?.into_inner();

                emit_line!(self.emitter, "{} = int(input())", target.text());
                self.symbols.insert(target.text().to_owned());
                true
            }

            _ => {
                let found = self.current.val().clone();
                let error = match Keyword::resembling(found.text()) {
                    Some(keyword) if found.kind() == TokenKind::Ident => {
                        ParserError::LowercaseKeyword {
                            found: found.text().to_owned(),
                            keyword,
                        }
                    }

                    _ => ParserError::ExpectedStatement(found),
                };

                return self.fail(error);
            }
        };

        self.nl()?;
        Ok(executable)
    }

    /// Cuerpo de un `IF` o `WHILE`, hasta la palabra clave `end` inclusive.
    fn block(&mut self, end: Keyword) -> Translate<()> {
        let end = TokenKind::Keyword(end);
        self.emitter.indent();

        let mut executable = false;
        loop {
            match self.kind() {
                kind if kind == end => break,
                TokenKind::Eof => return self.unexpected(end),
                _ => executable |= self.statement()?,
            }
        }

        // Un bloque vacío no es válido en el lenguaje objetivo
        if !executable {
            emit_line!(self.emitter, "pass");
        }

        self.emitter.dedent();
        self.expect(end)?;

        Ok(())
    }

    fn comparison(&mut self) -> Translate<()> {
        self.expression()?;
        if !self.kind().is_comparison() {
            let found = self.current.val().clone();
            return self.fail(ParserError::ExpectedComparison(found));
        }

        while self.kind().is_comparison() {
            self.operator()?;
            self.expression()?;
        }

        Ok(())
    }

    fn expression(&mut self) -> Translate<()> {
        self.term()?;
        while matches!(self.kind(), TokenKind::Plus | TokenKind::Minus) {
            self.operator()?;
            self.term()?;
        }

        Ok(())
    }

    fn term(&mut self) -> Translate<()> {
        self.unary()?;
        while matches!(self.kind(), TokenKind::Asterisk | TokenKind::Slash) {
            self.operator()?;
            self.unary()?;
        }

        Ok(())
    }

    fn unary(&mut self) -> Translate<()> {
        if matches!(self.kind(), TokenKind::Plus | TokenKind::Minus) {
            emit!(self.emitter, self.current.val().text());
            self.advance()?;
        }

        self.primary()
    }

    fn primary(&mut self) -> Translate<()> {
        match self.kind() {
            TokenKind::Number => (),

            TokenKind::Ident => {
                let name = self.current.val().text();
                if !self.symbols.contains(name) {
                    let error = ParserError::UndefinedVariable(name.to_owned());
                    return self.fail(error);
                }
            }

            _ => {
                let found = self.current.val().clone();
                return self.fail(ParserError::ExpectedOperand(found));
            }
        }

        emit!(self.emitter, self.current.val().text());
        self.advance()
    }

    /// Operador binario, emitido sin cambios entre espacios.
    fn operator(&mut self) -> Translate<()> {
        emit!(self.emitter, " {} ", self.current.val().text());
        self.advance()
    }

    /// Uno o más saltos de línea, o bien el fin del texto.
    fn nl(&mut self) -> Translate<()> {
        if self.check(TokenKind::Eof) {
            return Ok(());
        }

        self.expect(TokenKind::Newline)?;
        while self.check(TokenKind::Newline) {
            self.advance()?;
        }

        Ok(())
    }

    /// Consume el token actual si es de la categoría esperada.
    fn expect(&mut self, kind: TokenKind) -> Translate<Located<Token>> {
        if !self.check(kind) {
            return self.unexpected(kind);
        }

        let token = self.current.clone();
        self.advance()?;

        Ok(token)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn kind(&self) -> TokenKind {
        self.current.val().kind()
    }

    /// Desplaza el lookahead hacia el token actual y obtiene un nuevo lookahead.
    fn advance(&mut self) -> Translate<()> {
        let next = self.lexer.next_token()?;
        self.current = std::mem::replace(&mut self.lookahead, next);

        Ok(())
    }

    fn unexpected<T>(&self, expected: TokenKind) -> Translate<T> {
        let found = self.current.val().clone();
        self.fail(ParserError::UnexpectedToken { expected, found })
    }

    fn fail<T>(&self, error: ParserError) -> Translate<T> {
        let location = self.current.location().clone();
        Err(Failure::Syntax(Located::at(error, location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Result<String, Failure> {
        translate(Source::new("<test>", text)).map(|emitter| emitter.materialize().to_owned())
    }

    fn syntax_error(text: &str) -> ParserError {
        match run(text) {
            Err(Failure::Syntax(error)) => error.into_inner(),
            Err(Failure::Lexical(error)) => panic!("unexpected lexical error: {}", error.val()),
            Ok(output) => panic!("translation succeeded unexpectedly:\n{}", output),
        }
    }

    #[test]
    fn empty_program() {
        assert_eq!(run("").unwrap(), "");
        assert_eq!(run("\n\n# nothing here\n").unwrap(), "");
    }

    #[test]
    fn print() {
        assert_eq!(run("PRINT \"hello\"").unwrap(), "print(\"hello\")\n");
        assert_eq!(run("PRINT 1 + 2 * 3\n").unwrap(), "print(1 + 2 * 3)\n");
        assert_eq!(run("PRINT -4 / +2").unwrap(), "print(-4 / +2)\n");
    }

    #[test]
    fn let_and_input() {
        assert_eq!(run("LET x = 5\nPRINT x").unwrap(), "x = 5\nprint(x)\n");
        assert_eq!(run("INPUT n\nLET m = n - 1").unwrap(), "n = int(input())\nm = n - 1\n");
        assert_eq!(run("LET x = 1\nLET x = x * 2").unwrap(), "x = 1\nx = x * 2\n");
    }

    #[test]
    fn reference_before_assignment() {
        assert_eq!(
            syntax_error("PRINT y"),
            ParserError::UndefinedVariable(String::from("y"))
        );

        assert_eq!(run("LET x = x + 1").unwrap(), "x = x + 1\n");
        assert_eq!(
            syntax_error("LET x = y + 1"),
            ParserError::UndefinedVariable(String::from("y"))
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(
            run("INPUT a\nWHILE a >= 0 != 1 REPEAT\nLET a = a - 1\nENDWHILE").unwrap(),
            "a = int(input())\nwhile a >= 0 != 1:\n  a = a - 1\n"
        );

        assert!(matches!(
            syntax_error("IF 1 2 THEN\nENDIF"),
            ParserError::ExpectedComparison(found) if found.text() == "2"
        ));

        assert!(matches!(
            syntax_error("IF 1 THEN\nENDIF"),
            ParserError::ExpectedComparison(found)
                if found.kind() == TokenKind::Keyword(Keyword::Then)
        ));
    }

    #[test]
    fn nested_blocks() {
        let program = "\
IF 1 > 0 THEN
  WHILE 2 < 3 REPEAT
    PRINT \"deep\"
  ENDWHILE
  PRINT \"shallow\"
ENDIF
PRINT \"top\"
";

        assert_eq!(
            run(program).unwrap(),
            "if 1 > 0:\n  while 2 < 3:\n    print(\"deep\")\n  print(\"shallow\")\nprint(\"top\")\n"
        );
    }

    #[test]
    fn empty_blocks_get_pass() {
        assert_eq!(run("IF 1 == 1 THEN\nENDIF").unwrap(), "if 1 == 1:\n  pass\n");
        assert_eq!(
            run("WHILE 1 == 1 REPEAT\nLABEL spin\nENDWHILE").unwrap(),
            "while 1 == 1:\n  # LABEL spin\n  pass\n"
        );
    }

    #[test]
    fn unterminated_block() {
        assert_eq!(
            syntax_error("IF 1 > 0 THEN\nPRINT 1\n"),
            ParserError::UnexpectedToken {
                expected: TokenKind::Keyword(Keyword::EndIf),
                found: Token::new(TokenKind::Eof, ""),
            }
        );
    }

    #[test]
    fn statements_need_separators() {
        assert_eq!(
            syntax_error("PRINT 1 PRINT 2"),
            ParserError::UnexpectedToken {
                expected: TokenKind::Newline,
                found: Token::new(TokenKind::Keyword(Keyword::Print), "PRINT"),
            }
        );

        assert_eq!(
            syntax_error("IF 1 > 0 THEN PRINT 1\nENDIF"),
            ParserError::UnexpectedToken {
                expected: TokenKind::Newline,
                found: Token::new(TokenKind::Keyword(Keyword::Print), "PRINT"),
            }
        );
    }

    #[test]
    fn invalid_statements() {
        assert_eq!(
            syntax_error("x = 1"),
            ParserError::ExpectedStatement(Token::new(TokenKind::Ident, "x"))
        );

        assert_eq!(
            syntax_error("let x = 1"),
            ParserError::LowercaseKeyword {
                found: String::from("let"),
                keyword: Keyword::Let,
            }
        );

        assert_eq!(
            syntax_error("LET 1 = 2"),
            ParserError::UnexpectedToken {
                expected: TokenKind::Ident,
                found: Token::new(TokenKind::Number, "1"),
            }
        );

        assert!(matches!(
            syntax_error("PRINT"),
            ParserError::ExpectedOperand(found) if found.kind() == TokenKind::Eof
        ));
    }

    #[test]
    fn labels() {
        assert_eq!(
            run("GOTO end\nPRINT 1\nLABEL end").unwrap(),
            "# GOTO end\nprint(1)\n# LABEL end\n"
        );

        assert_eq!(
            syntax_error("LABEL a\nLABEL a"),
            ParserError::DuplicateLabel(String::from("a"))
        );

        assert_eq!(
            syntax_error("LABEL a\nGOTO b\nGOTO a"),
            ParserError::UndeclaredLabel(String::from("b"))
        );
    }

    #[test]
    fn error_locations() {
        let failure = run("LET a = 1\nPRINT a + b").unwrap_err();
        assert_eq!(failure.location().to_string(), "<test>:2:11");
        assert_eq!(
            failure.to_string(),
            "<test>:2:11: Referenced variable `b` before assignment"
        );

        let failure = run("GOTO nowhere\n").unwrap_err();
        assert_eq!(failure.location().to_string(), "<test>:[1:6-1:12]");
    }

    #[test]
    fn lexical_errors_abort() {
        let failure = run("PRINT 1\nPRINT \"50%\"").unwrap_err();
        assert!(matches!(
            failure,
            Failure::Lexical(ref error) if *error.val() == LexerError::IllegalStringChar('%')
        ));
    }
}
