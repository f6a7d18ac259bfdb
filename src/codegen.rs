//! Emisión de código.
//!
//! El [`Emitter`] es un búfer de solo anexado. El parser lo alimenta con
//! texto del lenguaje objetivo a medida que reconoce cada producción de
//! la gramática, por lo que no existe una fase separada de generación.

/// Columnas que agrega cada nivel de anidamiento.
pub const INDENT_WIDTH: usize = 2;

/// Acumulador de código generado.
///
/// Mantiene dos regiones independientes: un encabezado, reservado para
/// contenido que deba anteceder al programa, y el cuerpo, que es lo que
/// finalmente se persiste. El encabezado nunca se concatena de manera
/// automática; eso queda a cargo de quien persiste la salida.
#[derive(Debug)]
pub struct Emitter {
    header: String,
    body: String,
    indentation: usize,
    line_start: bool,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            header: String::new(),
            body: String::new(),
            indentation: 0,
            line_start: true,
        }
    }

    /// Anexa `code` al cuerpo, sin salto de línea.
    ///
    /// La indentación actual solo se inserta al inicio de una línea, de
    /// modo que varias invocaciones sucesivas forman una misma línea.
    pub fn emit(&mut self, code: &str) {
        if self.line_start && !code.is_empty() {
            self.body.extend(std::iter::repeat(' ').take(self.indentation));
            self.line_start = false;
        }

        self.body.push_str(code);
    }

    /// Anexa `code` al cuerpo y termina la línea.
    pub fn emit_line(&mut self, code: &str) {
        self.emit(code);
        self.body.push('\n');
        self.line_start = true;
    }

    /// Anexa una línea al encabezado.
    pub fn header_line(&mut self, code: &str) {
        self.header.push_str(code);
        self.header.push('\n');
    }

    /// Incrementa la indentación en un nivel.
    pub fn indent(&mut self) {
        self.indentation += INDENT_WIDTH;
    }

    /// Decrementa la indentación en un nivel.
    pub fn dedent(&mut self) {
        self.indentation = self.indentation.saturating_sub(INDENT_WIDTH);
    }

    /// Indentación actual, en columnas.
    pub fn indentation(&self) -> usize {
        self.indentation
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Texto acumulado en el cuerpo, listo para persistirse.
    pub fn materialize(&self) -> &str {
        &self.body
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_and_fragments() {
        let mut emitter = Emitter::new();
        emitter.emit("print(");
        emitter.emit("x");
        emitter.emit_line(")");
        emitter.emit_line("y = 1");

        assert_eq!(emitter.materialize(), "print(x)\ny = 1\n");
    }

    #[test]
    fn indentation_applies_once_per_line() {
        let mut emitter = Emitter::new();
        emitter.emit_line("if x > 0:");
        emitter.indent();
        emitter.emit("print(");
        emitter.emit("x");
        emitter.emit_line(")");
        emitter.indent();
        emitter.emit_line("pass");
        emitter.dedent();
        emitter.dedent();
        emitter.emit_line("done = 1");

        assert_eq!(
            emitter.materialize(),
            "if x > 0:\n  print(x)\n    pass\ndone = 1\n"
        );
    }

    #[test]
    fn dedent_never_goes_negative() {
        let mut emitter = Emitter::new();
        emitter.dedent();
        assert_eq!(emitter.indentation(), 0);

        emitter.indent();
        assert_eq!(emitter.indentation(), INDENT_WIDTH);
    }

    #[test]
    fn header_is_kept_apart() {
        let mut emitter = Emitter::new();
        emitter.header_line("import sys");
        emitter.emit_line("x = 1");

        assert_eq!(emitter.header(), "import sys\n");
        assert_eq!(emitter.materialize(), "x = 1\n");
    }
}
