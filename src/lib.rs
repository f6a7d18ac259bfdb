//! Traductor de código fuente a código fuente.
//!
//! # Pipeline
//! Cada programa deriva de un único texto fuente, el cual se recibe
//! completo antes de iniciar. El análisis léxico en [`lex`] produce
//! tokens bajo demanda, a medida que el parser en [`parse`] los solicita.
//! El parser valida la gramática y una pequeña tabla de símbolos, y a la
//! vez emite el código del lenguaje objetivo a través de [`codegen`]. No
//! existe una representación intermedia: la traducción ocurre en una sola
//! pasada, en el mismo orden del código fuente.
//!
//! # Errores
//! Cualquier error léxico o sintáctico aborta la traducción completa.
//! No hay salida parcial: o bien se obtiene el texto traducido completo,
//! o bien un [`parse::Failure`] que describe el primer error encontrado,
//! el cual puede presentarse al usuario por medio de [`error::Diagnostics`].
//!
//! # Lenguaje objetivo
//! La salida se escribe en un lenguaje dinámico con bloques por
//! indentación, `print(...)`, `int(input())` y operadores infijos
//! convencionales. La persistencia de la salida se encuentra en [`output`].

#[macro_use]
mod macros;

pub mod codegen;
pub mod error;
pub mod lex;
pub mod output;
pub mod parse;
pub mod source;

pub use parse::translate;
