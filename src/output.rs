//! Persistencia de la salida.
//!
//! Una vez que la traducción concluye con éxito, el texto acumulado en
//! el [`Emitter`] se escribe como un único archivo. Si la traducción
//! falla, nunca se llega a este punto y no se escribe nada.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::codegen::Emitter;
use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Opciones a aplicar al persistir la salida.
    pub struct OutputOptions: u32 {
        /// Anteponer el encabezado del [`Emitter`] al cuerpo.
        const WITH_HEADER = 0x01;

        /// Imprimir también el resultado en la salida estándar.
        const ECHO = 0x02;
    }
}

/// Un error de escritura de la salida.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error")]
    Io(#[from] io::Error),
}

/// Texto final a persistir, según las opciones dadas.
pub fn render(emitter: &Emitter, options: OutputOptions) -> String {
    let mut text = String::new();
    if options.contains(OutputOptions::WITH_HEADER) {
        text.push_str(emitter.header());
    }

    text.push_str(emitter.materialize());
    text
}

/// Escribe la salida hacia un flujo cualquiera.
pub fn emit<W: Write>(emitter: &Emitter, options: OutputOptions, output: &mut W) -> io::Result<()> {
    output.write_all(render(emitter, options).as_bytes())?;
    output.flush()
}

/// Escribe la salida en `path`, o en la salida estándar si `path` es `-`.
pub fn write<P: AsRef<Path>>(
    emitter: &Emitter,
    path: P,
    options: OutputOptions,
) -> Result<(), OutputError> {
    let path = path.as_ref();
    let to_stdout = path == Path::new("-");

    if to_stdout || options.contains(OutputOptions::ECHO) {
        let stdout = io::stdout();
        emit(emitter, options, &mut stdout.lock())?;
    }

    if !to_stdout {
        let mut file = BufWriter::new(File::create(path)?);
        emit(emitter, options, &mut file)?;
    }

    Ok(())
}
