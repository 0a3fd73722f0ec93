use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::Path;

/// Common interface of the structure formats read and written by pepforge.
///
/// Implementors parse a [`Molecule`] plus format-specific metadata from a
/// buffered reader and serialize them back. Path and string conveniences are
/// provided on top of the two required methods.
pub trait MolecularFile {
    /// Header information that does not belong in the atom or bond tables.
    type Metadata;

    /// The error type for parsing and serialization.
    type Error: Error + From<io::Error>;

    /// Reads a molecule and its metadata from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error>;

    /// Writes a molecule and its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the molecule cannot be represented in the format or
    /// the writer fails.
    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Reads a molecule from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Reads a molecule from an in-memory string.
    fn read_from_str(content: &str) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let mut reader = Cursor::new(content.as_bytes());
        Self::read_from(&mut reader)
    }

    /// Writes a molecule to a file path, creating or truncating the file.
    fn write_to_path<P: AsRef<Path>>(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(molecule, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serializes a molecule into a `String`.
    fn write_to_string(
        molecule: &Molecule,
        metadata: &Self::Metadata,
    ) -> Result<String, Self::Error> {
        let mut buffer = Vec::new();
        Self::write_to(molecule, metadata, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
