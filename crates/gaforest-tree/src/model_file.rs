//! Binary model file framing.
//!
//! A model file is the 5-byte ASCII magic `model` followed by every node record of the
//! ensemble as a little-endian `u64`, tree-major. The file carries no header describing its
//! shape: the reader must know how many trees and nodes per tree to expect.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::ensemble::Ensemble;

/// Leading bytes of every model file.
pub const MODEL_MAGIC: &[u8; 5] = b"model";

const RECORD_SIZE: usize = size_of::<u64>();

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ModelFileError {
    #[display("model file I/O failed: {_0}")]
    #[from]
    Io(io::Error),
    #[display("not a model file: unexpected magic bytes")]
    BadMagic,
    #[display("model file is truncated: expected {expected} node records, found {found}")]
    Truncated { expected: usize, found: usize },
    #[display("model shape {n_trees}x{n_nodes} cannot be represented")]
    InvalidShape { n_trees: usize, n_nodes: usize },
}

/// Writes `ensemble` in model file format.
pub fn write_model<W>(writer: W, ensemble: &Ensemble) -> Result<(), ModelFileError>
where
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    writer.write_all(MODEL_MAGIC)?;
    for record in ensemble.pack() {
        writer.write_all(&record.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads an ensemble of `n_trees` trees with `n_nodes` nodes each.
///
/// Trailing bytes after the expected records are ignored. Records are decoded with
/// [`Node::unpack`](crate::Node::unpack), which normalizes bits that do not affect
/// classification, so writing back a model produced elsewhere may not reproduce its bytes.
pub fn read_model<R>(reader: R, n_trees: usize, n_nodes: usize) -> Result<Ensemble, ModelFileError>
where
    R: Read,
{
    let invalid_shape = || ModelFileError::InvalidShape { n_trees, n_nodes };
    let expected = n_trees.checked_mul(n_nodes).ok_or_else(invalid_shape)?;

    let mut reader = BufReader::new(reader);
    let mut magic = [0; MODEL_MAGIC.len()];
    reader.read_exact(&mut magic).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ModelFileError::BadMagic,
        _ => ModelFileError::Io(e),
    })?;
    if &magic != MODEL_MAGIC {
        return Err(ModelFileError::BadMagic);
    }

    let mut records = Vec::with_capacity(expected);
    let mut buf = [0; RECORD_SIZE];
    while records.len() < expected {
        match reader.read_exact(&mut buf) {
            Ok(()) => records.push(u64::from_le_bytes(buf)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(ModelFileError::Truncated {
                    expected,
                    found: records.len(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    if n_trees == 0 {
        return Ok(Ensemble::from_trees(vec![]));
    }
    Ensemble::unpack(&records, n_nodes).ok_or_else(invalid_shape)
}

/// Replaces `destination` with the model read from `reader`.
///
/// The shape is taken from `destination`. On error, `destination` is left untouched.
pub fn load_model_into<R>(reader: R, destination: &mut Ensemble) -> Result<(), ModelFileError>
where
    R: Read,
{
    let n_nodes = destination.trees().first().map_or(0, |tree| tree.len());
    let model = read_model(reader, destination.len(), n_nodes)?;
    *destination = model;
    Ok(())
}

pub fn save_model_file<P>(path: P, ensemble: &Ensemble) -> Result<(), ModelFileError>
where
    P: AsRef<Path>,
{
    write_model(File::create(path)?, ensemble)
}

pub fn open_model_file<P>(path: P, n_trees: usize, n_nodes: usize) -> Result<Ensemble, ModelFileError>
where
    P: AsRef<Path>,
{
    read_model(File::open(path)?, n_trees, n_nodes)
}
