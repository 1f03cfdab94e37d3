use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use gaforest_data::{CsvLoad, CsvOptions, load_csv};
use gaforest_stats::class_accuracy::ClassAccuracy;
use serde::{Serialize, de::DeserializeOwned};

/// Path argument that selects standard output.
pub const STDOUT_PATH: &str = "-";

/// Destination of a JSON document.
#[derive(Debug)]
pub enum JsonSink {
    Stdout(StdoutLock<'static>),
    File { writer: BufWriter<File>, path: PathBuf },
}

impl JsonSink {
    /// Opens `path` for writing, or standard output when `path` is [`STDOUT_PATH`].
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        if path == Path::new(STDOUT_PATH) {
            return Ok(Self::Stdout(io::stdout().lock()));
        }
        let file =
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
        Ok(Self::File {
            writer: BufWriter::new(file),
            path: path.to_owned(),
        })
    }

    /// Human-readable destination for messages.
    pub fn name(&self) -> String {
        match self {
            Self::Stdout(_) => "standard output".to_owned(),
            Self::File { path, .. } => path.display().to_string(),
        }
    }

    /// Writes `value` as pretty-printed JSON terminated by a newline.
    pub fn write<T>(mut self, value: &T) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let name = self.name();
        let writer: &mut dyn Write = match &mut self {
            Self::Stdout(lock) => lock,
            Self::File { writer, .. } => writer,
        };
        serde_json::to_writer_pretty(&mut *writer, value)
            .with_context(|| format!("Cannot write JSON to {name}"))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .with_context(|| format!("Cannot finish writing {name}"))?;
        Ok(())
    }
}

/// Parses the JSON file at `path`; `what` names its content in error messages.
pub fn read_json_file<T>(what: &str, path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Cannot open {what} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot parse {what} file: {}", path.display()))
}

/// Loads a dataset CSV with `n_features` feature columns per sample.
pub fn read_dataset_file<P>(path: P, n_features: usize) -> anyhow::Result<CsvLoad>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let options = CsvOptions {
        n_features,
        ..CsvOptions::default()
    };
    let load = load_csv(path, &options)
        .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
    eprintln!(
        "Loaded {} samples ({} classes, {} feature columns) from {}",
        load.dataset.len(),
        load.dataset.n_classes(),
        load.feature_columns,
        path.display()
    );
    Ok(load)
}

pub fn print_class_accuracy(classes: &ClassAccuracy) {
    eprintln!("  Per class:");
    for (class, tally) in classes.classes().iter().enumerate() {
        match tally.accuracy() {
            Some(accuracy) => eprintln!(
                "    {class:3}: {accuracy:.4} ({}/{})",
                tally.correct, tally.total
            ),
            None => eprintln!("    {class:3}: n/a (no samples)"),
        }
    }
    eprintln!(
        "  Overall: {:.4} ({}/{})",
        classes.overall(),
        classes.correct(),
        classes.total()
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_dash_selects_stdout() {
        let sink = JsonSink::create(Path::new(STDOUT_PATH)).unwrap();
        assert!(matches!(sink, JsonSink::Stdout(_)));
        assert_eq!(sink.name(), "standard output");
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("gaforest-util-{}.json", std::process::id()));
        let value = BTreeMap::from([("accuracy".to_owned(), 0.5_f32)]);

        let sink = JsonSink::create(&path).unwrap();
        assert_eq!(sink.name(), path.display().to_string());
        sink.write(&value).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        let back: BTreeMap<String, f32> = read_json_file("test", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_missing_json_file_names_its_kind() {
        let err = read_json_file::<f32>("training parameters", Path::new("/nonexistent/params.json"))
            .unwrap_err();
        assert!(err.to_string().contains("training parameters"));
    }
}
