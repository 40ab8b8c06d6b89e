//! Interactive measurement-file picker.
//!
//! `corefit` without `-f` lists the CSV files under the current directory
//! whose headers carry `coreloss`, `bac` and `fs` columns, shows how many
//! records each one holds, and asks which file to fit.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;
use crate::io::ingest::{CsvPreview, REQUIRED_FIELDS, preview_csv};

/// Directory levels searched below the working directory.
const SEARCH_DEPTH: usize = 4;

const SKIPPED_DIRS: [&str; 3] = [".git", "target", "node_modules"];

/// A CSV that looks like measurement data.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub preview: CsvPreview,
}

/// Ask the user to pick a measurement CSV from the current directory tree.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let candidates = measurement_files(Path::new("."));
    if candidates.is_empty() {
        return Err(AppError::new(
            2,
            format!(
                "No CSV with {} columns found. Provide one with `corefit fit -f <file.csv>`.",
                REQUIRED_FIELDS.join("/")
            ),
        ));
    }

    let stdin = io::stdin();
    choose(&candidates, stdin.lock(), io::stdout().lock())
}

/// Selection loop: a menu number, a typed path, or `q`.
fn choose<R: BufRead, W: Write>(candidates: &[Candidate], mut input: R, mut out: W) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::new(2, format!("Terminal I/O failed: {e}"));

    writeln!(out, "Measurement files ({}):", candidates.len()).map_err(io_err)?;
    for (idx, c) in candidates.iter().enumerate() {
        writeln!(out, "{}", menu_line(idx + 1, c)).map_err(io_err)?;
    }

    loop {
        write!(out, "Pick 1-{}, type a path, or q: ", candidates.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::new(
                2,
                "No selection made. Provide a CSV path with `corefit fit -f <file.csv>`.",
            ));
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(n) = answer.parse::<usize>() {
            match candidates.get(n.wrapping_sub(1)) {
                Some(c) => return Ok(c.path.clone()),
                None => {
                    writeln!(out, "No entry {n}.").map_err(io_err)?;
                    continue;
                }
            }
        }

        let typed = PathBuf::from(answer);
        match validate_csv_path(&typed).and_then(|p| preview_csv(&p).map(|_| p)) {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(io_err)?,
        }
    }
}

fn menu_line(number: usize, c: &Candidate) -> String {
    let shown = c.path.strip_prefix("./").unwrap_or(c.path.as_path());
    format!(
        "{number:>3}) {}  ({} rows; {})",
        shown.display(),
        c.preview.records,
        c.preview.columns.join(", ")
    )
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if !path.is_file() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// CSV files under `root` that carry the measurement columns, sorted by path.
pub fn measurement_files(root: &Path) -> Vec<Candidate> {
    csv_files_under(root, SEARCH_DEPTH)
        .into_iter()
        .filter_map(|path| match preview_csv(&path) {
            Ok(preview) => Some(Candidate { path, preview }),
            Err(err) => {
                debug!(file = %path.display(), "not a measurement file: {err}");
                None
            }
        })
        .collect()
}

fn csv_files_under(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                if !skipped && depth < max_depth {
                    pending.push((path, depth + 1));
                }
            } else if kind.is_file() && has_csv_extension(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("corefit-picker-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        root
    }

    fn populate(root: &Path) {
        let good = "coreloss,bac,fs\n5,0.02,500\n18,0.03,500\n";
        fs::write(root.join("b.csv"), good).unwrap();
        fs::write(root.join("a.CSV"), "Coreloss_mW,Bac_T,fs_kHz\n1,0.1,100\n").unwrap();
        fs::write(root.join("sub/c.csv"), good).unwrap();
        fs::write(root.join("prices.csv"), "date,close\n2024-01-01,3\n").unwrap();
        fs::write(root.join("notes.txt"), good).unwrap();
        fs::write(root.join("target/skip.csv"), good).unwrap();
    }

    #[test]
    fn lists_only_measurement_csvs() {
        let root = scratch_dir("list");
        populate(&root);

        let found = measurement_files(&root);
        let names: Vec<String> = found
            .iter()
            .map(|c| c.path.strip_prefix(&root).unwrap().display().to_string())
            .collect();
        let records: Vec<usize> = found.iter().map(|c| c.preview.records).collect();
        let _ = fs::remove_dir_all(&root);

        assert_eq!(names, vec!["a.CSV", "b.csv", "sub/c.csv"]);
        assert_eq!(records, vec![1, 2, 2]);
        assert_eq!(found[0].preview.columns, ["Coreloss_mW", "Bac_T", "fs_kHz"].map(String::from));
    }

    #[test]
    fn menu_number_selects_and_bad_answers_reprompt() {
        let root = scratch_dir("choose");
        populate(&root);
        let found = measurement_files(&root);

        let mut out = Vec::new();
        let picked = choose(&found, "9\nprices\n2\n".as_bytes(), &mut out).unwrap();
        let shown = String::from_utf8(out).unwrap();

        let typed_input = format!("{}\n", root.join("prices.csv").display());
        let typed = choose(&found, typed_input.as_bytes(), Vec::new());
        let _ = fs::remove_dir_all(&root);

        assert_eq!(picked, found[1].path);
        assert!(shown.contains("(2 rows; coreloss, bac, fs)"));
        assert!(shown.contains("No entry 9."));
        assert!(shown.contains("CSV file not found: prices"));
        // Wrong columns: rejected, then input runs out.
        assert_eq!(typed.unwrap_err().exit_code(), 2);
    }

    #[test]
    fn quit_and_eof_cancel() {
        let candidates: Vec<Candidate> = Vec::new();
        let err = choose(&candidates, "q\n".as_bytes(), Vec::new()).unwrap_err();
        assert_eq!(err.message(), "Canceled.");
        assert!(choose(&candidates, "".as_bytes(), Vec::new()).is_err());
    }

    #[test]
    fn validate_rejects_dirs_missing_and_other_extensions() {
        let root = scratch_dir("validate");
        populate(&root);

        assert!(validate_csv_path(&root.join("b.csv")).is_ok());
        let errs = [
            validate_csv_path(&root.join("notes.txt")),
            validate_csv_path(&root.join("sub")),
            validate_csv_path(&root.join("nope.csv")),
        ];
        let _ = fs::remove_dir_all(&root);

        for err in errs {
            assert_eq!(err.unwrap_err().exit_code(), 2);
        }
    }
}
